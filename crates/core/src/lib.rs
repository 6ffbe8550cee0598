//! Core types and shared functionality for sitex.
//!
//! This crate provides:
//! - Unified error types
//! - Layered configuration loading
//! - Provider identifiers and the credential bag handed to the extraction agent

pub mod config;
pub mod error;
pub mod provider;

pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use provider::{GenerationParams, ProviderCredentials, ProviderId, WireFormat};
