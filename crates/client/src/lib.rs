//! Client code for sitex.
//!
//! This crate provides the extraction pipeline: provider resolution, model
//! backends, the extraction agent, deterministic text extractors and the
//! browser fetcher. The CLI is a thin shell over it.

pub mod agent;
pub mod browser;
pub mod extract;
pub mod llm;
pub mod report;

pub use agent::{
    AgentState, ExtractionAgent, ExtractionRequest, ExtractionResult, ExtractionStatus, PageContext, ParseError,
    Stage, parse_response,
};

#[cfg(feature = "render")]
pub use browser::BrowserFetcher;
pub use browser::{BrowserOptions, FetchError, PageFetcher, PageSnapshot};

pub use extract::{
    Image, Link, clean_text, extract_emails, extract_headings, extract_images, extract_links, extract_phone_numbers,
    extract_structured_data,
};

pub use llm::{Backend, BackendError, BackendRegistry, ChatModel, Message, ResolvedBackend, Role, resolve};
pub use report::SiteReport;
