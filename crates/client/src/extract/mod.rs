//! Deterministic content extraction from HTML and visible text.
//!
//! Every function here is pure: it takes markup or text and returns a fresh
//! container. None of them call a model, so they can run alongside (or
//! instead of) the model-driven summary.
//!
//! ### Markup
//! - [`extract_links`]: anchors with a non-empty href, document order, duplicates kept.
//! - [`extract_images`]: every `<img>`, missing attributes become empty strings.
//! - [`extract_headings`]: `h1`..`h6` outline with every level present.
//! - [`extract_structured_data`]: decoded LD+JSON blocks, malformed ones skipped.
//!
//! ### Text
//! - [`extract_emails`]: email-shaped tokens, duplicates kept.
//! - [`extract_phone_numbers`]: phone-shaped tokens from three patterns, deduplicated.
//! - [`clean_text`]: idempotent whitespace and character normalization.

pub mod contacts;
pub mod headings;
pub mod links;
pub mod normalize;
pub mod structured;

pub use contacts::{extract_emails, extract_phone_numbers};
pub use headings::{HEADING_LEVELS, extract_headings};
pub use links::{Image, Link, extract_images, extract_links};
pub use normalize::{clean_text, truncate_chars};
pub use structured::{extract_structured_data, schema_types};
