//! Tolerant parsing of model output into a JSON payload.
//!
//! Models often wrap JSON in Markdown fences. The parser looks for a
//! `json`-tagged fence first, then any fence, and otherwise decodes the whole
//! text. The tagged search always runs first.

use serde_json::Value;

const TAGGED_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Failure to interpret model output as structured data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// An opening fence was found without a matching closing fence.
    #[error("unterminated code fence starting at byte {0}")]
    UnclosedFence(usize),

    /// The extracted text is not valid JSON.
    #[error("{0}")]
    InvalidJson(String),
}

/// Locate the JSON candidate inside `raw`, without decoding it.
///
/// Returns the trimmed slice between the first opening fence and the next
/// closing fence, or the trimmed full text when no fence is present.
pub fn extract_payload(raw: &str) -> Result<&str, ParseError> {
    let opening = raw
        .find(TAGGED_FENCE)
        .map(|idx| (idx, idx + TAGGED_FENCE.len()))
        .or_else(|| raw.find(FENCE).map(|idx| (idx, idx + FENCE.len())));

    let Some((fence_start, body_start)) = opening else {
        return Ok(raw.trim());
    };

    let body_len = raw[body_start..]
        .find(FENCE)
        .ok_or(ParseError::UnclosedFence(fence_start))?;

    Ok(raw[body_start..body_start + body_len].trim())
}

/// Extract and strictly decode the JSON payload in `raw`.
///
/// # Errors
///
/// Returns [`ParseError`] when a fence is left open or the payload is not
/// valid JSON. The decoder's message is preserved verbatim.
pub fn parse_response(raw: &str) -> Result<Value, ParseError> {
    let payload = extract_payload(raw)?;
    serde_json::from_str(payload).map_err(|e| ParseError::InvalidJson(e.to_string()))
}
