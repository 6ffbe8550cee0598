//! Navigation target validation.

use url::Url;

use super::FetchError;

/// Parse a user-supplied URL into a navigable http(s) target.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Reject anything but http and https
///
/// Fragments are kept: client-side routers use them to select content.
pub fn parse_target(input: &str) -> Result<Url, FetchError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl("empty URL".into()));
    }

    let candidate = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = Url::parse(&candidate).map_err(|e| FetchError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(FetchError::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("{trimmed}: missing host")));
    }

    Ok(parsed)
}
