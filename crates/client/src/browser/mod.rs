//! Browser-driven page fetching for JS-heavy sites.
//!
//! [`PageFetcher`] is the seam the rest of the pipeline depends on; the
//! Chromium implementation lives behind the `render` feature.

#[cfg(feature = "render")]
mod chromium;
mod target;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use sitex_core::AppConfig;
use thiserror::Error;

use crate::agent::PageContext;

#[cfg(feature = "render")]
pub use chromium::BrowserFetcher;
pub use target::parse_target;

/// `<meta>` tags read into [`PageSnapshot::metadata`], as (key, selector).
pub const META_SELECTORS: [(&str, &str); 5] = [
    ("description", r#"meta[name="description"]"#),
    ("keywords", r#"meta[name="keywords"]"#),
    ("og:title", r#"meta[property="og:title"]"#),
    ("og:description", r#"meta[property="og:description"]"#),
    ("og:image", r#"meta[property="og:image"]"#),
];

/// Errors that can occur while driving the browser.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Target is not a navigable http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A bounded step ran out of time.
    #[error("{stage} timed out after {ms}ms")]
    Timeout { stage: &'static str, ms: u64 },

    /// Wait selector never appeared within the wait budget.
    #[error("selector `{selector}` not found within {ms}ms")]
    SelectorNotFound { selector: String, ms: u64 },

    /// Failed to read title, text, HTML or meta tags.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    /// Browser closed unexpectedly.
    #[error("browser closed unexpectedly")]
    BrowserClosed,
}

impl FetchError {
    /// True when the failure is a budget running out rather than a hard error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::SelectorNotFound { .. })
    }
}

impl From<FetchError> for sitex_core::Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidUrl(msg) => sitex_core::Error::InvalidUrl(msg),
            e if e.is_timeout() => sitex_core::Error::FetchTimeout(e.to_string()),
            e => sitex_core::Error::Fetch(e.to_string()),
        }
    }
}

/// Browser session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Run without a visible window (default: true).
    pub headless: bool,

    /// Budget for a page load (default: 30s).
    pub navigation_timeout: Duration,

    /// Budget for a `wait_for` selector to appear (default: 10s).
    pub wait_timeout: Duration,

    /// Viewport dimensions (default: 1280x720).
    pub viewport: (u32, u32),
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(10),
            viewport: (1280, 720),
        }
    }
}

impl BrowserOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            headless: config.browser_headless,
            navigation_timeout: config.navigation_timeout(),
            wait_timeout: config.wait_timeout(),
            ..Self::default()
        }
    }
}

/// Everything read from one loaded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// The requested URL.
    pub url: String,

    /// URL after redirects, as reported by the browser.
    pub final_url: String,

    /// Document title; empty when the page has none.
    pub title: String,

    /// Full rendered HTML.
    pub content: String,

    /// Visible text of `<body>`.
    pub text: String,

    /// Always holds every key of [`META_SELECTORS`]; absent tags map to "".
    pub metadata: BTreeMap<String, String>,

    pub fetched_at: DateTime<Utc>,

    /// Wall time of the whole fetch in milliseconds.
    pub fetch_ms: u64,

    /// Where a screenshot of this page load was saved, if one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

impl PageSnapshot {
    /// Metadata value for `key`, or "" when the key is unknown.
    pub fn meta(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Title and visible text, for feeding the extraction agent.
    pub fn page_context(&self) -> PageContext {
        PageContext { title: self.title.clone(), text: self.text.clone() }
    }
}

/// Build a metadata map holding every known key, filling absent ones with "".
pub fn complete_metadata<I>(found: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut metadata: BTreeMap<String, String> =
        META_SELECTORS.iter().map(|(key, _)| (key.to_string(), String::new())).collect();
    for (key, value) in found {
        if let Some(slot) = metadata.get_mut(&key) {
            *slot = value;
        }
    }
    metadata
}

static META_PARSED: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    META_SELECTORS
        .iter()
        .map(|(key, selector)| (*key, Selector::parse(selector).expect("invalid selector")))
        .collect()
});

/// Read the `content` attribute of every [`META_SELECTORS`] tag in `html`.
///
/// The first matching tag wins; every key is present in the result.
pub fn extract_metadata(html: &str) -> BTreeMap<String, String> {
    let document = Html::parse_document(html);
    let found = META_PARSED.iter().filter_map(|(key, selector)| {
        document
            .select(selector)
            .find_map(|el| el.value().attr("content"))
            .map(|content| (key.to_string(), content.trim().to_string()))
    });
    complete_metadata(found)
}

/// Loads pages and captures their state.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Navigate to `url`, optionally wait for `wait_for` to appear, and
    /// capture the page.
    async fn fetch_page(&self, url: &str, wait_for: Option<&str>) -> Result<PageSnapshot, FetchError>;
}
