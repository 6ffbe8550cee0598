//! Site reports: every deterministic extractor run over one page, optionally
//! joined with the model's extraction.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use scraper::{Html, Node, Selector};
use serde::Serialize;
use serde_json::Value;

use crate::agent::ExtractionResult;
use crate::browser::{PageSnapshot, extract_metadata};
use crate::extract::{
    Image, Link, clean_text, extract_emails, extract_headings, extract_images, extract_links,
    extract_phone_numbers, extract_structured_data, schema_types,
};

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("invalid selector"));
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("invalid selector"));

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Everything known about one page.
#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub url: String,
    pub title: String,
    pub metadata: BTreeMap<String, String>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub headings: BTreeMap<String, Vec<String>>,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub structured_data: Vec<Value>,
    pub schema_types: Vec<String>,

    /// Visible text after [`clean_text`].
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionResult>,
}

impl SiteReport {
    /// Mine a browser snapshot and attach the model's extraction, if any.
    pub fn compose(snapshot: &PageSnapshot, extraction: Option<ExtractionResult>) -> Self {
        let mut report = Self::mine(&snapshot.url, snapshot.title.clone(), &snapshot.content, &snapshot.text);
        report.metadata = snapshot.metadata.clone();
        report.fetched_at = Some(snapshot.fetched_at);
        report.screenshot = snapshot.screenshot.clone();
        report.extraction = extraction;
        report
    }

    /// Mine raw HTML, e.g. a saved page, without a browser or a model.
    pub fn from_html(url: &str, html: &str) -> Self {
        let (title, text) = {
            let document = Html::parse_document(html);
            let title = document
                .select(&TITLE_SELECTOR)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            (title, visible_text(&document))
        };

        let mut report = Self::mine(url, title, html, &text);
        report.metadata = extract_metadata(html);
        report
    }

    fn mine(url: &str, title: String, html: &str, text: &str) -> Self {
        let structured_data = extract_structured_data(html);
        Self {
            url: url.to_string(),
            title,
            metadata: BTreeMap::new(),
            links: extract_links(html),
            images: extract_images(html),
            headings: extract_headings(html),
            emails: extract_emails(text),
            phone_numbers: extract_phone_numbers(text),
            schema_types: schema_types(&structured_data),
            structured_data,
            text: clean_text(text),
            fetched_at: None,
            screenshot: None,
            extraction: None,
        }
    }

    /// Links resolved against the page URL, skipping unresolvable ones.
    pub fn absolute_links(&self) -> Vec<url::Url> {
        let Ok(base) = url::Url::parse(&self.url) else {
            return Vec::new();
        };
        self.links.iter().filter_map(|link| link.resolve(&base)).collect()
    }
}

/// Text nodes under `<body>`, skipping script-like elements, separated by newlines.
fn visible_text(document: &Html) -> String {
    let Some(body) = document.select(&BODY_SELECTOR).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|el| HIDDEN_ELEMENTS.contains(&el.name()));
        let trimmed = text.trim();
        if !hidden && !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::complete_metadata;
    use serde_json::json;

    const PAGE: &str = r#"<html><head>
        <title> Acme Widgets </title>
        <meta name="description" content="Widgets since 1999">
        <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
        <style>body { color: red; }</style>
    </head><body>
        <h1>Acme</h1>
        <p>Write to sales@acme.test or call 555-123-4567.</p>
        <a href="/about">About</a>
        <img src="logo.png" alt="Logo">
        <script>var hidden = "ghost@acme.test";</script>
    </body></html>"#;

    #[test]
    fn test_from_html() {
        let report = SiteReport::from_html("https://acme.test/", PAGE);

        assert_eq!(report.title, "Acme Widgets");
        assert_eq!(report.metadata["description"], "Widgets since 1999");
        assert_eq!(report.metadata.len(), 5);
        assert_eq!(report.emails, vec!["sales@acme.test"]);
        assert!(report.phone_numbers.iter().any(|p| p.trim() == "555-123-4567"));
        assert_eq!(report.headings["h1"], vec!["Acme"]);
        assert_eq!(report.links.len(), 1);
        assert_eq!(report.images[0].alt, "Logo");
        assert_eq!(report.schema_types, vec!["Organization"]);
        assert!(!report.text.contains("color"));
        assert!(report.extraction.is_none());
    }

    #[test]
    fn test_absolute_links() {
        let report = SiteReport::from_html("https://acme.test/products/", PAGE);
        let links = report.absolute_links();
        assert_eq!(links[0].as_str(), "https://acme.test/about");
    }

    #[test]
    fn test_compose_uses_snapshot() {
        let snapshot = PageSnapshot {
            url: "https://acme.test/".into(),
            final_url: "https://acme.test/".into(),
            title: "Rendered title".into(),
            content: PAGE.into(),
            text: "Rendered text, mail info@acme.test".into(),
            metadata: complete_metadata([("keywords".to_string(), "widgets".to_string())]),
            fetched_at: Utc::now(),
            fetch_ms: 5,
            screenshot: Some(PathBuf::from("/tmp/001-acme.test.png")),
        };
        let extraction = ExtractionResult::error("https://acme.test/", "boom");

        let report = SiteReport::compose(&snapshot, Some(extraction));

        assert_eq!(report.title, "Rendered title");
        assert_eq!(report.emails, vec!["info@acme.test"]);
        assert_eq!(report.metadata["keywords"], "widgets");
        assert_eq!(report.fetched_at, Some(snapshot.fetched_at));
        assert_eq!(report.screenshot, snapshot.screenshot);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["extraction"], json!({"url": "https://acme.test/", "status": "error", "error": "boom"}));
    }

    #[test]
    fn test_from_html_skips_empty_optionals() {
        let value = serde_json::to_value(SiteReport::from_html("u", "<p>hi</p>")).unwrap();
        assert!(value.get("extraction").is_none());
        assert!(value.get("fetched_at").is_none());
        assert!(value.get("screenshot").is_none());
        assert_eq!(value["text"], json!("hi"));
    }
}
