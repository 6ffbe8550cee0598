//! Heading outline extraction.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::links::element_text;

/// Heading tag names, in level order.
pub const HEADING_LEVELS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").expect("invalid selector"));

/// Headings grouped by level (`h1`..`h6`), each in document order.
///
/// Every level is present in the map; levels without headings map to an empty list.
pub fn extract_headings(html: &str) -> BTreeMap<String, Vec<String>> {
    let document = Html::parse_document(html);

    let mut headings: BTreeMap<String, Vec<String>> =
        HEADING_LEVELS.iter().map(|level| (level.to_string(), Vec::new())).collect();

    for element in document.select(&HEADING) {
        if let Some(texts) = headings.get_mut(element.value().name()) {
            texts.push(element_text(&element));
        }
    }

    headings
}
