//! Link and image harvesting from HTML documents.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("invalid selector"));

/// A harvested link with text and href.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link text content, trimmed (may be empty)
    pub text: String,
    /// The href attribute exactly as written in the document
    pub href: String,
}

impl Link {
    /// Resolve the href against `base`, returning `None` when it is not a valid URL reference.
    pub fn resolve(&self, base: &Url) -> Option<Url> {
        base.join(&self.href).ok()
    }
}

/// A harvested image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// The src attribute, empty when missing
    pub src: String,
    /// The alt attribute, empty when missing
    pub alt: String,
}

/// Extract every anchor with a non-empty href, in document order.
///
/// Duplicates are kept; relative hrefs are returned verbatim (see [`Link::resolve`]).
pub fn extract_links(html: &str) -> Vec<Link> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            if href.is_empty() {
                return None;
            }
            Some(Link { text: element_text(&element), href: href.to_string() })
        })
        .collect()
}

/// Extract every `<img>` element in document order.
pub fn extract_images(html: &str) -> Vec<Image> {
    let document = Html::parse_document(html);

    document
        .select(&IMAGE)
        .map(|element| {
            let attr = |name: &str| element.value().attr(name).unwrap_or_default().to_string();
            Image { src: attr("src"), alt: attr("alt") }
        })
        .collect()
}

/// Concatenated descendant text of an element, trimmed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_links_basic() {
        let links = extract_links(r#"<a href="https://example.com">Example</a>"#);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "Example");
        assert_eq!(links[0].href, "https://example.com");
    }

    #[test]
    fn test_extract_links_document_order_and_duplicates() {
        let html = r#"
            <html>
                <body>
                    <a href="/b">B</a>
                    <p><a href="/a">A</a></p>
                    <a href="/b">B again</a>
                </body>
            </html>
        "#;

        let links = extract_links(html);
        let hrefs: Vec<_> = links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/b", "/a", "/b"]);
        assert_eq!(links[2].text, "B again");
    }

    #[test]
    fn test_extract_links_skips_missing_and_empty_href() {
        let html = r##"
            <a>No href</a>
            <a href="">Empty</a>
            <a href="#top">Top</a>
        "##;

        let links = extract_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "#top");
    }

    #[test]
    fn test_extract_links_empty_text_allowed() {
        let links = extract_links(r#"<a href="https://example.com">   </a>"#);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text, "");
    }

    #[test]
    fn test_extract_links_nested_text_trimmed() {
        let html = r#"
            <a href="/contact">
                <span>Contact</span> us
            </a>
        "#;

        let links = extract_links(html);
        assert_eq!(links[0].text, "Contact us");
    }

    #[test]
    fn test_extract_links_counts_every_anchor() {
        let html: String = (0..25).map(|i| format!(r#"<a href="/p/{i}">{i}</a>"#)).collect();
        assert_eq!(extract_links(&html).len(), 25);
    }

    #[test]
    fn test_link_resolve() {
        let base = Url::parse("https://example.com/path/").unwrap();
        let link = Link { text: "About".into(), href: "../about".into() };
        assert_eq!(link.resolve(&base).unwrap().as_str(), "https://example.com/about");

        let absolute = Link { text: String::new(), href: "https://other.org/x".into() };
        assert_eq!(absolute.resolve(&base).unwrap().as_str(), "https://other.org/x");
    }

    #[test]
    fn test_extract_images_missing_attributes() {
        let html = r#"
            <img src="/logo.png" alt="Logo">
            <img src="/banner.jpg">
            <img alt="orphan">
        "#;

        let images = extract_images(html);
        assert_eq!(
            images,
            vec![
                Image { src: "/logo.png".into(), alt: "Logo".into() },
                Image { src: "/banner.jpg".into(), alt: String::new() },
                Image { src: String::new(), alt: "orphan".into() },
            ]
        );
    }

    #[test]
    fn test_extract_images_none() {
        assert!(extract_images("<p>No images</p>").is_empty());
    }
}
