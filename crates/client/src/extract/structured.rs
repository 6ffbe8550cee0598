//! JSON-LD structured data extraction.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

static LD_JSON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("invalid selector"));

/// Decode every `<script type="application/ld+json">` block in document order.
///
/// Blocks that fail to decode are skipped so one malformed block never hides
/// the rest of the page's structured data.
pub fn extract_structured_data(html: &str) -> Vec<Value> {
    let document = Html::parse_document(html);

    document
        .select(&LD_JSON)
        .filter_map(|script| {
            let body = script.text().collect::<String>();
            match serde_json::from_str::<Value>(body.trim()) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed LD+JSON block");
                    None
                }
            }
        })
        .collect()
}

/// Schema.org `@type` values declared by the decoded blocks.
///
/// Handles both string and array forms as well as `@graph` containers.
pub fn schema_types(blocks: &[Value]) -> Vec<String> {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value.get("@type") {
            Some(Value::String(t)) => out.push(t.clone()),
            Some(Value::Array(types)) => out.extend(types.iter().filter_map(Value::as_str).map(str::to_string)),
            _ => {}
        }
        if let Some(Value::Array(graph)) = value.get("@graph") {
            graph.iter().for_each(|node| collect(node, out));
        }
    }

    let mut types = Vec::new();
    for block in blocks {
        match block {
            Value::Array(items) => items.iter().for_each(|item| collect(item, &mut types)),
            other => collect(other, &mut types),
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_structured_data_skips_malformed() {
        let html = r#"
            <html><head>
                <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
                <script type="application/ld+json">{"@type": "Broken",</script>
            </head></html>
        "#;

        let data = extract_structured_data(html);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0], json!({"@type": "Organization", "name": "Acme"}));
    }

    #[test]
    fn test_extract_structured_data_ignores_other_scripts() {
        let html = r#"
            <script>var x = {"a": 1};</script>
            <script type="application/json">{"a": 1}</script>
        "#;
        assert!(extract_structured_data(html).is_empty());
    }

    #[test]
    fn test_extract_structured_data_empty_block() {
        let html = r#"<script type="application/ld+json"></script>"#;
        assert!(extract_structured_data(html).is_empty());
    }

    #[test]
    fn test_extract_structured_data_arrays_kept() {
        let html = r#"<script type="application/ld+json">[{"@type": "WebSite"}, {"@type": "Person"}]</script>"#;
        let data = extract_structured_data(html);
        assert_eq!(data.len(), 1);
        assert!(data[0].is_array());
    }

    #[test]
    fn test_schema_types() {
        let blocks = vec![
            json!({"@type": "Organization"}),
            json!({"@type": ["Product", "Thing"]}),
            json!([{"@type": "WebSite"}]),
            json!({"@graph": [{"@type": "BreadcrumbList"}]}),
        ];
        assert_eq!(schema_types(&blocks), vec!["Organization", "Product", "Thing", "WebSite", "BreadcrumbList"]);
    }
}
