//! Prompts sent to the model.

use std::path::Path;

use crate::extract::{clean_text, truncate_chars};

/// Built-in extraction instructions.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert at extracting information from websites.
Given a website URL (and, when available, the page title and visible text), extract the key information.

Principles:
1. Be accurate. Never invent information that is not supported by the page.
2. Organise the information into a clear structure.
3. Keep the original context and language of the content.
4. Mark anything you are unsure about as "unknown".

Answer with a single JSON object inside a ```json fenced block, using these keys where applicable:
- "title": the site or page title
- "description": a short summary of what the site offers
- "contacts": {"emails": [...], "phones": [...], "address": "..."}
- "links": important links as [{"text": "...", "href": "..."}]
- "metadata": any other notable facts (organisation, language, social profiles, ...)"#;

/// Upper bound on page text characters included in the human message.
pub const MAX_PAGE_CHARS: usize = 12_000;

/// Read a system prompt override, falling back to [`DEFAULT_SYSTEM_PROMPT`].
///
/// A missing, unreadable or blank file is logged and ignored.
pub fn load_system_prompt(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_SYSTEM_PROMPT.to_string();
    };

    match std::fs::read_to_string(path) {
        Ok(prompt) if !prompt.trim().is_empty() => prompt,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "system prompt file is empty; using built-in prompt");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read system prompt file; using built-in prompt");
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}

/// Page content a caller fetched beforehand and wants the model to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub title: String,
    pub text: String,
}

/// Input of one extraction: the URL plus optional page context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub url: String,
    pub page: Option<PageContext>,
}

impl ExtractionRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), page: None }
    }

    pub fn with_page(mut self, page: PageContext) -> Self {
        self.page = Some(page);
        self
    }

    /// The single human message for this request.
    pub fn human_message(&self) -> String {
        let mut message = format!("Please extract the website information: {}", self.url);

        if let Some(page) = &self.page {
            let title = clean_text(&page.title);
            if !title.is_empty() {
                message.push_str(&format!("\n\nPage title: {title}"));
            }

            let text = clean_text(&page.text);
            if !text.is_empty() {
                let excerpt = truncate_chars(&text, MAX_PAGE_CHARS);
                message.push_str(&format!("\n\nVisible page text:\n{excerpt}"));
                if excerpt.len() < text.len() {
                    message.push_str("\n[truncated]");
                }
            }
        }

        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_message_url_only() {
        let msg = ExtractionRequest::new("https://example.com").human_message();
        assert_eq!(msg, "Please extract the website information: https://example.com");
    }

    #[test]
    fn test_human_message_with_page() {
        let msg = ExtractionRequest::new("https://example.com")
            .with_page(PageContext { title: "  Example  Domain ".into(), text: "Hello\n\n  world ★".into() })
            .human_message();

        assert!(msg.contains("Page title: Example Domain"));
        assert!(msg.contains("Visible page text:\nHello world"));
        assert!(!msg.contains("[truncated]"));
    }

    #[test]
    fn test_human_message_truncates_long_text() {
        let text = "word ".repeat(5_000);
        let msg = ExtractionRequest::new("u")
            .with_page(PageContext { title: String::new(), text })
            .human_message();

        assert!(msg.ends_with("[truncated]"));
        assert!(!msg.contains("Page title"));
    }

    #[test]
    fn test_load_system_prompt_default() {
        assert_eq!(load_system_prompt(None), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_load_system_prompt_missing_file() {
        let prompt = load_system_prompt(Some(Path::new("/nonexistent/sitex/prompt.md")));
        assert_eq!(prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_load_system_prompt_from_file() {
        let path = std::env::temp_dir().join(format!("sitex-prompt-{}.md", std::process::id()));
        std::fs::write(&path, "Custom instructions").unwrap();
        assert_eq!(load_system_prompt(Some(&path)), "Custom instructions");
        std::fs::remove_file(&path).ok();
    }
}
