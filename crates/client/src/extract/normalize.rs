//! Text normalization for visible page text.

use std::sync::LazyLock;

use regex::Regex;

/// Anything that is not a word character, whitespace or common punctuation.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,!?;:()\[\]{}"'-]"#).expect("invalid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid regex"));

/// Normalize text for display or prompting.
///
/// Strips characters outside the allow-list (word characters, whitespace and
/// `. , ! ? ; : ( ) [ ] { } " ' -`), collapses whitespace runs to a single
/// space and trims both ends. Stripping happens before collapsing so that
/// `clean_text(clean_text(s)) == clean_text(s)`.
pub fn clean_text(text: &str) -> String {
    let stripped = DISALLOWED.replace_all(text, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Truncate `text` to at most `max_chars` characters, on a char boundary.
///
/// Returns the input unchanged when it already fits.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  Hello   World  "), "Hello World");
        assert_eq!(clean_text("line1\n\n\tline2"), "line1 line2");
    }

    #[test]
    fn test_clean_text_strips_disallowed() {
        assert_eq!(clean_text("Price: $5 <b>"), "Price: 5 b");
        assert_eq!(clean_text("\"quoted\" (x) [y] {z} it's - ok!?;"), "\"quoted\" (x) [y] {z} it's - ok!?;");
    }

    #[test]
    fn test_clean_text_keeps_unicode_words() {
        assert_eq!(clean_text("联系 我们 ★ café"), "联系 我们 café");
    }

    #[test]
    fn test_clean_text_idempotent() {
        let samples = [
            "a € b",
            "  mixed\t\twhite\nspace  ",
            "★★ stars ★★",
            "@@@",
            "",
            "already clean",
            "tabs\u{a0}and\u{2003}unicode spaces",
        ];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once, "not idempotent for {s:?}");
        }
        assert_eq!(clean_text("a € b"), "a b");
    }

    #[test]
    fn test_clean_text_only_symbols() {
        assert_eq!(clean_text("@#$%^&*"), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("联系我们", 2), "联系");
        assert_eq!(truncate_chars("", 0), "");
    }
}
