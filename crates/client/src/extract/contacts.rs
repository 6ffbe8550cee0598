//! Contact detail mining from plain text.
//!
//! The patterns are permissive on purpose: they match address- and
//! number-shaped tokens without validating that they exist.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("invalid regex"));

/// Phone shapes, evaluated independently: US grouped digits, CN mobile, CN landline.
static PHONE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"\+?1?[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
        r"\d{3}[-.\s]?\d{4}[-.\s]?\d{4}",
        r"\d{4}[-.\s]?\d{7,8}",
    ]
    .map(|p| Regex::new(p).expect("invalid regex"))
});

/// Every email-shaped token in `text`, in order, duplicates preserved.
pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Phone-number-shaped tokens in `text`, deduplicated.
///
/// Matches from all patterns are concatenated before the unique filter, so a
/// token matched by more than one pattern is reported once. The first-seen
/// order is kept but callers should not rely on it.
pub fn extract_phone_numbers(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    PHONE_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .map(|m| m.as_str().to_string())
        .filter(|phone| seen.insert(phone.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_emails_basic() {
        let emails = extract_emails("Contact: support@example.com or sales@test.com");
        assert_eq!(emails, vec!["support@example.com", "sales@test.com"]);
    }

    #[test]
    fn test_extract_emails_duplicates_preserved() {
        let emails = extract_emails("a@b.io, a@b.io; c.d+tag@sub.domain.org");
        assert_eq!(emails, vec!["a@b.io", "a@b.io", "c.d+tag@sub.domain.org"]);
    }

    #[test]
    fn test_extract_emails_requires_tld() {
        assert!(extract_emails("user@localhost and @example.com").is_empty());
    }

    #[test]
    fn test_extract_emails_cjk_context() {
        let emails = extract_emails("联系我们: support@example.com 或 sales@test.com");
        assert_eq!(emails.len(), 2);
        assert!(emails.contains(&"support@example.com".to_string()));
    }

    #[test]
    fn test_extract_phone_numbers_us() {
        let phones = extract_phone_numbers("Call (555) 123-4567 today");
        assert!(phones.iter().any(|p| p.contains("123-4567")));
    }

    #[test]
    fn test_extract_phone_numbers_cn_mobile() {
        let phones = extract_phone_numbers("手机 138-1234-5678");
        assert!(phones.contains(&"138-1234-5678".to_string()));
    }

    #[test]
    fn test_extract_phone_numbers_cn_landline() {
        let phones = extract_phone_numbers("电话 0755-12345678");
        assert!(phones.iter().any(|p| p.ends_with("12345678")));
    }

    #[test]
    fn test_extract_phone_numbers_no_duplicates() {
        // 13812345678 matches both the US and the CN mobile shapes.
        let phones = extract_phone_numbers("13812345678 and again 13812345678");
        let unique: HashSet<_> = phones.iter().collect();
        assert_eq!(unique.len(), phones.len());
        assert!(phones.contains(&"13812345678".to_string()));
    }

    #[test]
    fn test_extract_phone_numbers_none() {
        assert!(extract_phone_numbers("no digits here").is_empty());
    }
}
