//! Decides which extracted fragments are worth a translation call.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Digits with separators only: "123", "1,234.50", "2024-01-01"
#[allow(clippy::expect_used)]
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s,.\-]+$").expect("valid regex"));

/// Collapse whitespace runs to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// False for text under two characters, purely numeric text and
/// spreadsheet formulas (leading `=`).
pub fn should_translate(text: &str) -> bool {
    let text = clean_text(text);
    if text.chars().count() < 2 {
        return false;
    }
    if NUMERIC.is_match(&text) {
        return false;
    }
    !text.starts_with('=')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Hello \n\t world  "), "Hello world");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_skips_short_text() {
        assert!(!should_translate(""));
        assert!(!should_translate("   "));
        assert!(!should_translate("a"));
        assert!(should_translate("ab"));
    }

    #[test]
    fn test_skips_numbers() {
        assert!(!should_translate("123"));
        assert!(!should_translate("1,234.50"));
        assert!(!should_translate(" 2024-01-01 "));
        assert!(should_translate("Model X200"));
    }

    #[test]
    fn test_skips_formulas() {
        assert!(!should_translate("=SUM(A1:A3)"));
        assert!(should_translate("Total = 3 items"));
    }

    #[test]
    fn test_accepts_text() {
        assert!(should_translate("Hello"));
        assert!(should_translate("日本"));
    }
}
