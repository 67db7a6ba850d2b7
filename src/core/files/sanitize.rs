//! File name sanitization

use regex::Regex;
use std::sync::OnceLock;

/// Longest title component, in characters
pub const MAX_TITLE_LEN: usize = 100;
/// Longest author component, in characters
pub const MAX_AUTHOR_LEN: usize = 50;
/// Substitute for a component that sanitizes to nothing
pub const EMPTY_COMPONENT: &str = "Unknown";

fn illegal_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[<>:"/\\|?*\x00-\x1F\x7F]"#).expect("file name pattern is a valid regex")
    })
}

/// Makes `raw` safe as a single path component of at most `max_len` chars.
///
/// Characters illegal on common filesystems and control characters are
/// removed, leading and trailing spaces and dots are trimmed, and the result
/// is truncated. Returns [`EMPTY_COMPONENT`] if nothing is left.
pub fn sanitize_component(raw: &str, max_len: usize) -> String {
    let stripped = illegal_chars().replace_all(raw, "");
    let trimmed = trim_edges(&stripped);
    let truncated: String = trimmed.chars().take(max_len).collect();
    let result = trim_edges(&truncated);
    if result.is_empty() {
        EMPTY_COMPONENT.to_string()
    } else {
        result.to_string()
    }
}

pub fn sanitize_title(raw: &str) -> String {
    sanitize_component(raw, MAX_TITLE_LEN)
}

pub fn sanitize_author(raw: &str) -> String {
    sanitize_component(raw, MAX_AUTHOR_LEN)
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("On the Origin of Species", "On the Origin of Species" ; "plain")]
    #[test_case("What is <life>? A/B: \"test\"", "What is life AB test" ; "illegal characters")]
    #[test_case("Tab\there\u{7}", "Tabhere" ; "control characters")]
    #[test_case("  ..hidden title..  ", "hidden title" ; "edges")]
    #[test_case("???", "Unknown" ; "nothing left")]
    #[test_case("", "Unknown" ; "empty")]
    fn test_sanitize_title(raw: &str, expected: &str) {
        assert_eq!(sanitize_title(raw), expected);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let long = "é".repeat(120);
        let result = sanitize_title(&long);
        assert_eq!(result.chars().count(), MAX_TITLE_LEN);
    }

    #[test]
    fn test_truncation_retrims() {
        let raw = format!("{}. tail", "a".repeat(49));
        assert_eq!(sanitize_author(&raw), "a".repeat(49));
    }
}
