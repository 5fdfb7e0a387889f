//! Title text measurements.

use std::sync::LazyLock;

use regex::Regex;

// Letters, numbers and underscore only. `\w` would also admit combining marks.
static NON_WORD_NON_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_\s]").expect("static regex"));

/// Number of characters (Unicode scalar values) in the title.
pub fn title_length(title: &str) -> usize {
    title.chars().count()
}

/// Whether the title holds any character that is neither a word character nor
/// whitespace.
///
/// Ordinary punctuation matches too, so "Trailer!" counts as having an emoji.
pub fn has_emoji(title: &str) -> bool {
    NON_WORD_NON_SPACE.is_match(title)
}

/// Number of whitespace-delimited tokens.
pub fn word_count(title: &str) -> usize {
    title.split_whitespace().count()
}

/// Uppercase characters over all characters, with the denominator floored at 1.
pub fn caps_ratio(title: &str) -> f64 {
    let total = title.chars().count();
    let upper = title.chars().filter(|c| c.is_uppercase()).count();
    upper as f64 / total.max(1) as f64
}

/// Case-insensitive match of "official" anywhere in the title.
pub fn has_official(title: &str) -> bool {
    title.to_lowercase().contains("official")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_counts_as_emoji() {
        assert!(has_emoji("Trailer!"));
        assert!(has_emoji("🔥 hot"));
        assert!(!has_emoji("plain title 2025"));
        assert!(!has_emoji("snake_case words"));
        assert!(!has_emoji("日本語 タイトル"));
    }

    #[test]
    fn combining_marks_count_as_emoji() {
        assert!(has_emoji("नमस्ते दुनिया"));
        assert!(has_emoji("cafe\u{301}"));
        assert!(!has_emoji("café"));
    }

    #[test]
    fn caps_ratio_is_bounded() {
        for title in ["", "abc", "ABC", "Mixed Case Title", "123 !!", "ÉCOLE école"] {
            let ratio = caps_ratio(title);
            assert!((0.0..=1.0).contains(&ratio), "{title}: {ratio}");
        }
        assert_eq!(caps_ratio(""), 0.0);
        assert_eq!(caps_ratio("ABC"), 1.0);
        assert_eq!(caps_ratio("Ab  "), 0.25);
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("Official Trailer!!"), 2);
        assert_eq!(word_count("  spaced\tout\nwords  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn official_is_case_insensitive() {
        assert!(has_official("The OFFICIAL video"));
        assert!(has_official("unofficial remix"));
        assert!(!has_official("offical typo"));
    }
}
