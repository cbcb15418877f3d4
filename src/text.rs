//! Small text helpers shared by the text source and the analysis stages.

use unicode_normalization::UnicodeNormalization;

/// Check if a character belongs to a script that does not put spaces between
/// words. Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs
    (0x4E00..=0x9FFF).contains(&code)
    // Extension A
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana
    || (0x3040..=0x309F).contains(&code)
    // Katakana
    || (0x30A0..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

/// Collapse every whitespace run (including NBSP) into a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFKC-normalize (folds ligatures such as "ﬁ" into "fi") and collapse
/// whitespace.
pub fn normalize_line_text(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    collapse_whitespace(&folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaceless_scripts() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('あ'));
        assert!(is_spaceless_script_char('カ'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('a'));
    }

    #[test]
    fn test_normalize_line_text() {
        assert_eq!(normalize_line_text("  ﬁnal\u{00A0}\u{00A0}report \t"), "final report");
        assert_eq!(collapse_whitespace("a \n b"), "a b");
    }
}
