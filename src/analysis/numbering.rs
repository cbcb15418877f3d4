//! Heading numbering detection.
//!
//! An ordered list of tagged rules; the first rule whose pattern matches the
//! start of a line decides the numbering and its depth.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

/// Well-formed roman numeral, either case.
const ROMAN: &str = r"(?i:m{0,3}(?:cm|cd|d?c{0,3})(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3}))";

/// Kind of numbering scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NumberingKind {
    /// "Chapter 3", "Chapter IV"
    Chapter,
    /// "Part II"
    Part,
    /// "Section 2.1"
    Section,
    /// "Appendix B", "Appendix A.2"
    Appendix,
    /// "1.", "2.3", "4.1.2)"
    Decimal,
    /// "A.1", "B.2.3"
    AlphaDecimal,
    /// User-supplied rule
    Custom(String),
}

impl fmt::Display for NumberingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberingKind::Chapter => write!(f, "chapter"),
            NumberingKind::Part => write!(f, "part"),
            NumberingKind::Section => write!(f, "section"),
            NumberingKind::Appendix => write!(f, "appendix"),
            NumberingKind::Decimal => write!(f, "decimal"),
            NumberingKind::AlphaDecimal => write!(f, "alpha-decimal"),
            NumberingKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// How a rule derives the nesting depth from its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthRule {
    /// Always the same depth
    Fixed(u8),
    /// Number of dot-separated segments in the label
    Segments,
}

/// Numbering found at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Numbering {
    pub kind: NumberingKind,
    /// The number itself, e.g. "2.1" or "IV"
    pub label: String,
    /// Nesting depth (1 = top level)
    pub depth: u8,
}

#[derive(Debug, Clone)]
struct NumberingRule {
    kind: NumberingKind,
    pattern: Regex,
    depth: DepthRule,
}

/// Ordered numbering rules.
#[derive(Debug, Clone)]
pub struct NumberingDetector {
    rules: Vec<NumberingRule>,
    bare_serial: Regex,
}

impl NumberingDetector {
    /// Detector with the built-in rules.
    pub fn new() -> Self {
        let builtin = [
            (
                NumberingKind::Chapter,
                r"(?i)^chapter\s+(?P<label>\d+|[ivxlcdm]+)\b",
                DepthRule::Fixed(1),
            ),
            (
                NumberingKind::Part,
                r"(?i)^part\s+(?P<label>\d+|[ivxlcdm]+)\b",
                DepthRule::Fixed(1),
            ),
            (
                NumberingKind::Section,
                r"(?i)^section\s+(?P<label>\d+(?:\.\d+)*)\b",
                DepthRule::Segments,
            ),
            (
                NumberingKind::Appendix,
                r"(?i)^appendix\s+(?P<label>[a-z](?:\.\d+)*)\b",
                DepthRule::Segments,
            ),
            (
                NumberingKind::Decimal,
                r"^(?P<label>\d{1,3}(?:\.\d+)*)[.)]?\s+\S",
                DepthRule::Segments,
            ),
            (
                NumberingKind::AlphaDecimal,
                r"^(?P<label>[A-Z]\.\d+(?:\.\d+)*)\.?\s+\S",
                DepthRule::Segments,
            ),
        ];

        Self {
            rules: builtin
                .into_iter()
                .map(|(kind, pattern, depth)| NumberingRule {
                    kind,
                    pattern: Regex::new(pattern).unwrap(),
                    depth,
                })
                .collect(),
            bare_serial: Regex::new(&format!(r"^\(?(?:\d+|[A-Za-z]|{})[.)]?$", ROMAN)).unwrap(),
        }
    }

    /// Append a rule with the lowest priority.
    ///
    /// The pattern should match at the start of the line and may capture the
    /// number in a group named `label`.
    pub fn with_rule(mut self, kind: NumberingKind, pattern: &str, depth: DepthRule) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid numbering pattern: {}", e)))?;
        self.rules.push(NumberingRule {
            kind,
            pattern,
            depth,
        });
        Ok(self)
    }

    /// Numbering at the start of `text`, if any rule matches.
    pub fn detect(&self, text: &str) -> Option<Numbering> {
        let text = text.trim_start();
        self.rules.iter().find_map(|rule| {
            let caps = rule.pattern.captures(text)?;
            let label = caps
                .name("label")
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let depth = match rule.depth {
                DepthRule::Fixed(depth) => depth,
                DepthRule::Segments => label
                    .split('.')
                    .filter(|s| !s.is_empty())
                    .count()
                    .clamp(1, u8::MAX as usize) as u8,
            };
            Some(Numbering {
                kind: rule.kind.clone(),
                label,
                depth,
            })
        })
    }

    /// A serial with no text of its own, such as "1.", "A." or "(a)".
    pub fn is_bare_serial(&self, text: &str) -> bool {
        self.bare_serial.is_match(text.trim())
    }
}

impl Default for NumberingDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<(NumberingKind, String, u8)> {
        NumberingDetector::new()
            .detect(text)
            .map(|n| (n.kind, n.label, n.depth))
    }

    #[test]
    fn test_decimal_depths() {
        assert_eq!(
            detect("1. Introduction"),
            Some((NumberingKind::Decimal, "1".into(), 1))
        );
        assert_eq!(
            detect("1.1 Background"),
            Some((NumberingKind::Decimal, "1.1".into(), 2))
        );
        assert_eq!(
            detect("2.3.4) Details"),
            Some((NumberingKind::Decimal, "2.3.4".into(), 3))
        );
    }

    #[test]
    fn test_words_take_priority() {
        assert_eq!(
            detect("Chapter IV The Return"),
            Some((NumberingKind::Chapter, "IV".into(), 1))
        );
        assert_eq!(
            detect("PART 2: Methods"),
            Some((NumberingKind::Part, "2".into(), 1))
        );
        assert_eq!(
            detect("Section 3.2 Scope"),
            Some((NumberingKind::Section, "3.2".into(), 2))
        );
        assert_eq!(
            detect("Appendix B.1 Tables"),
            Some((NumberingKind::Appendix, "B.1".into(), 2))
        );
        assert_eq!(
            detect("A.2.1 Data sources"),
            Some((NumberingKind::AlphaDecimal, "A.2.1".into(), 3))
        );
    }

    #[test]
    fn test_non_numbered() {
        assert_eq!(detect("Introduction"), None);
        assert_eq!(detect("2024 annual results"), None);
        assert_eq!(detect("Participants"), None);
        assert_eq!(detect("Appendixes"), None);
        assert_eq!(detect("12"), None);
    }

    #[test]
    fn test_custom_rule() {
        let detector = NumberingDetector::new()
            .with_rule(
                NumberingKind::Custom("article".into()),
                r"^Article\s+(?P<label>\d+)",
                DepthRule::Fixed(2),
            )
            .unwrap();
        let numbering = detector.detect("Article 7 Remedies").unwrap();
        assert_eq!(numbering.depth, 2);
        assert_eq!(numbering.kind.to_string(), "article");

        assert!(NumberingDetector::new()
            .with_rule(NumberingKind::Custom("bad".into()), "(", DepthRule::Segments)
            .is_err());
    }

    #[test]
    fn test_bare_serial() {
        let detector = NumberingDetector::new();
        assert!(detector.is_bare_serial("1."));
        assert!(detector.is_bare_serial("A."));
        assert!(detector.is_bare_serial("(a)"));
        assert!(detector.is_bare_serial("iv)"));
        assert!(!detector.is_bare_serial("1. Scope"));
        assert!(!detector.is_bare_serial("Summary"));
        assert!(!detector.is_bare_serial("CIVIL"));
    }
}
