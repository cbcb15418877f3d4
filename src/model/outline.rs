//! The outline produced for a document.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Heading depth, rendered as "H1", "H2", ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const H1: HeadingLevel = HeadingLevel(1);
    pub const H2: HeadingLevel = HeadingLevel(2);
    pub const H3: HeadingLevel = HeadingLevel(3);
    pub const H4: HeadingLevel = HeadingLevel(4);

    /// Create a level; depth 0 is clamped to 1.
    pub fn new(depth: u8) -> Self {
        Self(depth.max(1))
    }

    pub fn depth(self) -> u8 {
        self.0
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

impl FromStr for HeadingLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('H')
            .or_else(|| s.strip_prefix('h'))
            .ok_or_else(|| format!("invalid heading level: {}", s))?;
        match digits.parse::<u8>() {
            Ok(depth) if depth > 0 => Ok(HeadingLevel(depth)),
            _ => Err(format!("invalid heading level: {}", s)),
        }
    }
}

impl TryFrom<String> for HeadingLevel {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HeadingLevel> for String {
    fn from(level: HeadingLevel) -> Self {
        level.to_string()
    }
}

/// A single heading in the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level
    pub level: HeadingLevel,
    /// Heading text
    pub text: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Top edge of the heading on its page, used for ordering checks
    #[serde(skip)]
    pub top: f32,
}

impl OutlineEntry {
    pub fn new(level: HeadingLevel, text: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            text: text.into(),
            page,
            top: 0.0,
        }
    }

    pub fn with_top(mut self, top: f32) -> Self {
        self.top = top;
        self
    }
}

/// Title plus ordered headings of one document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outline {
    /// Document title (empty if none was found)
    pub title: String,
    /// Headings in reading order
    #[serde(rename = "outline")]
    pub entries: Vec<OutlineEntry>,
}

impl Outline {
    /// Outline with no title and no headings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble an outline, checking that the entries are well formed and in
    /// reading order.
    pub fn build(title: impl Into<String>, entries: Vec<OutlineEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.page == 0 {
                return Err(Error::InvariantViolation(format!(
                    "entry {} ({:?}) has page 0",
                    i, entry.text
                )));
            }
            if entry.text.trim().is_empty() {
                return Err(Error::InvariantViolation(format!(
                    "entry {} on page {} has empty text",
                    i, entry.page
                )));
            }
        }

        if let Some(i) = entries.windows(2).position(|w| {
            w[1].page < w[0].page || (w[1].page == w[0].page && w[1].top < w[0].top)
        }) {
            return Err(Error::InvariantViolation(format!(
                "entry {} ({:?}, page {}) precedes entry {} in reading order",
                i + 1,
                entries[i + 1].text,
                entries[i + 1].page,
                i
            )));
        }

        Ok(Self {
            title: title.into(),
            entries,
        })
    }

    /// Title only, used for form documents.
    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.entries.is_empty()
    }

    /// Deepest level present in the outline.
    pub fn max_depth(&self) -> u8 {
        self.entries
            .iter()
            .map(|e| e.level.depth())
            .max()
            .unwrap_or(0)
    }
}
