//! Logical text lines built from merged spans.

use super::BBox;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Page dimensions carried alongside every line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageFrame {
    pub width: f32,
    pub height: f32,
}

impl PageFrame {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for PageFrame {
    fn default() -> Self {
        Self::new(612.0, 792.0)
    }
}

/// One visual line of text after span merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedLine {
    /// Concatenated, whitespace-normalized text
    pub text: String,
    /// Union of the member span boxes
    pub bbox: BBox,
    /// Font size of the dominant (heaviest) style in the line
    pub font_size: f32,
    /// Boldness of the dominant style
    pub bold: bool,
    /// Page number (1-indexed)
    pub page: u32,
    /// Whether the line is horizontally centered on the page
    pub centered: bool,
    /// Dimensions of the page the line sits on
    pub frame: PageFrame,
}

impl MergedLine {
    /// Number of non-whitespace characters.
    pub fn weight(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }

    /// Top edge of the line.
    pub fn top(&self) -> f32 {
        self.bbox.y0
    }

    /// Distance from the bottom edge of the line to the bottom of the page.
    pub fn distance_from_bottom(&self) -> f32 {
        (self.frame.height - self.bbox.y1).max(0.0)
    }

    /// Reading order: page, then top edge, then left edge.
    pub fn reading_order(&self, other: &MergedLine) -> Ordering {
        self.page
            .cmp(&other.page)
            .then_with(|| self.bbox.y0.total_cmp(&other.bbox.y0))
            .then_with(|| self.bbox.x0.total_cmp(&other.bbox.x0))
    }

    /// Whether the letters in the line are predominantly uppercase.
    ///
    /// Returns the ratio of uppercase letters and the number of letters.
    pub fn uppercase_stats(&self) -> (f32, usize) {
        let mut letters = 0usize;
        let mut upper = 0usize;
        for c in self.text.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            if c.is_uppercase() {
                upper += 1;
            }
        }
        if letters == 0 {
            (0.0, 0)
        } else {
            (upper as f32 / letters as f32, letters)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, page: u32, y0: f32, x0: f32) -> MergedLine {
        MergedLine {
            text: text.to_string(),
            bbox: BBox::new(x0, y0, x0 + 100.0, y0 + 12.0),
            font_size: 12.0,
            bold: false,
            page,
            centered: false,
            frame: PageFrame::default(),
        }
    }

    #[test]
    fn test_reading_order() {
        let a = line("a", 1, 100.0, 72.0);
        let b = line("b", 1, 100.0, 300.0);
        let c = line("c", 1, 50.0, 300.0);
        let d = line("d", 2, 10.0, 10.0);
        let mut lines = vec![d.clone(), b.clone(), a.clone(), c.clone()];
        lines.sort_by(|x, y| x.reading_order(y));
        let order: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_uppercase_stats() {
        let (ratio, letters) = line("INTRODUCTION 1", 1, 0.0, 0.0).uppercase_stats();
        assert_eq!(letters, 12);
        assert_eq!(ratio, 1.0);

        let (ratio, _) = line("Mixed Case", 1, 0.0, 0.0).uppercase_stats();
        assert!(ratio < 0.5);
    }

    #[test]
    fn test_distance_from_bottom() {
        let l = line("footer", 1, 760.0, 72.0);
        assert_eq!(l.distance_from_bottom(), 20.0);
    }
}
