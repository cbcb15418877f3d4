//! Positioned text as produced by a page text source.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page space.
///
/// Coordinates are top-down: `y0` is the top edge and grows toward the bottom
/// of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a box, normalizing swapped corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Horizontal midpoint.
    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Length of the overlap of the two vertical bands (0 if disjoint).
    pub fn vertical_overlap(&self, other: &BBox) -> f32 {
        (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0)
    }
}

/// A single run of text with uniform font metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Bounding box in top-down page space
    pub bbox: BBox,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub bold: bool,
    /// Page number (1-indexed)
    pub page: u32,
}

impl TextSpan {
    /// Create a span, deriving boldness from the font name.
    pub fn new(
        text: impl Into<String>,
        bbox: BBox,
        font_size: f32,
        font_name: impl Into<String>,
        page: u32,
    ) -> Self {
        let font_name = font_name.into();
        let bold = is_bold_font_name(&font_name);
        Self {
            text: text.into(),
            bbox,
            font_size,
            font_name,
            bold,
            page,
        }
    }

    /// Override the bold flag (e.g., when the source knows better than the name).
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Number of non-whitespace characters; used as the span's weight.
    pub fn weight(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

/// One page of positioned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// Page number (1-indexed)
    pub number: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Spans in content-stream order
    pub spans: Vec<TextSpan>,
}

impl PageText {
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            spans: Vec::new(),
        }
    }

    /// US Letter page (612 x 792 pt).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }

    pub fn push(&mut self, span: TextSpan) {
        self.spans.push(span);
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }
}

/// Guess boldness from a PostScript font name.
pub fn is_bold_font_name(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    ["bold", "black", "heavy", "semibold", "demi"]
        .iter()
        .any(|marker| lower.contains(marker))
}
