//! Data model shared by the extraction pipeline.
//!
//! Spans come out of a page text source, lines out of the fragment merger,
//! and the outline is the terminal artifact handed to rendering.

mod line;
mod outline;
mod span;

pub use line::{MergedLine, PageFrame};
pub use outline::{HeadingLevel, Outline, OutlineEntry};
pub use span::{is_bold_font_name, BBox, PageText, TextSpan};
