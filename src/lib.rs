//! # pdf-outline
//!
//! Heuristic outline extraction for PDF documents.
//!
//! The library reads the positioned text of a PDF and recovers its title and
//! a leveled heading list (H1..Hn) from typographic and positional signals
//! alone: font size relative to body text, weight, numbering, capitalization,
//! alignment and repetition across pages. No per-document rules are needed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_outline::{extract_outline_file, render};
//!
//! fn main() -> pdf_outline::Result<()> {
//!     let outline = extract_outline_file("report.pdf")?;
//!
//!     // {"title": "...", "outline": [{"level": "H1", "text": "...", "page": 1}]}
//!     let json = render::to_json(&outline, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layout statistics**: body size, size clusters, running headers and footers
//! - **Scored classification**: every threshold and weight is configurable
//! - **Numbering-aware levels**: "1.2.3", "Chapter IV", "Appendix A.1"
//! - **CJK support**: spaceless scripts are joined without spaces
//! - **Batch processing**: whole directories on a Rayon pool

pub mod analysis;
pub mod batch;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
mod text;

// Re-export commonly used types
pub use analysis::{Analysis, OutlineConfig, OutlineExtractor};
pub use batch::{run_batch, scan_pdfs, BatchEvent, BatchOptions, BatchSummary, DocumentStatus};
pub use detect::{is_pdf, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use model::{BBox, HeadingLevel, MergedLine, Outline, OutlineEntry, PageText, TextSpan};
pub use parser::{ErrorMode, MemoryTextSource, PageTextSource, ParseOptions, PdfTextSource};
pub use render::JsonFormat;

use std::path::Path;

/// Extract the outline of a PDF file with the default configuration.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::extract_outline_file;
///
/// let outline = extract_outline_file("report.pdf").unwrap();
/// for entry in &outline.entries {
///     println!("{} {} (page {})", entry.level, entry.text, entry.page);
/// }
/// ```
pub fn extract_outline_file<P: AsRef<Path>>(path: P) -> Result<Outline> {
    extract_outline_file_with_config(path, &OutlineConfig::default())
}

/// Extract the outline of a PDF file with a custom configuration.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::{extract_outline_file_with_config, OutlineConfig};
///
/// let config = OutlineConfig::from_json_str(r#"{ "levels": { "max_depth": 3 } }"#).unwrap();
/// let outline = extract_outline_file_with_config("report.pdf", &config).unwrap();
/// ```
pub fn extract_outline_file_with_config<P: AsRef<Path>>(
    path: P,
    config: &OutlineConfig,
) -> Result<Outline> {
    let source = PdfTextSource::open(path)?;
    OutlineExtractor::new(config.clone()).extract(&source)
}

/// Extract the outline of a PDF held in memory.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::extract_outline_bytes;
///
/// let data = std::fs::read("report.pdf").unwrap();
/// let outline = extract_outline_bytes(&data).unwrap();
/// ```
pub fn extract_outline_bytes(data: &[u8]) -> Result<Outline> {
    let source = PdfTextSource::from_bytes(data)?;
    OutlineExtractor::default().extract(&source)
}

/// Extract the outline from any page text source.
pub fn extract_outline<S: PageTextSource + ?Sized>(source: &S) -> Result<Outline> {
    OutlineExtractor::default().extract(source)
}
