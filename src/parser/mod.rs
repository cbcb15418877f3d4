//! PDF reading: backends, content-stream interpretation and page text sources.

mod backend;
mod options;
mod source;

pub use backend::{
    decode_text_simple, BackendFontInfo, ContentOp, LopdfBackend, LopdfPageDecoder, PageDecoder,
    PageId, PdfBackend, PdfValue, DEFAULT_PAGE_SIZE,
};
pub use options::{ErrorMode, ParseOptions};
pub use source::{MemoryTextSource, PageTextSource, PdfTextSource};
