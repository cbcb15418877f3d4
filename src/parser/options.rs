//! Parsing options and configuration.

/// Options for reading text out of PDF documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode for page-level failures
    pub error_mode: ErrorMode,

    /// Maximum number of pages to read (0 = unlimited)
    pub max_pages: u32,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages whose text cannot be extracted).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Fail the whole document on the first page that cannot be read.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Limit the number of pages read.
    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages;
        self
    }

    /// Number of pages to read out of `available`.
    pub fn page_limit(&self, available: u32) -> u32 {
        if self.max_pages == 0 {
            available
        } else {
            available.min(self.max_pages)
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            max_pages: 0,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    Strict,
    /// Skip unreadable pages and continue
    #[default]
    Lenient,
}
