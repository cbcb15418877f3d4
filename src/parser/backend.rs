//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the few PDF operations the text
//! source needs, isolating the concrete PDF library (lopdf) from content
//! stream interpretation.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Default page size when no usable MediaBox is found (US Letter).
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// Whether the font descriptor marks the font as bold (ForceBold flag or
    /// FontWeight of 600 and above).
    pub descriptor_bold: bool,
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }

    /// Numeric operand at `index`, if present.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(get_number_from_value)
    }
}

/// Text decoding for the fonts of one page.
pub trait PageDecoder {
    /// Decode the bytes of a text-show operator set in `font_name`.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode(&self, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Abstract interface for PDF document access.
pub trait PdfBackend {
    /// Decoder for one page, borrowing from the backend.
    type Decoder<'a>: PageDecoder
    where
        Self: 'a;

    /// Return all pages as (page_number → PageId), 1-indexed.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Page width and height in points.
    fn page_size(&self, page: PageId) -> (f32, f32);

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Resolve the font encodings of a page once, for every text operator
    /// on it.
    fn page_decoder(&self, page: PageId) -> Self::Decoder<'_>;

    /// Whether the document is an interactive form with fields.
    fn has_form_fields(&self) -> bool {
        false
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Encoding, Object};

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Self::checked(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Self::checked(doc)
    }

    fn checked(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; text may not decode correctly");
        }
        Ok(Self { doc })
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(obj).and_then(|o| o.as_dict().ok())
    }

    /// Look up a page attribute, following the `/Parent` chain for
    /// inheritable keys such as `/MediaBox`.
    fn inherited<'a>(&'a self, page: PageId, key: &[u8]) -> Option<&'a Object> {
        let mut current = self.doc.get_dictionary(page).ok();
        // Bounded walk guards against cyclic page trees.
        for _ in 0..32 {
            let dict = current?;
            if let Ok(value) = dict.get(key) {
                return self.resolve(value);
            }
            current = dict
                .get(b"Parent")
                .ok()
                .and_then(|p| self.resolve_dict(p));
        }
        None
    }

    fn font_is_bold(&self, font: &Dictionary) -> bool {
        let Some(descriptor) = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| self.resolve_dict(d))
        else {
            return false;
        };

        let flags = descriptor
            .get(b"Flags")
            .ok()
            .and_then(|f| f.as_i64().ok())
            .unwrap_or(0);
        // Bit 19: ForceBold
        if flags & (1 << 18) != 0 {
            return true;
        }

        descriptor
            .get(b"FontWeight")
            .ok()
            .and_then(|w| w.as_float().ok())
            .map(|w| w >= 600.0)
            .unwrap_or(false)
    }
}

/// Font encodings of one page, keyed by font resource name.
pub struct LopdfPageDecoder<'a> {
    encodings: BTreeMap<Vec<u8>, Encoding<'a>>,
}

impl PageDecoder for LopdfPageDecoder<'_> {
    fn decode(&self, font_name: &[u8], bytes: &[u8]) -> String {
        self.encodings
            .get(font_name)
            .and_then(|enc| LopdfDocument::decode_text(enc, bytes).ok())
            .unwrap_or_else(|| decode_text_simple(bytes))
    }
}

impl PdfBackend for LopdfBackend {
    type Decoder<'a> = LopdfPageDecoder<'a>;

    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_size(&self, page: PageId) -> (f32, f32) {
        let media_box = self
            .inherited(page, b"MediaBox")
            .and_then(|o| o.as_array().ok());

        if let Some(array) = media_box {
            let coords: Vec<f32> = array
                .iter()
                .filter_map(|o| self.resolve(o).and_then(|o| o.as_float().ok()))
                .collect();
            if coords.len() >= 4 {
                let width = (coords[2] - coords[0]).abs();
                let height = (coords[3] - coords[1]).abs();
                if width > 0.0 && height > 0.0 {
                    return (width, height);
                }
            }
        }

        DEFAULT_PAGE_SIZE
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut result = Vec::with_capacity(lopdf_fonts.len());
        for (name, font_dict) in &lopdf_fonts {
            let base_font = font_dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            result.push(BackendFontInfo {
                name: name.clone(),
                base_font,
                descriptor_bold: self.font_is_bold(font_dict),
            });
        }
        Ok(result)
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without /Contents is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        match self.resolve(contents) {
            Some(Object::Stream(s)) => Ok(s
                .decompressed_content()
                .unwrap_or_else(|_| s.content.clone())),
            Some(Object::Array(arr)) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Some(Object::Stream(s)) = self.resolve(obj) {
                        match s.decompressed_content() {
                            Ok(data) => content.extend_from_slice(&data),
                            Err(_) => content.extend_from_slice(&s.content),
                        }
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn page_decoder(&self, page: PageId) -> LopdfPageDecoder<'_> {
        let encodings = match self.doc.get_page_fonts(page) {
            Ok(fonts) => fonts
                .into_iter()
                .filter_map(|(name, font)| {
                    font.get_font_encoding(&self.doc)
                        .ok()
                        .map(|enc| (name, enc))
                })
                .collect(),
            Err(_) => BTreeMap::new(),
        };
        LopdfPageDecoder { encodings }
    }

    fn has_form_fields(&self) -> bool {
        let Ok(catalog) = self.doc.catalog() else {
            return false;
        };
        catalog
            .get(b"AcroForm")
            .ok()
            .and_then(|f| self.resolve_dict(f))
            .and_then(|form| form.get(b"Fields").ok())
            .and_then(|fields| self.resolve(fields))
            .and_then(|fields| fields.as_array().ok())
            .map(|fields| !fields.is_empty())
            .unwrap_or(false)
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}
