//! Page text sources.
//!
//! A [`PageTextSource`] yields, page by page, the positioned text spans the
//! outline pipeline works on. [`PdfTextSource`] interprets PDF content
//! streams through a [`PdfBackend`]; [`MemoryTextSource`] serves pages that
//! were decoded elsewhere (or built by hand in tests).

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::detect::{sniff_bytes, sniff_path};
use crate::error::{Error, Result};
use crate::model::{is_bold_font_name, BBox, PageText, TextSpan};
use crate::text::is_spaceless_script_char;

use super::backend::{
    get_number_from_value, ContentOp, LopdfBackend, PageDecoder, PageId, PdfBackend, PdfValue,
};

/// Average glyph advance as a fraction of the font size. Content streams do
/// not carry glyph widths, so span widths are estimated.
const AVG_GLYPH_WIDTH: f32 = 0.5;
/// Advance of a full-width (CJK) glyph.
const WIDE_GLYPH_WIDTH: f32 = 1.0;
/// Approximate ascender above the baseline, as a fraction of the font size.
const ASCENT: f32 = 0.8;
/// Approximate descender below the baseline.
const DESCENT: f32 = 0.2;
/// TJ adjustment (thousandths of an em) large enough to be a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Leading used by `T*` when the stream never set one with `TL`/`TD`.
const DEFAULT_LEADING_RATIO: f32 = 1.2;

/// Source of positioned text, one page at a time.
pub trait PageTextSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Positioned text of page `number` (1-indexed).
    fn page_text(&self, number: u32) -> Result<PageText>;

    /// Whether the document is an interactive form.
    fn is_form(&self) -> bool {
        false
    }
}

impl<S: PageTextSource + ?Sized> PageTextSource for &S {
    fn page_count(&self) -> u32 {
        (**self).page_count()
    }

    fn page_text(&self, number: u32) -> Result<PageText> {
        (**self).page_text(number)
    }

    fn is_form(&self) -> bool {
        (**self).is_form()
    }
}

/// Pages held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextSource {
    pages: Vec<PageText>,
    form: bool,
}

impl MemoryTextSource {
    /// Create a source from pages; pages are renumbered 1..=n in order.
    pub fn new(pages: Vec<PageText>) -> Self {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(i, mut page)| {
                let number = i as u32 + 1;
                page.number = number;
                for span in &mut page.spans {
                    span.page = number;
                }
                page
            })
            .collect();
        Self { pages, form: false }
    }

    /// Mark the document as an interactive form.
    pub fn as_form(mut self, form: bool) -> Self {
        self.form = form;
        self
    }

    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }
}

impl PageTextSource for MemoryTextSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, number: u32) -> Result<PageText> {
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .cloned()
            .ok_or(Error::PageOutOfRange(number, self.page_count()))
    }

    fn is_form(&self) -> bool {
        self.form
    }
}

/// Text source that interprets the content streams of a PDF.
pub struct PdfTextSource<B: PdfBackend = LopdfBackend> {
    backend: B,
    pages: BTreeMap<u32, PageId>,
}

impl PdfTextSource<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        sniff_path(path)?;
        Ok(Self::new(LopdfBackend::load_file(path)?))
    }

    /// Read a PDF from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        sniff_bytes(data)?;
        Ok(Self::new(LopdfBackend::load_bytes(data)?))
    }
}

impl<B: PdfBackend> PdfTextSource<B> {
    pub fn new(backend: B) -> Self {
        let pages = backend.pages();
        Self { backend, pages }
    }

    /// Access the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: PdfBackend> PageTextSource for PdfTextSource<B> {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, number: u32) -> Result<PageText> {
        let page_id = *self
            .pages
            .get(&number)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))?;

        let (width, height) = self.backend.page_size(page_id);

        let fonts: HashMap<Vec<u8>, FontStyle> = match self.backend.page_fonts(page_id) {
            Ok(fonts) => fonts
                .into_iter()
                .map(|f| {
                    let bold = f.descriptor_bold || is_bold_font_name(&f.base_font);
                    (
                        f.name,
                        FontStyle {
                            base_font: f.base_font,
                            bold,
                        },
                    )
                })
                .collect(),
            Err(e) => {
                log::debug!("Page {}: no font resources ({})", number, e);
                HashMap::new()
            }
        };

        let content = self.backend.page_content(page_id)?;
        let ops = self
            .backend
            .decode_content(&content)
            .map_err(|e| Error::TextExtract(format!("Page {}: {}", number, e)))?;

        let decoder = self.backend.page_decoder(page_id);
        let decode = |font: &[u8], bytes: &[u8]| decoder.decode(font, bytes);
        let spans = Interpreter::new(number, height, &fonts, decode).run(&ops);
        log::debug!("Page {}: {} spans from {} operations", number, spans.len(), ops.len());

        Ok(PageText {
            number,
            width,
            height,
            spans,
        })
    }

    fn is_form(&self) -> bool {
        self.backend.has_form_fields()
    }
}

/// Resolved style of a font resource.
#[derive(Debug, Clone)]
struct FontStyle {
    base_font: String,
    bold: bool,
}

/// Affine transform in PDF row-vector convention `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(op: &ContentOp) -> Option<Self> {
        Some(Matrix {
            a: op.number(0)?,
            b: op.number(1)?,
            c: op.number(2)?,
            d: op.number(3)?,
            e: op.number(4)?,
            f: op.number(5)?,
        })
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Graphics and text state tracked while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    saved: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font: Vec<u8>,
    font_size: f32,
    leading: Option<f32>,
    render_mode: i64,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            saved: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            leading: None,
            render_mode: 0,
            in_text: false,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self
            .leading
            .unwrap_or(self.font_size.abs() * DEFAULT_LEADING_RATIO);
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f32) {
        self.tm = Matrix::translation(tx, 0.0).multiply(&self.tm);
    }
}

/// Walks content stream operations and emits spans.
struct Interpreter<'a, D> {
    page: u32,
    page_height: f32,
    fonts: &'a HashMap<Vec<u8>, FontStyle>,
    decode: D,
    state: TextState,
    spans: Vec<TextSpan>,
}

impl<'a, D> Interpreter<'a, D>
where
    D: Fn(&[u8], &[u8]) -> String,
{
    fn new(
        page: u32,
        page_height: f32,
        fonts: &'a HashMap<Vec<u8>, FontStyle>,
        decode: D,
    ) -> Self {
        Self {
            page,
            page_height,
            fonts,
            decode,
            state: TextState::default(),
            spans: Vec::new(),
        }
    }

    fn run(mut self, ops: &[ContentOp]) -> Vec<TextSpan> {
        for op in ops {
            self.apply(op);
        }
        self.spans
    }

    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            "q" => self.state.saved.push(self.state.ctm),
            "Q" => {
                if let Some(ctm) = self.state.saved.pop() {
                    self.state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(op) {
                    self.state.ctm = m.multiply(&self.state.ctm);
                }
            }
            "BT" => {
                self.state.in_text = true;
                self.state.tm = Matrix::IDENTITY;
                self.state.tlm = Matrix::IDENTITY;
            }
            "ET" => self.state.in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.state.font = name.clone();
                }
                if let Some(size) = op.number(1) {
                    self.state.font_size = size;
                }
            }
            "TL" => self.state.leading = op.number(0),
            "Tr" => self.state.render_mode = op.number(0).map(|m| m as i64).unwrap_or(0),
            "Td" | "TD" => {
                let tx = op.number(0).unwrap_or(0.0);
                let ty = op.number(1).unwrap_or(0.0);
                if op.operator == "TD" {
                    self.state.leading = Some(-ty);
                }
                self.state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(op) {
                    self.state.tm = m;
                    self.state.tlm = m;
                }
            }
            "T*" => self.state.next_line(),
            "Tj" => self.show_string(op.operands.first()),
            "'" => {
                self.state.next_line();
                self.show_string(op.operands.first());
            }
            "\"" => {
                self.state.next_line();
                self.show_string(op.operands.get(2));
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show_array(items);
                }
            }
            _ => {}
        }
    }

    fn show_string(&mut self, operand: Option<&PdfValue>) {
        if let Some(PdfValue::Str(bytes)) = operand {
            let text = (self.decode)(&self.state.font, bytes);
            let advance = glyph_advance(&text, self.state.font_size.abs());
            self.show(text, advance);
        }
    }

    fn show_array(&mut self, items: &[PdfValue]) {
        let size = self.state.font_size.abs();
        let mut combined = String::new();
        let mut advance = 0.0;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let text = (self.decode)(&self.state.font, bytes);
                    advance += glyph_advance(&text, size);
                    combined.push_str(&text);
                }
                other => {
                    if let Some(adjustment) = get_number_from_value(other) {
                        // Negative adjustments move the pen to the right.
                        advance -= adjustment / 1000.0 * size;
                        if -adjustment > TJ_SPACE_THRESHOLD && wants_space(&combined) {
                            combined.push(' ');
                        }
                    }
                }
            }
        }

        self.show(combined, advance);
    }

    fn show(&mut self, text: String, advance: f32) {
        if self.state.in_text && !text.trim().is_empty() {
            let trm = self.state.tm.multiply(&self.state.ctm);
            let size = self.state.font_size.abs() * trm.vertical_scale();
            if size > 0.0 {
                let width = advance * trm.horizontal_scale();
                let x = trm.e;
                let baseline = trm.f;
                let top = self.page_height - (baseline + size * ASCENT);
                let bottom = self.page_height - (baseline - size * DESCENT);

                let style = self.fonts.get(&self.state.font);
                let font_name = style
                    .map(|s| s.base_font.clone())
                    .unwrap_or_else(|| String::from_utf8_lossy(&self.state.font).to_string());
                // Render mode 2 (fill + stroke) is the usual faux-bold trick.
                let bold = style.map(|s| s.bold).unwrap_or(false)
                    || is_bold_font_name(&font_name)
                    || self.state.render_mode == 2;

                self.spans.push(
                    TextSpan::new(
                        text,
                        BBox::new(x, top, x + width, bottom),
                        size,
                        font_name,
                        self.page,
                    )
                    .with_bold(bold),
                );
            }
        }
        self.state.advance(advance);
    }
}

/// Estimated advance of `text` in unscaled text space.
fn glyph_advance(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| {
            if is_spaceless_script_char(c) {
                WIDE_GLYPH_WIDTH
            } else {
                AVG_GLYPH_WIDTH
            }
        })
        .sum::<f32>()
        * font_size
}

fn wants_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && c != '\u{00A0}' && !is_spaceless_script_char(c),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::backend::decode_text_simple;
    use super::*;

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp::new(operator, operands)
    }

    fn name(s: &str) -> PdfValue {
        PdfValue::Name(s.as_bytes().to_vec())
    }

    fn string(s: &str) -> PdfValue {
        PdfValue::Str(s.as_bytes().to_vec())
    }

    fn int(i: i64) -> PdfValue {
        PdfValue::Integer(i)
    }

    fn fonts() -> HashMap<Vec<u8>, FontStyle> {
        let mut fonts = HashMap::new();
        fonts.insert(
            b"F1".to_vec(),
            FontStyle {
                base_font: "Helvetica".to_string(),
                bold: false,
            },
        );
        fonts.insert(
            b"F2".to_vec(),
            FontStyle {
                base_font: "Helvetica-Bold".to_string(),
                bold: true,
            },
        );
        fonts
    }

    fn run(ops: Vec<ContentOp>) -> Vec<TextSpan> {
        let fonts = fonts();
        Interpreter::new(1, 792.0, &fonts, |_: &[u8], b: &[u8]| decode_text_simple(b)).run(&ops)
    }

    #[test]
    fn test_tj_position_and_size() {
        let spans = run(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F2"), int(24)]),
            op("Td", vec![int(100), int(700)]),
            op("Tj", vec![string("Title")]),
            op("ET", vec![]),
        ]);

        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.text, "Title");
        assert_eq!(span.font_name, "Helvetica-Bold");
        assert!(span.bold);
        assert_eq!(span.font_size, 24.0);
        assert_eq!(span.bbox.x0, 100.0);
        // 5 glyphs * 0.5em * 24pt
        assert_eq!(span.bbox.x1, 160.0);
        // Baseline 700 from the bottom is 92 from the top.
        assert!((span.bbox.y0 - (92.0 - 24.0 * ASCENT)).abs() < 1e-3);
        assert!((span.bbox.y1 - (92.0 + 24.0 * DESCENT)).abs() < 1e-3);
    }

    #[test]
    fn test_consecutive_tj_advance_pen() {
        let spans = run(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(10)]),
            op("Td", vec![int(72), int(700)]),
            op("Tj", vec![string("Hello ")]),
            op("Tj", vec![string("world")]),
            op("ET", vec![]),
        ]);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].bbox.x0, 72.0 + 6.0 * 5.0);
        assert_eq!(spans[0].bbox.y0, spans[1].bbox.y0);
    }

    #[test]
    fn test_tj_array_inserts_word_spaces() {
        let spans = run(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(12)]),
            op(
                "TJ",
                vec![PdfValue::Array(vec![
                    string("Hello"),
                    int(-300),
                    string("World"),
                    int(-20),
                    string("!"),
                ])],
            ),
            op("ET", vec![]),
        ]);

        assert_eq!(spans[0].text, "Hello World!");
    }

    #[test]
    fn test_cm_scales_font_size() {
        let spans = run(vec![
            op("q", vec![]),
            op(
                "cm",
                vec![int(2), int(0), int(0), int(2), int(0), int(0)],
            ),
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(10)]),
            op("Td", vec![int(50), int(300)]),
            op("Tj", vec![string("Scaled")]),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(10)]),
            op("Tj", vec![string("Plain")]),
            op("ET", vec![]),
        ]);

        assert_eq!(spans[0].font_size, 20.0);
        assert_eq!(spans[0].bbox.x0, 100.0);
        assert_eq!(spans[1].font_size, 10.0);
    }

    #[test]
    fn test_next_line_uses_leading() {
        let spans = run(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(10)]),
            op("TL", vec![int(14)]),
            op("Td", vec![int(72), int(700)]),
            op("Tj", vec![string("first")]),
            op("T*", vec![]),
            op("Tj", vec![string("second")]),
            op("'", vec![string("third")]),
            op("ET", vec![]),
        ]);

        assert_eq!(spans.len(), 3);
        assert!((spans[1].bbox.y0 - spans[0].bbox.y0 - 14.0).abs() < 1e-3);
        assert!((spans[2].bbox.y0 - spans[1].bbox.y0 - 14.0).abs() < 1e-3);
        assert_eq!(spans[2].bbox.x0, 72.0);
    }

    #[test]
    fn test_text_outside_bt_is_ignored() {
        let spans = run(vec![op("Tj", vec![string("stray")])]);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_render_mode_two_is_bold() {
        let spans = run(vec![
            op("BT", vec![]),
            op("Tf", vec![name("F1"), int(12)]),
            op("Tr", vec![int(2)]),
            op("Tj", vec![string("Heavy")]),
            op("ET", vec![]),
        ]);
        assert!(spans[0].bold);
    }

    #[test]
    fn test_memory_source_renumbers_pages() {
        let mut page = PageText::letter(7);
        page.push(TextSpan::new("x", BBox::default(), 10.0, "Times", 7));
        let source = MemoryTextSource::new(vec![PageText::letter(3), page]);

        assert_eq!(source.page_count(), 2);
        let second = source.page_text(2).unwrap();
        assert_eq!(second.number, 2);
        assert_eq!(second.spans[0].page, 2);
        assert!(matches!(
            source.page_text(0),
            Err(Error::PageOutOfRange(0, 2))
        ));
        assert!(source.page_text(3).is_err());
        assert!(!source.is_form());
        assert!(source.clone().as_form(true).is_form());
    }
}
