//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_outline::{BBox, MemoryTextSource, PageText, TextSpan};

pub const BODY_TEXT: &str = "Body text that runs across the page in the regular size.";

/// Span with an estimated width of half an em per character.
pub fn span(text: &str, x0: f32, y0: f32, size: f32) -> TextSpan {
    let width = text.chars().count() as f32 * size * 0.5;
    TextSpan::new(text, BBox::new(x0, y0, x0 + width, y0 + size), size, "Helvetica", 1)
}

/// Span centered horizontally on a letter page.
pub fn centered(text: &str, y0: f32, size: f32) -> TextSpan {
    let width = text.chars().count() as f32 * size * 0.5;
    span(text, (612.0 - width) / 2.0, y0, size)
}

/// Letter page with `count` body lines starting at `top`.
pub fn body_page(count: usize, top: f32) -> PageText {
    let mut page = PageText::letter(1);
    for i in 0..count {
        page.push(span(BODY_TEXT, 72.0, top + i as f32 * 14.0, 11.0));
    }
    page
}

/// The two page report used across the tests: a 28pt centered title on
/// page 1, a numbered H1 and H2 on page 2, 11pt body text everywhere.
pub fn report_source() -> MemoryTextSource {
    let mut first = body_page(12, 200.0);
    first.push(centered("Project Report", 80.0, 28.0));

    let mut second = body_page(12, 200.0);
    second.push(span("1. Introduction", 72.0, 72.0, 16.0));
    second.push(span("1.1 Background", 72.0, 110.0, 13.0));

    MemoryTextSource::new(vec![first, second])
}

/// One line of text drawn at a baseline position.
pub struct TextLine {
    pub text: &'static str,
    pub x: i64,
    pub baseline: i64,
    pub size: i64,
    pub bold: bool,
}

impl TextLine {
    pub fn regular(text: &'static str, x: i64, baseline: i64, size: i64) -> Self {
        Self {
            text,
            x,
            baseline,
            size,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Regular body lines every 14pt from `baseline` downwards.
pub fn body_lines(count: usize, baseline: i64) -> Vec<TextLine> {
    (0..count)
        .map(|i| TextLine::regular(BODY_TEXT, 72, baseline - i as i64 * 14, 11))
        .collect()
}

/// Build a letter-size PDF with one content stream per page.
///
/// `F1` is Helvetica and `F2` Helvetica-Bold. With `form` set the catalog
/// carries an AcroForm with a single text field.
pub fn build_pdf(pages: Vec<Vec<TextLine>>, form: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for line in lines {
            let font = if line.bold { "F2" } else { "F1" };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
            operations.push(Operation::new(
                "Td",
                vec![line.x.into(), line.baseline.into()],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.text)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if form {
        let field_id = doc.add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("applicant"),
        });
        catalog.set(
            "AcroForm",
            dictionary! {
                "Fields" => vec![Object::Reference(field_id)],
            },
        );
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

/// The report of [`report_source`] as a real PDF.
pub fn report_pdf() -> Vec<u8> {
    let mut first = vec![TextLine::regular("Project Report", 208, 700, 28)];
    first.extend(body_lines(12, 600));

    let mut second = vec![
        TextLine::regular("1. Introduction", 72, 700, 16),
        TextLine::regular("1.1 Background", 72, 660, 13),
    ];
    second.extend(body_lines(12, 600));

    build_pdf(vec![first, second], false)
}
