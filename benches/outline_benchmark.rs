//! Benchmarks for outline extraction.
//!
//! Run with: cargo bench
//!
//! Documents are synthetic: a title page followed by chapters with numbered
//! headings and body text.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdf_outline::{BBox, MemoryTextSource, OutlineExtractor, PageText, TextSpan};

const BODY: &str = "Benchmark body text set in the running size of the document.";

/// Content stream of one synthetic page.
fn page_operations(number: usize) -> String {
    let mut ops = String::new();
    if number == 1 {
        ops.push_str("BT /F1 28 Tf 200 700 Td (Benchmark Report) Tj ET\n");
    } else {
        ops.push_str(&format!(
            "BT /F1 16 Tf 72 720 Td ({}. Chapter {}) Tj ET\n",
            number - 1,
            number - 1
        ));
        ops.push_str(&format!(
            "BT /F1 13 Tf 72 690 Td ({}.1 Section) Tj ET\n",
            number - 1
        ));
    }
    for line in 0..30 {
        ops.push_str(&format!("BT /F1 11 Tf 72 {} Td ({}) Tj ET\n", 650 - line * 14, BODY));
    }
    ops
}

/// Creates a synthetic PDF with the given number of pages.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut content = String::new();
    let mut offsets = Vec::new();

    content.push_str("%PDF-1.4\n");

    let mut object = |content: &mut String, body: String| {
        offsets.push(content.len());
        content.push_str(&format!("{} 0 obj\n{}\nendobj\n", offsets.len(), body));
    };

    // 1: catalog, 2: pages, 3: font, then page/content pairs
    object(&mut content, "<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 4 + i * 2)).collect();
    object(
        &mut content,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        ),
    );
    object(
        &mut content,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    );

    for i in 0..page_count {
        object(
            &mut content,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + i * 2
            ),
        );
        let ops = page_operations(i + 1);
        object(
            &mut content,
            format!("<< /Length {} >>\nstream\n{}\nendstream", ops.len(), ops),
        );
    }

    let xref_offset = content.len();
    content.push_str(&format!("xref\n0 {}\n", offsets.len() + 1));
    content.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        content.push_str(&format!("{:010} 00000 n \n", offset));
    }
    content.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_offset
    ));

    content.into_bytes()
}

/// The same document as already decoded spans.
fn create_memory_source(page_count: usize) -> MemoryTextSource {
    let span = |text: String, y0: f32, size: f32| {
        let width = text.chars().count() as f32 * size * 0.5;
        TextSpan::new(text, BBox::new(72.0, y0, 72.0 + width, y0 + size), size, "Helvetica", 1)
    };

    let pages = (1..=page_count)
        .map(|number| {
            let mut page = PageText::letter(number as u32);
            if number == 1 {
                page.push(span("Benchmark Report".to_string(), 70.0, 28.0));
            } else {
                page.push(span(format!("{}. Chapter {}", number - 1, number - 1), 50.0, 16.0));
                page.push(span(format!("{}.1 Section", number - 1), 90.0, 13.0));
            }
            for line in 0..30 {
                page.push(span(BODY.to_string(), 130.0 + line as f32 * 14.0, 11.0));
            }
            page
        })
        .collect();
    MemoryTextSource::new(pages)
}

/// Benchmark PDF header sniffing.
fn bench_format_detection(c: &mut Criterion) {
    let pdf_data = create_test_pdf(1);
    let non_pdf_data = b"Not a PDF file at all, just random text content";

    c.bench_function("sniff_valid_pdf", |b| {
        b.iter(|| pdf_outline::sniff_bytes(black_box(&pdf_data)).unwrap());
    });

    c.bench_function("sniff_non_pdf", |b| {
        b.iter(|| pdf_outline::sniff_bytes(black_box(non_pdf_data)).is_err());
    });
}

/// Benchmark the analysis stages alone, on pre-decoded pages.
fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    let extractor = OutlineExtractor::default();

    for page_count in [1, 10, 50].iter() {
        let source = create_memory_source(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| extractor.extract(black_box(&source)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark extraction from PDF bytes, content stream decoding included.
fn bench_pdf_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("pdf_extraction");

    for page_count in [1, 10, 50].iter() {
        let data = create_test_pdf(*page_count);

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| {
                let _ = pdf_outline::extract_outline_bytes(black_box(&data));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_analysis,
    bench_pdf_extraction,
);
criterion_main!(benches);
