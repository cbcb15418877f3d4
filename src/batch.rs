//! Directory batch processing.
//!
//! Every `*.pdf` in a directory is processed independently on a rayon pool;
//! each produces a `name.json` next to the others in the output directory. A
//! document that cannot be read is reported and skipped, never fatal to the
//! batch.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rayon::prelude::*;

use crate::analysis::OutlineExtractor;
use crate::detect::sniff_path;
use crate::error::{Error, Result};
use crate::parser::PdfTextSource;
use crate::render::{to_json, JsonFormat};

/// Batch settings.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory receiving the `.json` files
    pub output_dir: PathBuf,

    /// Worker threads (0 = one per core)
    pub jobs: usize,

    /// JSON layout of the written files
    pub json_format: JsonFormat,
}

impl BatchOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            jobs: 0,
            json_format: JsonFormat::Pretty,
        }
    }

    /// Set the number of worker threads.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }
}

/// Outcome of one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentStatus {
    /// Outline written
    Written { title: String, headings: usize },
    /// Not a PDF
    Skipped(String),
    /// The PDF could not be processed
    Failed(String),
}

/// Report for one input file.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub input: PathBuf,
    /// Written JSON file, if any
    pub output: Option<PathBuf>,
    pub status: DocumentStatus,
    pub elapsed: Duration,
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// The batch found `total` files
    Started { total: usize },
    /// One file is done
    Finished(DocumentReport),
}

/// Result of a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub reports: Vec<DocumentReport>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&DocumentStatus) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.status)).count()
    }
}

/// PDF files directly inside `dir` (not recursive), sorted by path.
pub fn scan_pdfs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Process every PDF in `input_dir`.
///
/// Fails only when the directories cannot be used; per-document problems are
/// recorded in the summary.
pub fn run_batch<P: AsRef<Path>>(
    input_dir: P,
    options: &BatchOptions,
    extractor: &OutlineExtractor,
    events: Option<&Sender<BatchEvent>>,
) -> Result<BatchSummary> {
    let start = Instant::now();
    let input_dir = input_dir.as_ref();
    if !input_dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input directory not found: {}", input_dir.display()),
        )));
    }

    fs::create_dir_all(&options.output_dir)?;
    let files = scan_pdfs(input_dir)?;
    log::info!(
        "Batch: {} PDF file(s) in {}",
        files.len(),
        input_dir.display()
    );

    if let Some(tx) = events {
        let _ = tx.send(BatchEvent::Started { total: files.len() });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    let reports: Vec<DocumentReport> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let report = process_document(path, options, extractor);
                if let Some(tx) = events {
                    let _ = tx.send(BatchEvent::Finished(report.clone()));
                }
                report
            })
            .collect()
    });

    let summary = BatchSummary {
        reports,
        elapsed: start.elapsed(),
    };
    log::info!(
        "Batch done: {} written, {} skipped, {} failed in {:.2?}",
        summary.written(),
        summary.skipped(),
        summary.failed(),
        summary.elapsed
    );
    Ok(summary)
}

/// Extract one document and write its JSON file.
///
/// Never panics: a panic inside the PDF parser is reported as a failure of
/// this document only.
pub fn process_document(
    path: &Path,
    options: &BatchOptions,
    extractor: &OutlineExtractor,
) -> DocumentReport {
    let start = Instant::now();
    let outcome = catch_panic(|| write_outline(path, options, extractor));
    finish_report(path, start, outcome)
}

type WriteOutcome = Result<(PathBuf, String, usize)>;

fn finish_report(
    path: &Path,
    start: Instant,
    outcome: std::result::Result<WriteOutcome, String>,
) -> DocumentReport {
    let (output, status) = match outcome {
        Ok(Ok((output, title, headings))) => {
            (Some(output), DocumentStatus::Written { title, headings })
        }
        Ok(Err(Error::UnknownFormat)) => {
            log::warn!("Skipping {}: not a PDF file", path.display());
            (None, DocumentStatus::Skipped("not a PDF file".into()))
        }
        Ok(Err(e)) if e.is_decode_failure() => {
            log::warn!("Could not decode {}: {}", path.display(), e);
            (None, DocumentStatus::Failed(e.to_string()))
        }
        Ok(Err(e)) => {
            log::warn!("Failed {}: {}", path.display(), e);
            (None, DocumentStatus::Failed(e.to_string()))
        }
        Err(message) => {
            log::warn!("Parser panicked on {}: {}", path.display(), message);
            (None, DocumentStatus::Failed(format!("panicked: {}", message)))
        }
    };

    DocumentReport {
        input: path.to_path_buf(),
        output,
        status,
        elapsed: start.elapsed(),
    }
}

/// Run `work`, turning a panic into its message.
fn catch_panic<T>(work: impl FnOnce() -> T) -> std::result::Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}

fn write_outline(
    path: &Path,
    options: &BatchOptions,
    extractor: &OutlineExtractor,
) -> Result<(PathBuf, String, usize)> {
    sniff_path(path)?;
    let source = PdfTextSource::open(path)?;
    let outline = extractor.extract(&source)?;
    let json = to_json(&outline, options.json_format)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let output = options.output_dir.join(format!("{}.json", stem));
    fs::write(&output, json)?;

    log::debug!("Wrote {}", output.display());
    Ok((output, outline.title, outline.entries.len()))
}
