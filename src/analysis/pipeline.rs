//! The outline extraction pipeline.
//!
//! ```text
//! PageTextSource -> merge_lines -> LayoutProfile -> TitleExtractor
//!                                               \-> HeadingClassifier -> LevelAssigner -> Outline
//! ```

use crate::error::Result;
use crate::model::{MergedLine, Outline};
use crate::parser::{ErrorMode, PageTextSource, ParseOptions};

use super::classify::{HeadingCandidate, HeadingClassifier, ScoredLine};
use super::config::OutlineConfig;
use super::levels::LevelAssigner;
use super::merge::merge_lines;
use super::numbering::NumberingDetector;
use super::stats::LayoutProfile;
use super::title::{TitleExtractor, TitleSelection};

/// Everything the pipeline computed for one document.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Merged lines of all pages, in reading order
    pub lines: Vec<MergedLine>,
    pub profile: LayoutProfile,
    pub title: TitleSelection,
    /// Score and verdict of every line, parallel to `lines`
    pub scored: Vec<ScoredLine>,
    pub outline: Outline,
    /// Pages skipped because their text could not be read
    pub skipped_pages: Vec<u32>,
    /// Whether the document was treated as a form
    pub form: bool,
}

/// Extracts outlines with a fixed configuration.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::{OutlineExtractor, PdfTextSource};
///
/// let source = PdfTextSource::open("report.pdf")?;
/// let outline = OutlineExtractor::default().extract(&source)?;
/// println!("{}", outline.title);
/// # Ok::<(), pdf_outline::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct OutlineExtractor {
    config: OutlineConfig,
    options: ParseOptions,
    numbering: NumberingDetector,
}

impl OutlineExtractor {
    pub fn new(config: OutlineConfig) -> Self {
        Self {
            config,
            options: ParseOptions::default(),
            numbering: NumberingDetector::new(),
        }
    }

    /// Set page reading options.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the numbering rules.
    pub fn with_numbering(mut self, numbering: NumberingDetector) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Extract the outline of a document.
    pub fn extract<S: PageTextSource + ?Sized>(&self, source: &S) -> Result<Outline> {
        self.analyze(source).map(|analysis| analysis.outline)
    }

    /// Run the pipeline and keep the intermediate results.
    pub fn analyze<S: PageTextSource + ?Sized>(&self, source: &S) -> Result<Analysis> {
        let page_count = self.options.page_limit(source.page_count());

        let mut lines = Vec::new();
        let mut skipped_pages = Vec::new();
        for number in 1..=page_count {
            match source.page_text(number) {
                Ok(page) => lines.extend(merge_lines(&page, &self.config.merge)),
                Err(e) => match self.options.error_mode {
                    ErrorMode::Strict => return Err(e),
                    ErrorMode::Lenient => {
                        log::warn!("Skipping page {}: {}", number, e);
                        skipped_pages.push(number);
                    }
                },
            }
        }

        // Repetition thresholds count only the pages that were read.
        let readable_pages = page_count - skipped_pages.len() as u32;
        let profile = LayoutProfile::compute(&lines, readable_pages, &self.config.layout);
        let title = TitleExtractor::new(self.config.title.clone()).extract(&lines, &profile);

        let classifier =
            HeadingClassifier::with_numbering(self.config.heading.clone(), self.numbering.clone());
        let scored = classifier.score_all(&lines, &profile, &title);

        let form = self.config.forms_title_only && source.is_form();
        let outline = if form {
            log::info!("Form document: emitting the title only");
            Outline::title_only(title.text.clone())
        } else {
            let candidates: Vec<HeadingCandidate> = scored
                .iter()
                .filter(|s| s.accepted())
                .map(|s| HeadingCandidate {
                    line: lines[s.index].clone(),
                    score: s.score,
                    numbering: s.numbering.clone(),
                    level_hint: None,
                })
                .collect();
            let entries = LevelAssigner::new(self.config.levels.clone()).assign(candidates, &title.text);
            Outline::build(title.text.clone(), entries)?
        };

        log::info!(
            "Outline: {} page(s), {} line(s), title {:?}, {} heading(s)",
            page_count,
            lines.len(),
            outline.title,
            outline.entries.len()
        );

        Ok(Analysis {
            lines,
            profile,
            title,
            scored,
            outline,
            skipped_pages,
            form,
        })
    }
}

impl Default for OutlineExtractor {
    fn default() -> Self {
        Self::new(OutlineConfig::default())
    }
}
