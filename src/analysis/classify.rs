//! Heading classification.
//!
//! Each line gets an additive score from typographic signals (size over body,
//! weight, numbering, capitalization, alignment). Lines at or above the
//! acceptance threshold that survive the negative filters become heading
//! candidates.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::model::MergedLine;

use super::config::HeadingConfig;
use super::numbering::{Numbering, NumberingDetector};
use super::stats::LayoutProfile;
use super::title::TitleSelection;

/// A line accepted as a heading.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    pub line: MergedLine,
    pub score: f32,
    pub numbering: Option<Numbering>,
    /// Level suggested before tiering; unset by the classifier
    pub level_hint: Option<u8>,
}

/// Why a line is not a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// No size hierarchy in the document
    Degenerate,
    /// Part of the title
    Title,
    /// Inside a running header or footer band
    FooterBand,
    /// Too short or too long
    Length,
    /// Only digits
    Digits,
    /// A serial without text, e.g. "(a)"
    BareSerial,
    /// Sentence punctuation at the end of an unnumbered line
    TrailingPunctuation,
    /// Mostly a calendar date
    Date,
    /// Score below the acceptance threshold
    LowScore,
    /// Same text already accepted on this page
    Duplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::Degenerate => "degenerate",
            Rejection::Title => "title",
            Rejection::FooterBand => "footer band",
            Rejection::Length => "length",
            Rejection::Digits => "digits",
            Rejection::BareSerial => "bare serial",
            Rejection::TrailingPunctuation => "trailing punctuation",
            Rejection::Date => "date",
            Rejection::LowScore => "low score",
            Rejection::Duplicate => "duplicate",
        };
        write!(f, "{}", s)
    }
}

/// Score and verdict of one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLine {
    /// Index of the line in the classified slice
    pub index: usize,
    pub score: f32,
    pub numbering: Option<Numbering>,
    /// `None` when the line was accepted
    pub rejection: Option<Rejection>,
}

impl ScoredLine {
    pub fn accepted(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Scored heading classifier.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    config: HeadingConfig,
    numbering: NumberingDetector,
    dates: DateDetector,
}

impl HeadingClassifier {
    pub fn new(config: HeadingConfig) -> Self {
        Self::with_numbering(config, NumberingDetector::new())
    }

    /// Use a custom numbering rule list.
    pub fn with_numbering(config: HeadingConfig, numbering: NumberingDetector) -> Self {
        Self {
            config,
            numbering,
            dates: DateDetector::new(),
        }
    }

    /// Heading candidates among `lines`, in input order.
    pub fn classify(
        &self,
        lines: &[MergedLine],
        profile: &LayoutProfile,
        title: &TitleSelection,
    ) -> Vec<HeadingCandidate> {
        let candidates: Vec<HeadingCandidate> = self
            .score_all(lines, profile, title)
            .into_iter()
            .filter(|s| s.accepted())
            .map(|s| HeadingCandidate {
                line: lines[s.index].clone(),
                score: s.score,
                numbering: s.numbering,
                level_hint: None,
            })
            .collect();

        log::debug!(
            "Classifier: {} of {} lines accepted as headings",
            candidates.len(),
            lines.len()
        );
        candidates
    }

    /// Score every line and record the verdict.
    pub fn score_all(
        &self,
        lines: &[MergedLine],
        profile: &LayoutProfile,
        title: &TitleSelection,
    ) -> Vec<ScoredLine> {
        let mut seen: BTreeSet<(String, u32)> = BTreeSet::new();

        lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let numbering = self.numbering.detect(&line.text);
                let score = self.score(line, profile, numbering.is_some());
                let mut rejection = if title.consumes(index) {
                    Some(Rejection::Title)
                } else {
                    self.reject(line, profile, numbering.as_ref(), score)
                };

                if rejection.is_none() && !seen.insert((line.text.clone(), line.page)) {
                    rejection = Some(Rejection::Duplicate);
                }

                ScoredLine {
                    index,
                    score,
                    numbering,
                    rejection,
                }
            })
            .collect()
    }

    /// Additive heading score of a line.
    pub fn score(&self, line: &MergedLine, profile: &LayoutProfile, numbered: bool) -> f32 {
        let c = &self.config;
        let ratio = profile.size_ratio(line.font_size);

        let mut score = if ratio <= 1.0 + c.body_ratio_epsilon {
            c.body_penalty
        } else {
            ((ratio - 1.0) * c.size_ratio_weight).min(c.size_bonus_cap)
        };

        if line.bold {
            score += c.bold_bonus;
        }
        if numbered {
            score += c.numbering_bonus;
        }

        let (upper_ratio, letters) = line.uppercase_stats();
        if letters >= c.min_uppercase_letters && upper_ratio >= c.uppercase_ratio {
            score += c.uppercase_bonus;
        }

        if line.centered {
            score += c.center_bonus;
        } else if profile
            .left_margin
            .is_some_and(|margin| (line.bbox.x0 - margin).abs() <= c.indent_tolerance)
        {
            score += c.indent_bonus;
        }

        score
    }

    fn reject(
        &self,
        line: &MergedLine,
        profile: &LayoutProfile,
        numbering: Option<&Numbering>,
        score: f32,
    ) -> Option<Rejection> {
        let text = line.text.trim();
        let length = text.chars().count();

        if profile.degenerate {
            Some(Rejection::Degenerate)
        } else if profile.in_footer_band(line) {
            Some(Rejection::FooterBand)
        } else if length < self.config.min_chars || length > self.config.max_chars {
            Some(Rejection::Length)
        } else if is_numeric(text) {
            Some(Rejection::Digits)
        } else if self.numbering.is_bare_serial(text) {
            Some(Rejection::BareSerial)
        } else if numbering.is_none() && text.ends_with(['.', ',', ';']) {
            Some(Rejection::TrailingPunctuation)
        } else if self.dates.coverage(text) >= self.config.date_coverage {
            Some(Rejection::Date)
        } else if score < self.config.acceptance_threshold {
            Some(Rejection::LowScore)
        } else {
            None
        }
    }
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new(HeadingConfig::default())
    }
}

/// Digits with at most number punctuation, e.g. "42" or "3.14".
fn is_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ',' | '-' | '/'))
}

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Finds calendar dates in month-name and numeric forms.
#[derive(Debug, Clone)]
struct DateDetector {
    month_day_year: Regex,
    day_month_year: Regex,
    month_year: Regex,
    iso: Regex,
    numeric: Regex,
}

impl DateDetector {
    fn new() -> Self {
        Self {
            month_day_year: Regex::new(&format!(
                r"(?i)\b(?P<m>{months})\.?\s+(?P<d>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<y>\d{{4}})\b",
                months = MONTHS
            ))
            .unwrap(),
            day_month_year: Regex::new(&format!(
                r"(?i)\b(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<m>{months})\.?,?\s+(?P<y>\d{{4}})\b",
                months = MONTHS
            ))
            .unwrap(),
            month_year: Regex::new(&format!(
                r"(?i)\b(?P<m>{months})\.?,?\s+(?P<y>\d{{4}})\b",
                months = MONTHS
            ))
            .unwrap(),
            iso: Regex::new(r"\b(?P<y>\d{4})-(?P<m>\d{1,2})-(?P<d>\d{1,2})\b").unwrap(),
            numeric: Regex::new(r"\b(?P<a>\d{1,2})[/.\-](?P<b>\d{1,2})[/.\-](?P<y>\d{4}|\d{2})\b")
                .unwrap(),
        }
    }

    /// Share of the non-space characters of `text` covered by valid dates.
    fn coverage(&self, text: &str) -> f32 {
        let total = text.chars().filter(|c| !c.is_whitespace()).count();
        if total == 0 {
            return 0.0;
        }

        let mut covered = vec![false; text.len()];
        let checks: [(&Regex, fn(&Captures) -> bool); 5] = [
            (&self.month_day_year, named_date_is_valid),
            (&self.day_month_year, named_date_is_valid),
            (&self.month_year, named_date_is_valid),
            (&self.iso, iso_date_is_valid),
            (&self.numeric, numeric_date_is_valid),
        ];
        for (re, valid) in checks {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(0).filter(|_| valid(&caps)) {
                    covered[m.start()..m.end()].iter_mut().for_each(|c| *c = true);
                }
            }
        }

        let date_chars = text
            .char_indices()
            .filter(|(i, c)| !c.is_whitespace() && covered[*i])
            .count();
        date_chars as f32 / total as f32
    }
}

fn named_date_is_valid(caps: &Captures) -> bool {
    let day = number(caps, "d").unwrap_or(1);
    match (month_number(caps), number(caps, "y")) {
        (Some(month), Some(year)) => is_valid_date(year as i32, month, day),
        _ => false,
    }
}

fn iso_date_is_valid(caps: &Captures) -> bool {
    match (number(caps, "y"), number(caps, "m"), number(caps, "d")) {
        (Some(y), Some(m), Some(d)) => is_valid_date(y as i32, m, d),
        _ => false,
    }
}

/// `a/b/y`, read month-first or day-first.
fn numeric_date_is_valid(caps: &Captures) -> bool {
    match (number(caps, "a"), number(caps, "b"), number(caps, "y")) {
        (Some(a), Some(b), Some(y)) => {
            let year = expand_year(y, caps.name("y").map_or(4, |m| m.as_str().len()));
            is_valid_date(year, a, b) || is_valid_date(year, b, a)
        }
        _ => false,
    }
}

fn number(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn month_number(caps: &Captures) -> Option<u32> {
    let name = caps.name("m")?.as_str().to_lowercase();
    let months = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    months
        .iter()
        .position(|m| name.starts_with(m))
        .map(|i| i as u32 + 1)
}

fn expand_year(year: u32, digits: usize) -> i32 {
    match (digits, year) {
        (2, y) if y < 70 => 2000 + y as i32,
        (2, y) => 1900 + y as i32,
        (_, y) => y as i32,
    }
}

fn is_valid_date(year: i32, month: u32, day: u32) -> bool {
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::config::LayoutConfig;
    use crate::model::{BBox, PageFrame};

    fn line(text: &str, page: u32, y0: f32, size: f32, bold: bool) -> MergedLine {
        MergedLine {
            text: text.to_string(),
            bbox: BBox::new(72.0, y0, 400.0, y0 + size),
            font_size: size,
            bold,
            page,
            centered: false,
            frame: PageFrame::default(),
        }
    }

    fn body(y0: f32, page: u32) -> MergedLine {
        line(
            "Regular body text set in the document's running size, long enough to dominate.",
            page,
            y0,
            11.0,
            false,
        )
    }

    fn classify(lines: &[MergedLine]) -> Vec<String> {
        let profile = LayoutProfile::compute(lines, 1, &LayoutConfig::default());
        HeadingClassifier::default()
            .classify(lines, &profile, &TitleSelection::default())
            .into_iter()
            .map(|c| c.line.text)
            .collect()
    }

    #[test]
    fn test_large_and_numbered_lines_are_headings() {
        let lines = vec![
            line("1. Introduction", 1, 100.0, 16.0, false),
            body(130.0, 1),
            line("1.1 Background", 1, 160.0, 13.0, false),
            body(190.0, 1),
            line("Plain Subheading", 1, 220.0, 15.0, false),
            body(250.0, 1),
        ];
        assert_eq!(
            classify(&lines),
            vec!["1. Introduction", "1.1 Background", "Plain Subheading"]
        );
    }

    #[test]
    fn test_body_text_is_rejected_even_when_bold() {
        let lines = vec![
            line("Bold body sentence", 1, 100.0, 11.0, true),
            body(130.0, 1),
            line("Big Heading", 1, 200.0, 18.0, false),
        ];
        assert_eq!(classify(&lines), vec!["Big Heading"]);
    }

    #[test]
    fn test_date_line_is_rejected() {
        let lines = vec![
            line("Published on March 3, 2024", 1, 100.0, 16.0, true),
            line("Revised 2024-02-30 draft", 1, 130.0, 16.0, true),
            body(160.0, 1),
        ];
        let profile = LayoutProfile::compute(&lines, 1, &LayoutConfig::default());
        let scored =
            HeadingClassifier::default().score_all(&lines, &profile, &TitleSelection::default());

        assert_eq!(scored[0].rejection, Some(Rejection::Date));
        // February 30th is not a date.
        assert!(scored[1].accepted());
    }

    #[test]
    fn test_negative_filters() {
        let lines = vec![
            line("2024", 1, 100.0, 18.0, true),
            line("(a)", 1, 130.0, 18.0, true),
            line("This ends like a sentence.", 1, 160.0, 18.0, true),
            line(&"Long ".repeat(30), 1, 190.0, 18.0, true),
            line("Results", 1, 220.0, 18.0, true),
            line("Results", 1, 250.0, 18.0, true),
            body(280.0, 1),
            body(300.0, 1),
            body(320.0, 1),
        ];
        let profile = LayoutProfile::compute(&lines, 1, &LayoutConfig::default());
        let rejections: Vec<Option<Rejection>> = HeadingClassifier::default()
            .score_all(&lines, &profile, &TitleSelection::default())
            .into_iter()
            .map(|s| s.rejection)
            .collect();

        assert_eq!(
            rejections,
            vec![
                Some(Rejection::Digits),
                Some(Rejection::BareSerial),
                Some(Rejection::TrailingPunctuation),
                Some(Rejection::Length),
                None,
                Some(Rejection::Duplicate),
                Some(Rejection::TrailingPunctuation),
                Some(Rejection::TrailingPunctuation),
                Some(Rejection::TrailingPunctuation),
            ]
        );
    }

    #[test]
    fn test_title_lines_are_skipped() {
        let lines = vec![line("Big Heading", 1, 100.0, 18.0, false), body(130.0, 1)];
        let profile = LayoutProfile::compute(&lines, 1, &LayoutConfig::default());
        let title = TitleSelection {
            text: "Big Heading".into(),
            lines: vec![0],
            score: 5.0,
        };
        assert!(HeadingClassifier::default()
            .classify(&lines, &profile, &title)
            .is_empty());
    }

    #[test]
    fn test_degenerate_document_has_no_headings() {
        let lines = vec![
            line("1. Introduction", 1, 100.0, 11.0, true),
            body(130.0, 1),
        ];
        assert!(classify(&lines).is_empty());
    }

    #[test]
    fn test_uppercase_bonus() {
        let lines = vec![line("SUMMARY", 1, 100.0, 12.0, false), body(130.0, 1)];
        let profile = LayoutProfile::compute(&lines, 1, &LayoutConfig::default());
        let classifier = HeadingClassifier::default();
        let upper = classifier.score(&lines[0], &profile, false);
        let lower = classifier.score(&line("Summary", 1, 100.0, 12.0, false), &profile, false);
        assert!((upper - lower - HeadingConfig::default().uppercase_bonus).abs() < 1e-5);
    }

    #[test]
    fn test_date_coverage() {
        let dates = DateDetector::new();
        assert!(dates.coverage("March 3, 2024") > 0.99);
        assert!(dates.coverage("3rd of March 2024") > 0.9);
        assert!(dates.coverage("Report 12/31/2023") > 0.4);
        assert!(dates.coverage("Budget for March") < 0.01);
        assert!(dates.coverage("Section 13/14/2023") < 0.01);
    }
}
