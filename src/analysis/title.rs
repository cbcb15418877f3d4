//! Title selection.
//!
//! The title is the most prominent text in the upper part of the first page:
//! large, preferably bold and centered, close to the top. Lines directly
//! above or below it in the same size are taken as title continuations.

use serde::Serialize;

use crate::model::MergedLine;
use crate::text::collapse_whitespace;

use super::config::TitleConfig;
use super::stats::LayoutProfile;

/// The chosen title and the lines it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TitleSelection {
    /// Cleaned title text; empty when nothing qualified
    pub text: String,
    /// Indices of the consumed lines in the slice given to the extractor
    pub lines: Vec<usize>,
    /// Score of the winning line
    pub score: f32,
}

impl TitleSelection {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the line at `index` is part of the title.
    pub fn consumes(&self, index: usize) -> bool {
        self.lines.contains(&index)
    }
}

/// Picks the document title from the first page.
#[derive(Debug, Clone, Default)]
pub struct TitleExtractor {
    config: TitleConfig,
}

impl TitleExtractor {
    pub fn new(config: TitleConfig) -> Self {
        Self { config }
    }

    /// Select the title among `lines` (document lines in reading order; only
    /// first-page lines are considered).
    pub fn extract(&self, lines: &[MergedLine], profile: &LayoutProfile) -> TitleSelection {
        if profile.degenerate {
            return TitleSelection::default();
        }

        let first_page: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.page == 1)
            .map(|(i, _)| i)
            .collect();

        let mut best: Option<(usize, f32)> = None;
        for (pos, &idx) in first_page.iter().enumerate() {
            if let Some(score) = self.score(&lines[idx], profile) {
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((pos, score));
                }
            }
        }

        let Some((winner, score)) = best else {
            log::debug!("Title: no candidate on the first page");
            return TitleSelection::default();
        };

        let (start, end) = self.expand(lines, &first_page, winner, profile);
        let consumed: Vec<usize> = first_page[start..=end].to_vec();
        let joined = consumed
            .iter()
            .map(|&i| lines[i].text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let text = clean_title(&joined);

        log::debug!(
            "Title: {:?} from {} line(s), score {:.2}",
            text,
            consumed.len(),
            score
        );

        TitleSelection {
            text,
            lines: consumed,
            score,
        }
    }

    /// Title score of a line, or `None` when it cannot be the title.
    fn score(&self, line: &MergedLine, profile: &LayoutProfile) -> Option<f32> {
        let region_height = self.config.region * line.frame.height;
        if region_height <= 0.0 || line.top() > region_height {
            return None;
        }
        if line.weight() < self.config.min_chars || profile.in_footer_band(line) {
            return None;
        }

        let ratio = profile.size_ratio(line.font_size);
        if ratio < self.config.min_size_ratio {
            return None;
        }

        let mut score = self.config.size_weight * ratio;
        if line.bold {
            score += self.config.bold_bonus;
        }
        if line.centered {
            score += self.config.center_bonus;
        }
        score += self.config.position_bonus * (1.0 - line.top().max(0.0) / region_height);
        Some(score)
    }

    /// Grow the title around `winner` (a position in `page`) to neighbours of
    /// the same size, returning the inclusive position range.
    fn expand(
        &self,
        lines: &[MergedLine],
        page: &[usize],
        winner: usize,
        profile: &LayoutProfile,
    ) -> (usize, usize) {
        let anchor = &lines[page[winner]];
        let continues = |upper: &MergedLine, lower: &MergedLine| {
            let gap = lower.top() - upper.bbox.y1;
            (lower.font_size - anchor.font_size).abs() <= self.config.size_tolerance
                && (upper.font_size - anchor.font_size).abs() <= self.config.size_tolerance
                && lower.top() > upper.top()
                && gap <= self.config.max_line_gap_ratio * anchor.font_size
                && !profile.in_footer_band(lower)
                && !profile.in_footer_band(upper)
        };

        let max_lines = self.config.max_lines.max(1);
        let (mut start, mut end) = (winner, winner);
        loop {
            let mut grew = false;
            if end - start + 1 < max_lines
                && start > 0
                && continues(&lines[page[start - 1]], &lines[page[start]])
            {
                start -= 1;
                grew = true;
            }
            if end - start + 1 < max_lines
                && end + 1 < page.len()
                && continues(&lines[page[end]], &lines[page[end + 1]])
            {
                end += 1;
                grew = true;
            }
            if !grew {
                break;
            }
        }
        (start, end)
    }
}

/// Collapse whitespace, drop a garbled repeated prefix and trailing punctuation.
pub fn clean_title(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let mut tokens: Vec<&str> = collapsed.split(' ').filter(|t| !t.is_empty()).collect();

    if tokens.len() >= MIN_GARBLED_TOKENS {
        if let Some(k) = garbled_prefix(&tokens) {
            tokens.drain(..k);
        }
    }

    tokens
        .join(" ")
        .trim_end_matches(|c: char| {
            c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '-' | '|' | '/' | '–' | '—')
        })
        .to_string()
}

const MIN_GARBLED_TOKENS: usize = 4;
const MIN_GARBLED_COPIES: usize = 3;

/// Number of leading tokens to drop when the start of a title was drawn over
/// and over ("RFP: R RFP: R RFP: Request ..."). A unit only counts as garbled
/// when it occurs at least three times in a row; the last copy may be a
/// truncated form of the real text and is kept.
fn garbled_prefix(tokens: &[&str]) -> Option<usize> {
    (1..=tokens.len() / MIN_GARBLED_COPIES).find_map(|k| {
        let unit = &tokens[..k];
        let exact = tokens
            .chunks_exact(k)
            .take_while(|chunk| *chunk == unit)
            .count();

        let next = tokens.get(exact * k..(exact + 1) * k);
        let truncated = k >= 2
            && next.is_some_and(|next| {
                next[..k - 1] == unit[..k - 1]
                    && unit[k - 1].len() < next[k - 1].len()
                    && next[k - 1].starts_with(unit[k - 1])
            });

        if exact + usize::from(truncated) < MIN_GARBLED_COPIES {
            return None;
        }
        // Keep one copy: the truncated one if present, else the last exact one.
        let drop = if truncated { exact * k } else { (exact - 1) * k };
        (drop > 0 && drop < tokens.len()).then_some(drop)
    })
}
