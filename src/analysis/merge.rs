//! Span-to-line merging.
//!
//! Spans that share a visual line are joined left to right into a
//! [`MergedLine`]; spans separated by a wide horizontal gap (a column gutter)
//! stay apart. Words broken with a hyphen at a line end are re-joined.

use crate::model::{BBox, MergedLine, PageFrame, PageText, TextSpan};
use crate::text::{is_spaceless_script_char, normalize_line_text};

use super::config::MergeConfig;

/// Merge the spans of one page into lines, in reading order.
pub fn merge_lines(page: &PageText, config: &MergeConfig) -> Vec<MergedLine> {
    let frame = PageFrame::new(page.width, page.height);

    let mut spans: Vec<&TextSpan> = page
        .spans
        .iter()
        .filter(|s| !s.text.trim().is_empty() && s.font_size > 0.0)
        .collect();
    spans.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut open: Vec<LineBuilder> = Vec::new();
    for span in spans {
        match find_line(&open, span, config) {
            Some(idx) => open[idx].push(span),
            None => open.push(LineBuilder::new(span)),
        }
    }

    let mut lines: Vec<MergedLine> = open
        .into_iter()
        .filter_map(|builder| builder.build(page.number, frame, config))
        .collect();
    lines.sort_by(|a, b| a.reading_order(b));

    let before = lines.len();
    let lines = join_hyphenated(lines, config);
    log::debug!(
        "Page {}: {} spans -> {} lines ({} hyphen joins)",
        page.number,
        page.spans.len(),
        lines.len(),
        before - lines.len()
    );
    lines
}

/// Pick the open line a span continues, preferring the smallest gap.
fn find_line(open: &[LineBuilder], span: &TextSpan, config: &MergeConfig) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (idx, line) in open.iter().enumerate() {
        let min_height = line.bbox.height().min(span.bbox.height());
        if min_height <= 0.0 {
            continue;
        }
        let overlap = line.bbox.vertical_overlap(&span.bbox) / min_height;
        if overlap <= config.min_vertical_overlap {
            continue;
        }
        if line.overprints(span) {
            return Some(idx);
        }

        let em = line.size.max(span.font_size);
        let gap = horizontal_gap(&line.bbox, &span.bbox);
        if gap > config.max_gap_ratio * em || gap < -config.max_overlap_ratio * em {
            continue;
        }

        if best.map_or(true, |(_, g)| gap.abs() < g) {
            best = Some((idx, gap.abs()));
        }
    }

    best.map(|(idx, _)| idx)
}

/// Horizontal distance between two boxes; negative when they overlap.
fn horizontal_gap(a: &BBox, b: &BBox) -> f32 {
    if b.x0 >= a.x1 {
        b.x0 - a.x1
    } else if b.x1 <= a.x0 {
        a.x0 - b.x1
    } else {
        -(a.x1.min(b.x1) - a.x0.max(b.x0))
    }
}

struct LineBuilder<'a> {
    spans: Vec<&'a TextSpan>,
    bbox: BBox,
    size: f32,
}

impl<'a> LineBuilder<'a> {
    fn new(span: &'a TextSpan) -> Self {
        Self {
            spans: vec![span],
            bbox: span.bbox,
            size: span.font_size,
        }
    }

    /// Same text drawn again at (nearly) the same spot, a common faux-bold trick.
    fn overprints(&self, span: &TextSpan) -> bool {
        self.spans
            .iter()
            .any(|s| s.text == span.text && (s.bbox.x0 - span.bbox.x0).abs() < 1.0)
    }

    fn push(&mut self, span: &'a TextSpan) {
        if self.overprints(span) {
            return;
        }
        self.bbox = self.bbox.union(&span.bbox);
        self.size = self.size.max(span.font_size);
        self.spans.push(span);
    }

    fn build(mut self, page: u32, frame: PageFrame, config: &MergeConfig) -> Option<MergedLine> {
        self.spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

        let text = normalize_line_text(&assemble_text(&self.spans, config));
        if text.is_empty() {
            return None;
        }

        let (font_size, bold) = dominant_style(&self.spans);
        let centered = is_centered(&self.bbox, frame, config);

        Some(MergedLine {
            text,
            bbox: self.bbox,
            font_size,
            bold,
            page,
            centered,
            frame,
        })
    }
}

/// Concatenate spans, inserting spaces at visible gaps.
///
/// No space is inserted between two spaceless-script (CJK) characters.
fn assemble_text(spans: &[&TextSpan], config: &MergeConfig) -> String {
    let mut result = String::new();

    for (i, span) in spans.iter().enumerate() {
        if i > 0 {
            let prev = spans[i - 1];
            let gap = span.bbox.x0 - prev.bbox.x1;

            let char_count = span.text.chars().count();
            let avg_char_width = if char_count > 0 && span.bbox.width() > 0.0 {
                span.bbox.width() / char_count as f32
            } else {
                span.font_size * 0.5
            };

            let both_spaceless = prev.text.chars().last().is_some_and(is_spaceless_script_char)
                && span.text.chars().next().is_some_and(is_spaceless_script_char);
            let already_spaced = result.ends_with(char::is_whitespace)
                || span.text.starts_with(char::is_whitespace);

            if gap > avg_char_width * config.space_gap_ratio && !both_spaceless && !already_spaced
            {
                result.push(' ');
            }
        }
        result.push_str(&span.text);
    }

    result
}

/// The (size, bold) style carrying the most characters; ties go to the first seen.
fn dominant_style(spans: &[&TextSpan]) -> (f32, bool) {
    let mut styles: Vec<(f32, bool, usize)> = Vec::new();
    for span in spans {
        let weight = span.weight();
        match styles
            .iter_mut()
            .find(|(size, bold, _)| (*size - span.font_size).abs() < 0.05 && *bold == span.bold)
        {
            Some(style) => style.2 += weight,
            None => styles.push((span.font_size, span.bold, weight)),
        }
    }

    let mut best = styles[0];
    for style in &styles[1..] {
        if style.2 > best.2 {
            best = *style;
        }
    }
    (best.0, best.1)
}

fn is_centered(bbox: &BBox, frame: PageFrame, config: &MergeConfig) -> bool {
    if frame.width <= 0.0 {
        return false;
    }
    (bbox.center_x() - frame.width / 2.0).abs() <= config.center_tolerance * frame.width
}

/// Join lines that end in `letter-` with the following line of the same flow
/// when it starts lowercase.
fn join_hyphenated(lines: Vec<MergedLine>, config: &MergeConfig) -> Vec<MergedLine> {
    let mut lines: Vec<Option<MergedLine>> = lines.into_iter().map(Some).collect();

    for i in 0..lines.len() {
        loop {
            let Some(current) = lines[i].as_ref() else {
                break;
            };
            if !ends_with_word_hyphen(&current.text) {
                break;
            }

            let max_gap = config.hyphen_max_line_gap * current.font_size;
            let mut target = None;
            for (j, slot) in lines.iter().enumerate().skip(i + 1) {
                let Some(next) = slot else { continue };
                let gap = next.bbox.y0 - current.bbox.y1;
                if next.page != current.page || gap > max_gap {
                    break;
                }
                if next.bbox.y0 <= current.bbox.y0 {
                    continue;
                }
                if (next.bbox.x0 - current.bbox.x0).abs() <= config.hyphen_max_indent_delta
                    && (next.font_size - current.font_size).abs() <= config.hyphen_size_tolerance
                {
                    if next.text.chars().next().is_some_and(char::is_lowercase) {
                        target = Some(j);
                    }
                    break;
                }
            }

            let Some(j) = target else { break };
            let Some(next) = lines[j].take() else { break };
            if let Some(current) = lines[i].as_mut() {
                current.text.pop();
                current.text.push_str(&next.text);
                current.bbox = current.bbox.union(&next.bbox);
            }
        }
    }

    lines.into_iter().flatten().collect()
}

fn ends_with_word_hyphen(text: &str) -> bool {
    let mut chars = text.chars().rev();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_alphabetic)
}
