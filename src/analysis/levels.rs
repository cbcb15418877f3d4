//! Heading level assignment.
//!
//! Font sizes of the accepted headings are grouped into tiers (largest = H1).
//! Numbering depth overrides the tier, and a final forward pass keeps
//! unnumbered headings from skipping levels.

use crate::model::{HeadingLevel, OutlineEntry};

use super::classify::HeadingCandidate;
use super::config::LevelConfig;

/// Maps heading candidates to outline entries.
#[derive(Debug, Clone, Default)]
pub struct LevelAssigner {
    config: LevelConfig,
}

impl LevelAssigner {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    /// Assign levels and return the entries in reading order.
    pub fn assign(&self, mut candidates: Vec<HeadingCandidate>, title: &str) -> Vec<OutlineEntry> {
        if candidates.is_empty() {
            return Vec::new();
        }

        candidates.sort_by(|a, b| a.line.reading_order(&b.line));

        let max_depth = self.config.max_depth.max(1);
        let tiers = self.size_tiers(&candidates);
        log::debug!("Levels: {} size tier(s) {:?}", tiers.len(), tiers);

        let mut levels: Vec<u8> = candidates
            .iter()
            .map(|c| {
                let level = match (&c.level_hint, &c.numbering) {
                    (Some(hint), _) => *hint,
                    (None, Some(numbering)) => numbering.depth,
                    (None, None) => nearest_tier(&tiers, c.line.font_size) as u8 + 1,
                };
                level.clamp(1, max_depth)
            })
            .collect();

        let title = title.trim().to_lowercase();
        if self.config.promote_title_heading
            && !title.is_empty()
            && candidates[0].line.text.to_lowercase().contains(&title)
        {
            levels[0] = 1;
        }

        // Unnumbered headings never skip a level.
        let mut previous = 0u8;
        for (level, candidate) in levels.iter_mut().zip(&candidates) {
            if candidate.numbering.is_none() && *level > previous + 1 {
                *level = previous + 1;
            }
            previous = *level;
        }

        candidates
            .into_iter()
            .zip(levels)
            .map(|(c, level)| {
                OutlineEntry::new(HeadingLevel::new(level), c.line.text, c.line.page)
                    .with_top(c.line.bbox.y0)
            })
            .collect()
    }

    /// Representative size of each tier, largest first, at most `max_depth`.
    fn size_tiers(&self, candidates: &[HeadingCandidate]) -> Vec<f32> {
        let mut sizes: Vec<f32> = candidates.iter().map(|c| c.line.font_size).collect();
        sizes.sort_by(|a, b| b.total_cmp(a));

        let mut tiers: Vec<f32> = Vec::new();
        for size in sizes {
            match tiers.last() {
                Some(&tier) if tier - size <= self.config.tier_tolerance => {}
                _ => tiers.push(size),
            }
        }
        tiers.truncate(self.config.max_depth.max(1) as usize);
        tiers
    }
}

/// Index of the tier closest to `size`; ties go to the larger tier.
fn nearest_tier(tiers: &[f32], size: f32) -> usize {
    let mut best = 0;
    for (i, tier) in tiers.iter().enumerate() {
        if (tier - size).abs() < (tiers[best] - size).abs() {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::numbering::NumberingDetector;
    use crate::model::{BBox, MergedLine, PageFrame};

    fn candidate(text: &str, page: u32, y0: f32, size: f32) -> HeadingCandidate {
        HeadingCandidate {
            line: MergedLine {
                text: text.to_string(),
                bbox: BBox::new(72.0, y0, 300.0, y0 + size),
                font_size: size,
                bold: false,
                page,
                centered: false,
                frame: PageFrame::default(),
            },
            score: 2.0,
            numbering: NumberingDetector::new().detect(text),
            level_hint: None,
        }
    }

    fn levels(entries: &[OutlineEntry]) -> Vec<String> {
        entries.iter().map(|e| e.level.to_string()).collect()
    }

    #[test]
    fn test_size_tiers() {
        let entries = LevelAssigner::default().assign(
            vec![
                candidate("Subsection", 1, 300.0, 13.0),
                candidate("Overview", 1, 100.0, 18.0),
                candidate("Details", 1, 200.0, 15.0),
                candidate("More details", 2, 100.0, 15.4),
            ],
            "",
        );
        let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Overview", "Details", "Subsection", "More details"]);
        assert_eq!(levels(&entries), vec!["H1", "H2", "H3", "H2"]);
        assert_eq!(entries[0].top, 100.0);
    }

    #[test]
    fn test_numbering_overrides_size() {
        let entries = LevelAssigner::default().assign(
            vec![
                candidate("1. Introduction", 1, 100.0, 14.0),
                candidate("1.1 Background", 1, 200.0, 14.0),
                candidate("1.1.1 Details of the method", 1, 300.0, 14.0),
                candidate("1.1.1.1.1 Too deep", 1, 400.0, 14.0),
            ],
            "",
        );
        assert_eq!(levels(&entries), vec!["H1", "H2", "H3", "H4"]);
    }

    #[test]
    fn test_unnumbered_levels_do_not_skip() {
        let entries = LevelAssigner::default().assign(
            vec![
                candidate("Big", 1, 100.0, 24.0),
                candidate("Medium", 1, 150.0, 18.0),
                candidate("Small", 1, 200.0, 14.0),
                candidate("Tiny", 2, 100.0, 12.0),
            ],
            "",
        );
        assert_eq!(levels(&entries), vec!["H1", "H2", "H3", "H4"]);

        // Without the larger headings the smallest one cannot start at H4.
        let entries = LevelAssigner::default().assign(
            vec![
                candidate("Big", 2, 100.0, 24.0),
                candidate("Medium", 2, 150.0, 18.0),
                candidate("Small", 2, 200.0, 14.0),
                candidate("Lead-in", 1, 100.0, 12.0),
            ],
            "",
        );
        assert_eq!(levels(&entries), vec!["H1", "H1", "H2", "H3"]);
    }

    #[test]
    fn test_title_heading_promoted() {
        let entries = LevelAssigner::default().assign(
            vec![
                candidate("Chapter", 1, 50.0, 30.0),
                candidate("Project Report Summary", 1, 100.0, 14.0),
            ],
            "project report",
        );
        assert_eq!(levels(&entries), vec!["H1", "H2"]);

        let entries = LevelAssigner::default().assign(
            vec![
                candidate("Project Report Summary", 1, 100.0, 14.0),
                candidate("Scope", 1, 150.0, 20.0),
            ],
            "Project Report",
        );
        assert_eq!(levels(&entries), vec!["H1", "H1"]);
    }

    #[test]
    fn test_max_depth() {
        let assigner = LevelAssigner::new(LevelConfig::default().with_max_depth(2));
        let entries = assigner.assign(
            vec![
                candidate("A heading", 1, 100.0, 24.0),
                candidate("B heading", 1, 150.0, 18.0),
                candidate("C heading", 1, 200.0, 14.0),
                candidate("1.2.3 Numbered", 1, 250.0, 14.0),
            ],
            "",
        );
        assert_eq!(levels(&entries), vec!["H1", "H2", "H2", "H2"]);
        assert!(assigner.assign(Vec::new(), "").is_empty());
    }
}
