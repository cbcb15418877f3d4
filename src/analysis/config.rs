//! Tunable thresholds and weights for every analysis stage.
//!
//! All structs deserialize with `#[serde(default)]`, so a JSON file only needs
//! to name the values it overrides:
//!
//! ```json
//! { "heading": { "acceptance_threshold": 1.5 }, "levels": { "max_depth": 3 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Span-to-line merging
    pub merge: MergeConfig,

    /// Document-wide statistics (body size, footer bands)
    pub layout: LayoutConfig,

    /// Title selection on the first page
    pub title: TitleConfig,

    /// Heading scoring and filters
    pub heading: HeadingConfig,

    /// Heading level assignment
    pub levels: LevelConfig,

    /// Emit only the title for interactive form documents
    pub forms_title_only: bool,
}

impl OutlineConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (partial) configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a (partial) configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        fn fraction(name: &str, value: f32) -> Result<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(Error::Config(format!("{} must be within 0..=1, got {}", name, value)))
            }
        }

        fraction("merge.min_vertical_overlap", self.merge.min_vertical_overlap)?;
        fraction("merge.center_tolerance", self.merge.center_tolerance)?;
        fraction("layout.header_margin", self.layout.header_margin)?;
        fraction("layout.footer_margin", self.layout.footer_margin)?;
        fraction("layout.footer_page_ratio", self.layout.footer_page_ratio)?;
        fraction("title.region", self.title.region)?;
        fraction("heading.uppercase_ratio", self.heading.uppercase_ratio)?;
        fraction("heading.date_coverage", self.heading.date_coverage)?;

        if self.levels.max_depth == 0 {
            return Err(Error::Config("levels.max_depth must be at least 1".into()));
        }
        if self.heading.min_chars > self.heading.max_chars {
            return Err(Error::Config(format!(
                "heading.min_chars ({}) exceeds heading.max_chars ({})",
                self.heading.min_chars, self.heading.max_chars
            )));
        }
        if self.layout.default_body_size <= 0.0 {
            return Err(Error::Config("layout.default_body_size must be positive".into()));
        }
        Ok(())
    }

    pub fn with_merge(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_title(mut self, title: TitleConfig) -> Self {
        self.title = title;
        self
    }

    pub fn with_heading(mut self, heading: HeadingConfig) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_levels(mut self, levels: LevelConfig) -> Self {
        self.levels = levels;
        self
    }

    /// Enable or disable title-only output for form documents.
    pub fn with_forms_title_only(mut self, enabled: bool) -> Self {
        self.forms_title_only = enabled;
        self
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            merge: MergeConfig::default(),
            layout: LayoutConfig::default(),
            title: TitleConfig::default(),
            heading: HeadingConfig::default(),
            levels: LevelConfig::default(),
            forms_title_only: true,
        }
    }
}

/// How spans are merged into lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Minimum vertical overlap, as a fraction of the smaller height
    pub min_vertical_overlap: f32,

    /// Largest horizontal gap bridged within a line, in ems
    pub max_gap_ratio: f32,

    /// Largest tolerated backwards step (overlap) within a line, in ems
    pub max_overlap_ratio: f32,

    /// Gap, as a fraction of the average character width, that gets a space
    pub space_gap_ratio: f32,

    /// Largest vertical gap between hyphen-joined lines, in ems
    pub hyphen_max_line_gap: f32,

    /// Largest difference of left edges between hyphen-joined lines
    pub hyphen_max_indent_delta: f32,

    /// Largest font size difference between hyphen-joined lines
    pub hyphen_size_tolerance: f32,

    /// Distance from the page midpoint, as a fraction of page width, that
    /// still counts as centered
    pub center_tolerance: f32,
}

impl MergeConfig {
    pub fn with_max_gap_ratio(mut self, ratio: f32) -> Self {
        self.max_gap_ratio = ratio;
        self
    }

    pub fn with_center_tolerance(mut self, tolerance: f32) -> Self {
        self.center_tolerance = tolerance;
        self
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            min_vertical_overlap: 0.5,
            max_gap_ratio: 3.0,
            max_overlap_ratio: 0.5,
            space_gap_ratio: 0.2,
            hyphen_max_line_gap: 1.5,
            hyphen_max_indent_delta: 20.0,
            hyphen_size_tolerance: 1.0,
            center_tolerance: 0.06,
        }
    }
}

/// Document-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Top margin searched for running headers, as a fraction of page height
    pub header_margin: f32,

    /// Bottom margin searched for footers, as a fraction of page height
    pub footer_margin: f32,

    /// Fraction of pages a band must repeat on
    pub footer_page_ratio: f32,

    /// Minimum number of pages a band must repeat on
    pub min_footer_pages: u32,

    /// Quantization step for the distance of a band from its edge (pt)
    pub band_quantum: f32,

    /// Tolerance when clustering font sizes (pt)
    pub size_bucket_tolerance: f32,

    /// Bucket width when locating the dominant left margin (pt)
    pub margin_bucket: f32,

    /// Body size assumed for documents without any text
    pub default_body_size: f32,
}

impl LayoutConfig {
    pub fn with_footer_page_ratio(mut self, ratio: f32) -> Self {
        self.footer_page_ratio = ratio;
        self
    }

    pub fn with_size_bucket_tolerance(mut self, tolerance: f32) -> Self {
        self.size_bucket_tolerance = tolerance;
        self
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_margin: 0.12,
            footer_margin: 0.12,
            footer_page_ratio: 0.6,
            min_footer_pages: 2,
            band_quantum: 4.0,
            size_bucket_tolerance: 0.5,
            margin_bucket: 5.0,
            default_body_size: 10.0,
        }
    }
}

/// Title selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// Upper fraction of the first page searched for the title
    pub region: f32,

    /// Minimum number of non-space characters
    pub min_chars: usize,

    /// Minimum size ratio over body text
    pub min_size_ratio: f32,

    /// Weight of the size ratio in the score
    pub size_weight: f32,

    pub bold_bonus: f32,

    pub center_bonus: f32,

    /// Bonus scaled by how close the line is to the top of the page
    pub position_bonus: f32,

    /// Size tolerance for lines merged into the title (pt)
    pub size_tolerance: f32,

    /// Largest vertical gap between title lines, in ems
    pub max_line_gap_ratio: f32,

    /// Maximum number of lines a title may span
    pub max_lines: usize,
}

impl TitleConfig {
    pub fn with_region(mut self, region: f32) -> Self {
        self.region = region;
        self
    }

    pub fn with_min_size_ratio(mut self, ratio: f32) -> Self {
        self.min_size_ratio = ratio;
        self
    }
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            region: 0.5,
            min_chars: 3,
            min_size_ratio: 1.25,
            size_weight: 2.0,
            bold_bonus: 1.0,
            center_bonus: 1.0,
            position_bonus: 1.0,
            size_tolerance: 1.0,
            max_line_gap_ratio: 1.2,
            max_lines: 4,
        }
    }
}

/// Heading scoring and filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    /// Size ratios up to `1 + epsilon` count as body text
    pub body_ratio_epsilon: f32,

    /// Score applied to body-sized lines (negative)
    pub body_penalty: f32,

    /// Score per unit of size ratio above body
    pub size_ratio_weight: f32,

    /// Cap on the size component
    pub size_bonus_cap: f32,

    pub bold_bonus: f32,

    pub numbering_bonus: f32,

    pub uppercase_bonus: f32,

    /// Share of uppercase letters for the uppercase bonus
    pub uppercase_ratio: f32,

    /// Minimum letters for the uppercase bonus
    pub min_uppercase_letters: usize,

    pub center_bonus: f32,

    /// Bonus for lines starting at the document's dominant left margin
    pub indent_bonus: f32,

    /// Tolerance for the left margin match (pt)
    pub indent_tolerance: f32,

    /// Minimum score for a heading
    pub acceptance_threshold: f32,

    /// Minimum number of characters
    pub min_chars: usize,

    /// Maximum number of characters
    pub max_chars: usize,

    /// Share of non-space characters a date must cover to disqualify a line
    pub date_coverage: f32,
}

impl HeadingConfig {
    pub fn with_acceptance_threshold(mut self, threshold: f32) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    pub fn with_bold_bonus(mut self, bonus: f32) -> Self {
        self.bold_bonus = bonus;
        self
    }

    pub fn with_length_bounds(mut self, min_chars: usize, max_chars: usize) -> Self {
        self.min_chars = min_chars;
        self.max_chars = max_chars;
        self
    }
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            body_ratio_epsilon: 0.05,
            body_penalty: -2.0,
            size_ratio_weight: 5.0,
            size_bonus_cap: 3.0,
            bold_bonus: 1.5,
            numbering_bonus: 1.5,
            uppercase_bonus: 0.75,
            uppercase_ratio: 0.8,
            min_uppercase_letters: 4,
            center_bonus: 0.5,
            indent_bonus: 0.25,
            indent_tolerance: 4.0,
            acceptance_threshold: 1.0,
            min_chars: 3,
            max_chars: 120,
            date_coverage: 0.4,
        }
    }
}

/// Heading level assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Sizes within this distance share a tier (pt)
    pub tier_tolerance: f32,

    /// Deepest level emitted (H1..Hn)
    pub max_depth: u8,

    /// Force the first entry to H1 when it repeats the title
    pub promote_title_heading: bool,
}

impl LevelConfig {
    /// Set the deepest level (at least 1).
    pub fn with_max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn with_promote_title_heading(mut self, enabled: bool) -> Self {
        self.promote_title_heading = enabled;
        self
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            tier_tolerance: 1.0,
            max_depth: 4,
            promote_title_heading: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = OutlineConfig::from_json_str(
            r#"{ "heading": { "acceptance_threshold": 2.5 }, "levels": { "max_depth": 3 } }"#,
        )
        .unwrap();

        assert_eq!(config.heading.acceptance_threshold, 2.5);
        assert_eq!(config.heading.bold_bonus, HeadingConfig::default().bold_bonus);
        assert_eq!(config.levels.max_depth, 3);
        assert_eq!(config.merge, MergeConfig::default());
        assert!(config.forms_title_only);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = OutlineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let err = OutlineConfig::from_json_str(r#"{ "title": { "region": 1.5 } }"#).unwrap_err();
        assert!(err.to_string().contains("title.region"));

        let err = OutlineConfig::from_json_str(r#"{ "levels": { "max_depth": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = OutlineConfig::new()
            .with_levels(LevelConfig::default().with_max_depth(0))
            .with_heading(HeadingConfig::default().with_length_bounds(2, 80))
            .with_forms_title_only(false);

        assert_eq!(config.levels.max_depth, 1);
        assert_eq!(config.heading.max_chars, 80);
        assert!(!config.forms_title_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outline.json");
        std::fs::write(&path, r#"{ "layout": { "footer_page_ratio": 0.5 } }"#).unwrap();

        let config = OutlineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.layout.footer_page_ratio, 0.5);

        let missing = OutlineConfig::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
