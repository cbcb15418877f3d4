//! Heuristic outline analysis.
//!
//! Turns the positioned spans of a document into a title and a leveled
//! heading list using only typographic and positional signals.

mod classify;
mod config;
mod levels;
mod merge;
mod numbering;
mod pipeline;
mod stats;
mod title;

pub use classify::{HeadingCandidate, HeadingClassifier, Rejection, ScoredLine};
pub use config::{HeadingConfig, LayoutConfig, LevelConfig, MergeConfig, OutlineConfig, TitleConfig};
pub use levels::LevelAssigner;
pub use merge::merge_lines;
pub use numbering::{DepthRule, Numbering, NumberingDetector, NumberingKind};
pub use pipeline::{Analysis, OutlineExtractor};
pub use stats::{Edge, FooterBand, LayoutProfile, SizeCluster};
pub use title::{clean_title, TitleExtractor, TitleSelection};
