//! Document-wide layout statistics.
//!
//! Computed once over every merged line of a document: the body text size,
//! the font size clusters, the dominant left margin and the repeating header
//! and footer bands.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;

use crate::model::MergedLine;
use crate::text::collapse_whitespace;

use super::config::LayoutConfig;
use super::numbering::NumberingDetector;

/// Page edge a band is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edge {
    Top,
    Bottom,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Top => write!(f, "top"),
            Edge::Bottom => write!(f, "bottom"),
        }
    }
}

/// A running header or footer: the same text at the same distance from a
/// page edge on most pages.
#[derive(Debug, Clone, PartialEq)]
pub struct FooterBand {
    pub edge: Edge,
    /// Distance range (min, max) from `edge`, in points
    pub range: (f32, f32),
    /// Normalized text shared by every occurrence
    pub signature: String,
    /// Number of pages the band appears on
    pub repetitions: u32,
}

/// A group of nearby font sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeCluster {
    /// Heaviest exact size in the cluster
    pub size: f32,
    pub min: f32,
    pub max: f32,
    /// Number of non-whitespace characters set in this cluster
    pub weight: usize,
}

impl SizeCluster {
    pub fn contains(&self, size: f32) -> bool {
        size >= self.min && size <= self.max
    }
}

/// Document-wide statistics every classification stage relies on.
#[derive(Debug, Clone)]
pub struct LayoutProfile {
    /// Body text size
    pub body_font_size: f32,
    pub footer_bands: Vec<FooterBand>,
    /// Size clusters, ascending by size
    pub size_clusters: Vec<SizeCluster>,
    /// Dominant left edge of body text
    pub left_margin: Option<f32>,
    pub page_count: u32,
    /// Fewer than two size clusters: no hierarchy can be inferred
    pub degenerate: bool,
    band_tolerance: f32,
    signer: BandSignature,
}

impl LayoutProfile {
    /// Compute the profile of a document from all of its merged lines.
    pub fn compute(lines: &[MergedLine], page_count: u32, config: &LayoutConfig) -> Self {
        let signer = BandSignature::new();
        let footer_bands = detect_bands(lines, page_count, config, &signer);

        let mut profile = Self {
            body_font_size: config.default_body_size,
            footer_bands,
            size_clusters: Vec::new(),
            left_margin: None,
            page_count,
            degenerate: true,
            band_tolerance: config.band_quantum,
            signer,
        };

        let body_lines: Vec<&MergedLine> =
            lines.iter().filter(|l| !profile.in_footer_band(l)).collect();

        profile.size_clusters = cluster_sizes(&body_lines, config.size_bucket_tolerance);

        if let Some(body) = profile
            .size_clusters
            .iter()
            .fold(None::<&SizeCluster>, |best, c| match best {
                Some(b) if b.weight >= c.weight => Some(b),
                _ => Some(c),
            })
        {
            profile.body_font_size = body.size;
            profile.left_margin = dominant_left_margin(&body_lines, body, config.margin_bucket);
        }
        profile.degenerate = profile.size_clusters.len() < 2;

        log::debug!(
            "Layout: body {:.1}pt, {} size clusters, {} header/footer bands, left margin {:?}{}",
            profile.body_font_size,
            profile.size_clusters.len(),
            profile.footer_bands.len(),
            profile.left_margin,
            if profile.degenerate { " (degenerate)" } else { "" }
        );

        profile
    }

    /// Size of `size` relative to body text.
    pub fn size_ratio(&self, size: f32) -> f32 {
        if self.body_font_size > 0.0 {
            size / self.body_font_size
        } else {
            1.0
        }
    }

    /// Whether the line sits in a detected header/footer band.
    pub fn in_footer_band(&self, line: &MergedLine) -> bool {
        if self.footer_bands.is_empty() || self.signer.is_numbered_heading(&line.text) {
            return false;
        }
        let signature = self.signer.sign(&line.text);
        self.footer_bands.iter().any(|band| {
            let distance = edge_distance(line, band.edge);
            band.signature == signature
                && distance >= band.range.0 - self.band_tolerance
                && distance <= band.range.1 + self.band_tolerance
        })
    }
}

fn edge_distance(line: &MergedLine, edge: Edge) -> f32 {
    match edge {
        Edge::Top => line.top(),
        Edge::Bottom => line.distance_from_bottom(),
    }
}

/// Normalizes margin text so that page numbers do not break repetition.
///
/// Only page-number forms are masked: "page N (of M)" and a number closing
/// the line. Lines that open with heading numbering never join a band, so
/// numbered headings set at the same spot on every page stay distinct.
#[derive(Debug, Clone)]
struct BandSignature {
    page_phrase: Regex,
    trailing_number: Regex,
    numbering: NumberingDetector,
}

impl BandSignature {
    fn new() -> Self {
        Self {
            page_phrase: Regex::new(r"(?i)\bpage\s*\d+(\s*(of|/)\s*\d+)?").unwrap(),
            trailing_number: Regex::new(r"\d+(?P<tail>\W*)$").unwrap(),
            numbering: NumberingDetector::new(),
        }
    }

    fn sign(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let without_page = self.page_phrase.replace_all(&lower, " ");
        let trimmed = without_page.trim();
        let masked = self.trailing_number.replace(trimmed, "#$tail");
        collapse_whitespace(&masked)
    }

    fn is_numbered_heading(&self, text: &str) -> bool {
        self.numbering.detect(text).is_some()
    }
}

/// Occurrences of one signature along one edge.
struct BandCandidate {
    pages: BTreeSet<u32>,
    min: f32,
    max: f32,
}

fn detect_bands(
    lines: &[MergedLine],
    page_count: u32,
    config: &LayoutConfig,
    signer: &BandSignature,
) -> Vec<FooterBand> {
    if page_count < config.min_footer_pages.max(1) {
        return Vec::new();
    }

    let tolerance = config.band_quantum.max(0.1);
    let mut groups: BTreeMap<(Edge, String), Vec<(f32, u32)>> = BTreeMap::new();

    for line in lines {
        let height = line.frame.height;
        let edge = if line.bbox.y1 <= config.header_margin * height {
            Edge::Top
        } else if line.bbox.y0 >= (1.0 - config.footer_margin) * height {
            Edge::Bottom
        } else {
            continue;
        };
        if signer.is_numbered_heading(&line.text) {
            continue;
        }

        groups
            .entry((edge, signer.sign(&line.text)))
            .or_default()
            .push((edge_distance(line, edge), line.page));
    }

    let required = (config.footer_page_ratio * page_count as f32).ceil() as usize;
    let required = required.max(config.min_footer_pages as usize);

    let mut bands = Vec::new();
    for ((edge, signature), mut occurrences) in groups {
        occurrences.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for candidate in sweep_distances(&occurrences, tolerance) {
            if candidate.pages.len() >= required {
                bands.push(FooterBand {
                    edge,
                    range: (candidate.min, candidate.max),
                    signature: signature.clone(),
                    repetitions: candidate.pages.len() as u32,
                });
            }
        }
    }
    bands
}

/// Split distance-sorted occurrences wherever two neighbours are more than
/// `tolerance` apart.
fn sweep_distances(occurrences: &[(f32, u32)], tolerance: f32) -> Vec<BandCandidate> {
    let mut candidates: Vec<BandCandidate> = Vec::new();
    for &(distance, page) in occurrences {
        match candidates.last_mut() {
            Some(current) if distance - current.max <= tolerance => {
                current.pages.insert(page);
                current.max = distance;
            }
            _ => candidates.push(BandCandidate {
                pages: BTreeSet::from([page]),
                min: distance,
                max: distance,
            }),
        }
    }
    candidates
}

/// Greedy clustering of the character-weighted size histogram.
fn cluster_sizes(lines: &[&MergedLine], tolerance: f32) -> Vec<SizeCluster> {
    // Keyed by hundredths of a point so that equal sizes share a bucket.
    let mut histogram: BTreeMap<i64, (f32, usize)> = BTreeMap::new();
    for line in lines {
        let entry = histogram
            .entry((line.font_size * 100.0).round() as i64)
            .or_insert((line.font_size, 0));
        entry.1 += line.weight();
    }

    let mut clusters: Vec<SizeCluster> = Vec::new();
    let mut heaviest: Vec<usize> = Vec::new();

    for (size, weight) in histogram.into_values() {
        if weight == 0 {
            continue;
        }
        let open = clusters
            .len()
            .checked_sub(1)
            .filter(|&idx| size - clusters[idx].min <= tolerance);
        match open {
            Some(idx) => {
                let cluster = &mut clusters[idx];
                cluster.max = size;
                cluster.weight += weight;
                if weight > heaviest[idx] {
                    heaviest[idx] = weight;
                    cluster.size = size;
                }
            }
            None => {
                clusters.push(SizeCluster {
                    size,
                    min: size,
                    max: size,
                    weight,
                });
                heaviest.push(weight);
            }
        }
    }

    clusters
}

fn dominant_left_margin(lines: &[&MergedLine], body: &SizeCluster, bucket: f32) -> Option<f32> {
    let bucket = bucket.max(0.1);
    let mut buckets: BTreeMap<i64, (usize, f32)> = BTreeMap::new();

    for line in lines.iter().filter(|l| body.contains(l.font_size)) {
        let entry = buckets
            .entry((line.bbox.x0 / bucket).floor() as i64)
            .or_insert((0, line.bbox.x0));
        entry.0 += line.weight();
        entry.1 = entry.1.min(line.bbox.x0);
    }

    let mut best: Option<(usize, f32)> = None;
    for (weight, x0) in buckets.into_values() {
        if best.map_or(true, |(w, _)| weight > w) {
            best = Some((weight, x0));
        }
    }
    best.map(|(_, x0)| x0)
}
