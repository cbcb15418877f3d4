//! Plain text rendering of outlines.

use std::fmt::Write;

use crate::model::Outline;

/// Spaces per heading level.
const INDENT: usize = 2;

/// Render an outline as an indented list:
///
/// ```text
/// Project Report
///
/// H1 1. Introduction .... p. 2
///   H2 1.1 Background .. p. 2
/// ```
pub fn to_text(outline: &Outline) -> String {
    let mut output = String::new();

    if outline.title.is_empty() {
        output.push_str("(untitled)\n");
    } else {
        output.push_str(&outline.title);
        output.push('\n');
    }

    if outline.entries.is_empty() {
        return output;
    }
    output.push('\n');

    let labels: Vec<String> = outline
        .entries
        .iter()
        .map(|e| {
            format!(
                "{}{} {}",
                " ".repeat(INDENT * (e.level.depth() as usize - 1)),
                e.level,
                e.text
            )
        })
        .collect();
    let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 2;

    for (label, entry) in labels.iter().zip(&outline.entries) {
        let dots = width - label.chars().count();
        let _ = writeln!(output, "{} {} p. {}", label, ".".repeat(dots), entry.page);
    }

    output
}
