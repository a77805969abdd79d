//! Terminal formatting helpers.

use crate::processing::OverlapKind;
use colored::{ColoredString, Colorize};

/// Pad a value to a left-aligned column of at least `width` characters.
///
/// Values longer than the column are kept whole. Pass plain text: escape
/// codes of an already colored value count towards the width.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    if value_str.len() >= width {
        value_str
    } else {
        format!("{value_str:<width$}")
    }
}

/// Colored label for an overlap relation, padded to `width` before coloring.
pub fn overlap_label(kind: OverlapKind, width: usize) -> ColoredString {
    let (text, color): (&str, fn(String) -> ColoredString) = match kind {
        OverlapKind::NoOverlap => ("none", |s: String| s.as_str().green()),
        OverlapKind::Equal => ("exact", |s: String| s.as_str().red().bold()),
        OverlapKind::Contains => ("contains", |s: String| s.as_str().red()),
        OverlapKind::ContainedBy => ("contained_by", |s: String| s.as_str().red()),
        OverlapKind::Partial => ("partial", |s: String| s.as_str().magenta()),
    };
    color(format_field(text, width))
}

/// Yes/no marker.
pub fn flag(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".yellow()
    }
}
