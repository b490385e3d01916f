use super::columns::ColumnLayout;
use crate::model::PositionedFragment;
use crate::normalize::normalize_key;
use crate::normalize::shapes::is_canonical_mould_no;
use crate::template::{column_position, ColumnKey};
use regex::Regex;
use std::sync::LazyLock;

static INDEX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}$").expect("valid pattern"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowAnchor {
    pub index: u32,
    pub top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSource {
    /// Bare ordinals in the gutter left of the first column.
    IndexGutter,
    /// Mould numbers, when the gutter holds no ordinals.
    MouldNumber,
}

/// Drop positions within `tolerance` of the last kept one. Input must be sorted.
fn dedupe_by_top<T>(sorted: Vec<(f64, T)>, tolerance: f64) -> Vec<(f64, T)> {
    let mut kept: Vec<(f64, T)> = Vec::with_capacity(sorted.len());
    for (top, value) in sorted {
        if kept.last().map_or(true, |(last, _)| top - last > tolerance) {
            kept.push((top, value));
        }
    }
    kept
}

pub fn index_anchors(
    fragments: &[PositionedFragment],
    layout: &ColumnLayout,
    table_end: f64,
    tolerance: f64,
) -> Vec<RowAnchor> {
    let gutter_right = layout.boundaries[0] - 1.0;
    let mut hits: Vec<(f64, u32)> = fragments
        .iter()
        .filter(|f| f.top >= layout.table_start && f.top <= table_end && f.right <= gutter_right)
        .filter_map(|f| {
            let text = f.text.trim();
            if !INDEX_DIGITS.is_match(text) {
                return None;
            }
            text.parse().ok().map(|index| (f.top, index))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    dedupe_by_top(hits, tolerance)
        .into_iter()
        .map(|(top, index)| RowAnchor { index, top })
        .collect()
}

pub fn mould_anchors(
    fragments: &[PositionedFragment],
    layout: &ColumnLayout,
    table_end: f64,
    tolerance: f64,
) -> Vec<RowAnchor> {
    let col = column_position(ColumnKey::MouldNo);
    let (left, right) = (layout.boundaries[col], layout.boundaries[col + 1]);
    let mut tops: Vec<(f64, ())> = fragments
        .iter()
        .filter(|f| f.top >= layout.table_start && f.top <= table_end)
        .filter(|f| f.center_x() >= left && f.center_x() < right)
        .filter(|f| is_canonical_mould_no(&normalize_key(&f.text)))
        .map(|f| (f.top, ()))
        .collect();
    tops.sort_by(|a, b| a.0.total_cmp(&b.0));
    dedupe_by_top(tops, tolerance)
        .into_iter()
        .zip(1..)
        .map(|((top, ()), index)| RowAnchor { index, top })
        .collect()
}
