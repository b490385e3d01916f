use super::anchors::RowAnchor;
use super::columns::{ColumnLayout, COLUMN_COUNT};
use super::lines::group_lines;
use crate::model::PositionedFragment;
use crate::normalize::{compact, compress_spaces};
use crate::template::{JoinPolicy, COLUMNS};

/// Vertical span owned by one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBand {
    pub index: u32,
    pub top: f64,
    pub bottom: f64,
}

/// Split the table into bands halfway between consecutive anchors. The
/// first band starts at the table start, the last ends just past the
/// table end.
pub fn row_bands(anchors: &[RowAnchor], table_start: f64, table_end: f64) -> Vec<RowBand> {
    anchors
        .iter()
        .enumerate()
        .map(|(i, anchor)| {
            let top = match i.checked_sub(1).map(|p| &anchors[p]) {
                Some(prev) => table_start.max((prev.top + anchor.top) / 2.0),
                None => table_start,
            };
            let bottom = match anchors.get(i + 1) {
                Some(next) => (table_end + 2.0).min((anchor.top + next.top) / 2.0),
                None => table_end + 2.0,
            };
            RowBand {
                index: anchor.index,
                top,
                bottom,
            }
        })
        .collect()
}

/// Text of every column cell inside `band`, in column order.
pub fn collect_cells(
    fragments: &[PositionedFragment],
    band: &RowBand,
    layout: &ColumnLayout,
    tolerance: f64,
) -> [String; COLUMN_COUNT] {
    let mut buckets: [Vec<PositionedFragment>; COLUMN_COUNT] = Default::default();
    for f in fragments {
        if f.top < band.top || f.top >= band.bottom {
            continue;
        }
        if let Some(col) = layout.column_of(f.center_x()) {
            buckets[col].push(f.clone());
        }
    }

    let mut cells: [String; COLUMN_COUNT] = Default::default();
    for ((cell, bucket), column) in cells.iter_mut().zip(&buckets).zip(COLUMNS.iter()) {
        *cell = join_cell(bucket, column.join, tolerance);
    }
    cells
}

fn join_cell(fragments: &[PositionedFragment], policy: JoinPolicy, tolerance: f64) -> String {
    let sub_lines: Vec<String> = group_lines(fragments, tolerance)
        .iter()
        .map(|line| line.fragments.iter().map(|f| f.text.trim()).collect::<String>())
        .collect();
    match policy {
        JoinPolicy::Adjacent => compact(&sub_lines.concat()),
        JoinPolicy::Spaced => compress_spaces(&sub_lines.join(" ")),
    }
}
