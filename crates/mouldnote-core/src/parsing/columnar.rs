//! Tables exported column by column: each header label on its own line,
//! followed by that column's values one per line.

use super::header::{is_header_label_line, label_only, LabelOnly};
use super::rejoin_split_seal_lines;
use crate::finalize::RowDraft;
use crate::normalize::shapes::{is_part_prefix_fragment, is_part_suffix_fragment};
use crate::normalize::{is_ascii_digits, is_junk_line, normalize_key, strip_checkbox_prefix};
use crate::template::{column_position, contains_sentinel, ColumnKey, COLUMNS};

/// Collect values per column and zip them into rows. `None` when fewer
/// than two column labels stand alone on their own lines.
pub fn parse_column_blocks(lines: &[&str]) -> Option<Vec<RowDraft>> {
    let label_lines = lines
        .iter()
        .filter(|l| matches!(label_only(l), Some(LabelOnly::Column(_))))
        .count();
    if label_lines < 2 {
        return None;
    }

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); COLUMNS.len()];
    let mut current: Option<usize> = None;
    for raw in lines {
        if contains_sentinel(&normalize_key(raw)) {
            break;
        }
        match label_only(raw) {
            Some(LabelOnly::Column(key)) => {
                current = Some(column_position(key));
                continue;
            }
            Some(LabelOnly::Index) => {
                current = None;
                continue;
            }
            None => {}
        }
        let Some(col) = current else { continue };
        if is_junk_line(raw) {
            continue;
        }
        let value = strip_checkbox_prefix(raw).trim();
        if value.is_empty() || is_ascii_digits(value) || is_header_label_line(value) {
            continue;
        }
        columns[col].push(value.to_string());
    }

    let part_col = column_position(ColumnKey::PartNo);
    columns[part_col] = rejoin_split_part_values(std::mem::take(&mut columns[part_col]));
    let seal_col = column_position(ColumnKey::SealSampleNo);
    columns[seal_col] = rejoin_split_seal_lines(std::mem::take(&mut columns[seal_col]));

    let row_count = columns.iter().map(Vec::len).max().unwrap_or(0);
    log::debug!("column-block layout: {label_lines} label lines, {row_count} rows");

    let value = |col: ColumnKey, i: usize| {
        columns[column_position(col)]
            .get(i)
            .cloned()
            .unwrap_or_default()
    };
    let drafts = (0..row_count)
        .map(|i| RowDraft {
            index: i as u32 + 1,
            part_no: value(ColumnKey::PartNo, i),
            mould_name: value(ColumnKey::MouldName, i),
            mould_no: value(ColumnKey::MouldNo, i),
            mould_factory: value(ColumnKey::MouldFactory, i),
            move_to: value(ColumnKey::MoveTo, i),
            seal_sample_no: value(ColumnKey::SealSampleNo, i),
        })
        .collect();
    Some(drafts)
}

fn rejoin_split_part_values(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        match out.last_mut() {
            Some(prev) if is_part_prefix_fragment(prev) && is_part_suffix_fragment(&value) => {
                prev.push_str(value.trim());
            }
            _ => out.push(value),
        }
    }
    out
}
