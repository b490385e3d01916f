//! Row drafts and the cleanup both pipelines run before emitting rows.

use crate::error::ErrorKind;
use crate::model::ExtractedRow;
use crate::normalize::fields::{
    normalize_mould_no, normalize_part_no, normalize_seal_no, strip_leaked_fields,
};
use crate::normalize::shapes::{self, is_part_prefix_fragment, is_part_suffix_fragment, SEAL_MATCHERS};
use crate::normalize::{compress_spaces, is_ascii_digits, strip_private_use};
use crate::trace::{ExtractionTrace, TraceSeverity, TraceStepType};

/// A row as collected by a pipeline, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowDraft {
    pub index: u32,
    pub part_no: String,
    pub mould_name: String,
    pub mould_no: String,
    pub mould_factory: String,
    pub move_to: String,
    pub seal_sample_no: String,
}

impl RowDraft {
    pub fn new(index: u32) -> Self {
        RowDraft {
            index,
            ..RowDraft::default()
        }
    }

    pub fn has_part_and_seal(&self) -> bool {
        !self.part_no.is_empty() && !self.seal_sample_no.is_empty()
    }

    pub fn has_free_text(&self) -> bool {
        !self.mould_name.is_empty() || !self.mould_factory.is_empty() || !self.move_to.is_empty()
    }
}

fn fill_if_empty(slot: &mut String, value: &str) {
    if slot.is_empty() {
        *slot = value.to_string();
    }
}

/// Merge a row whose part number ends in a dangling dot with a following
/// row holding only the dotted tail, e.g. `B22197.21.` + `2.1`.
pub fn merge_split_part_rows(drafts: Vec<RowDraft>, trace: &mut ExtractionTrace) -> Vec<RowDraft> {
    let mut out: Vec<RowDraft> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let mergeable = out.last().is_some_and(|prev| {
            is_part_prefix_fragment(&prev.part_no)
                && is_part_suffix_fragment(&draft.part_no)
                && (prev.mould_no.is_empty()
                    || draft.mould_no.is_empty()
                    || normalize_mould_no(&prev.mould_no) == normalize_mould_no(&draft.mould_no))
        });
        match out.last_mut() {
            Some(prev) if mergeable => {
                trace.warn(
                    TraceSeverity::Info,
                    Some(prev.index),
                    format!("joined split part number {} + {}", prev.part_no, draft.part_no),
                );
                let mut merged = draft;
                merged.index = prev.index;
                merged.part_no = format!("{}{}", prev.part_no, merged.part_no);
                fill_if_empty(&mut merged.mould_name, &prev.mould_name);
                fill_if_empty(&mut merged.mould_no, &prev.mould_no);
                fill_if_empty(&mut merged.mould_factory, &prev.mould_factory);
                fill_if_empty(&mut merged.move_to, &prev.move_to);
                fill_if_empty(&mut merged.seal_sample_no, &prev.seal_sample_no);
                *prev = merged;
            }
            _ => out.push(draft),
        }
    }
    out
}

/// Assign seals by row order when some rows lost theirs and the document
/// holds exactly one distinct seal per row.
pub fn backfill_seals(drafts: &mut [RowDraft], text: &str, trace: &mut ExtractionTrace) {
    if drafts.iter().all(|d| !d.seal_sample_no.is_empty()) {
        return;
    }
    let mut seals: Vec<String> = Vec::new();
    for m in shapes::find_all(&SEAL_MATCHERS, text) {
        if !seals.contains(&m.value) {
            seals.push(m.value);
        }
    }
    if seals.len() != drafts.len() {
        return;
    }
    for (draft, seal) in drafts.iter_mut().zip(seals) {
        if draft.seal_sample_no.is_empty() {
            trace.warn(
                TraceSeverity::Important,
                Some(draft.index),
                format!("seal {seal} assigned by row order"),
            );
            draft.seal_sample_no = seal;
        }
    }
}

fn normalize_draft(draft: &RowDraft) -> ExtractedRow {
    let part_no = normalize_part_no(&draft.part_no);
    let mould_no = match draft.mould_no.trim() {
        "" => String::new(),
        raw => normalize_mould_no(raw),
    };
    let seal_sample_no = match draft.seal_sample_no.trim() {
        "" => String::new(),
        raw => normalize_seal_no(raw),
    };
    let mould_factory = compress_spaces(&strip_private_use(&draft.mould_factory));
    let move_to = compress_spaces(&strip_private_use(&draft.move_to));
    let mould_name = strip_leaked_fields(
        &draft.mould_name,
        &[&mould_no, &mould_factory, &move_to, &seal_sample_no],
        draft.index,
    );
    ExtractedRow {
        index: draft.index,
        part_no,
        mould_name,
        mould_no,
        mould_factory,
        move_to,
        seal_sample_no,
    }
}

fn is_date_like_part(part_no: &str) -> bool {
    part_no.len() == 8 && is_ascii_digits(part_no)
}

/// Normalize drafts into output rows and enforce row integrity.
pub fn finalize_rows(
    drafts: &[RowDraft],
    trace: &mut ExtractionTrace,
) -> Result<Vec<ExtractedRow>, ErrorKind> {
    let mut rows: Vec<ExtractedRow> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let row = normalize_draft(draft);

        if row.part_no.is_empty() && row.mould_no.is_empty() && row.mould_name.is_empty() {
            trace.warn(TraceSeverity::Info, Some(row.index), "dropped empty row");
            continue;
        }
        if is_date_like_part(&row.part_no) && row.mould_no.is_empty() {
            trace.warn(
                TraceSeverity::Info,
                Some(row.index),
                format!("dropped date-like part number {}", row.part_no),
            );
            continue;
        }
        if row.part_no.is_empty() && row.mould_no.is_empty() {
            return Err(ErrorKind::IncompleteRow { index: row.index });
        }
        if let Some(prev) = rows.last() {
            if row.index <= prev.index {
                return Err(ErrorKind::NonMonotonicIndex {
                    previous: prev.index,
                    found: row.index,
                });
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ErrorKind::NoRowsDetected(
            "no row kept a part number or mould number".into(),
        ));
    }
    trace.step(
        TraceStepType::FinalizeRows,
        format!("{} of {} rows kept", rows.len(), drafts.len()),
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExtractionMode;

    fn trace() -> ExtractionTrace {
        ExtractionTrace::new(ExtractionMode::Lines)
    }

    fn draft(index: u32, part: &str, name: &str, mould: &str, seal: &str) -> RowDraft {
        RowDraft {
            index,
            part_no: part.into(),
            mould_name: name.into(),
            mould_no: mould.into(),
            mould_factory: "苏州模具厂".into(),
            move_to: "上海工厂".into(),
            seal_sample_no: seal.into(),
        }
    }

    #[test]
    fn test_finalize_normalizes_fields() {
        let drafts = vec![draft(1, "C25025. 5.12.4", "1 把手盖 苏州模具厂", "ML 012302", "ML－A1－20240101－1")];
        let rows = finalize_rows(&drafts, &mut trace()).unwrap();
        assert_eq!(rows[0].part_no, "C25025.5.12.4");
        assert_eq!(rows[0].mould_name, "把手盖");
        assert_eq!(rows[0].mould_no, "ML012302");
        assert_eq!(rows[0].seal_sample_no, "ML-A1-20240101-1");
    }

    #[test]
    fn test_empty_and_date_rows_dropped() {
        let drafts = vec![
            RowDraft::new(1),
            draft(2, "20240101", "", "", ""),
            draft(3, "C1234.5", "把手", "ML01", ""),
        ];
        let rows = finalize_rows(&drafts, &mut trace()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 3);
    }

    #[test]
    fn test_row_without_identifiers_is_incomplete() {
        let drafts = vec![draft(4, "", "把手", "", "")];
        assert_eq!(
            finalize_rows(&drafts, &mut trace()),
            Err(ErrorKind::IncompleteRow { index: 4 })
        );
    }

    #[test]
    fn test_repeated_index_rejected() {
        let drafts = vec![
            draft(2, "C1234.5", "把手", "ML01", ""),
            draft(2, "C1234.6", "盖板", "ML02", ""),
        ];
        assert_eq!(
            finalize_rows(&drafts, &mut trace()),
            Err(ErrorKind::NonMonotonicIndex { previous: 2, found: 2 })
        );
    }

    #[test]
    fn test_no_rows_left() {
        assert!(matches!(
            finalize_rows(&[RowDraft::new(1)], &mut trace()),
            Err(ErrorKind::NoRowsDetected(_))
        ));
    }

    #[test]
    fn test_split_part_rows_merged() {
        let drafts = vec![
            draft(3, "B22197.21.", "把手座", "ML01230271", ""),
            RowDraft {
                part_no: "2.1".into(),
                ..RowDraft::new(4)
            },
        ];
        let merged = merge_split_part_rows(drafts, &mut trace());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].index, 3);
        assert_eq!(merged[0].part_no, "B22197.21.2.1");
        assert_eq!(merged[0].mould_no, "ML01230271");
    }

    #[test]
    fn test_split_rows_with_different_moulds_kept_apart() {
        let drafts = vec![
            draft(1, "B22197.21.", "", "ML01", ""),
            draft(2, "2.1", "", "ML02", ""),
        ];
        assert_eq!(merge_split_part_rows(drafts, &mut trace()).len(), 2);
    }

    #[test]
    fn test_backfill_only_when_counts_match() {
        let text = "ML-A1-20240101-1 ML-B2-20240202-2";
        let mut drafts = vec![draft(1, "C1.23", "", "ML01", ""), draft(2, "C1.24", "", "ML02", "")];
        backfill_seals(&mut drafts, text, &mut trace());
        assert_eq!(drafts[0].seal_sample_no, "ML-A1-20240101-1");
        assert_eq!(drafts[1].seal_sample_no, "ML-B2-20240202-2");

        let mut three = vec![
            draft(1, "C1.23", "", "ML01", ""),
            draft(2, "C1.24", "", "ML02", ""),
            draft(3, "C1.25", "", "ML03", ""),
        ];
        backfill_seals(&mut three, text, &mut trace());
        assert!(three.iter().all(|d| d.seal_sample_no.is_empty()));
    }
}
