//! Mode A: table reconstruction from positioned text fragments.
//!
//! The pipeline runs line grouping, header location, column boundary
//! resolution, row anchor detection, and per-band cell collection, then
//! hands the collected drafts to the shared row finalizer.

pub mod anchors;
pub mod cells;
pub mod columns;
pub mod lines;

use crate::config::ExtractionConfig;
use crate::error::ErrorKind;
use crate::finalize::{finalize_rows, merge_split_part_rows, RowDraft};
use crate::model::{DocumentKind, ExtractionResult, PositionedPage};
use crate::normalize::date::extract_move_date;
use crate::normalize::fields::extract_seal_no;
use crate::normalize::shapes::{find_first, SEAL_MATCHERS};
use crate::normalize::{compact, remove_span};
use crate::template::{column_position, has_title_marker, ColumnKey, COLUMNS};
use crate::trace::{ExtractionTrace, TraceSeverity, TraceStepType};
use anchors::{index_anchors, mould_anchors, AnchorSource};
use cells::{collect_cells, row_bands};
use columns::{find_table_end, locate_headers, resolve_columns, COLUMN_COUNT};
use lines::group_lines;

pub fn extract_page(
    page: &PositionedPage,
    config: &ExtractionConfig,
    trace: &mut ExtractionTrace,
) -> Result<ExtractionResult, ErrorKind> {
    let fragments = page.normalized_fragments();
    if fragments.len() < config.min_fragments {
        return Err(ErrorKind::InsufficientText {
            found: fragments.len(),
            required: config.min_fragments,
            unit: "fragments",
        });
    }

    let lines = group_lines(&fragments, config.line_tolerance);
    trace.step(
        TraceStepType::GroupLines,
        format!("{} fragments in {} lines", fragments.len(), lines.len()),
    );

    let full_text = lines
        .iter()
        .map(|l| l.text())
        .collect::<Vec<_>>()
        .join("\n");
    if !has_title_marker(&compact(&full_text)) {
        return Err(ErrorKind::UnrecognizedTemplate(
            "no mould transfer notice title on the page".into(),
        ));
    }

    let date = extract_move_date(&full_text, config)?;
    trace.step(
        TraceStepType::ExtractDate,
        format!("{} ({})", date.value, date.strategy),
    );

    let headers = locate_headers(&lines);
    trace.step(
        TraceStepType::LocateHeaders,
        format!(
            "found {} of {} headers",
            headers.iter().flatten().count(),
            COLUMNS.len()
        ),
    );
    let layout = resolve_columns(&headers, page.width, config)?;
    for &col in &layout.extrapolated {
        trace.warn(
            TraceSeverity::Important,
            None,
            format!("header '{}' missing, column boundary extrapolated", COLUMNS[col].label),
        );
    }
    let table_end = find_table_end(&fragments, layout.table_start, page.height);
    trace.step(
        TraceStepType::ResolveColumns,
        format!(
            "boundaries {:?}, table {:.1}..{:.1}",
            layout.boundaries, layout.table_start, table_end
        ),
    );

    let mut anchors = index_anchors(&fragments, &layout, table_end, config.index_dedup_tolerance);
    let mut source = AnchorSource::IndexGutter;
    if anchors.is_empty() {
        anchors = mould_anchors(
            &fragments,
            &layout,
            table_end,
            config.mould_anchor_dedup_tolerance,
        );
        source = AnchorSource::MouldNumber;
        trace.warn(
            TraceSeverity::Important,
            None,
            "no row ordinals in the index gutter, anchoring rows on mould numbers",
        );
    }
    if anchors.is_empty() {
        return Err(ErrorKind::NoRowsDetected(
            "no row ordinals or mould numbers inside the table".into(),
        ));
    }
    trace.step(
        TraceStepType::DetectAnchors,
        format!("{} anchors from {:?}", anchors.len(), source),
    );

    let bands = row_bands(&anchors, layout.table_start, table_end);
    let mut drafts = Vec::with_capacity(bands.len());
    for band in &bands {
        let cells = collect_cells(&fragments, band, &layout, config.line_tolerance);
        drafts.push(draft_from_cells(band.index, cells, trace));
    }
    trace.step(
        TraceStepType::CollectCells,
        format!("{} row bands collected", drafts.len()),
    );

    let drafts = merge_split_part_rows(drafts, trace);
    let rows = finalize_rows(&drafts, trace)?;

    Ok(ExtractionResult {
        document_kind: DocumentKind::MouldTransfer,
        move_date: date.value,
        rows,
    })
}

fn draft_from_cells(
    index: u32,
    cells: [String; COLUMN_COUNT],
    trace: &mut ExtractionTrace,
) -> RowDraft {
    let [part_no, mould_name, mould_no, mould_factory, mut move_to, seal_cell] = cells;

    let seal_sample_no = match extract_seal_no(&seal_cell) {
        Some(seal) => seal,
        None => match find_first(&SEAL_MATCHERS, &move_to) {
            Some(m) => {
                trace.warn(
                    TraceSeverity::Info,
                    Some(index),
                    format!(
                        "seal {} found in the '{}' cell",
                        m.value,
                        COLUMNS[column_position(ColumnKey::MoveTo)].label
                    ),
                );
                move_to = remove_span(&move_to, m.start, m.end);
                m.value
            }
            None => seal_cell,
        },
    };

    RowDraft {
        index,
        part_no,
        mould_name,
        mould_no,
        mould_factory,
        move_to,
        seal_sample_no,
    }
}
