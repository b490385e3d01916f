//! Mode B: table reconstruction from reconstructed text lines.

pub mod columnar;
pub mod header;
pub mod rows;
pub mod section;

use crate::config::ExtractionConfig;
use crate::error::{ErrorKind, ExtractionError};
use crate::finalize::{backfill_seals, finalize_rows, merge_split_part_rows, RowDraft};
use crate::model::{DocumentKind, ExtractionResult};
use crate::normalize::date::extract_move_date;
use crate::normalize::{compact, normalize_text};
use crate::template::{has_title_marker, COLUMNS};
use crate::trace::{ExtractionTrace, TraceSeverity, TraceStepType};
use regex::Regex;
use std::sync::LazyLock;

/// `ML-<code>-YYYYMM` at the end of a line whose day and sequence wrapped.
static SEAL_CUT_IN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ML\s*[\-－—–‑−]\s*[A-Z0-9]+\s*[\-－—–‑−]\s*\d{6}$").expect("valid pattern")
});

static DAY_AND_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\s*[\-－—–‑−]\s*\d+").expect("valid pattern"));

/// `ML-<code>-YYYYMMDD` at the end of a line whose sequence wrapped.
static SEAL_CUT_AFTER_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ML\s*[\-－—–‑−]\s*[A-Z0-9]+\s*[\-－—–‑−]\s*\d{8}$").expect("valid pattern")
});

static SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-－—–‑−]?\s*\d{3,}").expect("valid pattern"));

/// Glue seal numbers that a line break cut in two back together.
pub fn rejoin_split_seal_lines(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let next = line.trim();
        if let Some(prev) = out.last_mut() {
            let head = prev.trim_end();
            if SEAL_CUT_IN_DATE.is_match(head) && DAY_AND_SEQUENCE.is_match(next) {
                *prev = format!("{head}{next}");
                continue;
            }
            if SEAL_CUT_AFTER_DATE.is_match(head) && SEQUENCE.is_match(next) {
                let glue = if next.starts_with(|c: char| c.is_ascii_digit()) { "-" } else { "" };
                *prev = format!("{head}{glue}{next}");
                continue;
            }
        }
        out.push(line);
    }
    out
}

/// Extract the notice from reconstructed text. Failures carry the
/// normalized text.
pub fn extract_text(
    text: &str,
    config: &ExtractionConfig,
    trace: &mut ExtractionTrace,
) -> Result<ExtractionResult, ExtractionError> {
    let normalized = normalize_text(text);
    extract_normalized(&normalized, config, trace)
        .map_err(|kind| ExtractionError::with_raw_text(kind, normalized.as_str()))
}

fn extract_normalized(
    text: &str,
    config: &ExtractionConfig,
    trace: &mut ExtractionTrace,
) -> Result<ExtractionResult, ErrorKind> {
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    if visible < config.min_text_chars {
        return Err(ErrorKind::InsufficientText {
            found: visible,
            required: config.min_text_chars,
            unit: "characters",
        });
    }
    if !has_title_marker(&compact(text)) {
        return Err(ErrorKind::UnrecognizedTemplate(
            "no mould transfer notice title in the text".into(),
        ));
    }

    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let date = extract_move_date(text, config)?;
    trace.step(
        TraceStepType::ExtractDate,
        format!("{} ({})", date.value, date.strategy),
    );

    let drafts = parse_table(text, &lines, trace)?;
    let mut drafts = merge_split_part_rows(drafts, trace);
    backfill_seals(&mut drafts, text, trace);
    let rows = finalize_rows(&drafts, trace)?;

    Ok(ExtractionResult {
        document_kind: DocumentKind::MouldTransfer,
        move_date: date.value,
        rows,
    })
}

fn accept_column_blocks(drafts: &[RowDraft]) -> bool {
    let n = drafts.len();
    let parts = drafts.iter().filter(|d| !d.part_no.is_empty()).count();
    let moulds = drafts.iter().filter(|d| !d.mould_no.is_empty()).count();
    n > 0 && parts * 2 >= n && moulds * 2 >= n
}

fn parse_table(
    text: &str,
    lines: &[&str],
    trace: &mut ExtractionTrace,
) -> Result<Vec<RowDraft>, ErrorKind> {
    if let Some(drafts) = columnar::parse_column_blocks(lines) {
        if accept_column_blocks(&drafts) {
            trace.step(
                TraceStepType::ColumnBlocks,
                format!("{} rows from column blocks", drafts.len()),
            );
            return Ok(drafts);
        }
        trace.warn(
            TraceSeverity::Info,
            None,
            "column-block layout rejected, too few part or mould numbers",
        );
    }

    let Some(header_at) = header::find_header_line(lines) else {
        trace.warn(
            TraceSeverity::Important,
            None,
            "table header line not found, scanning the whole section",
        );
        let drafts = section::scan_section(text);
        trace.step(
            TraceStepType::SectionScan,
            format!("{} rows from section scan", drafts.len()),
        );
        if drafts.is_empty() {
            return Err(ErrorKind::MissingTableHeader(format!(
                "no line carries the '{}' label and no part/mould number pairs were found",
                COLUMNS[0].label
            )));
        }
        return Ok(drafts);
    };

    let mut data: Vec<String> = Vec::with_capacity(lines.len() - header_at);
    let residual = header::strip_header_labels(lines[header_at]);
    if !residual.is_empty() {
        data.push(residual);
    }
    data.extend(lines[header_at + 1..].iter().map(|l| l.to_string()));
    let data = rejoin_split_seal_lines(data);

    let drafts = rows::parse_rows(&data);
    trace.step(
        TraceStepType::ParseLines,
        format!(
            "header on line {}, {} rows from {} lines",
            header_at + 1,
            drafts.len(),
            data.len()
        ),
    );
    if !drafts.is_empty() {
        return Ok(drafts);
    }

    trace.warn(
        TraceSeverity::Important,
        None,
        "no rows below the header line, scanning the whole section",
    );
    let drafts = section::scan_section(text);
    trace.step(
        TraceStepType::SectionScan,
        format!("{} rows from section scan", drafts.len()),
    );
    if drafts.is_empty() {
        return Err(ErrorKind::NoRowsDetected(
            "header found but no row could be segmented below it".into(),
        ));
    }
    Ok(drafts)
}
