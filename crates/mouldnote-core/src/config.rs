use crate::error::MouldNoteError;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Tuned against one family of mould transfer notices. Re-validate before
// reusing them on other table layouts.
pub const DEFAULT_LINE_TOLERANCE: f64 = 3.0;
/// Looser than `DEFAULT_LINE_TOLERANCE`: one ordinal printed
/// twice (or split across two text runs) a few units apart still marks a
/// single row, while real rows sit well over 6 units apart.
pub const DEFAULT_INDEX_DEDUP_TOLERANCE: f64 = 6.0;
pub const DEFAULT_MOULD_ANCHOR_DEDUP_TOLERANCE: f64 = 10.0;
pub const DEFAULT_MISSING_COLUMN_OFFSET: f64 = 120.0;
pub const DEFAULT_HEADER_GAP: f64 = 4.0;
pub const DEFAULT_GUTTER_MARGIN: f64 = 2.0;
pub const DEFAULT_MIN_FRAGMENTS: usize = 30;
pub const DEFAULT_MIN_TEXT_CHARS: usize = 40;
pub const DEFAULT_DATE_WINDOW_BEFORE: usize = 120;
pub const DEFAULT_DATE_WINDOW_AFTER: usize = 180;
pub const DEFAULT_DATE_LINE_RADIUS: usize = 3;

/// Tunable constants of both extraction pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Max vertical distance for two fragments to share a line (also used for cell sub-lines).
    pub line_tolerance: f64,
    /// Index-gutter digits closer than this collapse into one row anchor.
    pub index_dedup_tolerance: f64,
    /// Mould-number anchors closer than this collapse into one row anchor.
    pub mould_anchor_dedup_tolerance: f64,
    /// Horizontal offset used to place a column whose header was not found.
    pub missing_column_offset: f64,
    /// Data rows start this far below the lowest header.
    pub header_gap: f64,
    /// Subtracted from the first header's left edge to form the table's left boundary.
    pub gutter_margin: f64,
    pub min_fragments: usize,
    pub min_text_chars: usize,
    pub date_window_before: usize,
    pub date_window_after: usize,
    pub date_line_radius: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            index_dedup_tolerance: DEFAULT_INDEX_DEDUP_TOLERANCE,
            mould_anchor_dedup_tolerance: DEFAULT_MOULD_ANCHOR_DEDUP_TOLERANCE,
            missing_column_offset: DEFAULT_MISSING_COLUMN_OFFSET,
            header_gap: DEFAULT_HEADER_GAP,
            gutter_margin: DEFAULT_GUTTER_MARGIN,
            min_fragments: DEFAULT_MIN_FRAGMENTS,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            date_window_before: DEFAULT_DATE_WINDOW_BEFORE,
            date_window_after: DEFAULT_DATE_WINDOW_AFTER,
            date_line_radius: DEFAULT_DATE_LINE_RADIUS,
        }
    }
}

/// Load an extraction config from a JSON file. Missing fields keep their defaults.
pub fn load_config(path: &Path) -> Result<ExtractionConfig, MouldNoteError> {
    let content = std::fs::read_to_string(path).map_err(|e| MouldNoteError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse an extraction config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<ExtractionConfig, MouldNoteError> {
    let config: ExtractionConfig =
        serde_json::from_str(json).map_err(|e| MouldNoteError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that every distance is a positive finite number.
pub fn validate_config(config: &ExtractionConfig) -> Result<(), MouldNoteError> {
    let distances = [
        ("line_tolerance", config.line_tolerance),
        ("index_dedup_tolerance", config.index_dedup_tolerance),
        (
            "mould_anchor_dedup_tolerance",
            config.mould_anchor_dedup_tolerance,
        ),
        ("missing_column_offset", config.missing_column_offset),
        ("header_gap", config.header_gap),
    ];
    for (name, value) in distances {
        if !value.is_finite() || value <= 0.0 {
            return Err(MouldNoteError::ConfigInvalid(format!(
                "{name} must be a positive number (got {value})"
            )));
        }
    }

    if !config.gutter_margin.is_finite() || config.gutter_margin < 0.0 {
        return Err(MouldNoteError::ConfigInvalid(format!(
            "gutter_margin must not be negative (got {})",
            config.gutter_margin
        )));
    }

    if config.date_window_before == 0 && config.date_window_after == 0 {
        return Err(MouldNoteError::ConfigInvalid(
            "date window must not be empty".into(),
        ));
    }

    Ok(())
}
