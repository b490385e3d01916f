use std::path::PathBuf;

/// Why an extraction run failed. Every kind is fatal for the document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("document is not a mould transfer notice: {0}")]
    UnrecognizedTemplate(String),

    #[error("could not find a date (YYYY-MM-DD) near the '{label}' label")]
    MissingDateField { label: String },

    #[error("table header not found: {0}")]
    MissingTableHeader(String),

    #[error("no table rows detected: {0}")]
    NoRowsDetected(String),

    #[error("too little text ({found} {unit}, need at least {required}); scanned documents need OCR")]
    InsufficientText {
        found: usize,
        required: usize,
        unit: &'static str,
    },

    #[error("row index {found} does not follow row {previous}")]
    NonMonotonicIndex { previous: u32, found: u32 },

    #[error("row {index} has neither a part number nor a mould number")]
    IncompleteRow { index: u32 },
}

/// A failed extraction. Line-mode failures carry the normalized input text
/// so callers can show what the engine actually saw.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}")]
pub struct ExtractionError {
    pub kind: ErrorKind,
    pub raw_text: Option<String>,
}

impl ExtractionError {
    pub fn with_raw_text(kind: ErrorKind, raw_text: impl Into<String>) -> Self {
        ExtractionError {
            kind,
            raw_text: Some(raw_text.into()),
        }
    }
}

impl From<ErrorKind> for ExtractionError {
    fn from(kind: ErrorKind) -> Self {
        ExtractionError {
            kind,
            raw_text: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MouldNoteError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("PDF reading failed: {0}")]
    Read(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_message_passes_through() {
        let err = ExtractionError::from(ErrorKind::NoRowsDetected("empty band".into()));
        assert_eq!(err.to_string(), "no table rows detected: empty band");
        assert!(err.raw_text.is_none());
    }

    #[test]
    fn test_raw_text_attached() {
        let err = ExtractionError::with_raw_text(
            ErrorKind::MissingDateField {
                label: "模具移模时间".into(),
            },
            "abc",
        );
        assert_eq!(err.raw_text.as_deref(), Some("abc"));
    }
}
