use crate::model::ExtractionMode;
use serde::{Deserialize, Serialize};

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    /// The result may be wrong; a person should look at it.
    Important,
    /// A recovered irregularity.
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStepType {
    GroupLines,
    LocateHeaders,
    ResolveColumns,
    DetectAnchors,
    CollectCells,
    ParseLines,
    ColumnBlocks,
    SectionScan,
    ExtractDate,
    FinalizeRows,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub step_type: TraceStepType,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u32>,
    pub message: String,
    pub severity: TraceSeverity,
}

/// What one extraction run did, step by step. Recording into a trace never
/// changes the extraction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionTrace {
    pub trace_schema_version: String,
    pub mode: ExtractionMode,
    pub steps: Vec<TraceStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TraceWarning>,
}

impl ExtractionTrace {
    pub fn new(mode: ExtractionMode) -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            mode,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn step(&mut self, step_type: TraceStepType, message: impl Into<String>) {
        let message = message.into();
        log::debug!("[{}] {:?}: {}", self.mode, step_type, message);
        self.steps.push(TraceStep { step_type, message });
    }

    /// Record a degradation. Info-level notes are logged at debug level,
    /// important ones as warnings.
    pub fn warn(&mut self, severity: TraceSeverity, row_index: Option<u32>, message: impl Into<String>) {
        let message = message.into();
        match severity {
            TraceSeverity::Info => log::debug!("[{}] {}", self.mode, message),
            TraceSeverity::Important => log::warn!("[{}] {}", self.mode, message),
        }
        self.warnings.push(TraceWarning {
            row_index,
            message,
            severity,
        });
    }

    pub fn has_step(&self, step_type: TraceStepType) -> bool {
        self.steps.iter().any(|s| s.step_type == step_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_records_steps_in_order() {
        let mut trace = ExtractionTrace::new(ExtractionMode::Lines);
        trace.step(TraceStepType::ExtractDate, "2024-03-05");
        trace.step(TraceStepType::ParseLines, "2 rows");
        assert_eq!(trace.steps.len(), 2);
        assert_eq!(trace.steps[0].step_type, TraceStepType::ExtractDate);
        assert!(trace.has_step(TraceStepType::ParseLines));
        assert!(!trace.has_step(TraceStepType::SectionScan));
    }

    #[test]
    fn test_trace_serializes_without_empty_warnings() {
        let mut trace = ExtractionTrace::new(ExtractionMode::Geometry);
        trace.step(TraceStepType::GroupLines, "12 lines");
        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains("\"mode\":\"geometry\""));
        assert!(json.contains("\"group_lines\""));
        assert!(!json.contains("warnings"));

        trace.warn(TraceSeverity::Important, Some(2), "seal taken from destination cell");
        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains("\"row_index\":2"));
        assert!(json.contains("\"important\""));
    }

    #[test]
    fn test_severity_names() {
        let parsed: Vec<TraceSeverity> = serde_json::from_str(r#"["important", "info"]"#).unwrap();
        assert_eq!(parsed, vec![TraceSeverity::Important, TraceSeverity::Info]);
        assert!(serde_json::from_str::<TraceSeverity>(r#""critical""#).is_err());
    }
}
