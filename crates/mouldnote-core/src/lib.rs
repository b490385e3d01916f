pub mod config;
pub mod error;
pub mod extraction;
pub mod finalize;
pub mod geometry;
pub mod model;
pub mod normalize;
pub mod parsing;
pub mod template;
pub mod trace;

use config::ExtractionConfig;
use error::{ErrorKind, ExtractionError, MouldNoteError};
use extraction::DocumentSource;
use model::{ExtractionMode, ExtractionResult, PositionedPage};
use serde::{Deserialize, Serialize};
use trace::{ExtractionTrace, TraceSeverity};

/// One way of turning a page into an [`ExtractionResult`].
pub trait TableExtractor {
    type Input: ?Sized;

    fn mode(&self) -> ExtractionMode;

    /// Run the extraction and keep a record of what it did.
    fn extract_traced(
        &self,
        input: &Self::Input,
    ) -> Result<(ExtractionResult, ExtractionTrace), ExtractionError>;

    fn extract(&self, input: &Self::Input) -> Result<ExtractionResult, ExtractionError> {
        self.extract_traced(input).map(|(result, _)| result)
    }
}

/// Mode A: positioned fragments of one page.
#[derive(Debug, Clone, Default)]
pub struct GeometryExtractor {
    pub config: ExtractionConfig,
}

impl GeometryExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        GeometryExtractor { config }
    }
}

impl TableExtractor for GeometryExtractor {
    type Input = PositionedPage;

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Geometry
    }

    fn extract_traced(
        &self,
        page: &PositionedPage,
    ) -> Result<(ExtractionResult, ExtractionTrace), ExtractionError> {
        let mut trace = ExtractionTrace::new(self.mode());
        let result = geometry::extract_page(page, &self.config, &mut trace)?;
        Ok((result, trace))
    }
}

/// Mode B: reconstructed text, lines separated by `\n`.
#[derive(Debug, Clone, Default)]
pub struct LineExtractor {
    pub config: ExtractionConfig,
}

impl LineExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        LineExtractor { config }
    }
}

impl TableExtractor for LineExtractor {
    type Input = str;

    fn mode(&self) -> ExtractionMode {
        ExtractionMode::Lines
    }

    fn extract_traced(
        &self,
        text: &str,
    ) -> Result<(ExtractionResult, ExtractionTrace), ExtractionError> {
        let mut trace = ExtractionTrace::new(self.mode());
        let result = parsing::extract_text(text, &self.config, &mut trace)?;
        Ok((result, trace))
    }
}

/// Extract from positioned fragments (mode A).
pub fn extract_positioned(
    page: &PositionedPage,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, ExtractionError> {
    GeometryExtractor::new(config.clone()).extract(page)
}

/// Extract from reconstructed text (mode B).
pub fn extract_text(text: &str, config: &ExtractionConfig) -> Result<ExtractionResult, ExtractionError> {
    LineExtractor::new(config.clone()).extract(text)
}

/// Which pipeline [`extract_pdf`] runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePreference {
    /// Geometry when word boxes exist, falling back to lines when the
    /// table cannot be found geometrically.
    #[default]
    Auto,
    Geometry,
    Lines,
}

/// Main API entry point: read a PDF's first page and extract the notice.
pub fn extract_pdf(
    pdf_bytes: &[u8],
    source: &dyn DocumentSource,
    config: &ExtractionConfig,
    preference: ModePreference,
) -> Result<(ExtractionResult, ExtractionTrace), MouldNoteError> {
    let content = source.read_page(pdf_bytes)?;
    log::debug!(
        "read page via {} ({} text bytes)",
        source.backend_name(),
        content.text.len()
    );

    let geometry = GeometryExtractor::new(config.clone());
    let lines = LineExtractor::new(config.clone());

    match (preference, &content.page) {
        (ModePreference::Lines, _) => Ok(lines.extract_traced(&content.text)?),
        (ModePreference::Geometry, Some(page)) => Ok(geometry.extract_traced(page)?),
        (ModePreference::Geometry, None) => Err(ExtractionError::from(ErrorKind::InsufficientText {
            found: 0,
            required: config.min_fragments,
            unit: "fragments",
        })
        .into()),
        (ModePreference::Auto, Some(page)) if content.has_fragments() => {
            match geometry.extract_traced(page) {
                Err(err) if is_layout_failure(&err.kind) => {
                    log::warn!("geometry extraction failed ({err}), retrying on text lines");
                    let (result, mut trace) = lines.extract_traced(&content.text)?;
                    trace.warn(
                        TraceSeverity::Important,
                        None,
                        format!("geometry pipeline failed: {err}"),
                    );
                    Ok((result, trace))
                }
                other => Ok(other?),
            }
        }
        (ModePreference::Auto, _) => Ok(lines.extract_traced(&content.text)?),
    }
}

fn is_layout_failure(kind: &ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::MissingTableHeader(_) | ErrorKind::NoRowsDetected(_)
    )
}
