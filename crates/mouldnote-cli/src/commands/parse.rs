use mouldnote_core::config::{load_config, ExtractionConfig};
use mouldnote_core::error::MouldNoteError;
use mouldnote_core::extraction::pdftotext::PdftotextSource;
use mouldnote_core::model::{ExtractionResult, PositionedPage};
use mouldnote_core::trace::ExtractionTrace;
use mouldnote_core::{GeometryExtractor, LineExtractor, ModePreference, TableExtractor};
use std::path::{Path, PathBuf};

use crate::output;

pub struct ParseArgs {
    pub input_file: PathBuf,
    pub preference: ModePreference,
    pub output_format: String,
    pub output_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub show_trace: bool,
}

pub fn run(args: ParseArgs) -> Result<(), MouldNoteError> {
    let config = match &args.config_file {
        Some(path) => load_config(path)?,
        None => ExtractionConfig::default(),
    };

    let (result, trace) = match extract_file(&args.input_file, &config, args.preference) {
        Ok(extracted) => extracted,
        Err(MouldNoteError::Extraction(err)) => {
            log::debug!("extraction of {} failed: {err}", args.input_file.display());
            if let (true, Some(raw)) = (args.show_trace, err.raw_text.as_deref()) {
                eprintln!("--- text seen by the extractor ---\n{raw}\n---");
            }
            return Err(err.into());
        }
        Err(e) => return Err(e),
    };

    log::info!(
        "{}: {} row(s) via {} mode, {} trace warning(s)",
        args.input_file.display(),
        result.rows.len(),
        trace.mode,
        trace.warnings.len()
    );
    if args.show_trace {
        output::table::print_trace(&trace);
    }

    match args.output_file {
        Some(path) => {
            // Files always get JSON.
            output::json::write(&result, &path)?;
            eprintln!(
                "Extracted {} row(s) via {}, written to {}",
                result.rows.len(),
                trace.mode,
                path.display()
            );
        }
        None => match args.output_format.as_str() {
            "json" => output::json::print(&result)?,
            _ => output::table::print(&result),
        },
    }

    Ok(())
}

/// Dispatch on the file extension: PDFs go through pdftotext, `.json` files
/// hold a positioned page, anything else is read as reconstructed text.
fn extract_file(
    path: &Path,
    config: &ExtractionConfig,
    preference: ModePreference,
) -> Result<(ExtractionResult, ExtractionTrace), MouldNoteError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => {
            log::debug!("reading {} through pdftotext ({preference:?})", path.display());
            let bytes = std::fs::read(path)?;
            let source = PdftotextSource::new();
            mouldnote_core::extract_pdf(&bytes, &source, config, preference)
        }
        Some("json") => {
            log::debug!("reading {} as a positioned page", path.display());
            let content = std::fs::read_to_string(path)?;
            let page: PositionedPage = serde_json::from_str(&content)?;
            Ok(GeometryExtractor::new(config.clone()).extract_traced(&page)?)
        }
        _ => {
            log::debug!("reading {} as text lines", path.display());
            let text = std::fs::read_to_string(path)?;
            Ok(LineExtractor::new(config.clone()).extract_traced(&text)?)
        }
    }
}
