use crate::error::MouldNoteError;
use crate::extraction::{DocumentSource, PageContent};
use crate::model::{PositionedFragment, PositionedPage, YAxis};
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// Document source backed by pdftotext (from poppler-utils).
///
/// Runs `pdftotext -layout` for the text and `pdftotext -bbox` for word
/// boxes, first page only. Word boxes come in top-down coordinates.
pub struct PdftotextSource;

impl PdftotextSource {
    pub fn new() -> Self {
        PdftotextSource
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSource for PdftotextSource {
    fn read_page(&self, pdf_bytes: &[u8]) -> Result<PageContent, MouldNoteError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| MouldNoteError::Read(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| MouldNoteError::Read(e.to_string()))?;
        let tmp_path = tmpfile.path().to_path_buf();

        let text = run_pdftotext(&tmp_path, "-layout")?;
        // Form feed ends each page.
        let text = text.split('\x0c').next().unwrap_or_default().to_string();

        let xml = run_pdftotext(&tmp_path, "-bbox")?;
        let page = parse_bbox_xml(&xml);
        log::debug!(
            "pdftotext: {} text lines, {} words",
            text.lines().count(),
            page.as_ref().map_or(0, |p| p.fragments.len())
        );

        Ok(PageContent { page, text })
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn run_pdftotext(pdf_path: &Path, mode_flag: &str) -> Result<String, MouldNoteError> {
    let output = Command::new("pdftotext")
        .args(["-f", "1", "-l", "1", "-enc", "UTF-8"])
        .arg(mode_flag)
        .arg(pdf_path)
        .arg("-") // output to stdout
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MouldNoteError::PdftotextNotFound
            } else {
                MouldNoteError::Read(format!("pdftotext {mode_flag} failed: {e}"))
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(MouldNoteError::PdftotextFailed { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse the first `<page>` of `pdftotext -bbox` output into positioned words.
fn parse_bbox_xml(xml: &str) -> Option<PositionedPage> {
    let mut page: Option<PositionedPage> = None;

    for raw in xml.lines() {
        let line = raw.trim();

        if line.starts_with("<page ") {
            if page.is_some() {
                break;
            }
            page = Some(PositionedPage {
                width: parse_attr_f64(line, "width")?,
                height: parse_attr_f64(line, "height")?,
                y_axis: YAxis::Down,
                fragments: Vec::new(),
            });
            continue;
        }

        if line.starts_with("<word ") {
            let (Some(current), Some(fragment)) = (page.as_mut(), parse_word(line)) else {
                continue;
            };
            current.fragments.push(fragment);
        }
    }

    page
}

fn parse_word(tag: &str) -> Option<PositionedFragment> {
    let text = decode_xml_entities(parse_word_text(tag)?);
    if text.trim().is_empty() {
        return None;
    }
    Some(PositionedFragment::new(
        text,
        parse_attr_f64(tag, "xMin")?,
        parse_attr_f64(tag, "xMax")?,
        parse_attr_f64(tag, "yMin")?,
    ))
}

fn parse_attr_f64(tag: &str, name: &str) -> Option<f64> {
    parse_attr(tag, name)?.parse().ok()
}

fn parse_attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

fn parse_word_text(word_tag: &str) -> Option<&str> {
    let start = word_tag.find('>')? + 1;
    let end = word_tag.rfind("</word>")?;
    word_tag.get(start..end)
}

fn decode_xml_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
