use serde::{Deserialize, Serialize};
use std::fmt;

/// One atomic run of text from a page's text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedFragment {
    pub text: String,
    pub left: f64,
    pub right: f64,
    /// Distance from the top of the page once the page is normalized.
    pub top: f64,
}

impl PositionedFragment {
    pub fn new(text: impl Into<String>, left: f64, right: f64, top: f64) -> Self {
        PositionedFragment {
            text: text.into(),
            left,
            right,
            top,
        }
    }

    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// Direction of the vertical axis of the source coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YAxis {
    /// `top` grows downwards (pdftotext, most layout tools).
    #[default]
    Down,
    /// `top` is a baseline measured from the page bottom (raw PDF user space).
    Up,
}

/// All fragments of one logical page plus its size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedPage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub y_axis: YAxis,
    pub fragments: Vec<PositionedFragment>,
}

impl PositionedPage {
    /// Fragments in top-down coordinates, blank ones dropped. Zero-width
    /// fragments get a nominal width of one unit.
    pub fn normalized_fragments(&self) -> Vec<PositionedFragment> {
        self.fragments
            .iter()
            .filter(|f| !f.text.trim().is_empty())
            .map(|f| {
                let top = match self.y_axis {
                    YAxis::Down => f.top,
                    YAxis::Up => self.height - f.top,
                };
                let right = if f.right > f.left { f.right } else { f.left + 1.0 };
                PositionedFragment::new(f.text.clone(), f.left, right, top)
            })
            .collect()
    }
}

/// Fragments sharing one baseline, sorted left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub vertical_position: f64,
    pub fragments: Vec<PositionedFragment>,
}

impl TextLine {
    /// Fragment texts joined with single spaces.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRow {
    pub index: u32,
    pub part_no: String,
    pub mould_name: String,
    pub mould_no: String,
    pub mould_factory: String,
    pub move_to: String,
    pub seal_sample_no: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "mould-transfer")]
    MouldTransfer,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::MouldTransfer => write!(f, "{}", crate::template::DOCUMENT_KIND),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub document_kind: DocumentKind,
    /// ISO date, `YYYY-MM-DD`.
    pub move_date: String,
    pub rows: Vec<ExtractedRow>,
}

/// Which pipeline produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    Geometry,
    Lines,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Geometry => write!(f, "geometry"),
            ExtractionMode::Lines => write!(f, "lines"),
        }
    }
}
