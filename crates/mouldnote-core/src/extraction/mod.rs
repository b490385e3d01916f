pub mod pdftotext;

use crate::error::MouldNoteError;
use crate::model::PositionedPage;

/// Content of the first page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// Positioned words, when the backend can provide them.
    pub page: Option<PositionedPage>,
    /// Reconstructed text with newline-separated lines.
    pub text: String,
}

impl PageContent {
    /// True when there are positioned fragments to run the geometry pipeline on.
    pub fn has_fragments(&self) -> bool {
        self.page.as_ref().is_some_and(|p| !p.fragments.is_empty())
    }
}

/// Trait for document reading backends.
pub trait DocumentSource: Send + Sync {
    /// Read the first page of a PDF from its bytes.
    fn read_page(&self, pdf_bytes: &[u8]) -> Result<PageContent, MouldNoteError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
