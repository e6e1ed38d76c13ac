//! Document backend seam
//!
//! Parsing, rasterisation and text extraction are delegated to an external
//! PDF library. The engine only sees these two traits.

use super::types::{Destination, OutlineItem, PageBox, RasterImage, TextRun};
use super::viewport::Viewport;

/// Errors reported by a document backend
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid PDF: {0}")]
    Invalid(String),

    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("destination could not be resolved: {0}")]
    UnresolvedDestination(String),

    #[error("PDF engine: {detail}")]
    Backend { detail: String },
}

impl DocumentError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend { detail: msg.into() }
    }
}

/// A parsed document. Page indices are 0-based at this seam.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Title from the document info dictionary, if any
    fn title(&self) -> Result<Option<String>, DocumentError>;

    /// Unscaled, unrotated page box
    fn page_box(&self, index: usize) -> Result<PageBox, DocumentError>;

    /// Rasterise a page into a surface sized to `viewport`
    fn rasterize(&self, index: usize, viewport: &Viewport) -> Result<RasterImage, DocumentError>;

    /// Text runs in source order
    fn text_content(&self, index: usize) -> Result<Vec<TextRun>, DocumentError>;

    /// Outline tree; an empty vector when the document has none
    fn outline(&self) -> Result<Vec<OutlineItem>, DocumentError>;

    /// Resolve an outline destination to a 0-based page index
    fn resolve_destination(&self, destination: &Destination) -> Result<usize, DocumentError>;

    fn check_index(&self, index: usize) -> Result<(), DocumentError> {
        let count = self.page_count();
        if index < count {
            Ok(())
        } else {
            Err(DocumentError::PageOutOfRange { index, count })
        }
    }
}

/// Turns raw bytes into a [`PdfDocument`]
pub trait DocumentParser {
    fn parse(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, DocumentError>;
}
