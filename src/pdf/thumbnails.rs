//! Low-resolution page previews for the sidebar

use super::document::{DocumentError, PdfDocument};
use super::types::{RasterImage, Rotation};
use super::viewport::Viewport;

/// Default scale factor for thumbnails
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.2;

/// One rendered preview
#[derive(Clone, Debug)]
pub struct Thumbnail {
    /// Page number (1-based)
    pub page_number: usize,
    pub rotation: Rotation,
    pub raster: RasterImage,
}

/// Ordered strip of thumbnails with a single selected entry
#[derive(Debug, Default)]
pub struct ThumbnailStrip {
    entries: Vec<Thumbnail>,
    selected_page: usize,
}

impl ThumbnailStrip {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry ahead of a regeneration pass
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, thumbnail: Thumbnail) {
        self.entries.push(thumbnail);
    }

    pub fn select(&mut self, page: usize) {
        self.selected_page = page;
    }

    #[must_use]
    pub fn selected_page(&self) -> usize {
        self.selected_page
    }

    #[must_use]
    pub fn is_selected(&self, thumbnail: &Thumbnail) -> bool {
        thumbnail.page_number == self.selected_page
    }

    /// The entry marked as selected, if it has been generated
    #[must_use]
    pub fn selected(&self) -> Option<&Thumbnail> {
        self.entries.iter().find(|t| self.is_selected(t))
    }

    #[must_use]
    pub fn entries(&self) -> &[Thumbnail] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Render a single preview at `scale`, honouring `rotation`
pub fn render_thumbnail(
    doc: &dyn PdfDocument,
    page_number: usize,
    scale: f32,
    rotation: Rotation,
) -> Result<Thumbnail, DocumentError> {
    let index = page_number.saturating_sub(1);
    doc.check_index(index)?;

    let viewport = Viewport::new(doc.page_box(index)?, scale, rotation);
    let raster = doc.rasterize(index, &viewport)?;

    Ok(Thumbnail {
        page_number,
        rotation,
        raster,
    })
}
