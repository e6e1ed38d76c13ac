//! MuPDF-backed implementation of the document seam

use log::debug;
use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, MetadataName, Page, Pixmap, TextPageFlags};

use super::document::{DocumentError, DocumentParser, PdfDocument};
use super::types::{Destination, OutlineItem, PageBox, RasterImage, TextRun};
use super::viewport::{Transform, Viewport, compose};

impl From<mupdf::error::Error> for DocumentError {
    fn from(e: mupdf::error::Error) -> Self {
        DocumentError::backend(e.to_string())
    }
}

/// Parses PDF bytes with MuPDF
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfParser;

impl DocumentParser for MupdfParser {
    fn parse(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, DocumentError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(DocumentError::Invalid("missing %PDF header".to_string()));
        }
        let doc = Document::from_bytes(bytes, "application/pdf")
            .map_err(|e| DocumentError::Invalid(e.to_string()))?;
        let page_count = usize::try_from(doc.page_count()?)
            .map_err(|_| DocumentError::Invalid("negative page count".to_string()))?;
        debug!("MuPDF parsed {} bytes, {page_count} pages", bytes.len());
        Ok(Box::new(MupdfDocument { doc, page_count }))
    }
}

pub struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl MupdfDocument {
    fn page(&self, index: usize) -> Result<Page, DocumentError> {
        self.check_index(index)?;
        let index = i32::try_from(index).map_err(|_| DocumentError::PageOutOfRange {
            index,
            count: self.page_count,
        })?;
        Ok(self.doc.load_page(index)?)
    }
}

fn page_box_of(page: &Page) -> Result<PageBox, DocumentError> {
    let bounds = page.bounds()?;
    Ok(PageBox::sized(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
}

/// MuPDF lays pages out y-down from the top-left corner; flip into the
/// y-up space the viewport transform expects.
fn device_matrix(viewport: &Viewport, page_height: f32) -> Matrix {
    let flip: Transform = [1.0, 0.0, 0.0, -1.0, 0.0, page_height];
    let [a, b, c, d, e, f] = compose(&viewport.transform, &flip);
    Matrix::new(a, b, c, d, e, f)
}

fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<RasterImage, DocumentError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(DocumentError::backend(format!(
            "unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(DocumentError::backend("pixmap buffer size mismatch"));
    }

    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        for px in row.chunks_exact(n) {
            pixels.extend_from_slice(&px[..3]);
            pixels.push(if n >= 4 { px[3] } else { 0xFF });
        }
    }

    Ok(RasterImage {
        width: width as u32,
        height: height as u32,
        pixels,
    })
}

/// `#nameddest=` link for `name`, percent-encoding anything outside the
/// unreserved URI set
fn named_dest_uri(name: &str) -> String {
    let mut uri = String::from("#nameddest=");
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            uri.push(char::from(byte));
        } else {
            uri.push_str(&format!("%{byte:02X}"));
        }
    }
    uri
}

fn convert_outline(outlines: &[mupdf::Outline]) -> Vec<OutlineItem> {
    outlines
        .iter()
        .map(|outline| {
            let destination = if let Some(dest) = outline.dest {
                Some(Destination::PageIndex(dest.loc.page_number as usize))
            } else {
                outline
                    .uri
                    .as_deref()
                    .and_then(|uri| uri.strip_prefix('#'))
                    .map(|name| Destination::Named(name.to_string()))
            };
            OutlineItem::new(outline.title.trim(), destination)
                .with_children(convert_outline(&outline.down))
        })
        .collect()
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn title(&self) -> Result<Option<String>, DocumentError> {
        let title = self.doc.metadata(MetadataName::Title)?;
        Ok(Some(title).filter(|t| !t.trim().is_empty()))
    }

    fn page_box(&self, index: usize) -> Result<PageBox, DocumentError> {
        page_box_of(&self.page(index)?)
    }

    fn rasterize(&self, index: usize, viewport: &Viewport) -> Result<RasterImage, DocumentError> {
        let page = self.page(index)?;
        let page_box = page_box_of(&page)?;
        let matrix = device_matrix(viewport, page_box.height());
        let pixmap = page.to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)?;
        pixmap_to_rgba(&pixmap)
    }

    fn text_content(&self, index: usize) -> Result<Vec<TextRun>, DocumentError> {
        let page = self.page(index)?;
        let page_height = page_box_of(&page)?.height();
        let text_page = page.to_text_page(TextPageFlags::empty())?;

        let mut runs = Vec::new();
        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let mut chars = line.chars();
                let Some(first) = chars.next() else {
                    continue;
                };
                let origin = first.origin();
                let size = first.size();
                let text: String = std::iter::once(first)
                    .chain(chars)
                    .filter_map(|ch| ch.char())
                    .collect();
                if text.trim().is_empty() {
                    continue;
                }
                let bbox = line.bounds();
                runs.push(TextRun {
                    text,
                    transform: [size, 0.0, 0.0, size, origin.x, page_height - origin.y],
                    width: bbox.x1 - bbox.x0,
                    height: size,
                    font_name: None,
                });
            }
        }
        Ok(runs)
    }

    fn outline(&self) -> Result<Vec<OutlineItem>, DocumentError> {
        Ok(convert_outline(&self.doc.outlines()?))
    }

    fn resolve_destination(&self, destination: &Destination) -> Result<usize, DocumentError> {
        match destination {
            Destination::PageIndex(index) => {
                self.check_index(*index)?;
                Ok(*index)
            }
            Destination::Named(name) => {
                let index = match self.doc.resolve_link(&named_dest_uri(name)) {
                    Ok(Some(location)) => location.page_number as usize,
                    Ok(None) => return Err(DocumentError::UnresolvedDestination(name.clone())),
                    Err(e) => {
                        debug!("MuPDF could not resolve destination {name:?}: {e}");
                        return Err(DocumentError::UnresolvedDestination(name.clone()));
                    }
                };
                self.check_index(index)?;
                Ok(index)
            }
            // Indirect targets are resolved while MuPDF builds the outline
            Destination::Reference { object, generation } => Err(
                DocumentError::UnresolvedDestination(format!("{object} {generation} R")),
            ),
        }
    }
}
