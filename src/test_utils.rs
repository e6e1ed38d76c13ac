//! In-memory fakes for exercising the engine without a PDF backend.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration tests under `tests/`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::anyhow;

use crate::error::ViewerError;
use crate::events::NotificationListener;
use crate::host::HostServices;
use crate::loader::{LoadedDocument, SourceFetcher};
use crate::pdf::{
    Destination, DocumentError, DocumentParser, OutlineItem, PageBox, PdfDocument, RasterImage,
    TextRun, Viewport,
};
use crate::protocol::Notification;

/// US Letter, the page size every fake page uses
pub const LETTER: PageBox = PageBox::sized(612.0, 792.0);

const LINE_LEFT: f32 = 72.0;
const FIRST_BASELINE: f32 = 720.0;
const LINE_ADVANCE: f32 = 14.0;
const FONT_SIZE: f32 = 12.0;

/// Shared log of `(page_index, scale)` for every rasterisation
pub type RenderLog = Rc<RefCell<Vec<(usize, f32)>>>;

/// A document whose pages are plain strings; each line becomes one 12pt run
#[derive(Clone, Debug, Default)]
pub struct MemoryDocument {
    pages: Vec<String>,
    title: Option<String>,
    outline: Vec<OutlineItem>,
    named_destinations: HashMap<String, usize>,
    failing_render: HashSet<usize>,
    failing_text: HashSet<usize>,
    failing_outline: bool,
    failing_title: bool,
    render_log: RenderLog,
}

impl MemoryDocument {
    pub fn with_pages(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| (*p).to_string()).collect(),
            ..Self::default()
        }
    }

    /// `count` pages whose text is "Page N"
    pub fn numbered(count: usize) -> Self {
        Self {
            pages: (1..=count).map(|n| format!("Page {n}")).collect(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_outline(mut self, outline: Vec<OutlineItem>) -> Self {
        self.outline = outline;
        self
    }

    /// Register a named destination pointing at a 0-based page index
    pub fn with_named_destination(mut self, name: &str, index: usize) -> Self {
        self.named_destinations.insert(name.to_string(), index);
        self
    }

    /// Rasterising this page (1-based) fails
    pub fn failing_render(mut self, page: usize) -> Self {
        self.failing_render.insert(page);
        self
    }

    /// Text extraction for this page (1-based) fails
    pub fn failing_text(mut self, page: usize) -> Self {
        self.failing_text.insert(page);
        self
    }

    pub fn failing_outline(mut self) -> Self {
        self.failing_outline = true;
        self
    }

    pub fn failing_title(mut self) -> Self {
        self.failing_title = true;
        self
    }

    /// Handle onto the rasterisation log, shared with every clone
    pub fn render_log(&self) -> RenderLog {
        Rc::clone(&self.render_log)
    }
}

impl PdfDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn title(&self) -> Result<Option<String>, DocumentError> {
        if self.failing_title {
            return Err(DocumentError::backend("metadata unreadable"));
        }
        Ok(self.title.clone())
    }

    fn page_box(&self, index: usize) -> Result<PageBox, DocumentError> {
        self.check_index(index)?;
        Ok(LETTER)
    }

    fn rasterize(&self, index: usize, viewport: &Viewport) -> Result<RasterImage, DocumentError> {
        self.check_index(index)?;
        if self.failing_render.contains(&(index + 1)) {
            return Err(DocumentError::backend(format!(
                "cannot rasterise page {}",
                index + 1
            )));
        }
        self.render_log.borrow_mut().push((index, viewport.scale));
        let (width, height) = viewport.pixel_size();
        Ok(RasterImage::blank(width, height))
    }

    fn text_content(&self, index: usize) -> Result<Vec<TextRun>, DocumentError> {
        self.check_index(index)?;
        if self.failing_text.contains(&(index + 1)) {
            return Err(DocumentError::backend(format!(
                "no text layer on page {}",
                index + 1
            )));
        }
        Ok(self.pages[index]
            .lines()
            .enumerate()
            .map(|(i, line)| {
                TextRun::at(
                    line,
                    LINE_LEFT,
                    FIRST_BASELINE - i as f32 * LINE_ADVANCE,
                    FONT_SIZE,
                )
            })
            .collect())
    }

    fn outline(&self) -> Result<Vec<OutlineItem>, DocumentError> {
        if self.failing_outline {
            return Err(DocumentError::backend("outline is corrupt"));
        }
        Ok(self.outline.clone())
    }

    fn resolve_destination(&self, destination: &Destination) -> Result<usize, DocumentError> {
        match destination {
            Destination::PageIndex(index) => Ok(*index),
            Destination::Named(name) => self
                .named_destinations
                .get(name)
                .copied()
                .ok_or_else(|| DocumentError::UnresolvedDestination(name.clone())),
            Destination::Reference { object, generation } => Err(
                DocumentError::UnresolvedDestination(format!("{object} {generation} R")),
            ),
        }
    }
}

/// Parser that only recognises byte strings registered up front
#[derive(Clone, Debug, Default)]
pub struct MemoryParser {
    documents: HashMap<Vec<u8>, MemoryDocument>,
}

impl MemoryParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, bytes: &[u8], document: MemoryDocument) -> Self {
        self.documents.insert(bytes.to_vec(), document);
        self
    }
}

impl DocumentParser for MemoryParser {
    fn parse(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, DocumentError> {
        self.documents
            .get(bytes)
            .cloned()
            .map(|doc| Box::new(doc) as Box<dyn PdfDocument>)
            .ok_or_else(|| DocumentError::Invalid("missing %PDF header".to_string()))
    }
}

/// Fetcher serving fixed bytes per location
#[derive(Clone, Debug, Default)]
pub struct StaticFetcher {
    resources: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, location: &str, bytes: &[u8]) -> Self {
        self.resources.insert(location.to_string(), bytes.to_vec());
        self
    }
}

impl SourceFetcher for StaticFetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, ViewerError> {
        self.resources
            .get(location)
            .cloned()
            .ok_or_else(|| ViewerError::fetch(location, "404 Not Found"))
    }
}

/// Listener that keeps every notification it sees
#[derive(Clone, Debug, Default)]
pub struct RecordingListener {
    seen: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.borrow().clone()
    }

    /// Wire names of the recorded notifications, in order
    pub fn kinds(&self) -> Vec<&'static str> {
        self.seen.borrow().iter().map(Notification::kind).collect()
    }

    /// Return and forget everything recorded so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.borrow_mut())
    }

    pub fn last(&self) -> Option<Notification> {
        self.seen.borrow().last().cloned()
    }

    /// Recorded `error` messages
    pub fn errors(&self) -> Vec<String> {
        self.seen
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Error { error } => Some(error.clone()),
                _ => None,
            })
            .collect()
    }
}

impl NotificationListener for RecordingListener {
    fn notify(&mut self, notification: &Notification) -> anyhow::Result<()> {
        self.seen.borrow_mut().push(notification.clone());
        Ok(())
    }
}

/// Listener that rejects everything
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingListener;

impl NotificationListener for FailingListener {
    fn notify(&mut self, notification: &Notification) -> anyhow::Result<()> {
        Err(anyhow!("listener refused {}", notification.kind()))
    }
}

/// Host services that remember what they were asked to do
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    saved: Rc<RefCell<Vec<(String, Vec<u8>)>>>,
    printed: Rc<RefCell<Vec<String>>>,
    print_succeeds: bool,
    save_fails: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            print_succeeds: true,
            ..Self::default()
        }
    }

    pub fn with_print_failure(mut self) -> Self {
        self.print_succeeds = false;
        self
    }

    pub fn with_save_failure(mut self) -> Self {
        self.save_fails = true;
        self
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.borrow().clone()
    }

    /// Sources of the documents sent to print
    pub fn printed(&self) -> Vec<String> {
        self.printed.borrow().clone()
    }
}

impl HostServices for RecordingHost {
    fn print(&mut self, document: &LoadedDocument) -> anyhow::Result<bool> {
        self.printed.borrow_mut().push(document.source.clone());
        Ok(self.print_succeeds)
    }

    fn save(&mut self, filename: &str, bytes: &[u8]) -> anyhow::Result<()> {
        if self.save_fails {
            return Err(anyhow!("disk full"));
        }
        self.saved
            .borrow_mut()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}
