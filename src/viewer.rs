//! The viewer engine.
//!
//! [`Viewer`] owns the live document and every piece of derived state: render
//! surfaces, layout, thumbnails, bookmarks, the search index and annotations.
//! Each public operation validates its input, mutates state through
//! [`ViewerState::apply`], carries out the returned effects, and reports any
//! failure to listeners as an `error` notification instead of returning it.

use log::{debug, info, warn};

use crate::annotations::{AnnotationPayload, AnnotationStore, Point};
use crate::error::ViewerError;
use crate::events::{Emitter, NotificationListener};
use crate::host::{HostServices, NoHostServices};
use crate::loader::{DocumentSource, HttpFetcher, LoadedDocument, SourceFetcher, open_document};
use crate::pdf::{
    Bookmarks, Command, Destination, DocumentParser, Effect, FitMode, LinkTarget, PageLayout,
    PageSurface, RenderParams, RenderPipeline, SidebarTab, StepOutcome, ThumbnailStrip,
    Viewport, ViewerState, Zoom,
};
use crate::protocol::Notification;
use crate::search_engine::{SearchEngine, SearchIndex};
use crate::settings::ViewerSettings;

const DEFAULT_DOWNLOAD_NAME: &str = "document.pdf";

pub struct Viewer {
    settings: ViewerSettings,
    zoom: Zoom,
    state: ViewerState,
    ready: bool,

    document: Option<LoadedDocument>,
    pipeline: RenderPipeline,
    layout: PageLayout,
    bookmarks: Bookmarks,
    search: SearchEngine,
    annotations: AnnotationStore,

    emitter: Emitter,
    parser: Box<dyn DocumentParser>,
    fetcher: Box<dyn SourceFetcher>,
    host: Box<dyn HostServices>,
}

impl Viewer {
    pub fn new(mut settings: ViewerSettings, parser: impl DocumentParser + 'static) -> Self {
        settings.sanitize();
        Self {
            zoom: Zoom {
                step: settings.zoom_step,
                container_padding: settings.container_padding,
            },
            state: ViewerState::new(settings.default_scale),
            ready: false,
            document: None,
            pipeline: RenderPipeline::new(settings.thumbnail_scale),
            layout: PageLayout::new(settings.page_gap),
            bookmarks: Bookmarks::NotLoaded,
            search: SearchEngine::new(),
            annotations: AnnotationStore::new(),
            emitter: Emitter::new(),
            parser: Box::new(parser),
            fetcher: Box::new(HttpFetcher::new()),
            host: Box::new(NoHostServices),
            settings,
        }
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: impl SourceFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl HostServices + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn subscribe(&mut self, listener: impl NotificationListener + 'static) {
        self.emitter.subscribe(listener);
    }

    // ---- read-only views -------------------------------------------------

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn page_count(&self) -> usize {
        self.state.page_count
    }

    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    pub fn surface(&self, page: usize) -> Option<&PageSurface> {
        self.pipeline.surface(page)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &PageSurface> {
        self.pipeline.surfaces()
    }

    pub fn thumbnails(&self) -> &ThumbnailStrip {
        self.pipeline.thumbnails()
    }

    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn search_index(&self) -> Option<&SearchIndex> {
        self.search.index()
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    /// No render work is queued
    pub fn is_render_idle(&self) -> bool {
        self.pipeline.is_idle()
    }

    // ---- lifecycle -------------------------------------------------------

    /// Mark the engine ready and announce it
    pub fn initialize(&mut self) {
        if self.ready {
            debug!("initialize called twice; ignoring");
            return;
        }
        self.ready = true;
        info!("Viewer ready");
        self.emit(Notification::Ready);
        self.emit(Notification::ViewerReady);
    }

    pub fn load_from_url(&mut self, url: &str) {
        self.load(DocumentSource::Url(url.to_string()));
    }

    pub fn load_from_base64(&mut self, data: &str) {
        self.load(DocumentSource::Base64(data.to_string()));
    }

    pub fn load_bytes(&mut self, name: &str, bytes: Vec<u8>) {
        self.load(DocumentSource::Bytes {
            name: name.to_string(),
            bytes,
        });
    }

    /// Replace the live document. On failure nothing changes.
    pub fn load(&mut self, source: DocumentSource) {
        match open_document(&source, self.fetcher.as_ref(), self.parser.as_ref()) {
            Ok(loaded) => self.install(loaded),
            Err(e) => {
                warn!("Load of {} failed: {e}", source.label());
                self.emit(Notification::error(format!("Failed to load PDF: {e}")));
            }
        }
    }

    fn install(&mut self, loaded: LoadedDocument) {
        let page_count = loaded.page_count();
        let title = loaded.title.clone();

        self.pipeline.discard();
        self.layout.clear();
        self.search.clear();
        self.annotations.clear();
        self.bookmarks = Bookmarks::NotLoaded;
        self.document = Some(loaded);

        let effects = self.state.apply(Command::DocumentLoaded { page_count });
        self.pipeline.thumbnails_mut().select(self.state.current_page);
        self.emit(Notification::DocumentLoaded { page_count, title });
        self.run_effects(effects);
    }

    pub fn close_document(&mut self) {
        if self.document.take().is_none() {
            debug!("close_document without a document");
        }
        self.search.clear();
        self.annotations.clear();
        self.bookmarks = Bookmarks::NotLoaded;
        self.dispatch(Command::DocumentClosed);
    }

    // ---- rendering -------------------------------------------------------

    /// Advance queued render work by the per-tick budget (everything when no
    /// budget is configured). Returns true while work remains.
    pub fn tick(&mut self) -> bool {
        match self.settings.render_pages_per_tick {
            Some(budget) => {
                for _ in 0..budget.max(1) {
                    if !self.step_render() {
                        break;
                    }
                }
            }
            None => self.drain_render(),
        }
        !self.pipeline.is_idle()
    }

    fn start_render(&mut self, thumbnails: bool) {
        let Some(loaded) = self.document.as_ref() else {
            return;
        };
        let doc = loaded.document.as_ref();
        let page_count = doc.page_count();
        let params = RenderParams {
            scale: self.state.scale,
            rotation: self.state.rotation,
        };

        // Estimated heights until each page is actually rendered
        let heights = (0..page_count)
            .map(|index| {
                doc.page_box(index)
                    .map(|page_box| Viewport::new(page_box, params.scale, params.rotation).height)
                    .unwrap_or(0.0)
            })
            .collect();
        self.layout.set_page_heights(heights);
        self.layout.scroll_to_page(self.state.current_page);

        self.pipeline
            .begin_full_render(page_count, params, thumbnails);
        if self.settings.render_pages_per_tick.is_none() {
            self.drain_render();
        }
    }

    fn drain_render(&mut self) {
        while self.step_render() {}
    }

    fn step_render(&mut self) -> bool {
        let Some(loaded) = self.document.as_ref() else {
            return false;
        };
        let outcome = self.pipeline.step(loaded.document.as_ref());

        match outcome {
            StepOutcome::Idle => return false,
            StepOutcome::PageRendered { page, height } => {
                self.layout.set_page_height(page, height);
            }
            StepOutcome::PageFailed { page, error } => {
                self.report(ViewerError::Render {
                    page,
                    source: error,
                });
            }
            StepOutcome::PagesFinished(generation) => {
                debug!("Pages of generation {} finished", generation.0);
            }
            StepOutcome::ThumbnailRendered { .. } | StepOutcome::ThumbnailFailed { .. } => {}
            StepOutcome::ThumbnailsFinished(generation) => {
                let current = self.state.current_page;
                self.pipeline.thumbnails_mut().select(current);
                debug!("Thumbnails of generation {} finished", generation.0);
            }
        }
        true
    }

    // ---- navigation ------------------------------------------------------

    pub fn go_to_page(&mut self, page: usize) {
        if self.ensure_ready() {
            self.dispatch(Command::GoToPage(page));
        }
    }

    /// Does nothing on the last page
    pub fn next_page(&mut self) {
        if self.ensure_ready() && self.state.current_page < self.state.page_count {
            self.dispatch(Command::GoToPage(self.state.current_page + 1));
        }
    }

    /// Does nothing on the first page
    pub fn previous_page(&mut self) {
        if self.ensure_ready() && self.state.current_page > 1 {
            self.dispatch(Command::GoToPage(self.state.current_page - 1));
        }
    }

    pub fn first_page(&mut self) {
        self.go_to_page(1);
    }

    pub fn last_page(&mut self) {
        let last = self.state.page_count;
        self.go_to_page(last);
    }

    pub fn set_container_size(&mut self, width: f32, height: f32) {
        if self.ensure_ready() {
            self.layout.set_container(width, height);
        }
    }

    /// Scroll position changed: adopt the page nearest the viewport centre
    pub fn on_scroll(&mut self, scroll_top: f32) {
        if !self.ensure_ready() {
            return;
        }
        self.layout.set_scroll_top(scroll_top);
        if let Some(page) = self.layout.page_at_viewport_center() {
            self.dispatch(Command::SyncPageFromScroll(page));
        }
    }

    // ---- zoom & rotation -------------------------------------------------

    pub fn set_zoom(&mut self, scale: f32) {
        if self.ensure_ready() {
            self.dispatch(Command::SetScale(scale));
        }
    }

    /// Zoom factor as sent by a host, e.g. `1.5`
    pub fn set_zoom_level(&mut self, zoom_level: f64) {
        self.set_zoom(Zoom::clamp_wide(zoom_level));
    }

    /// Zoom given as a percentage, e.g. `150.0` for 1.5x
    pub fn set_zoom_percentage(&mut self, percentage: f64) {
        self.set_zoom_level(percentage / 100.0);
    }

    pub fn zoom_in(&mut self) {
        let scale = self.zoom.step_in(self.state.scale);
        self.set_zoom(scale);
    }

    pub fn zoom_out(&mut self) {
        let scale = self.zoom.step_out(self.state.scale);
        self.set_zoom(scale);
    }

    pub fn fit_width(&mut self) {
        self.fit(FitMode::Width);
    }

    pub fn fit_page(&mut self) {
        self.fit(FitMode::Page);
    }

    fn fit(&mut self, mode: FitMode) {
        if !self.ensure_ready() {
            return;
        }
        let Some(loaded) = self.document.as_ref() else {
            return;
        };
        let container = self.layout.container();
        if container.0 <= 0.0 || container.1 <= 0.0 {
            debug!("fit {mode:?} ignored: container size unknown");
            return;
        }

        let first_page = match loaded.document.page_box(0) {
            Ok(page_box) => page_box,
            Err(e) => {
                self.report(ViewerError::Document(e));
                return;
            }
        };
        if let Some(scale) = self
            .zoom
            .fit(mode, first_page, self.state.rotation, container)
        {
            self.set_zoom(scale);
        }
    }

    pub fn rotate_clockwise(&mut self) {
        if self.ensure_ready() {
            self.dispatch(Command::RotateClockwise);
        }
    }

    pub fn rotate_counter_clockwise(&mut self) {
        if self.ensure_ready() {
            self.dispatch(Command::RotateCounterClockwise);
        }
    }

    // ---- search ----------------------------------------------------------

    /// Literal search over the whole document. An empty query does nothing.
    pub fn search(&mut self, query: &str, case_sensitive: bool) {
        if !self.ensure_ready() {
            return;
        }
        let Some(loaded) = self.document.as_ref() else {
            return;
        };

        let found = match self
            .search
            .search(loaded.document.as_ref(), query, case_sensitive)
        {
            Ok(Some(index)) => (index.status(), index.current()),
            Ok(None) => return,
            Err(e) => {
                self.report(ViewerError::Search(e));
                return;
            }
        };
        self.publish_search(found);
    }

    pub fn find_next(&mut self) {
        if !self.ensure_ready() {
            return;
        }
        if let Some(index) = self.search.index_mut().filter(|i| !i.is_empty()) {
            index.advance();
            let found = (index.status(), index.current());
            self.publish_search(found);
        }
    }

    pub fn find_previous(&mut self) {
        if !self.ensure_ready() {
            return;
        }
        if let Some(index) = self.search.index_mut().filter(|i| !i.is_empty()) {
            index.retreat();
            let found = (index.status(), index.current());
            self.publish_search(found);
        }
    }

    pub fn clear_search(&mut self) {
        if self.ensure_ready() {
            self.search.clear();
        }
    }

    fn publish_search(
        &mut self,
        (status, current): (
            crate::search_engine::SearchStatus,
            Option<crate::search_engine::SearchMatch>,
        ),
    ) {
        if let Some(found) = current {
            self.dispatch(Command::GoToPage(found.page_number));
        }
        self.emit(Notification::SearchCompleted {
            match_count: status.match_count,
            current_match: status.current_match,
        });
    }

    // ---- sidebar ---------------------------------------------------------

    pub fn toggle_sidebar(&mut self) {
        if self.ensure_ready() {
            self.dispatch(Command::ToggleSidebar);
        }
    }

    pub fn set_sidebar_visible(&mut self, visible: bool) {
        if self.ensure_ready() {
            self.dispatch(Command::SetSidebarVisible(visible));
        }
    }

    pub fn show_thumbnails(&mut self) {
        if self.ensure_ready() {
            self.dispatch(Command::ShowTab(SidebarTab::Thumbnails));
        }
    }

    pub fn show_bookmarks(&mut self) {
        if self.ensure_ready() {
            self.dispatch(Command::ShowTab(SidebarTab::Bookmarks));
        }
    }

    pub fn click_thumbnail(&mut self, page: usize) {
        if !self.ensure_ready() || !self.state.has_document() {
            return;
        }
        self.dispatch(Command::GoToPage(page));
        let page_number = self.state.current_page;
        self.emit(Notification::ThumbnailClicked { page_number });
    }

    /// Follow the bookmark at `path` (child indices from the root)
    pub fn click_bookmark(&mut self, path: &[usize]) {
        if !self.ensure_ready() {
            return;
        }
        let Some(loaded) = self.document.as_ref() else {
            return;
        };
        let Some(node) = self.bookmarks.node(path) else {
            debug!("No bookmark at {path:?}");
            return;
        };

        match node.resolve(loaded.document.as_ref()) {
            Ok(Some(page_number)) => {
                let title = node.title.clone();
                self.dispatch(Command::GoToPage(page_number));
                self.emit(Notification::BookmarkClicked { title, page_number });
            }
            Ok(None) => debug!("Bookmark {:?} has no destination", node.title),
            Err(e) => self.report(ViewerError::Document(e)),
        }
    }

    /// Follow a link: `#page=N`, `#N` and `#name` stay inside the document
    pub fn follow_link(&mut self, url: &str) {
        if !self.ensure_ready() {
            return;
        }
        let target = LinkTarget::parse(url);
        let page = match &target {
            LinkTarget::Page(page) => Some(*page),
            LinkTarget::Named(name) => match self.resolve_named(name) {
                Ok(page) => page,
                Err(e) => {
                    self.report(e);
                    return;
                }
            },
            LinkTarget::External(_) => None,
        };

        if let Some(page) = page {
            self.dispatch(Command::GoToPage(page));
        }
        self.emit(Notification::LinkClicked {
            url: url.to_string(),
            is_internal: target.is_internal(),
        });
    }

    fn resolve_named(&self, name: &str) -> Result<Option<usize>, ViewerError> {
        let Some(loaded) = self.document.as_ref() else {
            return Ok(None);
        };
        let doc = loaded.document.as_ref();
        let index = doc.resolve_destination(&Destination::Named(name.to_string()))?;
        doc.check_index(index)?;
        Ok(Some(index + 1))
    }

    // ---- annotations -----------------------------------------------------

    pub fn set_annotations_enabled(&mut self, enabled: bool) {
        if self.ensure_ready() {
            self.dispatch(Command::SetAnnotationsEnabled(enabled));
        }
    }

    /// Record the text the user selected on `page`
    pub fn select_text(&mut self, page: usize, text: &str) {
        if !self.ensure_ready() || !self.state.has_document() {
            return;
        }
        let page_number = self.state.clamp_page(page);
        self.annotations.select_text(page_number, text.to_string());
        self.emit(Notification::TextSelected {
            selected_text: text.to_string(),
            page_number,
        });
    }

    pub fn clear_selection(&mut self) {
        if self.ensure_ready() {
            self.annotations.clear_selection();
        }
    }

    /// Highlight the active selection on the current page
    pub fn highlight_selection(&mut self, color: &str) {
        if !self.can_annotate("highlight") {
            return;
        }
        let Some(selection) = self.annotations.selection().filter(|s| !s.is_blank()) else {
            debug!("highlight ignored: nothing selected");
            return;
        };
        let payload = AnnotationPayload::Highlight {
            color: color.to_string(),
            text: selection.text.clone(),
        };
        self.add_annotation(self.state.current_page, payload);
    }

    pub fn add_note(&mut self, page: usize, x: f32, y: f32, text: &str) {
        if !self.can_annotate("note") {
            return;
        }
        let page_number = self.state.clamp_page(page);
        let payload = AnnotationPayload::Note {
            x,
            y,
            text: text.to_string(),
        };
        self.add_annotation(page_number, payload);
    }

    pub fn enable_drawing(&mut self, color: &str, width: f32) {
        if self.ensure_ready() {
            self.dispatch(Command::EnableDrawing {
                color: color.to_string(),
                width,
            });
        }
    }

    pub fn disable_drawing(&mut self) {
        if self.ensure_ready() {
            self.dispatch(Command::DisableDrawing);
        }
    }

    /// Record a freehand stroke on the current page with the active pen
    pub fn add_stroke(&mut self, points: Vec<Point>) {
        if !self.can_annotate("drawing") {
            return;
        }
        if !self.state.drawing.enabled {
            debug!("stroke ignored: drawing mode is off");
            return;
        }
        if points.is_empty() {
            return;
        }
        let payload = AnnotationPayload::Drawing {
            color: self.state.drawing.color.clone(),
            width: self.state.drawing.width,
            points,
        };
        self.add_annotation(self.state.current_page, payload);
    }

    pub fn select_annotation(&mut self, id: &str) {
        if !self.ensure_ready() {
            return;
        }
        match self.annotations.find(id) {
            Some(record) => {
                let notification = Notification::AnnotationSelected {
                    annotation_id: record.id.clone(),
                    annotation_type: record.kind().as_str().to_string(),
                };
                self.emit(notification);
            }
            None => debug!("select_annotation: unknown id {id}"),
        }
    }

    /// Remove the annotations of the current page
    pub fn clear_annotations(&mut self) {
        if !self.ensure_ready() {
            return;
        }
        let removed = self.annotations.clear_page(self.state.current_page);
        debug!(
            "Cleared {removed} annotations on page {}",
            self.state.current_page
        );
    }

    /// All annotations as a JSON array; `None` if the call was refused
    pub fn export_annotations(&mut self) -> Option<String> {
        if !self.ensure_ready() {
            return None;
        }
        match self.annotations.export_json() {
            Ok(json) => Some(json),
            Err(e) => {
                self.report(format!("Failed to export annotations: {e}"));
                None
            }
        }
    }

    /// Replace all annotations. Malformed input is logged and ignored.
    pub fn import_annotations(&mut self, json: &str) {
        if !self.ensure_ready() {
            return;
        }
        match self.annotations.import_json(json) {
            Ok(count) => info!("Imported {count} annotations"),
            Err(e) => warn!("Failed to import annotations: {e}"),
        }
    }

    fn can_annotate(&mut self, kind: &str) -> bool {
        if !self.ensure_ready() || !self.state.has_document() {
            return false;
        }
        if !self.state.annotations_enabled {
            debug!("{kind} ignored: annotations are disabled");
            return false;
        }
        true
    }

    fn add_annotation(&mut self, page_number: usize, payload: AnnotationPayload) {
        let record = self.annotations.add(page_number, payload);
        let notification = Notification::AnnotationAdded {
            annotation_type: record.kind().as_str().to_string(),
            page_number: record.page_number,
        };
        self.emit(notification);
    }

    // ---- host services ---------------------------------------------------

    pub fn print(&mut self) {
        if !self.ensure_ready() {
            return;
        }
        let Some(loaded) = self.document.as_ref() else {
            self.report(ViewerError::NoDocument);
            return;
        };
        let success = match self.host.print(loaded) {
            Ok(success) => success,
            Err(e) => {
                warn!("Print failed: {e:#}");
                false
            }
        };
        self.emit(Notification::PrintCompleted { success });
    }

    /// Hand the original document bytes to the host for saving
    pub fn download(&mut self, filename: Option<&str>) {
        if !self.ensure_ready() {
            return;
        }
        let Some(loaded) = self.document.as_ref() else {
            self.report(ViewerError::NoDocument);
            return;
        };
        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| download_name(&loaded.title));

        if let Err(e) = self.host.save(&filename, &loaded.bytes) {
            self.report(format!("Failed to download {filename}: {e:#}"));
        }
    }

    // ---- plumbing --------------------------------------------------------

    fn ensure_ready(&mut self) -> bool {
        if !self.ready {
            self.report(ViewerError::NotReady);
        }
        self.ready
    }

    fn dispatch(&mut self, command: Command) {
        debug!("{command:?}");
        let effects = self.state.apply(command);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ScrollToPage(page) => self.layout.scroll_to_page(page),
                Effect::SyncThumbnailSelection => {
                    let current = self.state.current_page;
                    self.pipeline.thumbnails_mut().select(current);
                }
                Effect::RenderAll { thumbnails } => self.start_render(thumbnails),
                Effect::DiscardRender => {
                    self.pipeline.discard();
                    self.layout.clear();
                }
                Effect::LoadBookmarks => {
                    if let Some(loaded) = self.document.as_ref() {
                        self.bookmarks = Bookmarks::load(loaded.document.as_ref());
                    }
                }
                Effect::Notify(notification) => self.emit(notification),
            }
        }
    }

    fn emit(&mut self, notification: Notification) {
        self.emitter.emit(notification);
    }

    /// Turn a failure into an `error` notification
    pub fn report(&mut self, error: impl std::fmt::Display) {
        let message = error.to_string();
        warn!("{message}");
        self.emit(Notification::error(message));
    }
}

/// `<title>.pdf` with path separators removed, or a generic name
fn download_name(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if stem.is_empty() {
        DEFAULT_DOWNLOAD_NAME.to_string()
    } else {
        format!("{stem}.pdf")
    }
}

impl std::fmt::Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("ready", &self.ready)
            .field("state", &self.state)
            .field("document", &self.document)
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{OutlineItem, Rotation};
    use crate::test_utils::{MemoryDocument, MemoryParser, RecordingHost, RecordingListener};

    const PDF: &[u8] = b"%PDF-test";

    fn viewer_with(doc: MemoryDocument) -> (Viewer, RecordingListener) {
        let parser = MemoryParser::new().with_document(PDF, doc);
        let mut viewer = Viewer::new(ViewerSettings::default(), parser);
        let recorder = RecordingListener::new();
        viewer.subscribe(recorder.clone());
        viewer.initialize();
        viewer.load_bytes("test.pdf", PDF.to_vec());
        recorder.take();
        (viewer, recorder)
    }

    #[test]
    fn load_resets_page_and_renders_everything() {
        let (viewer, _) = viewer_with(MemoryDocument::numbered(4));
        assert_eq!(viewer.current_page(), 1);
        assert_eq!(viewer.page_count(), 4);
        assert_eq!(viewer.surfaces().count(), 4);
        assert_eq!(viewer.thumbnails().len(), 4);
        assert_eq!(viewer.thumbnails().selected_page(), 1);
        assert_eq!(viewer.bookmarks(), &Bookmarks::Empty);
    }

    #[test]
    fn next_and_previous_stop_at_the_ends() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(2));
        viewer.previous_page();
        assert!(recorder.take().is_empty());

        viewer.next_page();
        viewer.next_page();
        assert_eq!(viewer.current_page(), 2);
        assert_eq!(
            recorder.take(),
            vec![Notification::PageChanged { page_number: 2 }]
        );
    }

    #[test]
    fn zoom_steps_and_clamps() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(1));
        viewer.zoom_in();
        assert_eq!(viewer.scale(), 1.25);
        for _ in 0..20 {
            viewer.zoom_in();
        }
        assert_eq!(viewer.scale(), 4.0);
        assert_eq!(
            recorder.last(),
            Some(Notification::ZoomChanged { zoom_level: 4.0 })
        );
        viewer.set_zoom_percentage(50.0);
        assert_eq!(viewer.scale(), 0.5);
    }

    #[test]
    fn oversized_zoom_requests_saturate_at_bounds() {
        let (mut viewer, _) = viewer_with(MemoryDocument::numbered(1));
        viewer.set_zoom_percentage(1e300);
        assert_eq!(viewer.scale(), 4.0);

        viewer.set_zoom_level(-1e39);
        assert_eq!(viewer.scale(), 0.25);

        viewer.set_zoom_level(1e39);
        assert_eq!(viewer.scale(), 4.0);

        viewer.set_zoom(f32::NEG_INFINITY);
        assert_eq!(viewer.scale(), 0.25);

        viewer.set_zoom(f32::INFINITY);
        assert_eq!(viewer.scale(), 4.0);
    }

    #[test]
    fn zero_render_budget_still_makes_progress() {
        let settings = ViewerSettings {
            render_pages_per_tick: Some(0),
            ..ViewerSettings::default()
        };
        let parser = MemoryParser::new().with_document(PDF, MemoryDocument::numbered(3));
        let mut viewer = Viewer::new(settings, parser);
        viewer.initialize();
        viewer.load_bytes("doc.pdf", PDF.to_vec());

        let mut ticks = 0;
        while viewer.tick() {
            ticks += 1;
            assert!(ticks < 100, "render queue never drains");
        }
        assert!(viewer.is_render_idle());
        assert_eq!(viewer.surfaces().count(), 3);
    }

    #[test]
    fn fit_width_uses_container_minus_padding() {
        let (mut viewer, _) = viewer_with(MemoryDocument::numbered(1));
        viewer.set_container_size(652.0, 400.0);
        viewer.fit_width();
        // (652 - 40) / 612
        assert_eq!(viewer.scale(), 1.0);

        viewer.fit_page();
        // min(1.0, (400 - 40) / 792)
        assert!((viewer.scale() - 360.0 / 792.0).abs() < 1e-6);
    }

    #[test]
    fn fit_honours_rotation() {
        let (mut viewer, _) = viewer_with(MemoryDocument::numbered(1));
        viewer.rotate_clockwise();
        viewer.set_container_size(832.0, 2000.0);
        viewer.fit_width();
        // sideways page is 792 wide
        assert_eq!(viewer.scale(), 1.0);
    }

    #[test]
    fn fit_without_container_is_ignored() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(1));
        viewer.fit_page();
        assert_eq!(viewer.scale(), 1.0);
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn rotation_rerenders_pages_and_thumbnails() {
        let (mut viewer, _) = viewer_with(MemoryDocument::numbered(2));
        viewer.rotate_counter_clockwise();
        assert_eq!(viewer.state().rotation, Rotation::Deg270);
        let surface = viewer.surface(1).unwrap();
        assert_eq!((surface.width, surface.height), (792, 612));
        assert!(
            viewer
                .thumbnails()
                .entries()
                .iter()
                .all(|t| t.rotation == Rotation::Deg270)
        );
    }

    #[test]
    fn scroll_updates_page_without_scrolling() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(3));
        viewer.set_container_size(800.0, 600.0);
        // page 2 starts at 792 + 10
        viewer.on_scroll(900.0);
        assert_eq!(viewer.current_page(), 2);
        assert_eq!(viewer.layout().scroll_top(), 900.0);
        assert_eq!(
            recorder.take(),
            vec![Notification::PageChanged { page_number: 2 }]
        );
        assert_eq!(viewer.thumbnails().selected_page(), 2);
    }

    #[test]
    fn go_to_page_scrolls_into_view() {
        let (mut viewer, _) = viewer_with(MemoryDocument::numbered(3));
        viewer.go_to_page(3);
        assert_eq!(viewer.layout().scroll_top(), 2.0 * (792.0 + 10.0));
    }

    #[test]
    fn bookmark_click_navigates() {
        let doc = MemoryDocument::numbered(5).with_outline(vec![
            OutlineItem::new("Start", Some(Destination::PageIndex(0))),
            OutlineItem::new("Appendix", Some(Destination::Named("app".into()))),
            OutlineItem::new("Broken", Some(Destination::Named("gone".into()))),
            OutlineItem::new("Label", None),
        ]);
        let (mut viewer, recorder) = viewer_with(doc.with_named_destination("app", 3));

        viewer.click_bookmark(&[1]);
        assert_eq!(viewer.current_page(), 4);
        assert_eq!(
            recorder.take(),
            vec![
                Notification::PageChanged { page_number: 4 },
                Notification::BookmarkClicked {
                    title: "Appendix".into(),
                    page_number: 4
                },
            ]
        );

        viewer.click_bookmark(&[3]);
        assert!(recorder.take().is_empty());

        viewer.click_bookmark(&[2]);
        assert_eq!(recorder.kinds(), vec!["error"]);
        assert_eq!(viewer.current_page(), 4);
    }

    #[test]
    fn links_distinguish_internal_and_external() {
        let doc = MemoryDocument::numbered(5).with_named_destination("intro", 1);
        let (mut viewer, recorder) = viewer_with(doc);

        viewer.follow_link("#page=3");
        assert_eq!(viewer.current_page(), 3);
        viewer.follow_link("#intro");
        assert_eq!(viewer.current_page(), 2);
        recorder.take();

        viewer.follow_link("https://example.com");
        assert_eq!(viewer.current_page(), 2);
        assert_eq!(
            recorder.take(),
            vec![Notification::LinkClicked {
                url: "https://example.com".into(),
                is_internal: false
            }]
        );
    }

    #[test]
    fn highlight_needs_a_selection() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(3));
        viewer.highlight_selection("#ff0");
        assert!(viewer.annotations().is_empty());

        viewer.go_to_page(2);
        viewer.select_text(2, "   ");
        viewer.highlight_selection("#ff0");
        assert!(viewer.annotations().is_empty());

        viewer.select_text(2, "quarterly revenue");
        recorder.take();
        viewer.highlight_selection("#ff0");
        assert_eq!(
            recorder.take(),
            vec![Notification::AnnotationAdded {
                annotation_type: "highlight".into(),
                page_number: 2
            }]
        );
    }

    #[test]
    fn disabled_annotations_refuse_creation() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(3));
        viewer.set_annotations_enabled(false);
        viewer.add_note(1, 0.0, 0.0, "nope");
        viewer.enable_drawing("#000", 1.0);
        viewer.add_stroke(vec![Point { x: 1.0, y: 1.0 }]);
        assert!(viewer.annotations().is_empty());
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn strokes_require_drawing_mode() {
        let (mut viewer, _) = viewer_with(MemoryDocument::numbered(2));
        let stroke = vec![Point { x: 1.0, y: 1.0 }, Point { x: 5.0, y: 3.0 }];
        viewer.add_stroke(stroke.clone());
        assert!(viewer.annotations().is_empty());

        viewer.enable_drawing("#00f", 3.0);
        viewer.add_stroke(stroke.clone());
        viewer.disable_drawing();
        viewer.add_stroke(stroke);

        assert_eq!(viewer.annotations().len(), 1);
        assert!(matches!(
            &viewer.annotations().records()[0].payload,
            AnnotationPayload::Drawing { color, width, .. } if color == "#00f" && *width == 3.0
        ));
    }

    #[test]
    fn notes_clamp_their_page() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(3));
        viewer.add_note(99, 1.0, 2.0, "late");
        assert_eq!(
            recorder.take(),
            vec![Notification::AnnotationAdded {
                annotation_type: "note".into(),
                page_number: 3
            }]
        );
    }

    #[test]
    fn select_annotation_reports_kind() {
        let (mut viewer, recorder) = viewer_with(MemoryDocument::numbered(1));
        viewer.add_note(1, 0.0, 0.0, "hi");
        recorder.take();
        viewer.select_annotation("annot-1");
        viewer.select_annotation("annot-404");
        assert_eq!(
            recorder.take(),
            vec![Notification::AnnotationSelected {
                annotation_id: "annot-1".into(),
                annotation_type: "note".into()
            }]
        );
    }

    #[test]
    fn print_and_download_go_through_host() {
        let host = RecordingHost::new();
        let parser =
            MemoryParser::new().with_document(PDF, MemoryDocument::numbered(1).with_title("Q3/Q4"));
        let mut viewer = Viewer::new(ViewerSettings::default(), parser).with_host(host.clone());
        let recorder = RecordingListener::new();
        viewer.subscribe(recorder.clone());
        viewer.initialize();
        viewer.load_bytes("report", PDF.to_vec());
        recorder.take();

        viewer.print();
        assert_eq!(
            recorder.take(),
            vec![Notification::PrintCompleted { success: true }]
        );
        assert_eq!(host.printed(), vec!["report".to_string()]);

        viewer.download(None);
        viewer.download(Some("copy.pdf"));
        let names: Vec<String> = host.saved().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Q3_Q4.pdf".to_string(), "copy.pdf".to_string()]);
        assert!(host.saved().iter().all(|(_, bytes)| bytes == PDF));
    }

    #[test]
    fn failed_print_reports_unsuccessful() {
        let host = RecordingHost::new().with_print_failure();
        let parser = MemoryParser::new().with_document(PDF, MemoryDocument::numbered(1));
        let mut viewer = Viewer::new(ViewerSettings::default(), parser).with_host(host.clone());
        let recorder = RecordingListener::new();
        viewer.subscribe(recorder.clone());
        viewer.initialize();
        viewer.load_bytes("report", PDF.to_vec());
        recorder.take();

        viewer.print();
        assert_eq!(
            recorder.take(),
            vec![Notification::PrintCompleted { success: false }]
        );
        assert_eq!(host.printed(), vec!["report".to_string()]);
    }

    #[test]
    fn failed_download_is_reported() {
        let parser = MemoryParser::new().with_document(PDF, MemoryDocument::numbered(1));
        let mut viewer = Viewer::new(ViewerSettings::default(), parser)
            .with_host(RecordingHost::new().with_save_failure());
        let recorder = RecordingListener::new();
        viewer.subscribe(recorder.clone());
        viewer.initialize();
        viewer.load_bytes("x", PDF.to_vec());
        recorder.take();

        viewer.download(None);
        let errors = recorder.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to download document.pdf"));
    }

    #[test]
    fn print_without_document_is_an_error() {
        let mut viewer = Viewer::new(ViewerSettings::default(), MemoryParser::new());
        let recorder = RecordingListener::new();
        viewer.subscribe(recorder.clone());
        viewer.initialize();
        recorder.take();
        viewer.print();
        assert_eq!(recorder.errors(), vec!["No document loaded".to_string()]);
    }

    #[test]
    fn initialize_announces_once() {
        let mut viewer = Viewer::new(ViewerSettings::default(), MemoryParser::new());
        let recorder = RecordingListener::new();
        viewer.subscribe(recorder.clone());
        viewer.initialize();
        viewer.initialize();
        assert_eq!(recorder.kinds(), vec!["ready", "viewerReady"]);
    }

    #[test]
    fn close_drops_document_state() {
        let (mut viewer, _) = viewer_with(MemoryDocument::with_pages(&["cat", "cat"]));
        viewer.search("cat", false);
        viewer.add_note(1, 0.0, 0.0, "x");
        viewer.close_document();
        assert!(viewer.document().is_none());
        assert_eq!(viewer.page_count(), 0);
        assert_eq!(viewer.current_page(), 1);
        assert!(viewer.search_index().is_none());
        assert!(viewer.annotations().is_empty());
        assert_eq!(viewer.surfaces().count(), 0);
        assert!(viewer.thumbnails().is_empty());
    }

    #[test]
    fn download_name_strips_separators() {
        assert_eq!(download_name(""), "document.pdf");
        assert_eq!(download_name(" Annual Report "), "Annual Report.pdf");
        assert_eq!(download_name("a/b\\c"), "a_b_c.pdf");
    }
}
