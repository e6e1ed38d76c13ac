//! Viewer state management

use super::types::Rotation;
use super::zoom::Zoom;
use crate::annotations::DrawingMode;
use crate::protocol::Notification;

/// Sidebar panel currently shown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SidebarTab {
    #[default]
    Thumbnails,
    Bookmarks,
}

/// Current view state of the document
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerState {
    /// Current page (1-based); 1 when no document is loaded
    pub current_page: usize,

    /// Total page count; 0 when no document is loaded
    pub page_count: usize,

    /// Zoom factor, always within `[Zoom::MIN_SCALE, Zoom::MAX_SCALE]`
    pub scale: f32,

    pub rotation: Rotation,

    pub sidebar_visible: bool,
    pub sidebar_tab: SidebarTab,

    pub annotations_enabled: bool,
    pub drawing: DrawingMode,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ViewerState {
    #[must_use]
    pub fn new(initial_scale: f32) -> Self {
        Self {
            current_page: 1,
            page_count: 0,
            scale: Zoom::clamp_factor(initial_scale),
            rotation: Rotation::Deg0,
            sidebar_visible: true,
            sidebar_tab: SidebarTab::Thumbnails,
            annotations_enabled: true,
            drawing: DrawingMode::default(),
        }
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        self.page_count > 0
    }

    /// Clamp a requested page into `[1, page_count]`
    #[must_use]
    pub fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.page_count.max(1))
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::DocumentLoaded { page_count } => {
                self.page_count = page_count;
                self.current_page = 1;
                vec![
                    Effect::RenderAll { thumbnails: true },
                    Effect::LoadBookmarks,
                ]
            }

            Command::DocumentClosed => {
                self.page_count = 0;
                self.current_page = 1;
                vec![Effect::DiscardRender]
            }

            Command::GoToPage(page) => {
                if !self.has_document() {
                    return vec![];
                }
                let clamped = self.clamp_page(page);
                self.current_page = clamped;
                vec![
                    Effect::ScrollToPage(clamped),
                    Effect::SyncThumbnailSelection,
                    Effect::Notify(Notification::PageChanged {
                        page_number: clamped,
                    }),
                ]
            }

            Command::SyncPageFromScroll(page) => {
                if !self.has_document() {
                    return vec![];
                }
                let clamped = self.clamp_page(page);
                if clamped == self.current_page {
                    return vec![];
                }
                self.current_page = clamped;
                vec![
                    Effect::SyncThumbnailSelection,
                    Effect::Notify(Notification::PageChanged {
                        page_number: clamped,
                    }),
                ]
            }

            Command::SetScale(scale) => {
                self.scale = Zoom::clamp_factor(scale);
                if !self.has_document() {
                    return vec![Effect::Notify(Notification::ZoomChanged {
                        zoom_level: f64::from(self.scale),
                    })];
                }
                vec![
                    Effect::RenderAll { thumbnails: false },
                    Effect::Notify(Notification::ZoomChanged {
                        zoom_level: f64::from(self.scale),
                    }),
                ]
            }

            Command::RotateClockwise => {
                self.rotation = self.rotation.clockwise();
                self.rotation_effects()
            }

            Command::RotateCounterClockwise => {
                self.rotation = self.rotation.counter_clockwise();
                self.rotation_effects()
            }

            Command::ToggleSidebar => {
                self.sidebar_visible = !self.sidebar_visible;
                vec![]
            }

            Command::SetSidebarVisible(visible) => {
                self.sidebar_visible = visible;
                vec![]
            }

            Command::ShowTab(tab) => {
                self.sidebar_tab = tab;
                vec![]
            }

            Command::SetAnnotationsEnabled(enabled) => {
                self.annotations_enabled = enabled;
                vec![]
            }

            Command::EnableDrawing { color, width } => {
                self.drawing = DrawingMode {
                    enabled: true,
                    color,
                    width,
                };
                vec![]
            }

            Command::DisableDrawing => {
                self.drawing.enabled = false;
                vec![]
            }
        }
    }

    fn rotation_effects(&self) -> Vec<Effect> {
        if self.has_document() {
            vec![Effect::RenderAll { thumbnails: true }]
        } else {
            vec![]
        }
    }
}

/// Commands that modify viewer state
#[derive(Clone, Debug)]
pub enum Command {
    /// A new document replaced the current one
    DocumentLoaded { page_count: usize },
    /// The document was closed
    DocumentClosed,
    /// Navigate to a page (1-based) and scroll it into view
    GoToPage(usize),
    /// Adopt the page resolved from the scroll position, without scrolling
    SyncPageFromScroll(usize),
    /// Set the zoom factor
    SetScale(f32),
    RotateClockwise,
    RotateCounterClockwise,
    ToggleSidebar,
    SetSidebarVisible(bool),
    ShowTab(SidebarTab),
    SetAnnotationsEnabled(bool),
    EnableDrawing { color: String, width: f32 },
    DisableDrawing,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Move the scroll position to the top of a page (1-based)
    ScrollToPage(usize),
    /// Re-mark the selected thumbnail
    SyncThumbnailSelection,
    /// Re-render every page; optionally regenerate thumbnails afterwards
    RenderAll { thumbnails: bool },
    /// Drop all rendered surfaces and pending work
    DiscardRender,
    /// Build the bookmark tree from the document outline
    LoadBookmarks,
    /// Emit a notification to the host
    Notify(Notification),
}
