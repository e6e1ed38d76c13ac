//! PDF rendering infrastructure

mod document;
mod layout;
#[cfg(feature = "mupdf")]
mod mupdf_backend;
mod outline;
mod pipeline;
mod state;
mod thumbnails;
mod types;
mod viewport;
mod zoom;

pub use document::{DocumentError, DocumentParser, PdfDocument};
pub use layout::PageLayout;
#[cfg(feature = "mupdf")]
pub use mupdf_backend::{MupdfDocument, MupdfParser};
pub use outline::{BookmarkNode, Bookmarks};
pub use pipeline::{Generation, RenderParams, RenderPipeline, StepOutcome, render_page};
pub use state::{Command, Effect, SidebarTab, ViewerState};
pub use thumbnails::{DEFAULT_THUMBNAIL_SCALE, Thumbnail, ThumbnailStrip, render_thumbnail};
pub use types::*;
pub use viewport::{Transform, Viewport, compose};
pub use zoom::*;
