// Export modules for use in tests and by embedding hosts
pub mod annotations;
pub mod bridge;
pub mod error;
pub mod events;
pub mod host;
pub mod loader;
pub mod logging;
pub mod panic_handler;
pub mod pdf;
pub mod protocol;
pub mod search_engine;
pub mod settings;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bridge::HostBridge;
pub use error::{Result, ViewerError};
pub use events::NotificationListener;
pub use protocol::{HostCommand, Notification};
pub use settings::ViewerSettings;
pub use viewer::Viewer;
