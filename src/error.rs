//! Engine error types

use crate::pdf::DocumentError;

/// Errors surfaced by viewer operations.
///
/// Every public operation on [`crate::viewer::Viewer`] converts these into an
/// `error` notification at the operation boundary; none of them escape to the host.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Viewer not ready")]
    NotReady,

    #[error("No document loaded")]
    NoDocument,

    #[error("{what} cannot be empty")]
    EmptySource { what: &'static str },

    #[error("fetch failed for {location}: {detail}")]
    Fetch { location: String, detail: String },

    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to render page {page}: {source}")]
    Render {
        page: usize,
        #[source]
        source: DocumentError,
    },

    #[error("search pattern rejected: {0}")]
    Search(#[from] regex::Error),
}

impl ViewerError {
    pub fn fetch(location: impl Into<String>, detail: impl ToString) -> Self {
        Self::Fetch {
            location: location.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
