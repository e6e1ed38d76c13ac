//! Wire messages exchanged with the host.
//!
//! Every message is a JSON object whose `type` field names the message kind;
//! the remaining fields are camelCase. Inbound messages are decoded exactly
//! once, here, into [`HostCommand`]. Outbound messages are [`Notification`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::Point;

/// Engine → host messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    Ready,
    ViewerReady,
    DocumentLoaded {
        page_count: usize,
        title: String,
    },
    PageChanged {
        page_number: usize,
    },
    ZoomChanged {
        zoom_level: f64,
    },
    SearchCompleted {
        match_count: usize,
        /// 1-based; 0 when nothing matched
        current_match: usize,
    },
    AnnotationAdded {
        annotation_type: String,
        page_number: usize,
    },
    AnnotationSelected {
        annotation_id: String,
        annotation_type: String,
    },
    BookmarkClicked {
        title: String,
        page_number: usize,
    },
    ThumbnailClicked {
        page_number: usize,
    },
    TextSelected {
        selected_text: String,
        page_number: usize,
    },
    LinkClicked {
        url: String,
        is_internal: bool,
    },
    PrintCompleted {
        success: bool,
    },
    Error {
        error: String,
    },
    /// Reply to [`HostCommand::ExportAnnotations`]
    AnnotationsExported {
        request_id: String,
        annotations: String,
    },
}

impl Notification {
    /// Wire name carried in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Ready => "ready",
            Notification::ViewerReady => "viewerReady",
            Notification::DocumentLoaded { .. } => "documentLoaded",
            Notification::PageChanged { .. } => "pageChanged",
            Notification::ZoomChanged { .. } => "zoomChanged",
            Notification::SearchCompleted { .. } => "searchCompleted",
            Notification::AnnotationAdded { .. } => "annotationAdded",
            Notification::AnnotationSelected { .. } => "annotationSelected",
            Notification::BookmarkClicked { .. } => "bookmarkClicked",
            Notification::ThumbnailClicked { .. } => "thumbnailClicked",
            Notification::TextSelected { .. } => "textSelected",
            Notification::LinkClicked { .. } => "linkClicked",
            Notification::PrintCompleted { .. } => "printCompleted",
            Notification::Error { .. } => "error",
            Notification::AnnotationsExported { .. } => "annotationsExported",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification::Error {
            error: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Host → engine messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostCommand {
    LoadUrl {
        url: String,
    },
    LoadBase64 {
        data: String,
    },
    CloseDocument,

    GoToPage {
        page_number: usize,
    },
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,

    ZoomIn,
    ZoomOut,
    /// Zoom as a percentage, e.g. 150 for 1.5x
    SetZoom {
        percentage: f64,
    },
    /// Zoom as a fraction, e.g. 1.5
    SetZoomLevel {
        zoom_level: f64,
    },
    FitWidth,
    FitPage,

    RotateClockwise,
    RotateCounterClockwise,

    Search {
        text: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    FindNext,
    FindPrevious,
    ClearSearch,

    SelectText {
        page_number: usize,
        text: String,
    },
    ClearSelection,
    HighlightSelection {
        color: String,
    },
    AddNote {
        page_number: usize,
        x: f32,
        y: f32,
        text: String,
    },
    EnableDrawing {
        color: String,
        width: f32,
    },
    DisableDrawing,
    AddStroke {
        points: Vec<Point>,
    },
    SelectAnnotation {
        annotation_id: String,
    },
    ClearAnnotations,
    ExportAnnotations {
        #[serde(default)]
        request_id: String,
    },
    ImportAnnotations {
        annotations: String,
    },

    Print,
    Download {
        #[serde(default)]
        filename: Option<String>,
    },

    ToggleSidebar,
    SetSidebarVisible {
        visible: bool,
    },
    ShowThumbnails,
    ShowBookmarks,
    SetAnnotationsEnabled {
        enabled: bool,
    },

    SetContainerSize {
        width: f32,
        height: f32,
    },
    Scroll {
        scroll_top: f32,
    },
    ClickThumbnail {
        page_number: usize,
    },
    ClickBookmark {
        path: Vec<usize>,
    },
    FollowLink {
        url: String,
    },

    /// A well-formed message whose `type` the engine does not know
    #[serde(skip)]
    Unrecognized {
        kind: String,
    },
}

/// Every `type` value [`HostCommand`] deserialises
const COMMAND_KINDS: &[&str] = &[
    "loadUrl",
    "loadBase64",
    "closeDocument",
    "goToPage",
    "nextPage",
    "previousPage",
    "firstPage",
    "lastPage",
    "zoomIn",
    "zoomOut",
    "setZoom",
    "setZoomLevel",
    "fitWidth",
    "fitPage",
    "rotateClockwise",
    "rotateCounterClockwise",
    "search",
    "findNext",
    "findPrevious",
    "clearSearch",
    "selectText",
    "clearSelection",
    "highlightSelection",
    "addNote",
    "enableDrawing",
    "disableDrawing",
    "addStroke",
    "selectAnnotation",
    "clearAnnotations",
    "exportAnnotations",
    "importAnnotations",
    "print",
    "download",
    "toggleSidebar",
    "setSidebarVisible",
    "showThumbnails",
    "showBookmarks",
    "setAnnotationsEnabled",
    "setContainerSize",
    "scroll",
    "clickThumbnail",
    "clickBookmark",
    "followLink",
];

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message has no string `type` field")]
    MissingType,

    #[error("invalid `{kind}` message: {source}")]
    BadPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl HostCommand {
    /// Decode one inbound message.
    ///
    /// Unknown kinds decode to [`HostCommand::Unrecognized`]; a known kind with
    /// fields of the wrong shape is an error.
    pub fn decode(json: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(json).map_err(ProtocolError::Malformed)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(map) = &value else {
            return Err(ProtocolError::NotAnObject);
        };
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?
            .to_string();

        if !COMMAND_KINDS.contains(&kind.as_str()) {
            return Ok(HostCommand::Unrecognized { kind });
        }

        serde_json::from_value(value).map_err(|source| ProtocolError::BadPayload { kind, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn notifications_use_camel_case_wire_names() {
        let value = serde_json::to_value(Notification::DocumentLoaded {
            page_count: 5,
            title: String::new(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "documentLoaded", "pageCount": 5, "title": ""})
        );

        let value = serde_json::to_value(Notification::SearchCompleted {
            match_count: 1,
            current_match: 1,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "searchCompleted", "matchCount": 1, "currentMatch": 1})
        );

        let value = serde_json::to_value(Notification::ViewerReady).unwrap();
        assert_eq!(value, json!({"type": "viewerReady"}));
    }

    #[test]
    fn kind_matches_serialised_type() {
        let samples = [
            Notification::Ready,
            Notification::LinkClicked {
                url: "https://example.com".into(),
                is_internal: false,
            },
            Notification::error("boom"),
            Notification::AnnotationsExported {
                request_id: "r1".into(),
                annotations: "[]".into(),
            },
        ];
        for sample in samples {
            let value = serde_json::to_value(&sample).unwrap();
            assert_eq!(value["type"], sample.kind());
        }
    }

    #[test]
    fn decodes_known_commands() {
        assert_eq!(
            HostCommand::decode(r#"{"type":"goToPage","pageNumber":3}"#).unwrap(),
            HostCommand::GoToPage { page_number: 3 }
        );
        assert_eq!(
            HostCommand::decode(r#"{"type":"search","text":"foo"}"#).unwrap(),
            HostCommand::Search {
                text: "foo".into(),
                case_sensitive: false
            }
        );
        assert_eq!(
            HostCommand::decode(r#"{"type":"nextPage","extra":true}"#).unwrap(),
            HostCommand::NextPage
        );
        assert_eq!(
            HostCommand::decode(r#"{"type":"clickBookmark","path":[1,0]}"#).unwrap(),
            HostCommand::ClickBookmark { path: vec![1, 0] }
        );
    }

    #[test]
    fn unknown_kind_is_unrecognized() {
        assert_eq!(
            HostCommand::decode(r#"{"type":"launchRocket"}"#).unwrap(),
            HostCommand::Unrecognized {
                kind: "launchRocket".into()
            }
        );
    }

    #[test]
    fn bad_payloads_are_errors() {
        assert!(matches!(
            HostCommand::decode(r#"{"type":"goToPage","pageNumber":"three"}"#),
            Err(ProtocolError::BadPayload { .. })
        ));
        assert!(matches!(
            HostCommand::decode("[1,2,3]"),
            Err(ProtocolError::NotAnObject)
        ));
        assert!(matches!(
            HostCommand::decode(r#"{"pageNumber":3}"#),
            Err(ProtocolError::MissingType)
        ));
        assert!(matches!(
            HostCommand::decode("{nope"),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn every_listed_kind_is_decodable() {
        // unit kinds decode from the bare tag; the rest must fail on payload, not on the tag
        for kind in COMMAND_KINDS {
            let result = HostCommand::decode(&format!(r#"{{"type":"{kind}"}}"#));
            match result {
                Ok(HostCommand::Unrecognized { .. }) => panic!("{kind} treated as unknown"),
                Err(ProtocolError::BadPayload { source, .. }) => {
                    assert!(!source.to_string().contains("unknown variant"), "{kind}: {source}");
                }
                Ok(_) => {}
                Err(e) => panic!("{kind}: unexpected {e}"),
            }
        }
    }
}
