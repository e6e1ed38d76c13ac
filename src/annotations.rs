use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ID_PREFIX: &str = "annot-";

/// Annotation category as reported to the host
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Highlight,
    Note,
    Drawing,
}

impl AnnotationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Note => "note",
            AnnotationKind::Drawing => "drawing",
        }
    }
}

/// A point in page-surface coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// What the annotation actually holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationPayload {
    /// Highlight over the text that was selected when it was made
    Highlight { color: String, text: String },
    /// Free-text note pinned at a position on the page
    Note { x: f32, y: f32, text: String },
    /// Freehand stroke
    Drawing {
        color: String,
        width: f32,
        points: Vec<Point>,
    },
}

impl AnnotationPayload {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationPayload::Highlight { .. } => AnnotationKind::Highlight,
            AnnotationPayload::Note { .. } => AnnotationKind::Note,
            AnnotationPayload::Drawing { .. } => AnnotationKind::Drawing,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: String,
    pub page_number: usize,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: AnnotationPayload,
}

impl AnnotationRecord {
    pub fn kind(&self) -> AnnotationKind {
        self.payload.kind()
    }
}

/// Stroke style remembered between drawing sessions
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingMode {
    pub enabled: bool,
    pub color: String,
    pub width: f32,
}

impl Default for DrawingMode {
    fn default() -> Self {
        Self {
            enabled: false,
            color: "#000000".to_string(),
            width: 2.0,
        }
    }
}

/// Text the user currently has selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelection {
    pub page_number: usize,
    pub text: String,
}

impl TextSelection {
    /// Selections made only of whitespace cannot be highlighted
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// All annotations of the live document plus the active text selection
#[derive(Debug)]
pub struct AnnotationStore {
    records: Vec<AnnotationRecord>,
    next_id: u64,
    selection: Option<TextSelection>,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            selection: None,
        }
    }

    pub fn add(&mut self, page_number: usize, payload: AnnotationPayload) -> &AnnotationRecord {
        let id = self.fresh_id();
        self.records.push(AnnotationRecord {
            id,
            page_number,
            created_at: Utc::now(),
            payload,
        });
        &self.records[self.records.len() - 1]
    }

    /// Next unused id. Once the counter is exhausted it wraps to 1 and skips
    /// ids that are still taken.
    fn fresh_id(&mut self) -> String {
        loop {
            let id = format!("{ID_PREFIX}{}", self.next_id);
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            if self.find(&id).is_none() {
                return id;
            }
        }
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn on_page(&self, page_number: usize) -> impl Iterator<Item = &AnnotationRecord> {
        self.records
            .iter()
            .filter(move |r| r.page_number == page_number)
    }

    pub fn find(&self, id: &str) -> Option<&AnnotationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Remove the records of one page, returning how many went away
    pub fn clear_page(&mut self, page_number: usize) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.page_number != page_number);
        before - self.records.len()
    }

    /// Forget everything, including the selection
    pub fn clear(&mut self) {
        self.records.clear();
        self.selection = None;
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.records)
    }

    /// Replace the list with the records in `json`.
    ///
    /// Leaves the store untouched on malformed input.
    pub fn import_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let records: Vec<AnnotationRecord> = serde_json::from_str(json)?;

        let highest = records
            .iter()
            .filter_map(|r| r.id.strip_prefix(ID_PREFIX)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest.saturating_add(1));

        self.records = records;
        Ok(self.records.len())
    }

    pub fn select_text(&mut self, page_number: usize, text: String) {
        self.selection = Some(TextSelection { page_number, text });
    }

    pub fn selection(&self) -> Option<&TextSelection> {
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}
