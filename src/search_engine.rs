use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use crate::pdf::PdfDocument;

/// A single occurrence of the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Page number (1-based)
    pub page_number: usize,
    /// Byte offset into the page's joined text
    pub offset: usize,
}

/// Match position reported to the host: 1-based index and total count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStatus {
    pub match_count: usize,
    /// 1-based; 0 when there are no matches
    pub current_match: usize,
}

/// Ordered matches of one query over the whole document
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    query: String,
    case_sensitive: bool,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchIndex {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<SearchMatch> {
        self.current.and_then(|i| self.matches.get(i).copied())
    }

    pub fn status(&self) -> SearchStatus {
        SearchStatus {
            match_count: self.matches.len(),
            current_match: self.current.map_or(0, |i| i + 1),
        }
    }

    /// Move to the next match, wrapping from last to first
    pub fn advance(&mut self) -> Option<SearchMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        self.current = Some(self.current.map_or(0, |i| (i + 1) % len));
        self.current()
    }

    /// Move to the previous match, wrapping from first to last
    pub fn retreat(&mut self) -> Option<SearchMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        self.current = Some(self.current.map_or(len - 1, |i| (i + len - 1) % len));
        self.current()
    }

    /// Matches on one page, in offset order
    pub fn matches_on_page(&self, page_number: usize) -> impl Iterator<Item = &SearchMatch> {
        self.matches
            .iter()
            .filter(move |m| m.page_number == page_number)
    }
}

/// Literal, optionally case-insensitive, full-document text search
#[derive(Debug, Default)]
pub struct SearchEngine {
    index: Option<SearchIndex>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live index, if a search has run since the last clear
    pub fn index(&self) -> Option<&SearchIndex> {
        self.index.as_ref()
    }

    pub fn index_mut(&mut self) -> Option<&mut SearchIndex> {
        self.index.as_mut()
    }

    /// Compile the query as a literal pattern; metacharacters have no meaning
    pub fn compile(query: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&regex::escape(query))
            .case_insensitive(!case_sensitive)
            .build()
    }

    /// Build a fresh index over every page.
    ///
    /// Returns `Ok(None)` without touching the previous index when `query` is empty.
    /// Fails only when the literal pattern exceeds the regex size limit.
    pub fn search(
        &mut self,
        doc: &dyn PdfDocument,
        query: &str,
        case_sensitive: bool,
    ) -> Result<Option<&SearchIndex>, regex::Error> {
        if query.is_empty() {
            return Ok(None);
        }

        let pattern = Self::compile(query, case_sensitive)?;
        let mut matches = Vec::new();

        for index in 0..doc.page_count() {
            let page_number = index + 1;
            let text = match page_text(doc, index) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping page {page_number} in search: {e}");
                    continue;
                }
            };
            matches.extend(pattern.find_iter(&text).map(|m| SearchMatch {
                page_number,
                offset: m.start(),
            }));
        }

        debug!(
            "Search for {query:?} (case_sensitive={case_sensitive}) found {} matches",
            matches.len()
        );

        let current = if matches.is_empty() { None } else { Some(0) };
        self.index = Some(SearchIndex {
            query: query.to_string(),
            case_sensitive,
            matches,
            current,
        });
        Ok(self.index.as_ref())
    }

    pub fn clear(&mut self) {
        self.index = None;
    }
}

/// Page text as all runs joined by single spaces, in source order
pub fn page_text(
    doc: &dyn PdfDocument,
    index: usize,
) -> Result<String, crate::pdf::DocumentError> {
    let runs = doc.text_content(index)?;
    Ok(runs
        .iter()
        .map(|run| run.text.as_str())
        .collect::<Vec<_>>()
        .join(" "))
}
