//! Bookmark tree built from the document outline.
//!
//! Destinations are kept as-is at build time and resolved against the
//! document only when an entry is clicked.

use super::document::{DocumentError, PdfDocument};
use super::types::{Destination, OutlineItem};

/// A node of the bookmark tree
#[derive(Clone, Debug, PartialEq)]
pub struct BookmarkNode {
    pub title: String,
    pub destination: Option<Destination>,
    pub children: Vec<BookmarkNode>,
}

impl BookmarkNode {
    fn from_outline(item: OutlineItem) -> Self {
        Self {
            title: item.title.trim().to_string(),
            destination: item.destination,
            children: item
                .children
                .into_iter()
                .map(BookmarkNode::from_outline)
                .collect(),
        }
    }

    /// Resolve this entry's destination to a 1-based page number
    pub fn resolve(&self, doc: &dyn PdfDocument) -> Result<Option<usize>, DocumentError> {
        let Some(destination) = &self.destination else {
            return Ok(None);
        };
        let index = doc.resolve_destination(destination)?;
        doc.check_index(index)?;
        Ok(Some(index + 1))
    }
}

/// Bookmark panel contents for the live document
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Bookmarks {
    /// Nothing loaded yet
    #[default]
    NotLoaded,
    /// The document has no outline: show the "no bookmarks" placeholder
    Empty,
    /// The outline could not be read
    Unavailable(String),
    Tree(Vec<BookmarkNode>),
}

impl Bookmarks {
    /// Read the outline once and build the tree
    pub fn load(doc: &dyn PdfDocument) -> Self {
        match doc.outline() {
            Ok(items) if items.is_empty() => Self::Empty,
            Ok(items) => Self::Tree(items.into_iter().map(BookmarkNode::from_outline).collect()),
            Err(e) => {
                log::warn!("Could not load bookmarks: {e}");
                Self::Unavailable(e.to_string())
            }
        }
    }

    /// Placeholder text for the panel, if the tree is not shown
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Empty => Some("No bookmarks available"),
            Self::Unavailable(_) => Some("Could not load bookmarks"),
            Self::NotLoaded | Self::Tree(_) => None,
        }
    }

    /// Node at an index path, e.g. `[1, 0]` = first child of the second root
    #[must_use]
    pub fn node(&self, path: &[usize]) -> Option<&BookmarkNode> {
        let Self::Tree(roots) = self else {
            return None;
        };
        let (first, rest) = path.split_first()?;
        let mut node = roots.get(*first)?;
        for index in rest {
            node = node.children.get(*index)?;
        }
        Some(node)
    }

    /// Depth-first (title, depth) listing, the order the panel shows entries in
    #[must_use]
    pub fn flatten(&self) -> Vec<(&str, usize)> {
        fn walk<'a>(nodes: &'a [BookmarkNode], depth: usize, out: &mut Vec<(&'a str, usize)>) {
            for node in nodes {
                out.push((node.title.as_str(), depth));
                walk(&node.children, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        if let Self::Tree(roots) = self {
            walk(roots, 0, &mut out);
        }
        out
    }
}
