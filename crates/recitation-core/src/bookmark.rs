//! Bookmark requests.
//!
//! The core only computes what a bookmark for the current view is called;
//! storing and toggling bookmarks belongs to a [`BookmarkAdapter`].

use crate::content::CorpusIndex;
use crate::model::{Document, ViewMode, ViewType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRequest {
    pub view_type: ViewType,
    pub identifier: u32,
    pub label: String,
}

pub trait BookmarkAdapter {
    /// Add the bookmark if absent, remove it if present.
    fn toggle(&mut self, request: BookmarkRequest);
}

pub fn bookmark_request(mode: ViewMode, document: &Document, index: &CorpusIndex) -> BookmarkRequest {
    BookmarkRequest {
        view_type: mode.view_type(),
        identifier: mode.identifier(),
        label: bookmark_label(mode, document, index),
    }
}

/// Display label for a bookmark of `mode`, derived from the document's first
/// verse where the view needs it.
pub fn bookmark_label(mode: ViewMode, document: &Document, index: &CorpusIndex) -> String {
    match mode {
        ViewMode::SinglePage(page) => {
            let anchor_page = document.first_verse().map_or(page, |verse| verse.page);
            match index.part_for_page(anchor_page) {
                Some(part) => format!("Page {page} (Part {part})"),
                None => format!("Page {page}"),
            }
        }
        ViewMode::WholeSection(id) => document
            .section(id)
            .map(|section| section.info.name.clone())
            .or_else(|| index.section_info(id).map(|info| info.name.clone()))
            .unwrap_or_else(|| format!("Section {id}")),
        ViewMode::WholePart(part) => format!("Part {part}"),
    }
}
