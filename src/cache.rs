//! On-disk state under the cache directory: saved bookmarks and fetched
//! recitation clips.
//!
//! Bookmarks live in a single `bookmarks.toml`; clips are stored under
//! `audio/` using a hash of their locator as the filename.

use recitation_core::{BookmarkAdapter, BookmarkRequest};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BOOKMARKS_FILE: &str = "bookmarks.toml";

/// Bookmarks kept newest first and written back on every toggle.
pub struct BookmarkStore {
    path: PathBuf,
    entries: Vec<BookmarkRequest>,
}

#[derive(Default, serde::Serialize, serde::Deserialize)]
struct BookmarkFile {
    #[serde(default)]
    bookmarks: Vec<BookmarkRequest>,
}

impl BookmarkStore {
    /// Load bookmarks from `cache_dir`. A missing or unreadable file yields an
    /// empty store.
    pub fn load(cache_dir: &Path) -> Self {
        let path = cache_dir.join(BOOKMARKS_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(data) => match toml::from_str::<BookmarkFile>(&data) {
                Ok(file) => file.bookmarks,
                Err(err) => {
                    warn!(path = %path.display(), "Ignoring malformed bookmarks: {err}");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        debug!(path = %path.display(), count = entries.len(), "Loaded bookmarks");
        Self { path, entries }
    }

    pub fn list(&self) -> &[BookmarkRequest] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&BookmarkRequest> {
        self.entries.get(index)
    }

    pub fn contains(&self, request: &BookmarkRequest) -> bool {
        self.position_of(request).is_some()
    }

    fn position_of(&self, request: &BookmarkRequest) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.view_type == request.view_type && entry.identifier == request.identifier
        })
    }

    /// Persist the store. Errors are logged and otherwise ignored so a
    /// read-only cache does not interrupt playback.
    pub fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), "Failed to create cache dir: {err}");
                return;
            }
        }
        let file = BookmarkFile {
            bookmarks: self.entries.clone(),
        };
        match toml::to_string(&file) {
            Ok(contents) => {
                if let Err(err) = fs::write(&self.path, contents) {
                    warn!(path = %self.path.display(), "Failed to save bookmarks: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize bookmarks: {err}"),
        }
    }
}

impl BookmarkAdapter for BookmarkStore {
    fn toggle(&mut self, request: BookmarkRequest) {
        match self.position_of(&request) {
            Some(idx) => {
                let removed = self.entries.remove(idx);
                info!(label = %removed.label, "Removed bookmark");
            }
            None => {
                info!(label = %request.label, "Added bookmark");
                self.entries.insert(0, request);
            }
        }
        self.save();
    }
}

/// Cache location for the clip at `locator`, keeping its extension so the
/// decoder can sniff the format.
pub fn audio_cache_path(cache_dir: &Path, locator: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(locator.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    let ext = locator
        .rsplit('/')
        .next()
        .and_then(|name| name.split(['?', '#']).next())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5)
        .unwrap_or("bin");
    cache_dir.join("audio").join(format!("{hash}.{ext}"))
}
