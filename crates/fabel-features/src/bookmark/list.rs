use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, FeatureResult};
use crate::store::KeyValueStore;

/// Most bookmarks a player may keep.
pub const MAX_BOOKMARKS: usize = 10;

/// A named, compressed engine snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Display name.
    pub name: String,
    /// Snapshot JSON, gzipped and base64-encoded.
    pub data: String,
}

/// The persisted, bounded list of bookmarks.
///
/// Every call reads or writes the store, so two lists over the same store
/// and key always agree.
pub struct BookmarkList {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl BookmarkList {
    /// Keep bookmarks in `store` under `key`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// All bookmarks, oldest first.
    pub fn load(&self) -> FeatureResult<Vec<Bookmark>> {
        match self.store.get_item(&self.key)? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, bookmarks: &[Bookmark]) -> FeatureResult<()> {
        self.store
            .set_item(&self.key, &serde_json::to_string(bookmarks)?)
    }

    /// Number of bookmarks.
    pub fn len(&self) -> FeatureResult<usize> {
        Ok(self.load()?.len())
    }

    /// Whether there are no bookmarks.
    pub fn is_empty(&self) -> FeatureResult<bool> {
        Ok(self.load()?.is_empty())
    }

    /// The bookmark at `index`.
    pub fn get(&self, index: usize) -> FeatureResult<Bookmark> {
        self.load()?
            .into_iter()
            .nth(index)
            .ok_or(FeatureError::InvalidBookmark)
    }

    /// Append a bookmark. Rejected once the list holds [`MAX_BOOKMARKS`].
    pub fn add(&self, bookmark: Bookmark) -> FeatureResult<usize> {
        let mut bookmarks = self.load()?;
        if bookmarks.len() >= MAX_BOOKMARKS {
            return Err(FeatureError::TooManyBookmarks);
        }
        bookmarks.push(bookmark);
        self.save(&bookmarks)?;
        Ok(bookmarks.len())
    }

    /// Remove and return the bookmark at `index`.
    pub fn remove(&self, index: usize) -> FeatureResult<Bookmark> {
        let mut bookmarks = self.load()?;
        if index >= bookmarks.len() {
            return Err(FeatureError::InvalidBookmark);
        }
        let removed = bookmarks.remove(index);
        self.save(&bookmarks)?;
        Ok(removed)
    }
}
