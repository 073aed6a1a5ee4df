//! Saving and restoring named snapshots.
//!
//! The bookmark manager is a two-state machine. In `prompt` the player can
//! create a bookmark from the engine's current snapshot, import one from a
//! file, or select an existing one; in `bookmark-selected` the selection
//! can be loaded, deleted or exported. Problems are reported as warnings
//! and end the dialog.

mod list;
mod manager;

pub use list::{Bookmark, BookmarkList, MAX_BOOKMARKS};
pub use manager::{
    BookmarkServices, ExportedBookmark, GameLoader, ResetAndLoad, Selection, bookmark_manager,
};
