//! Error types for the feature layer.

use fabel_pipeline::PipelineError;
use thiserror::Error;

/// Result type for feature operations.
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Errors that can occur inside a feature.
///
/// Most of these are reported to the player as warnings and never leave the
/// feature that raised them.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The key/value store could not be read or written.
    #[error("storage error: {0}")]
    Store(String),

    /// A file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be compressed or decompressed.
    #[error("compression error: {0}")]
    Compression(String),

    /// Stored or imported JSON was malformed.
    #[error("invalid data: {0}")]
    Json(#[from] serde_json::Error),

    /// The bookmark list is full.
    #[error("Too many bookmarks")]
    TooManyBookmarks,

    /// A bookmark index was out of range.
    #[error("Invalid bookmark selected")]
    InvalidBookmark,

    /// The engine did not answer in time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// An imported bookmark belongs to another game.
    #[error("bookmark is for {found}, not {expected}")]
    WrongGame {
        /// The game id of the running session.
        expected: String,
        /// The game id in the imported file.
        found: String,
    },

    /// The player did not provide a file to import.
    #[error("no file to import")]
    NoFile,

    /// The pipeline refused a message.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<FeatureError> for PipelineError {
    fn from(error: FeatureError) -> Self {
        match error {
            FeatureError::Pipeline(inner) => inner,
            other => PipelineError::Feature(other.to_string()),
        }
    }
}
