//! Configuration for a play session.

use std::time::Duration;

/// Configuration for a play session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identifies the game; stored data and exported bookmarks carry it.
    pub game_id: String,
    /// How long a bookmark capture waits for the engine's snapshot.
    pub capture_timeout: Duration,
    /// How often a bookmark capture checks for the snapshot.
    pub capture_poll: Duration,
    /// Whether every snapshot is persisted for resuming later.
    pub autosave: bool,
    /// Store key of the autosave snapshot.
    pub autosave_key: String,
    /// Store key of the bookmark list.
    pub bookmarks_key: String,
    /// Store key of the settings.
    pub settings_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game_id: "fabel".to_string(),
            capture_timeout: Duration::from_millis(100),
            capture_poll: Duration::from_millis(10),
            autosave: true,
            autosave_key: "autosave".to_string(),
            bookmarks_key: "bookmarks".to_string(),
            settings_key: "settings".to_string(),
        }
    }
}

impl SessionConfig {
    /// Set the game id.
    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = game_id.into();
        self
    }

    /// Set how long captures wait, and how often they check.
    pub fn with_capture(mut self, timeout: Duration, poll: Duration) -> Self {
        self.capture_timeout = timeout;
        self.capture_poll = poll.min(timeout);
        self
    }

    /// Turn autosave on or off.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// A store key qualified by the game id, so games sharing a store do
    /// not see each other's data.
    pub fn key(&self, name: &str) -> String {
        format!("{}/{}", self.game_id, name)
    }

    /// Qualified key of the autosave snapshot.
    pub fn autosave_key(&self) -> String {
        self.key(&self.autosave_key)
    }

    /// Qualified key of the bookmark list.
    pub fn bookmarks_key(&self) -> String {
        self.key(&self.bookmarks_key)
    }

    /// Qualified key of the settings.
    pub fn settings_key(&self) -> String {
        self.key(&self.settings_key)
    }
}
