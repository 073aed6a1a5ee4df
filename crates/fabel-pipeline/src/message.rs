//! Request and response messages.
//!
//! Requests flow from the client toward the engine, responses flow back.
//! Both are tagged with a `type` field on the wire:
//!
//! ```json
//! {"type":"execute","command":["take","lamp"]}
//! {"type":"status","title":"Cave","canUndo":true,"canRedo":false}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Opaque engine snapshot carried by save and load messages.
pub type SaveData = serde_json::Value;

/// Key/value properties for engine configuration.
pub type ConfigProperties = BTreeMap<String, String>;

/// A message flowing from the client toward the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Ask for the words that may follow a partial command.
    GetWords {
        /// The words typed so far.
        command: Vec<String>,
    },
    /// Run a complete command.
    Execute {
        /// The command words.
        command: Vec<String>,
    },
    /// Ask for the current status line.
    GetStatus,
    /// Replace the engine state with a snapshot.
    Load {
        /// The snapshot to restore.
        data: SaveData,
    },
    /// Ask the engine for a snapshot.
    Save {
        /// Whether transient history may be left out.
        compress: bool,
    },
    /// Begin a game, optionally from a snapshot.
    Start {
        /// Snapshot to resume from.
        #[serde(default)]
        data: Option<SaveData>,
    },
    /// Pass configuration properties to the engine.
    Config {
        /// The properties to apply.
        properties: ConfigProperties,
    },
    /// Reset the engine to its initial state.
    Reset,
    /// Undo the last command.
    Undo,
    /// Redo the last undone command.
    Redo,
    /// Ask for information about the game.
    GetInfo,
}

impl Request {
    /// Build an execute request from words.
    pub fn execute(command: &[&str]) -> Self {
        Self::Execute {
            command: words(command),
        }
    }

    /// Build a word-list request from words.
    pub fn get_words(command: &[&str]) -> Self {
        Self::GetWords {
            command: words(command),
        }
    }

    /// Whether this is an execute request for exactly these words.
    pub fn is_command(&self, expected: &[&str]) -> bool {
        match self {
            Self::Execute { command } => {
                command.len() == expected.len()
                    && command.iter().zip(expected).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetWords { .. } => "getWords",
            Self::Execute { .. } => "execute",
            Self::GetStatus => "getStatus",
            Self::Load { .. } => "load",
            Self::Save { .. } => "save",
            Self::Start { .. } => "start",
            Self::Config { .. } => "config",
            Self::Reset => "reset",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::GetInfo => "getInfo",
        }
    }

    /// Decode a request from JSON.
    pub fn from_json(text: &str) -> PipelineResult<Self> {
        serde_json::from_str(text).map_err(|e| PipelineError::Protocol(e.to_string()))
    }

    /// Encode this request as JSON.
    pub fn to_json(&self) -> PipelineResult<String> {
        serde_json::to_string(self).map_err(|e| PipelineError::Protocol(e.to_string()))
    }
}

/// Severity of a log response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    /// Developer detail.
    Debug,
    /// Informational.
    Info,
    /// Something went wrong but the game continues.
    Warn,
    /// Something failed.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Out-of-band instruction for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ControlDirective {
    /// Withhold further output for a while.
    Pause {
        /// Pause length in milliseconds.
        millis: u64,
    },
    /// Show a modal message.
    Alert {
        /// The message text.
        text: String,
    },
    /// Apply changed user-interface settings.
    ApplySettings {
        /// The full settings object.
        settings: serde_json::Value,
    },
}

/// A message flowing from the engine toward the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    /// Text to show the player.
    Print {
        /// The text.
        text: String,
    },
    /// Words that may follow a partial command.
    Words {
        /// The partial command the words complete.
        command: Vec<String>,
        /// The candidate words.
        words: Vec<String>,
    },
    /// The status line.
    Status {
        /// Title, usually the current location.
        title: String,
        /// Whether an undo is available.
        can_undo: bool,
        /// Whether a redo is available.
        can_redo: bool,
    },
    /// A snapshot of the engine.
    SaveState {
        /// The snapshot.
        data: SaveData,
    },
    /// A log line.
    Log {
        /// Severity.
        level: LogLevel,
        /// The message.
        message: String,
    },
    /// An instruction for the client.
    Control {
        /// The instruction.
        directive: ControlDirective,
    },
}

impl Response {
    /// Build a print response.
    pub fn print(text: impl Into<String>) -> Self {
        Self::Print { text: text.into() }
    }

    /// Build a log response.
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Build a word-list response.
    pub fn words(command: Vec<String>, words: Vec<String>) -> Self {
        Self::Words { command, words }
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Print { .. } => "print",
            Self::Words { .. } => "words",
            Self::Status { .. } => "status",
            Self::SaveState { .. } => "saveState",
            Self::Log { .. } => "log",
            Self::Control { .. } => "control",
        }
    }

    /// Decode a response from JSON.
    pub fn from_json(text: &str) -> PipelineResult<Self> {
        serde_json::from_str(text).map_err(|e| PipelineError::Protocol(e.to_string()))
    }

    /// Encode this response as JSON.
    pub fn to_json(&self) -> PipelineResult<String> {
        serde_json::to_string(self).map_err(|e| PipelineError::Protocol(e.to_string()))
    }
}

/// Convert a slice of string literals into owned words.
pub fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_wire_format() {
        let json = Request::execute(&["take", "lamp"]).to_json().unwrap();
        insta::assert_snapshot!(json, @r#"{"type":"execute","command":["take","lamp"]}"#);
    }

    #[test]
    fn status_wire_format() {
        let status = Response::Status {
            title: "Cave".to_string(),
            can_undo: true,
            can_redo: false,
        };
        insta::assert_snapshot!(
            status.to_json().unwrap(),
            @r#"{"type":"status","title":"Cave","canUndo":true,"canRedo":false}"#
        );
    }

    #[test]
    fn control_wire_format() {
        let pause = Response::Control {
            directive: ControlDirective::Pause { millis: 500 },
        };
        insta::assert_snapshot!(
            pause.to_json().unwrap(),
            @r#"{"type":"control","directive":{"kind":"pause","millis":500}}"#
        );
    }

    #[test]
    fn unit_requests_decode() {
        assert_eq!(
            Request::from_json(r#"{"type":"getStatus"}"#).unwrap(),
            Request::GetStatus
        );
        assert_eq!(Request::from_json(r#"{"type":"undo"}"#).unwrap(), Request::Undo);
        assert_eq!(
            Request::from_json(r#"{"type":"start"}"#).unwrap(),
            Request::Start { data: None }
        );
    }

    #[test]
    fn unknown_tag_is_protocol_error() {
        let err = Request::from_json(r#"{"type":"teleport"}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Protocol(_)));

        let err = Response::from_json(r#"{"text":"no tag"}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Protocol(_)));
    }

    #[test]
    fn is_command_matches_exactly() {
        let request = Request::execute(&["restart"]);
        assert!(request.is_command(&["restart"]));
        assert!(!request.is_command(&["restart", "now"]));
        assert!(!Request::get_words(&["restart"]).is_command(&["restart"]));
    }

    #[test]
    fn log_levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
