//! Stages that support features without taking over the conversation.

mod autosave;
mod log_gate;
mod status;
mod undo;
mod words;

pub use autosave::AutoSave;
pub use log_gate::LogGate;
pub use status::{StatusLine, StatusRecorder, restore_autosave};
pub use undo::UndoRedoFilter;
pub use words::WordInjector;

use fabel_pipeline::Response;

/// Add `extra` to a root word list, skipping words already offered.
///
/// Word lists for partial commands are returned unchanged.
pub(crate) fn inject_root_words(response: Response, extra: &[String]) -> Response {
    match response {
        Response::Words { command, mut words } if command.is_empty() => {
            for word in extra {
                if !words.contains(word) {
                    words.push(word.clone());
                }
            }
            Response::Words { command, words }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use fabel_pipeline::message::words;

    use super::*;

    #[test]
    fn injects_once_into_root_lists() {
        let root = Response::words(Vec::new(), words(&["look", "undo"]));
        assert_eq!(
            inject_root_words(root, &words(&["undo", "redo"])),
            Response::words(Vec::new(), words(&["look", "undo", "redo"]))
        );
    }

    #[test]
    fn leaves_partial_lists_alone() {
        let partial = Response::words(words(&["go"]), words(&["north"]));
        assert_eq!(
            inject_root_words(partial.clone(), &words(&["undo"])),
            partial
        );
    }
}
