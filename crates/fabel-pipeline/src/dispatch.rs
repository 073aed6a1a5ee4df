//! Command dispatch helpers for state handlers.
//!
//! ```
//! use fabel_pipeline::{Request, handle_input};
//!
//! let input = Request::execute(&["cancel"]);
//! let choice = handle_input(&input)
//!     .on_command(&["load"], || "load")
//!     .on_command(&["cancel"], || "cancel")
//!     .on_get_words(|_| "words")
//!     .on_any(|_| "unknown");
//! assert_eq!(choice, "cancel");
//! ```

use crate::message::Request;

/// Start matching a request against a sequence of handlers.
pub fn handle_input<T>(input: &Request) -> InputMatch<'_, T> {
    InputMatch {
        input,
        outcome: None,
    }
}

/// A request being matched. Handlers are tried in registration order and the
/// first match wins; later handlers are skipped.
#[derive(Debug)]
pub struct InputMatch<'a, T> {
    input: &'a Request,
    outcome: Option<T>,
}

impl<'a, T> InputMatch<'a, T> {
    /// Fire if the input executes exactly `words`.
    pub fn on_command(mut self, words: &[&str], handler: impl FnOnce() -> T) -> Self {
        if self.outcome.is_none() && self.input.is_command(words) {
            self.outcome = Some(handler());
        }
        self
    }

    /// Fire for any execute request not matched so far.
    pub fn on_any_command(mut self, handler: impl FnOnce(&'a [String]) -> T) -> Self {
        if self.outcome.is_some() {
            return self;
        }
        if let Request::Execute { command } = self.input {
            self.outcome = Some(handler(command.as_slice()));
        }
        self
    }

    /// Fire for word-list requests.
    pub fn on_get_words(mut self, handler: impl FnOnce(&'a [String]) -> T) -> Self {
        if self.outcome.is_some() {
            return self;
        }
        if let Request::GetWords { command } = self.input {
            self.outcome = Some(handler(command.as_slice()));
        }
        self
    }

    /// Finish matching; `handler` fires only if nothing matched.
    pub fn on_any(self, handler: impl FnOnce(&'a Request) -> T) -> T {
        match self.outcome {
            Some(outcome) => outcome,
            None => handler(self.input),
        }
    }

    /// Finish matching without a fallback.
    pub fn outcome(self) -> Option<T> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Choice {
        Restart,
        Other(Vec<String>),
        Words(Vec<String>),
        Fallback(&'static str),
    }

    fn dispatch(input: &Request) -> Choice {
        handle_input(input)
            .on_command(&["restart"], || Choice::Restart)
            .on_any_command(|command| Choice::Other(command.to_vec()))
            .on_get_words(|command| Choice::Words(command.to_vec()))
            .on_any(|request| Choice::Fallback(request.kind()))
    }

    #[test]
    fn exact_command_wins_over_any_command() {
        assert_eq!(dispatch(&Request::execute(&["restart"])), Choice::Restart);
    }

    #[test]
    fn unmatched_execute_goes_to_any_command() {
        assert_eq!(
            dispatch(&Request::execute(&["restart", "now"])),
            Choice::Other(vec!["restart".to_string(), "now".to_string()])
        );
    }

    #[test]
    fn word_requests_go_to_get_words() {
        assert_eq!(
            dispatch(&Request::get_words(&["res"])),
            Choice::Words(vec!["res".to_string()])
        );
    }

    #[test]
    fn fallback_only_fires_when_nothing_matched() {
        assert_eq!(dispatch(&Request::Undo), Choice::Fallback("undo"));
    }

    #[test]
    fn only_first_handler_runs() {
        let mut calls = 0;
        let outcome = handle_input(&Request::execute(&["a"]))
            .on_command(&["a"], || 1)
            .on_command(&["a"], || {
                calls += 1;
                2
            })
            .outcome();
        assert_eq!(outcome, Some(1));
        assert_eq!(calls, 0);
    }
}
