//! Convenience wrapper around a forwarder.

use crate::error::PipelineResult;
use crate::forwarder::Forwarder;
use crate::message::{ControlDirective, LogLevel, Request, Response};

/// A [`Forwarder`] with shorthand for the responses machines emit most.
///
/// Everything is built on `respond`, so a machine never needs to know the
/// shape of the wire messages.
#[derive(Debug, Clone)]
pub struct Responder {
    forwarder: Forwarder,
}

impl Responder {
    /// Wrap a forwarder.
    pub fn new(forwarder: Forwarder) -> Self {
        Self { forwarder }
    }

    /// The wrapped forwarder.
    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Push a request toward the engine.
    pub async fn send(&self, request: Request) -> PipelineResult<()> {
        self.forwarder.send(request).await
    }

    /// Push a response toward the client.
    pub fn respond(&self, response: Response) -> PipelineResult<()> {
        self.forwarder.respond(response)
    }

    /// Show text to the player.
    pub fn print(&self, text: impl Into<String>) -> PipelineResult<()> {
        self.respond(Response::print(text))
    }

    /// Emit a debug log line.
    pub fn debug(&self, message: impl Into<String>) -> PipelineResult<()> {
        self.respond(Response::log(LogLevel::Debug, message))
    }

    /// Emit an informational log line.
    pub fn info(&self, message: impl Into<String>) -> PipelineResult<()> {
        self.respond(Response::log(LogLevel::Info, message))
    }

    /// Emit a warning.
    pub fn warn(&self, message: impl Into<String>) -> PipelineResult<()> {
        self.respond(Response::log(LogLevel::Warn, message))
    }

    /// Emit an error.
    pub fn error(&self, message: impl Into<String>) -> PipelineResult<()> {
        self.respond(Response::log(LogLevel::Error, message))
    }

    /// Offer a word list for a partial command.
    pub fn words(&self, command: Vec<String>, words: Vec<String>) -> PipelineResult<()> {
        self.respond(Response::words(command, words))
    }

    /// Send a control directive to the client.
    pub fn control(&self, directive: ControlDirective) -> PipelineResult<()> {
        self.respond(Response::Control { directive })
    }
}
