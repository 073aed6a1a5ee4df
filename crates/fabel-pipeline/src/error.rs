//! Error types for the pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while routing messages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A message could not be decoded or violated the stage contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A request was sent onward from the server edge.
    #[error("cannot send {0} past the server edge")]
    PastServerEdge(String),

    /// A response was sent onward from the client edge.
    #[error("cannot respond with {0} past the client edge")]
    PastClientEdge(String),

    /// No stage with the given name exists in the chain.
    #[error("no stage named {0}")]
    UnknownStage(String),

    /// A state machine tried to enter a state it does not declare.
    #[error("unknown state: {0}")]
    UnknownState(String),

    /// Input was sent to a state machine that is not running.
    #[error("state machine is not running")]
    NotRunning,

    /// The engine behind the server edge failed.
    #[error("server error: {0}")]
    Server(String),

    /// The client endpoint failed to accept a response.
    #[error("client error: {0}")]
    Client(String),

    /// A feature stage failed.
    #[error("{0}")]
    Feature(String),
}
