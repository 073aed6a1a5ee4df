//! Error types for the engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while running a game.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The command was not understood.
    #[error("I don't understand \"{0}\".")]
    UnknownCommand(String),

    /// A command needs an argument that was not given.
    #[error("{0} what?")]
    MissingArgument(String),

    /// No exit leads that way.
    #[error("You can't go {0} from here.")]
    NoExit(String),

    /// The named item is not in the room.
    #[error("You don't see any {0} here.")]
    ItemNotHere(String),

    /// The named item is not carried.
    #[error("You aren't carrying any {0}.")]
    NotCarried(String),

    /// The item cannot be picked up.
    #[error("You can't take the {0}.")]
    CannotTake(String),

    /// There is nothing to undo or redo.
    #[error("There is nothing to {0}.")]
    NoHistory(&'static str),

    /// The world references a room that does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// A snapshot could not be decoded.
    #[error("invalid save data: {0}")]
    InvalidSave(String),

    /// A world file could not be decoded.
    #[error("invalid world: {0}")]
    InvalidWorld(#[from] serde_json::Error),
}
