//! Reference text-adventure engine for Fabel.
//!
//! Implements the engine side of the pipeline: a small world of rooms and
//! items, a word-based command set with completion, status lines, snapshots,
//! and undo/redo. The pipeline treats it as an opaque server; any engine
//! speaking the same messages can replace it.

pub mod direction;
pub mod error;
pub mod game;
pub mod server;
pub mod world;

pub use direction::Direction;
pub use error::{EngineError, EngineResult};
pub use game::{Beat, Game, GameState, Outcome};
pub use server::GameServer;
pub use world::{Item, Room, World};
