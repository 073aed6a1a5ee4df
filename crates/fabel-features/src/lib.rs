//! Player-facing features layered onto a Fabel pipeline.
//!
//! Features come in two shapes. Filters in [`filters`] watch or rewrite
//! traffic without ever holding the conversation. Machines in [`machines`]
//! and [`bookmark`] take over the conversation while a dialog is open.
//! [`Session`] wires them all between a client and an engine.

pub mod bookmark;
pub mod codec;
pub mod config;
pub mod error;
pub mod exchange;
pub mod filters;
pub mod machines;
pub mod session;
pub mod settings;
pub mod store;
pub mod watched;

pub use config::SessionConfig;
pub use error::{FeatureError, FeatureResult};
pub use exchange::{DirectoryExchange, FileExchange, MemoryExchange};
pub use session::{Collaborators, Session, TRIGGERS};
pub use settings::{COLOUR_SCHEMES, Settings, SettingsStore, UI_SCHEMES};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use watched::Watched;
