//! Bidirectional message pipeline for Fabel.
//!
//! Every command the player types and every line the engine prints passes
//! through a [`DuplexProxy`]: an ordered chain of [`Filter`] stages between
//! the client and the game engine. Stages can forward, rewrite, drop, answer
//! locally, or hold messages. A [`StateMachineFilter`] lets a
//! [`StateMachine`] take over the conversation for dialogs such as restart
//! confirmation, and a [`PauseFilter`] gates engine output for dramatic
//! pauses.

pub mod dispatch;
pub mod error;
pub mod filter;
pub mod forwarder;
pub mod machine;
pub mod machine_filter;
pub mod message;
pub mod pause;
pub mod proxy;
pub mod responder;

pub use dispatch::{InputMatch, handle_input};
pub use error::{PipelineError, PipelineResult};
pub use filter::{Filter, RequestListener, ResponseListener, ResponseLog};
pub use forwarder::Forwarder;
pub use machine::{MachineOps, MachineStatus, State, StateMachine, Transition};
pub use machine_filter::{StateMachineFilter, Turn};
pub use message::{ConfigProperties, ControlDirective, LogLevel, Request, Response, SaveData};
pub use pause::{CONTINUE, PauseFilter};
pub use proxy::DuplexProxy;
pub use responder::Responder;
