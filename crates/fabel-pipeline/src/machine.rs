//! Generic named-state machines.
//!
//! A [`StateMachine`] owns a set of named [`State`]s. Each state reacts to
//! being entered and to input, operating on a caller-supplied context. The
//! machine knows nothing about the pipeline; [`crate::StateMachineFilter`]
//! is what plugs it in.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::message::Request;

/// Lifecycle of a machine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus {
    /// `start` has never been called.
    NotStarted,
    /// Accepting input.
    Running,
    /// Terminated; input is no longer routed to the machine.
    Finished,
}

/// What a state wants to happen after handling input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Remain in the current state.
    Stay,
    /// Enter the named state, firing its `on_enter`.
    Goto(String),
    /// Terminate the machine.
    Finish,
}

impl Transition {
    /// Transition to the named state.
    pub fn goto(state: impl Into<String>) -> Self {
        Self::Goto(state.into())
    }
}

/// Requests a state can make from inside `on_enter`.
#[derive(Debug, Default)]
pub struct MachineOps {
    next_state: Option<String>,
    status: Option<MachineStatus>,
}

impl MachineOps {
    /// Move on to another state as soon as `on_enter` returns.
    pub fn set_state(&mut self, state: impl Into<String>) {
        self.next_state = Some(state.into());
    }

    /// Override the machine status as soon as `on_enter` returns.
    pub fn set_status(&mut self, status: MachineStatus) {
        self.status = Some(status);
    }
}

/// One named state.
#[async_trait]
pub trait State<C: Send, I: Send = Request>: Send + Sync {
    /// Called when the state becomes current.
    async fn on_enter(&self, _ctx: &mut C, _ops: &mut MachineOps) -> PipelineResult<()> {
        Ok(())
    }

    /// Called for every input while the state is current.
    async fn on_action(&self, input: I, ctx: &mut C) -> PipelineResult<Transition>;
}

/// A machine of named states over context `C` and input `I`.
pub struct StateMachine<C, I = Request> {
    initial: String,
    current: String,
    status: MachineStatus,
    states: HashMap<String, Box<dyn State<C, I>>>,
}

impl<C: Send, I: Send> StateMachine<C, I> {
    /// Create a machine that starts in `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        Self {
            current: initial.clone(),
            initial,
            status: MachineStatus::NotStarted,
            states: HashMap::new(),
        }
    }

    /// Declare a state.
    pub fn with_state(mut self, name: impl Into<String>, state: impl State<C, I> + 'static) -> Self {
        self.states.insert(name.into(), Box::new(state));
        self
    }

    /// Current lifecycle status.
    pub fn status(&self) -> MachineStatus {
        self.status
    }

    /// Name of the current state.
    pub fn current_state(&self) -> &str {
        &self.current
    }

    /// Whether the machine accepts input.
    pub fn is_running(&self) -> bool {
        self.status == MachineStatus::Running
    }

    /// Force the lifecycle status.
    pub fn set_status(&mut self, status: MachineStatus) {
        self.status = status;
    }

    /// Start (or restart) the machine in its initial state.
    pub async fn start(&mut self, ctx: &mut C) -> PipelineResult<MachineStatus> {
        self.status = MachineStatus::Running;
        self.enter(self.initial.clone(), ctx).await?;
        Ok(self.status)
    }

    /// Feed one input to the current state.
    pub async fn send(&mut self, input: I, ctx: &mut C) -> PipelineResult<MachineStatus> {
        if !self.is_running() {
            return Err(PipelineError::NotRunning);
        }

        let state = self
            .states
            .get(&self.current)
            .ok_or_else(|| PipelineError::UnknownState(self.current.clone()))?;

        let transition = state.on_action(input, ctx).await?;
        match transition {
            Transition::Stay => {}
            Transition::Goto(next) => self.enter(next, ctx).await?,
            Transition::Finish => {
                debug!(state = %self.current, "machine finished");
                self.status = MachineStatus::Finished;
            }
        }
        Ok(self.status)
    }

    async fn enter(&mut self, name: String, ctx: &mut C) -> PipelineResult<()> {
        let mut pending = Some(name);
        while let Some(name) = pending.take() {
            let state = self
                .states
                .get(&name)
                .ok_or_else(|| PipelineError::UnknownState(name.clone()))?;
            debug!(state = %name, "entering state");
            self.current = name;

            let mut ops = MachineOps::default();
            state.on_enter(ctx, &mut ops).await?;

            if let Some(status) = ops.status {
                self.status = status;
            }
            if self.is_running() {
                pending = ops.next_state;
            }
        }
        Ok(())
    }
}

impl<C, I> fmt::Debug for StateMachine<C, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current)
            .field("status", &self.status)
            .field("states", &self.states.len())
            .finish()
    }
}
