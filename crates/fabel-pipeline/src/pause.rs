//! Output gating for timed pauses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PipelineResult;
use crate::filter::Filter;
use crate::forwarder::Forwarder;
use crate::message::{ControlDirective, Request, Response};

/// The only word offered while paused.
pub const CONTINUE: &str = "continue";

#[derive(Default)]
struct PauseState {
    paused: bool,
    draining: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    held: VecDeque<(Response, Forwarder)>,
    resume: Option<Forwarder>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<PauseState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PauseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leave the paused state. `from_timer` carries the generation of the
    /// timer that fired, which is ignored if a newer pause superseded it.
    ///
    /// Output stays gated until the queue is empty, so responses arriving
    /// during the replay are queued behind the held ones.
    async fn unpause(&self, from_timer: Option<u64>) -> PipelineResult<()> {
        let (generation, resume) = {
            let mut state = self.lock();
            if !state.paused || state.draining {
                return Ok(());
            }
            if from_timer.is_some_and(|generation| generation != state.generation) {
                return Ok(());
            }
            state.draining = true;
            if let (Some(timer), None) = (state.timer.take(), from_timer) {
                timer.abort();
            }
            (state.generation, state.resume.take())
        };

        let mut first_error = None;
        let resumed = loop {
            let held = {
                let mut state = self.lock();
                if state.generation != generation {
                    // a new pause began mid-replay and keeps the rest
                    state.draining = false;
                    break false;
                }
                if state.held.is_empty() {
                    state.draining = false;
                    state.paused = false;
                    break true;
                }
                std::mem::take(&mut state.held)
            };
            debug!(held = held.len(), "replaying held output");
            for (response, forwarder) in held {
                if let Err(e) = forwarder.respond(response) {
                    first_error.get_or_insert(e);
                }
            }
        };

        if let (true, Some(forwarder)) = (resumed, resume) {
            forwarder
                .send(Request::GetWords {
                    command: Vec::new(),
                })
                .await?;
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// A stage that withholds engine output while paused.
///
/// While paused, every response reaching this stage is queued with its
/// forwarder, and the only word offered is [`CONTINUE`]. Executing
/// `continue` or letting the timer run out replays the queue in arrival
/// order and asks for a fresh word list. Requests other than `continue` and
/// word-list requests still reach the engine; only output is gated.
///
/// A `Control::Pause` response passing through starts a pause automatically.
#[derive(Clone, Default)]
pub struct PauseFilter {
    shared: Arc<Shared>,
}

impl PauseFilter {
    /// Create an unpaused filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether output is currently withheld.
    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Number of responses waiting for the pause to end.
    pub fn held_count(&self) -> usize {
        self.shared.lock().held.len()
    }

    /// Start withholding output for up to `duration`.
    ///
    /// `forwarder` must be the one handed to this stage: it is used to offer
    /// the `continue` word and, on unpause, to request a fresh word list.
    /// Must be called from within a tokio runtime.
    pub fn pause(&self, duration: Duration, forwarder: &Forwarder) -> PipelineResult<()> {
        {
            let mut state = self.shared.lock();
            state.paused = true;
            state.generation += 1;
            state.resume = Some(forwarder.clone());
            if let Some(previous) = state.timer.take() {
                previous.abort();
            }

            let shared = Arc::clone(&self.shared);
            let generation = state.generation;
            state.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                if let Err(e) = shared.unpause(Some(generation)).await {
                    warn!(error = %e, "failed to replay output after pause");
                }
            }));
        }

        debug!(millis = duration.as_millis() as u64, "paused");
        forwarder.respond(Response::words(Vec::new(), vec![CONTINUE.to_string()]))
    }

    /// Stop withholding output, cancelling the timer if it is still armed.
    pub async fn unpause(&self) -> PipelineResult<()> {
        self.shared.unpause(None).await
    }
}

#[async_trait]
impl Filter for PauseFilter {
    async fn filter_request(&self, request: Request, next: &Forwarder) -> PipelineResult<()> {
        if !self.is_paused() {
            return next.send(request).await;
        }

        match request {
            request if request.is_command(&[CONTINUE]) => self.unpause().await,
            Request::GetWords { command } => {
                let words = if command.len() == 1 && command[0] == CONTINUE {
                    Vec::new()
                } else {
                    vec![CONTINUE.to_string()]
                };
                next.respond(Response::Words { command, words })
            }
            request => next.send(request).await,
        }
    }

    fn filter_response(&self, response: Response, next: &Forwarder) -> PipelineResult<()> {
        if let Response::Control {
            directive: ControlDirective::Pause { millis },
        } = &response
        {
            let duration = Duration::from_millis(*millis);
            next.respond(response)?;
            return self.pause(duration, next);
        }

        let mut state = self.shared.lock();
        if state.paused {
            state.held.push_back((response, next.clone()));
            return Ok(());
        }
        drop(state);
        next.respond(response)
    }
}
