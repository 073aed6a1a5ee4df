//! State machines plugged into the pipeline.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::PipelineResult;
use crate::filter::Filter;
use crate::forwarder::Forwarder;
use crate::machine::{MachineStatus, StateMachine};
use crate::message::Request;
use crate::responder::Responder;

/// The context a pipeline machine's states operate on.
///
/// `out` talks to the rest of the pipeline; `data` is the machine's own
/// state, kept between inputs for as long as the machine lives.
#[derive(Debug)]
pub struct Turn<S> {
    /// Responder bound to the stage hosting the machine.
    pub out: Responder,
    /// Machine-specific state.
    pub data: S,
}

/// A machine with its data, erased over the data type.
#[async_trait]
trait Takeover: Send {
    async fn start(&mut self, out: Responder) -> PipelineResult<MachineStatus>;
    async fn send(&mut self, input: Request, out: Responder) -> PipelineResult<MachineStatus>;
}

struct Slot<S> {
    machine: StateMachine<Turn<S>>,
    data: S,
}

impl<S: Default + Send> Slot<S> {
    fn turn(&mut self, out: Responder) -> Turn<S> {
        Turn {
            out,
            data: std::mem::take(&mut self.data),
        }
    }
}

#[async_trait]
impl<S: Default + Send> Takeover for Slot<S> {
    async fn start(&mut self, out: Responder) -> PipelineResult<MachineStatus> {
        let mut turn = self.turn(out);
        let result = self.machine.start(&mut turn).await;
        self.data = turn.data;
        result
    }

    async fn send(&mut self, input: Request, out: Responder) -> PipelineResult<MachineStatus> {
        let mut turn = self.turn(out);
        let result = self.machine.send(input, &mut turn).await;
        self.data = turn.data;
        result
    }
}

struct Entry {
    trigger: String,
    takeover: Box<dyn Takeover>,
}

#[derive(Default)]
struct Machines {
    entries: Vec<Entry>,
    active: Option<usize>,
}

/// A stage that lets state machines take over the conversation.
///
/// Each machine is registered under a trigger word. While no machine is
/// active, executing a single-word command equal to a trigger starts that
/// machine instead of reaching the engine. From then on every request is
/// routed to the active machine until it finishes. Responses pass through
/// untouched.
#[derive(Default)]
pub struct StateMachineFilter {
    triggers: Vec<String>,
    machines: Mutex<Machines>,
}

impl StateMachineFilter {
    /// Create a filter with no machines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `machine` under `trigger`.
    pub fn with_machine<S>(mut self, trigger: impl Into<String>, machine: StateMachine<Turn<S>>) -> Self
    where
        S: Default + Send + 'static,
    {
        let trigger = trigger.into();
        self.triggers.push(trigger.clone());
        self.machines.get_mut().entries.push(Entry {
            trigger,
            takeover: Box::new(Slot {
                machine,
                data: S::default(),
            }),
        });
        self
    }

    /// Trigger words in registration order.
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// Trigger of the machine currently holding the conversation.
    pub async fn active_trigger(&self) -> Option<String> {
        let machines = self.machines.lock().await;
        machines
            .active
            .map(|index| machines.entries[index].trigger.clone())
    }
}

#[async_trait]
impl Filter for StateMachineFilter {
    async fn filter_request(&self, request: Request, next: &Forwarder) -> PipelineResult<()> {
        let mut machines = self.machines.lock().await;
        let out = Responder::new(next.clone());

        if let Some(index) = machines.active {
            let result = machines.entries[index].takeover.send(request, out).await;
            if !matches!(result, Ok(MachineStatus::Running)) {
                debug!(trigger = %machines.entries[index].trigger, "machine released conversation");
                machines.active = None;
            }
            return result.map(|_| ());
        }

        let triggered = match &request {
            Request::Execute { command } if command.len() == 1 => machines
                .entries
                .iter()
                .position(|entry| entry.trigger == command[0]),
            _ => None,
        };

        let Some(index) = triggered else {
            drop(machines);
            return next.send(request).await;
        };

        debug!(trigger = %machines.entries[index].trigger, "machine took over conversation");
        let result = machines.entries[index].takeover.start(out).await;
        if matches!(result, Ok(MachineStatus::Running)) {
            machines.active = Some(index);
        }
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;
    use crate::dispatch::handle_input;
    use crate::filter::{RequestListener, ResponseLog};
    use crate::machine::{MachineOps, State, Transition};
    use crate::message::{Response, words};
    use crate::proxy::DuplexProxy;

    struct Engine {
        received: StdMutex<Vec<Request>>,
    }

    #[async_trait]
    impl RequestListener for Engine {
        async fn on_request(&self, request: Request, edge: &Forwarder) -> PipelineResult<()> {
            self.received.lock().unwrap().push(request.clone());
            if let Request::Execute { command } = request {
                edge.respond(Response::print(format!("engine: {}", command.join(" "))))?;
            }
            Ok(())
        }
    }

    /// Confirmation dialog counting how often it confirmed.
    struct Confirm {
        confirmed: Arc<AtomicUsize>,
    }

    enum Answer {
        Yes,
        No,
        Words,
        Unknown,
    }

    #[async_trait]
    impl State<Turn<()>> for Confirm {
        async fn on_enter(&self, ctx: &mut Turn<()>, _ops: &mut MachineOps) -> PipelineResult<()> {
            ctx.out.print("Are you sure?")?;
            ctx.out.words(Vec::new(), words(&["restart", "cancel"]))
        }

        async fn on_action(&self, input: Request, ctx: &mut Turn<()>) -> PipelineResult<Transition> {
            let answer = handle_input(&input)
                .on_command(&["restart"], || Answer::Yes)
                .on_command(&["cancel"], || Answer::No)
                .on_get_words(|_| Answer::Words)
                .on_any(|_| Answer::Unknown);
            match answer {
                Answer::Yes => {
                    self.confirmed.fetch_add(1, Ordering::SeqCst);
                    Ok(Transition::Finish)
                }
                Answer::No => {
                    ctx.out.print("Cancelled.")?;
                    Ok(Transition::Finish)
                }
                Answer::Words => {
                    ctx.out.words(Vec::new(), words(&["restart", "cancel"]))?;
                    Ok(Transition::Stay)
                }
                Answer::Unknown => {
                    ctx.out.warn("Please answer restart or cancel.")?;
                    Ok(Transition::Stay)
                }
            }
        }
    }

    /// Finishes as soon as it starts.
    struct OneShot;

    #[async_trait]
    impl State<Turn<()>> for OneShot {
        async fn on_enter(&self, ctx: &mut Turn<()>, ops: &mut MachineOps) -> PipelineResult<()> {
            ctx.out.print("done")?;
            ops.set_status(MachineStatus::Finished);
            Ok(())
        }

        async fn on_action(&self, _input: Request, _ctx: &mut Turn<()>) -> PipelineResult<Transition> {
            Ok(Transition::Finish)
        }
    }

    struct Fixture {
        proxy: DuplexProxy,
        client: Arc<ResponseLog>,
        engine: Arc<Engine>,
        confirmed: Arc<AtomicUsize>,
        filter: Arc<StateMachineFilter>,
    }

    fn fixture() -> Fixture {
        let client = Arc::new(ResponseLog::new());
        let engine = Arc::new(Engine {
            received: StdMutex::new(Vec::new()),
        });
        let confirmed = Arc::new(AtomicUsize::new(0));
        let restart = StateMachine::new("confirm").with_state(
            "confirm",
            Confirm {
                confirmed: confirmed.clone(),
            },
        );
        let once = StateMachine::new("run").with_state("run", OneShot);
        let filter = Arc::new(
            StateMachineFilter::new()
                .with_machine("restart", restart)
                .with_machine("once", once),
        );
        let proxy = DuplexProxy::new(client.clone(), engine.clone())
            .insert_proxy("machines", filter.clone());
        Fixture {
            proxy,
            client,
            engine,
            confirmed,
            filter,
        }
    }

    #[tokio::test]
    async fn trigger_starts_machine_without_reaching_engine() {
        let f = fixture();
        f.proxy.send(Request::execute(&["restart"])).await.unwrap();

        assert!(f.engine.received.lock().unwrap().is_empty());
        assert_eq!(f.client.printed(), vec!["Are you sure?"]);
        assert_eq!(f.client.last_words().unwrap(), vec!["restart", "cancel"]);
        assert_eq!(f.filter.active_trigger().await.as_deref(), Some("restart"));
    }

    #[tokio::test]
    async fn cancel_terminates_without_confirming() {
        let f = fixture();
        f.proxy.send(Request::execute(&["restart"])).await.unwrap();
        f.proxy.send(Request::execute(&["cancel"])).await.unwrap();

        assert_eq!(f.confirmed.load(Ordering::SeqCst), 0);
        assert_eq!(f.client.printed(), vec!["Are you sure?", "Cancelled."]);
        assert!(f.filter.active_trigger().await.is_none());

        f.proxy.send(Request::execute(&["look"])).await.unwrap();
        assert_eq!(f.engine.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn active_machine_captures_every_request() {
        let f = fixture();
        f.proxy.send(Request::execute(&["restart"])).await.unwrap();
        f.proxy.send(Request::execute(&["look"])).await.unwrap();
        f.proxy.send(Request::get_words(&[])).await.unwrap();
        f.proxy.send(Request::execute(&["restart"])).await.unwrap();

        assert!(f.engine.received.lock().unwrap().is_empty());
        assert_eq!(f.confirmed.load(Ordering::SeqCst), 1);
        let warnings = f
            .client
            .responses()
            .into_iter()
            .filter(|r| matches!(r, Response::Log { .. }))
            .count();
        assert_eq!(warnings, 1);
    }

    #[tokio::test]
    async fn machine_can_be_started_again() {
        let f = fixture();
        for _ in 0..2 {
            f.proxy.send(Request::execute(&["restart"])).await.unwrap();
            f.proxy.send(Request::execute(&["restart"])).await.unwrap();
        }
        assert_eq!(f.confirmed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn untriggered_requests_pass_through() {
        let f = fixture();
        f.proxy.send(Request::execute(&["restart", "game"])).await.unwrap();
        f.proxy.send(Request::get_words(&["restart"])).await.unwrap();

        assert_eq!(f.engine.received.lock().unwrap().len(), 2);
        assert_eq!(f.client.printed(), vec!["engine: restart game"]);
    }

    #[tokio::test]
    async fn one_shot_machine_never_becomes_active() {
        let f = fixture();
        f.proxy.send(Request::execute(&["once"])).await.unwrap();

        assert_eq!(f.client.printed(), vec!["done"]);
        assert!(f.filter.active_trigger().await.is_none());
        assert_eq!(f.filter.triggers(), ["restart", "once"]);
    }
}
