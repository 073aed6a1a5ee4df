//! Feature machines that take over the conversation for a dialog.

mod devmode;
mod picker;
mod restart;

pub use devmode::dev_mode_toggle;
pub use picker::{SettingKind, colour_picker, ui_picker};
pub use restart::{RESTART_PROMPT, ResetAndStart, RestartAction, restart_machine};

use fabel_pipeline::{PipelineResult, Responder};

/// Answer a word request with `options` at the root and nothing deeper.
pub(crate) fn offer(out: &Responder, command: &[String], options: &[String]) -> PipelineResult<()> {
    let words = if command.is_empty() {
        options.to_vec()
    } else {
        Vec::new()
    };
    out.words(command.to_vec(), words)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use fabel_pipeline::{
        DuplexProxy, Forwarder, PipelineResult, Request, RequestListener, Response, ResponseLog,
        StateMachine, StateMachineFilter, Turn,
    };

    /// Engine double recording what reaches it.
    #[derive(Default)]
    pub struct Engine {
        pub received: Mutex<Vec<Request>>,
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

    /// A pipeline hosting a single machine under `trigger`.
    pub fn host<S>(
        trigger: &str,
        machine: StateMachine<Turn<S>>,
    ) -> (DuplexProxy, Arc<Engine>, Arc<ResponseLog>)
    where
        S: Default + Send + 'static,
    {
        let engine = Arc::new(Engine::default());
        let log = Arc::new(ResponseLog::new());
        let filter = StateMachineFilter::new().with_machine(trigger, machine);
        let proxy = DuplexProxy::new(log.clone(), engine.clone())
            .insert_proxy("machines", Arc::new(filter));
        (proxy, engine, log)
    }
}
