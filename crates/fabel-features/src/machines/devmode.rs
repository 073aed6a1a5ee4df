use std::sync::Arc;

use async_trait::async_trait;
use fabel_pipeline::{
    ControlDirective, MachineOps, MachineStatus, PipelineResult, Request, State, StateMachine,
    Transition, Turn,
};
use tracing::{info, warn};

use crate::settings::SettingsStore;

/// Flips developer mode the moment it is entered.
struct Toggle {
    settings: Arc<SettingsStore>,
}

#[async_trait]
impl State<Turn<()>> for Toggle {
    async fn on_enter(&self, ctx: &mut Turn<()>, ops: &mut MachineOps) -> PipelineResult<()> {
        ops.set_status(MachineStatus::Finished);
        match self.settings.update(|s| s.dev_mode = !s.dev_mode) {
            Ok(settings) => {
                info!(dev_mode = settings.dev_mode, "developer mode toggled");
                ctx.out.control(ControlDirective::ApplySettings {
                    settings: settings.to_value(),
                })?;
                let state = if settings.dev_mode { "on" } else { "off" };
                ctx.out.print(format!("Developer mode {state}."))
            }
            Err(e) => {
                warn!(error = %e, "could not save settings");
                ctx.out.warn(format!("Could not save settings: {e}"))
            }
        }
    }

    async fn on_action(&self, _input: Request, _ctx: &mut Turn<()>) -> PipelineResult<Transition> {
        Ok(Transition::Finish)
    }
}

/// A one-shot machine that toggles developer mode and finishes at once.
pub fn dev_mode_toggle(settings: Arc<SettingsStore>) -> StateMachine<Turn<()>> {
    StateMachine::new("toggle").with_state("toggle", Toggle { settings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machines::testing::host;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn toggles_without_holding_the_conversation() {
        let settings = Arc::new(SettingsStore::new(Arc::new(MemoryStore::new()), "settings"));
        let (proxy, engine, log) = host("devmode", dev_mode_toggle(Arc::clone(&settings)));

        proxy.send(Request::execute(&["devmode"])).await.unwrap();
        assert!(settings.load().dev_mode);
        assert_eq!(log.printed(), vec!["Developer mode on."]);

        proxy.send(Request::execute(&["look"])).await.unwrap();
        assert_eq!(engine.received.lock().unwrap().len(), 1);

        proxy.send(Request::execute(&["devmode"])).await.unwrap();
        assert!(!settings.load().dev_mode);
    }
}
