use std::sync::Arc;

use async_trait::async_trait;
use fabel_pipeline::message::words;
use fabel_pipeline::{
    MachineOps, PipelineResult, Request, Responder, State, StateMachine, Transition, Turn,
    handle_input,
};
use tracing::info;

use super::offer;

/// Question asked before restarting.
pub const RESTART_PROMPT: &str = "Are you sure you want to restart?";

/// What happens when a restart is confirmed.
#[async_trait]
pub trait RestartAction: Send + Sync {
    /// Restart the game, talking to the engine through `out`.
    async fn restart(&self, out: &Responder) -> PipelineResult<()>;
}

/// Resets the engine and starts a fresh game.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetAndStart;

#[async_trait]
impl RestartAction for ResetAndStart {
    async fn restart(&self, out: &Responder) -> PipelineResult<()> {
        out.send(Request::Reset).await?;
        out.send(Request::Start { data: None }).await
    }
}

struct Confirm {
    action: Arc<dyn RestartAction>,
}

enum Choice {
    Restart,
    Cancel,
    Words(Vec<String>),
    Other,
}

fn options() -> Vec<String> {
    words(&["restart", "cancel"])
}

#[async_trait]
impl State<Turn<()>> for Confirm {
    async fn on_enter(&self, ctx: &mut Turn<()>, _ops: &mut MachineOps) -> PipelineResult<()> {
        ctx.out.print(RESTART_PROMPT)?;
        ctx.out.words(Vec::new(), options())
    }

    async fn on_action(&self, input: Request, ctx: &mut Turn<()>) -> PipelineResult<Transition> {
        let choice = handle_input(&input)
            .on_command(&["restart"], || Choice::Restart)
            .on_command(&["cancel"], || Choice::Cancel)
            .on_get_words(|command| Choice::Words(command.to_vec()))
            .on_any(|_| Choice::Other);

        match choice {
            Choice::Restart => {
                info!("restarting game");
                self.action.restart(&ctx.out).await?;
                Ok(Transition::Finish)
            }
            Choice::Cancel => {
                ctx.out.print("Restart cancelled.")?;
                Ok(Transition::Finish)
            }
            Choice::Words(command) => {
                offer(&ctx.out, &command, &options())?;
                Ok(Transition::Stay)
            }
            Choice::Other => {
                ctx.out.print("Please answer restart or cancel.")?;
                Ok(Transition::Stay)
            }
        }
    }
}

/// A confirmation dialog that runs `action` when the player confirms.
pub fn restart_machine(action: Arc<dyn RestartAction>) -> StateMachine<Turn<()>> {
    StateMachine::new("confirm").with_state("confirm", Confirm { action })
}
