//! Adapter from the pipeline's server edge to a game.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use fabel_pipeline::{
    ControlDirective, Forwarder, LogLevel, PipelineResult, Request, RequestListener, Response,
};
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::game::{Beat, Game, Outcome};

/// Serves a [`Game`] at the end of a pipeline.
///
/// Each request is answered in full before the call returns. Responses are
/// computed under the lock and delivered after it is released, so a stage
/// reacting to a response may immediately send another request.
#[derive(Debug)]
pub struct GameServer {
    game: Mutex<Game>,
}

impl GameServer {
    /// Serve the given game.
    pub fn new(game: Game) -> Self {
        Self {
            game: Mutex::new(game),
        }
    }

    fn handle(&self, request: Request) -> Vec<Response> {
        let mut game = self.game.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out = Vec::new();

        match request {
            Request::GetWords { command } => {
                let words = game.words_for(&command);
                out.push(Response::words(command, words));
            }
            Request::Execute { command } => {
                match game.execute(&command) {
                    Ok(outcome) => render(outcome, &mut out),
                    Err(e) => out.push(Response::print(e.to_string())),
                }
                out.push(status(&game));
            }
            Request::GetStatus => out.push(status(&game)),
            Request::Load { data } => match game.load(data) {
                Ok(outcome) => {
                    render(outcome, &mut out);
                    out.push(status(&game));
                }
                Err(e) => {
                    warn!(error = %e, "load failed");
                    out.push(Response::log(LogLevel::Error, e.to_string()));
                }
            },
            Request::Save { compress } => match game.save(compress) {
                Ok(data) => out.push(Response::SaveState { data }),
                Err(e) => out.push(Response::log(LogLevel::Error, e.to_string())),
            },
            Request::Start { data } => match game.start(data) {
                Ok(outcome) => {
                    render(outcome, &mut out);
                    out.push(status(&game));
                }
                Err(e) => {
                    warn!(error = %e, "start failed");
                    out.push(Response::log(LogLevel::Error, e.to_string()));
                }
            },
            Request::Config { properties } => {
                game.configure(&properties);
                out.push(Response::log(
                    LogLevel::Debug,
                    format!("applied {} properties", properties.len()),
                ));
            }
            Request::Reset => {
                game.reset();
                out.push(status(&game));
            }
            Request::Undo => history(game.undo(), &game, &mut out),
            Request::Redo => history(game.redo(), &game, &mut out),
            Request::GetInfo => out.push(Response::print(game.info())),
        }
        out
    }
}

fn render(outcome: Outcome, out: &mut Vec<Response>) {
    for beat in outcome.beats {
        out.push(match beat {
            Beat::Text(text) => Response::print(text),
            Beat::Pause(millis) => Response::Control {
                directive: ControlDirective::Pause { millis },
            },
        });
    }
}

fn history(result: EngineResult<Outcome>, game: &Game, out: &mut Vec<Response>) {
    match result {
        Ok(outcome) => render(outcome, out),
        Err(e) => out.push(Response::print(e.to_string())),
    }
    out.push(status(game));
}

fn status(game: &Game) -> Response {
    Response::Status {
        title: game.title().unwrap_or_default().to_string(),
        can_undo: game.can_undo(),
        can_redo: game.can_redo(),
    }
}

#[async_trait]
impl RequestListener for GameServer {
    async fn on_request(&self, request: Request, edge: &Forwarder) -> PipelineResult<()> {
        debug!(request = request.kind(), "engine request");
        for response in self.handle(request) {
            edge.respond(response)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fabel_pipeline::{DuplexProxy, ResponseLog};

    use super::*;
    use crate::world::World;

    fn serve() -> (DuplexProxy, Arc<ResponseLog>) {
        let log = Arc::new(ResponseLog::new());
        let server = Arc::new(GameServer::new(Game::new(World::demo())));
        (DuplexProxy::new(log.clone(), server), log)
    }

    #[tokio::test]
    async fn start_prints_and_reports_status() {
        let (proxy, log) = serve();
        proxy.send(Request::Start { data: None }).await.unwrap();

        let responses = log.take();
        assert!(matches!(responses[0], Response::Print { .. }));
        assert_eq!(
            responses.last(),
            Some(&Response::Status {
                title: "Cave".to_string(),
                can_undo: false,
                can_redo: false,
            })
        );
    }

    #[tokio::test]
    async fn failed_command_prints_the_error() {
        let (proxy, log) = serve();
        proxy.send(Request::execute(&["xyzzy"])).await.unwrap();
        assert_eq!(log.printed(), vec!["I don't understand \"xyzzy\"."]);
    }

    #[tokio::test]
    async fn wait_emits_a_pause_directive_between_prints() {
        let (proxy, log) = serve();
        proxy.send(Request::execute(&["wait"])).await.unwrap();

        let kinds: Vec<&str> = log.responses().iter().map(Response::kind).collect();
        assert_eq!(kinds, vec!["print", "control", "print", "status"]);
    }

    #[tokio::test]
    async fn words_echo_the_command() {
        let (proxy, log) = serve();
        proxy.send(Request::get_words(&["go"])).await.unwrap();
        assert_eq!(
            log.take(),
            vec![Response::words(
                vec!["go".to_string()],
                vec!["north".to_string(), "up".to_string()]
            )]
        );
    }

    #[tokio::test]
    async fn save_then_load_round_trips_location() {
        let (proxy, log) = serve();
        proxy.send(Request::execute(&["north"])).await.unwrap();
        proxy.send(Request::Save { compress: true }).await.unwrap();
        let data = log
            .take()
            .into_iter()
            .find_map(|r| match r {
                Response::SaveState { data } => Some(data),
                _ => None,
            })
            .unwrap();

        let (other, other_log) = serve();
        other.send(Request::Load { data }).await.unwrap();
        assert!(matches!(
            other_log.responses().last(),
            Some(Response::Status { title, .. }) if title == "Tunnel"
        ));
    }

    #[tokio::test]
    async fn bad_load_is_logged() {
        let (proxy, log) = serve();
        proxy
            .send(Request::Load {
                data: serde_json::json!({"nonsense": true}),
            })
            .await
            .unwrap();
        assert!(matches!(
            log.take().as_slice(),
            [Response::Log { level: LogLevel::Error, .. }]
        ));
    }

    #[tokio::test]
    async fn undo_without_history() {
        let (proxy, log) = serve();
        proxy.send(Request::Undo).await.unwrap();
        assert_eq!(log.printed(), vec!["There is nothing to undo."]);
    }
}
