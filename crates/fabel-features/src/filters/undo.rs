use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use fabel_pipeline::{Filter, Forwarder, PipelineResult, Request, Response};
use tracing::debug;

use super::inject_root_words;

/// Turns typed `undo`/`redo` into engine requests and offers them as words
/// whenever the engine says they are available.
#[derive(Debug, Default)]
pub struct UndoRedoFilter {
    available: Mutex<(bool, bool)>,
}

impl UndoRedoFilter {
    /// Create a filter that offers nothing until the first status arrives.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Filter for UndoRedoFilter {
    async fn filter_request(&self, request: Request, next: &Forwarder) -> PipelineResult<()> {
        if request.is_command(&["undo"]) {
            debug!("undo");
            return next.send(Request::Undo).await;
        }
        if request.is_command(&["redo"]) {
            debug!("redo");
            return next.send(Request::Redo).await;
        }
        next.send(request).await
    }

    fn filter_response(&self, response: Response, next: &Forwarder) -> PipelineResult<()> {
        let (can_undo, can_redo) = {
            let mut available = self.available.lock().unwrap_or_else(PoisonError::into_inner);
            if let Response::Status {
                can_undo, can_redo, ..
            } = &response
            {
                *available = (*can_undo, *can_redo);
            }
            *available
        };

        let mut extra = Vec::new();
        if can_undo {
            extra.push("undo".to_string());
        }
        if can_redo {
            extra.push("redo".to_string());
        }
        next.respond(inject_root_words(response, &extra))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fabel_pipeline::message::words;
    use fabel_pipeline::{DuplexProxy, RequestListener, ResponseLog};

    use super::*;

    #[derive(Default)]
    struct Engine {
        received: Mutex<Vec<Request>>,
    }

    #[async_trait]
    impl RequestListener for Engine {
        async fn on_request(&self, request: Request, edge: &Forwarder) -> PipelineResult<()> {
            self.received.lock().unwrap().push(request.clone());
            match request {
                Request::GetWords { command } => {
                    edge.respond(Response::words(command, words(&["look"])))
                }
                _ => edge.respond(Response::Status {
                    title: "Cave".to_string(),
                    can_undo: true,
                    can_redo: false,
                }),
            }
        }
    }

    fn setup() -> (DuplexProxy, Arc<Engine>, Arc<ResponseLog>) {
        let engine = Arc::new(Engine::default());
        let log = Arc::new(ResponseLog::new());
        let proxy = DuplexProxy::new(log.clone(), engine.clone())
            .insert_proxy("undo-redo", Arc::new(UndoRedoFilter::new()));
        (proxy, engine, log)
    }

    #[tokio::test]
    async fn typed_commands_become_requests() {
        let (proxy, engine, _) = setup();
        proxy.send(Request::execute(&["undo"])).await.unwrap();
        proxy.send(Request::execute(&["redo"])).await.unwrap();
        proxy.send(Request::execute(&["undo", "twice"])).await.unwrap();

        assert_eq!(
            *engine.received.lock().unwrap(),
            vec![
                Request::Undo,
                Request::Redo,
                Request::execute(&["undo", "twice"])
            ]
        );
    }

    #[tokio::test]
    async fn offers_only_what_is_available() {
        let (proxy, _, log) = setup();
        proxy.send(Request::get_words(&[])).await.unwrap();
        assert_eq!(log.last_words(), Some(words(&["look"])));

        proxy.send(Request::GetStatus).await.unwrap();
        proxy.send(Request::get_words(&[])).await.unwrap();
        assert_eq!(log.last_words(), Some(words(&["look", "undo"])));
    }
}
