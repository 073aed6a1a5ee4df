use async_trait::async_trait;
use fabel_pipeline::{Filter, Forwarder, PipelineResult, Request};

/// Asks the engine for a fresh snapshot after every request that may have
/// changed its state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSave;

fn changes_state(request: &Request) -> bool {
    matches!(
        request,
        Request::Execute { .. }
            | Request::Load { .. }
            | Request::Start { .. }
            | Request::Reset
            | Request::Undo
            | Request::Redo
    )
}

#[async_trait]
impl Filter for AutoSave {
    async fn filter_request(&self, request: Request, next: &Forwarder) -> PipelineResult<()> {
        let save = changes_state(&request);
        next.send(request).await?;
        if save {
            next.send(Request::Save { compress: true }).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use fabel_pipeline::{DuplexProxy, RequestListener, ResponseLog};

    use super::*;

    #[derive(Default)]
    struct Engine {
        received: Mutex<Vec<Request>>,
    }

    #[async_trait]
    impl RequestListener for Engine {
        async fn on_request(&self, request: Request, _edge: &Forwarder) -> PipelineResult<()> {
            self.received.lock().unwrap().push(request);
            Ok(())
        }
    }

    #[tokio::test]
    async fn saves_after_state_changes_only() {
        let engine = Arc::new(Engine::default());
        let proxy = DuplexProxy::new(Arc::new(ResponseLog::new()), engine.clone())
            .insert_proxy("autosave", Arc::new(AutoSave));

        proxy.send(Request::execute(&["north"])).await.unwrap();
        proxy.send(Request::get_words(&[])).await.unwrap();
        proxy.send(Request::Undo).await.unwrap();

        assert_eq!(
            *engine.received.lock().unwrap(),
            vec![
                Request::execute(&["north"]),
                Request::Save { compress: true },
                Request::get_words(&[]),
                Request::Undo,
                Request::Save { compress: true },
            ]
        );
    }
}
