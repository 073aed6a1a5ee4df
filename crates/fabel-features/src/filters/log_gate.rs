use std::sync::Arc;

use fabel_pipeline::{Filter, Forwarder, LogLevel, PipelineResult, Response};

use crate::settings::SettingsStore;

/// Drops debug and info log lines unless developer mode is on.
pub struct LogGate {
    settings: Arc<SettingsStore>,
}

impl LogGate {
    /// Gate on the dev-mode flag in `settings`.
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

impl Filter for LogGate {
    fn filter_response(&self, response: Response, next: &Forwarder) -> PipelineResult<()> {
        let chatter = matches!(&response, Response::Log { level, .. } if *level < LogLevel::Warn);
        if chatter && !self.settings.load().dev_mode {
            return Ok(());
        }
        next.respond(response)
    }
}

#[cfg(test)]
mod tests {
    use fabel_pipeline::{DuplexProxy, Forwarder, Request, RequestListener, ResponseLog};

    use super::*;
    use crate::store::MemoryStore;

    struct Silent;

    #[async_trait::async_trait]
    impl RequestListener for Silent {
        async fn on_request(&self, _request: Request, _edge: &Forwarder) -> PipelineResult<()> {
            Ok(())
        }
    }

    #[test]
    fn dev_mode_opens_the_gate() {
        let settings = Arc::new(SettingsStore::new(Arc::new(MemoryStore::new()), "settings"));
        let log = Arc::new(ResponseLog::new());
        let proxy = DuplexProxy::new(log.clone(), Arc::new(Silent))
            .insert_proxy("log-gate", Arc::new(LogGate::new(Arc::clone(&settings))));

        proxy.respond(Response::log(LogLevel::Debug, "hidden")).unwrap();
        proxy.respond(Response::log(LogLevel::Warn, "shown")).unwrap();
        proxy.respond(Response::print("text")).unwrap();
        assert_eq!(log.take().len(), 2);

        settings.update(|s| s.dev_mode = true).unwrap();
        proxy.respond(Response::log(LogLevel::Debug, "now shown")).unwrap();
        assert_eq!(log.take().len(), 1);
    }
}
