use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use fabel_pipeline::{Filter, Forwarder, PipelineResult, Request, Response, SaveData};
use tracing::{debug, warn};

use crate::codec::{compress, decompress};
use crate::error::FeatureResult;
use crate::store::KeyValueStore;
use crate::watched::Watched;

/// The last status line the engine reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Title, usually the current location.
    pub title: String,
    /// Whether an undo is available.
    pub can_undo: bool,
    /// Whether a redo is available.
    pub can_redo: bool,
}

/// Client saves on their way to the engine.
#[derive(Debug, Default)]
struct ClientSaves {
    pending: usize,
    delivered: u64,
}

struct Autosave {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

/// Records status lines and snapshots on their way to the client.
///
/// Snapshots the client asked for are delivered; snapshots requested by
/// inner stages (bookmark capture, autosave) are recorded and dropped.
pub struct StatusRecorder {
    status: Arc<Watched<StatusLine>>,
    snapshot: Arc<Watched<SaveData>>,
    autosave: Option<Autosave>,
    client_saves: Mutex<ClientSaves>,
}

impl StatusRecorder {
    /// Record into the given shared values.
    pub fn new(status: Arc<Watched<StatusLine>>, snapshot: Arc<Watched<SaveData>>) -> Self {
        Self {
            status,
            snapshot,
            autosave: None,
            client_saves: Mutex::new(ClientSaves::default()),
        }
    }

    /// Also persist every snapshot, compressed, under `key`.
    pub fn with_autosave(mut self, store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        self.autosave = Some(Autosave {
            store,
            key: key.into(),
        });
        self
    }

    fn persist(&self, data: &SaveData) -> FeatureResult<()> {
        let Some(autosave) = &self.autosave else {
            return Ok(());
        };
        let packed = compress(&serde_json::to_string(data)?)?;
        autosave.store.set_item(&autosave.key, &packed)?;
        debug!(key = %autosave.key, bytes = packed.len(), "autosaved");
        Ok(())
    }

    fn client_saves(&self) -> MutexGuard<'_, ClientSaves> {
        self.client_saves.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim_client_save(&self) -> bool {
        let mut saves = self.client_saves();
        if saves.pending == 0 {
            return false;
        }
        saves.pending -= 1;
        saves.delivered += 1;
        true
    }

    /// Forward a client save. A save still unanswered when the send returns
    /// was swallowed by an inner stage and is forgotten.
    async fn send_client_save(&self, request: Request, next: &Forwarder) -> PipelineResult<()> {
        let delivered = {
            let mut saves = self.client_saves();
            saves.pending += 1;
            saves.delivered
        };
        let sent = next.send(request).await;
        let mut saves = self.client_saves();
        if saves.delivered == delivered && saves.pending > 0 {
            debug!("client save went unanswered");
            saves.pending -= 1;
        }
        sent
    }
}

#[async_trait]
impl Filter for StatusRecorder {
    async fn filter_request(&self, request: Request, next: &Forwarder) -> PipelineResult<()> {
        if matches!(request, Request::Save { .. }) {
            return self.send_client_save(request, next).await;
        }
        next.send(request).await
    }

    fn filter_response(&self, response: Response, next: &Forwarder) -> PipelineResult<()> {
        match response {
            Response::Status {
                ref title,
                can_undo,
                can_redo,
            } => {
                self.status.set(StatusLine {
                    title: title.clone(),
                    can_undo,
                    can_redo,
                });
                next.respond(response)
            }
            Response::SaveState { data } => {
                if let Err(e) = self.persist(&data) {
                    warn!(error = %e, "autosave failed");
                }
                self.snapshot.set(data.clone());
                if self.claim_client_save() {
                    next.respond(Response::SaveState { data })
                } else {
                    Ok(())
                }
            }
            other => next.respond(other),
        }
    }
}

/// Read the autosaved snapshot, if one exists and is readable.
pub fn restore_autosave(store: &dyn KeyValueStore, key: &str) -> Option<SaveData> {
    let read = || -> FeatureResult<Option<SaveData>> {
        let Some(packed) = store.get_item(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&decompress(&packed)?)?))
    };
    match read() {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, key, "ignoring unreadable autosave");
            None
        }
    }
}
