//! The filter chain.

use std::sync::Arc;

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::filter::{Filter, RequestListener, ResponseListener};
use crate::forwarder::Forwarder;
use crate::message::{Request, Response};

/// A named stage in a chain.
#[derive(Clone)]
pub(crate) struct Stage {
    name: String,
    filter: Arc<dyn Filter>,
}

impl Stage {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn filter(&self) -> &Arc<dyn Filter> {
        &self.filter
    }
}

/// Immutable stage list plus the two endpoints.
pub(crate) struct Chain {
    stages: Vec<Stage>,
    client: Arc<dyn ResponseListener>,
    server: Arc<dyn RequestListener>,
}

impl Chain {
    pub(crate) fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub(crate) fn client(&self) -> &Arc<dyn ResponseListener> {
        &self.client
    }

    pub(crate) fn server(&self) -> &Arc<dyn RequestListener> {
        &self.server
    }
}

/// An ordered chain of filters between a client and an engine.
///
/// Requests enter at the client edge and visit stages in insertion order.
/// Responses enter at the server edge and visit stages in the opposite
/// direction, so the most recently inserted stage sees requests last and
/// responses first.
///
/// A proxy is immutable: inserting a stage returns a new proxy and leaves
/// forwarders handed out by the old one pointing at the old chain.
#[derive(Clone)]
pub struct DuplexProxy {
    chain: Arc<Chain>,
}

impl DuplexProxy {
    /// Create an empty chain between a client and an engine.
    pub fn new(client: Arc<dyn ResponseListener>, server: Arc<dyn RequestListener>) -> Self {
        Self {
            chain: Arc::new(Chain {
                stages: Vec::new(),
                client,
                server,
            }),
        }
    }

    /// Return a new proxy with `filter` appended nearest the server edge.
    pub fn insert_proxy(&self, name: impl Into<String>, filter: Arc<dyn Filter>) -> Self {
        let index = self.chain.stages.len();
        self.insert_at(index, name.into(), filter)
    }

    /// Return a new proxy with `filter` placed directly on the client side of
    /// the first stage named `anchor`.
    pub fn insert_proxy_before(
        &self,
        anchor: &str,
        name: impl Into<String>,
        filter: Arc<dyn Filter>,
    ) -> PipelineResult<Self> {
        let index = self
            .chain
            .stages
            .iter()
            .position(|s| s.name == anchor)
            .ok_or_else(|| PipelineError::UnknownStage(anchor.to_string()))?;
        Ok(self.insert_at(index, name.into(), filter))
    }

    fn insert_at(&self, index: usize, name: String, filter: Arc<dyn Filter>) -> Self {
        debug!(stage = %name, index, "inserting stage");
        let mut stages = self.chain.stages.clone();
        stages.insert(index, Stage { name, filter });
        Self {
            chain: Arc::new(Chain {
                stages,
                client: Arc::clone(&self.chain.client),
                server: Arc::clone(&self.chain.server),
            }),
        }
    }

    /// Names of the stages from client edge to server edge.
    pub fn stage_names(&self) -> Vec<&str> {
        self.chain.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Forwarder positioned at the client edge.
    pub fn client_edge(&self) -> Forwarder {
        Forwarder::new(Arc::clone(&self.chain), 0)
    }

    /// Forwarder positioned at the server edge.
    pub fn server_edge(&self) -> Forwarder {
        Forwarder::new(Arc::clone(&self.chain), self.chain.stages.len() + 1)
    }

    /// Send a request from the client through every stage.
    pub async fn send(&self, request: Request) -> PipelineResult<()> {
        self.client_edge().send(request).await
    }

    /// Deliver a response from the engine through every stage.
    pub fn respond(&self, response: Response) -> PipelineResult<()> {
        self.server_edge().respond(response)
    }
}
