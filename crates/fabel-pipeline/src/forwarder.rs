//! Handles to the neighbouring stages.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{PipelineError, PipelineResult};
use crate::message::{Request, Response};
use crate::proxy::Chain;

/// A bidirectional handle bound to one position in a chain.
///
/// Positions run from the client edge (0) through the stages (1..=n) to the
/// server edge (n + 1). `send` delivers to the position after this one and
/// `respond` to the position before it, so a stage can only reach its
/// immediate neighbours.
#[derive(Clone)]
pub struct Forwarder {
    chain: Arc<Chain>,
    position: usize,
}

impl Forwarder {
    pub(crate) fn new(chain: Arc<Chain>, position: usize) -> Self {
        Self { chain, position }
    }

    /// Push a request one step toward the engine.
    pub async fn send(&self, request: Request) -> PipelineResult<()> {
        let next = self.position + 1;
        let stages = self.chain.stages();

        if next <= stages.len() {
            let stage = &stages[next - 1];
            trace!(stage = stage.name(), request = request.kind(), "request");
            let forwarder = Forwarder::new(Arc::clone(&self.chain), next);
            stage.filter().filter_request(request, &forwarder).await
        } else if next == stages.len() + 1 {
            trace!(request = request.kind(), "request reached server");
            let edge = Forwarder::new(Arc::clone(&self.chain), next);
            self.chain.server().on_request(request, &edge).await
        } else {
            Err(PipelineError::PastServerEdge(request.kind().to_string()))
        }
    }

    /// Push a response one step toward the client.
    pub fn respond(&self, response: Response) -> PipelineResult<()> {
        match self.position {
            0 => Err(PipelineError::PastClientEdge(response.kind().to_string())),
            1 => {
                trace!(response = response.kind(), "response reached client");
                self.chain.client().on_response(response)
            }
            position => {
                let previous = position - 1;
                let stage = &self.chain.stages()[previous - 1];
                trace!(stage = stage.name(), response = response.kind(), "response");
                let forwarder = Forwarder::new(Arc::clone(&self.chain), previous);
                stage.filter().filter_response(response, &forwarder)
            }
        }
    }

    /// Position of this handle in its chain.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forwarder")
            .field("position", &self.position)
            .field("stages", &self.chain.stages().len())
            .finish()
    }
}
