//! Stage and endpoint traits.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::forwarder::Forwarder;
use crate::message::{Request, Response};

/// One stage of the pipeline.
///
/// Each hook receives a [`Forwarder`] bound to this stage's neighbours:
/// `next.send` continues toward the engine, `next.respond` continues toward
/// the client. A stage may forward unchanged, rewrite, drop, answer locally
/// by responding without sending, or hold the message for later.
/// Both hooks default to forwarding unchanged.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Called for every request reaching this stage.
    async fn filter_request(&self, request: Request, next: &Forwarder) -> PipelineResult<()> {
        next.send(request).await
    }

    /// Called for every response reaching this stage.
    fn filter_response(&self, response: Response, next: &Forwarder) -> PipelineResult<()> {
        next.respond(response)
    }
}

/// The engine side of the pipeline.
///
/// The listener gets the server-edge forwarder so it can respond at any
/// time, including after the request future has completed.
#[async_trait]
pub trait RequestListener: Send + Sync {
    /// Handle a request that made it through every stage.
    async fn on_request(&self, request: Request, edge: &Forwarder) -> PipelineResult<()>;
}

/// The client side of the pipeline.
pub trait ResponseListener: Send + Sync {
    /// Accept a response that made it through every stage.
    fn on_response(&self, response: Response) -> PipelineResult<()>;
}

impl<F> ResponseListener for F
where
    F: Fn(Response) -> PipelineResult<()> + Send + Sync,
{
    fn on_response(&self, response: Response) -> PipelineResult<()> {
        self(response)
    }
}

/// A client that records every response it receives.
#[derive(Debug, Default)]
pub struct ResponseLog {
    responses: Mutex<Vec<Response>>,
}

impl ResponseLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far.
    pub fn responses(&self) -> Vec<Response> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything received so far.
    pub fn take(&self) -> Vec<Response> {
        std::mem::take(&mut *self.responses.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Text of every print response received so far.
    pub fn printed(&self) -> Vec<String> {
        self.responses()
            .into_iter()
            .filter_map(|r| match r {
                Response::Print { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// The most recent word list received.
    pub fn last_words(&self) -> Option<Vec<String>> {
        self.responses().into_iter().rev().find_map(|r| match r {
            Response::Words { words, .. } => Some(words),
            _ => None,
        })
    }
}

impl ResponseListener for ResponseLog {
    fn on_response(&self, response: Response) -> PipelineResult<()> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response);
        Ok(())
    }
}
