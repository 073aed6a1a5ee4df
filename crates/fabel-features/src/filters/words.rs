use fabel_pipeline::{Filter, Forwarder, PipelineResult, Response};

use super::inject_root_words;

/// Adds fixed words to every root word list.
///
/// Used for commands the engine does not know about, such as the triggers
/// of feature machines.
#[derive(Debug, Clone, Default)]
pub struct WordInjector {
    words: Vec<String>,
}

impl WordInjector {
    /// Inject `words`, in order, after the engine's own.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// The injected words.
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

impl Filter for WordInjector {
    fn filter_response(&self, response: Response, next: &Forwarder) -> PipelineResult<()> {
        next.respond(inject_root_words(response, &self.words))
    }
}
