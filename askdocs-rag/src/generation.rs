//! Answer formatting via a language-model provider.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::Result;

/// The fixed answer returned when retrieval produces zero results.
pub const NO_RESULTS_MESSAGE: &str = "No relevant information found in the documents.";

/// A lazy, single-consumption sequence of answer text fragments.
///
/// Dropping the stream cancels the underlying provider request, so a client
/// disconnect mid-stream releases the connection without draining it.
pub type AnswerFragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Formats retrieved context and a query into a human-readable answer.
///
/// Implementations delegate to a language-model provider with a fixed prompt
/// template. Provider failures and timeouts surface as
/// [`RagError::Generation`](crate::error::RagError::Generation), which callers
/// must keep distinct from a zero-result answer.
#[async_trait]
pub trait AnswerFormatter: Send + Sync {
    /// Produce the complete answer in one call.
    async fn format(&self, query: &str, context: &str) -> Result<String>;

    /// Produce the answer as an incremental fragment stream.
    ///
    /// Concatenating all fragments yields the same text [`format`](Self::format)
    /// would return for identical inputs and provider state.
    async fn format_stream(&self, query: &str, context: &str) -> Result<AnswerFragmentStream>;
}
