// Trait abstractions for the pipeline's two external dependencies.
//
// TimelineSource — the content-source connector. One call per collection
//   pass, yielding a batch of candidate posts; internal retry/backoff is
//   the connector's concern, not the pipeline's.
// Generator — the text-generation backend. One synchronous call: ordered
//   role-tagged messages in, plain text out.
//
// These enable deterministic testing with ScriptedSource and
// ScriptedGenerator: no network, no local model server.

use async_trait::async_trait;

use chat_client::{ChatClient, Message, Sampling};
use driftwatch_common::{DriftwatchError, Post};

// ---------------------------------------------------------------------------
// TimelineSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TimelineSource: Send {
    /// Run one collection pass. `Ok(Some(batch))` may contain posts already
    /// seen in earlier passes; the collector's dedup index absorbs them.
    /// `Ok(None)` means the pass budget is exhausted or the source has no
    /// more content. `Err` means the source is unavailable and collection
    /// ends for this session.
    async fn next_batch(&mut self) -> Result<Option<Vec<Post>>, DriftwatchError>;

    /// Release any live source handle. Called exactly once when collection
    /// ends, including on cancellation.
    async fn close(&mut self) {}
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        messages: &[Message],
        sampling: Sampling,
    ) -> chat_client::Result<String>;
}

#[async_trait]
impl Generator for ChatClient {
    async fn generate(
        &self,
        messages: &[Message],
        sampling: Sampling,
    ) -> chat_client::Result<String> {
        self.chat(messages, sampling).await
    }
}
