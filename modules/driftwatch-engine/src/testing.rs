// Test doubles for the pipeline's two trait boundaries:
// - ScriptedSource (TimelineSource) — fixed sequence of passes
// - ScriptedGenerator (Generator) — deterministic responses with
//   call-indexed failure injection and captured prompts
//
// Plus a post fixture helper. No network, no model server.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chat_client::{ChatError, Message, Sampling};
use driftwatch_common::{DriftwatchError, Post};

use crate::traits::{Generator, TimelineSource};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A post fixture with a fixture author. Timestamps must be RFC 3339 so
/// lexicographic order matches chronological order.
pub fn post(key: &str, timestamp: &str, body: &str) -> Post {
    Post {
        key: key.to_string(),
        timestamp: timestamp.to_string(),
        author: "fixture".to_string(),
        body: body.to_string(),
    }
}

/// `n` posts keyed `k0..kn` with minute-spaced ascending timestamps.
pub fn posts(n: usize) -> Vec<Post> {
    (0..n)
        .map(|i| {
            post(
                &format!("k{i}"),
                &format!("2026-03-01T10:{:02}:00Z", i % 60),
                &format!("post body {i}"),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Yields a fixed sequence of passes, then ends (or fails, if scripted).
/// Builder pattern: `.pass(batch)`, `.then_unavailable(cause)`.
pub struct ScriptedSource {
    passes: VecDeque<Vec<Post>>,
    final_error: Option<String>,
    closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            passes: VecDeque::new(),
            final_error: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn pass(mut self, batch: Vec<Post>) -> Self {
        self.passes.push_back(batch);
        self
    }

    /// After all scripted passes, fail instead of ending cleanly.
    pub fn then_unavailable(mut self, cause: &str) -> Self {
        self.final_error = Some(cause.to_string());
        self
    }

    /// Flag observed by tests to assert the source handle was released.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimelineSource for ScriptedSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<Post>>, DriftwatchError> {
        if let Some(batch) = self.passes.pop_front() {
            return Ok(Some(batch));
        }
        match self.final_error.take() {
            Some(cause) => Err(DriftwatchError::SourceUnavailable(cause)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

#[derive(Default)]
struct GeneratorState {
    calls: u32,
    fail_calls: HashSet<u32>,
    prompts: Vec<Vec<Message>>,
}

/// Deterministic generator: call `n` answers `generated-n`, unless `n` was
/// scripted to fail. Every prompt is captured for assertions.
#[derive(Default)]
pub struct ScriptedGenerator {
    state: Mutex<GeneratorState>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th generate call (1-indexed) with an API error.
    pub fn fail_on_call(self, n: u32) -> Self {
        self.state.lock().expect("generator lock").fail_calls.insert(n);
        self
    }

    pub fn calls(&self) -> u32 {
        self.state.lock().expect("generator lock").calls
    }

    /// Every message list this generator was called with, in call order.
    pub fn captured_prompts(&self) -> Vec<Vec<Message>> {
        self.state.lock().expect("generator lock").prompts.clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        messages: &[Message],
        _sampling: Sampling,
    ) -> chat_client::Result<String> {
        let mut state = self.state.lock().expect("generator lock");
        state.calls += 1;
        let call = state.calls;
        state.prompts.push(messages.to_vec());

        if state.fail_calls.contains(&call) {
            return Err(ChatError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            });
        }
        Ok(format!("generated-{call}"))
    }
}
