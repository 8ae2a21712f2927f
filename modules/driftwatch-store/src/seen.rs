//! Dedup index over post keys.

use std::collections::HashSet;

use driftwatch_common::{AnnotatedPost, DriftwatchError};

use crate::log::RecordLog;

/// In-memory set of post keys that have already been durably annotated.
///
/// Rebuilt at every session start by replaying the annotated log, not the
/// raw posts log: a post that was collected but never annotated before a
/// crash gets retried on the next run.
#[derive(Debug, Default)]
pub struct SeenSet {
    keys: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the annotated log. Corrupt lines were already skipped
    /// by replay, so a torn trailing write just means one retried post.
    pub fn rebuild(log: &RecordLog<AnnotatedPost>) -> Result<Self, DriftwatchError> {
        let keys = log.replay()?.map(|a| a.post.key).collect();
        Ok(Self { keys })
    }

    pub fn seen(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Idempotent: marking an already-marked key is a no-op.
    pub fn mark(&mut self, key: &str) {
        self.keys.insert(key.to_string());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
