//! Producer half of a session: drives the timeline source, filters
//! duplicates, persists accepted posts, and feeds the queue.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use driftwatch_common::Post;
use driftwatch_store::{RecordLog, SeenSet};

use crate::queue::PostSender;
use crate::traits::TimelineSource;

/// Stats from one collection run.
#[derive(Debug, Default, Clone)]
pub struct CollectorStats {
    pub passes: u32,
    pub candidates: u32,
    pub duplicates: u32,
    pub accepted: u32,
}

impl std::fmt::Display for CollectorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Collection Complete ===")?;
        writeln!(f, "Passes:     {}", self.passes)?;
        writeln!(f, "Candidates: {}", self.candidates)?;
        writeln!(f, "Duplicates: {}", self.duplicates)?;
        writeln!(f, "Accepted:   {}", self.accepted)?;
        Ok(())
    }
}

pub struct Collector<S: TimelineSource> {
    source: S,
    posts_log: RecordLog<Post>,
    seen: SeenSet,
    queue: PostSender,
    cancel: CancellationToken,
}

impl<S: TimelineSource> Collector<S> {
    pub fn new(
        source: S,
        posts_log: RecordLog<Post>,
        seen: SeenSet,
        queue: PostSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            posts_log,
            seen,
            queue,
            cancel,
        }
    }

    /// Run collection passes until the source is exhausted, fails, or the
    /// session is cancelled. Consumes self; dropping the queue sender on
    /// return is what signals end-of-stream to the annotation worker.
    pub async fn run(mut self) -> CollectorStats {
        let mut stats = CollectorStats::default();

        'passes: loop {
            let batch = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Collection cancelled");
                    break 'passes;
                }
                next = self.source.next_batch() => match next {
                    Ok(Some(batch)) => batch,
                    Ok(None) => break 'passes,
                    Err(e) => {
                        // Fatal for collection only: everything already
                        // queued still drains and summarizes downstream.
                        error!(error = %e, "Source failed, ending collection");
                        break 'passes;
                    }
                },
            };
            stats.passes += 1;

            for post in batch {
                stats.candidates += 1;

                if self.seen.seen(&post.key) {
                    stats.duplicates += 1;
                    continue;
                }

                // Durably persist before marking, so a key is never marked
                // without a record backing it.
                if let Err(e) = self.posts_log.append(&post) {
                    warn!(key = %post.key, error = %e, "Failed to persist post, skipping");
                    continue;
                }
                self.seen.mark(&post.key);

                let key = post.key.clone();
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        info!(key = %key, "Cancelled while enqueueing, ending collection");
                        break 'passes;
                    }
                    sent = self.queue.put(post) => {
                        if sent.is_err() {
                            warn!(key = %key, "Annotation worker gone, ending collection");
                            break 'passes;
                        }
                        stats.accepted += 1;
                    }
                }
            }
        }

        self.source.close().await;
        info!(
            passes = stats.passes,
            accepted = stats.accepted,
            duplicates = stats.duplicates,
            "Collector finished"
        );
        stats
    }
}
