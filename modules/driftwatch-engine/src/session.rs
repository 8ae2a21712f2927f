//! Session orchestration: wire one collector and one annotation worker
//! through the bounded queue and hand back a controllable handle.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use driftwatch_common::{Config, DriftwatchError};
use driftwatch_store::{RecordLog, SeenSet, SessionPaths};

use crate::annotator::{AnnotationWorker, WorkerStats};
use crate::collector::{Collector, CollectorStats};
use crate::context::RollingContext;
use crate::queue;
use crate::report::MetaReportGenerator;
use crate::summarizer::BatchSummarizer;
use crate::traits::{Generator, TimelineSource};

const CONTEXT_PREAMBLE: &str = "You are observing one public account's timeline as it unfolds. \
For each post you are shown, reply with a brief interpretation that builds on the posts and \
interpretations that came before.";

/// Pipeline tuning knobs for one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub rolling_context_len: usize,
    pub batch_size: usize,
    pub queue_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rolling_context_len: 10,
            batch_size: 10,
            queue_capacity: 64,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            rolling_context_len: config.rolling_context_len,
            batch_size: config.batch_size,
            queue_capacity: config.queue_capacity,
        }
    }
}

/// Stats from a completed session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub collector: CollectorStats,
    pub worker: WorkerStats,
}

impl std::fmt::Display for SessionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.collector, self.worker)
    }
}

/// Handle to one live session. Owned by the control surface's registry;
/// the pipeline tasks only ever see the cancellation token.
pub struct SessionHandle {
    account: String,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    collector: JoinHandle<CollectorStats>,
    worker: JoinHandle<WorkerStats>,
}

impl SessionHandle {
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether any part of the pipeline is still live.
    pub fn is_running(&self) -> bool {
        !(self.collector.is_finished() && self.worker.is_finished())
    }

    /// Whether the annotation worker has fully drained. Live observers
    /// poll this to decide whether to keep refreshing.
    pub fn is_drained(&self) -> bool {
        self.worker.is_finished()
    }

    /// Request shutdown. The collector stops at its next pass or enqueue
    /// and closes its source handle; the worker stops consuming, flushes
    /// the remainder batch, and still attempts the meta report.
    pub fn request_stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for both tasks and collect their stats.
    pub async fn wait(self) -> anyhow::Result<SessionStats> {
        let collector = self.collector.await?;
        let worker = self.worker.await?;
        Ok(SessionStats { collector, worker })
    }
}

/// Start a session: create storage, rebuild the dedup index from the
/// annotated log, and spawn the collector/worker pair. Storage failures
/// here are session-start failures and are surfaced to the caller.
pub fn start<S: TimelineSource + 'static>(
    account: &str,
    source: S,
    generator: Arc<dyn Generator>,
    paths: SessionPaths,
    options: SessionOptions,
) -> Result<SessionHandle, DriftwatchError> {
    paths.create()?;
    let posts_log = RecordLog::open(paths.posts_log())?;
    let annotated_log = RecordLog::open(paths.annotated_log())?;
    let summaries_log = RecordLog::open(paths.summaries_log())?;

    let seen = SeenSet::rebuild(&annotated_log)?;
    if !seen.is_empty() {
        info!(account, already_annotated = seen.len(), "Resumed dedup index from history");
    }

    let cancel = CancellationToken::new();
    let (tx, rx) = queue::bounded(options.queue_capacity);

    let collector = Collector::new(source, posts_log, seen, tx, cancel.clone());

    let session_start = Instant::now();
    let summarizer = BatchSummarizer::new(generator.clone(), summaries_log, session_start);
    let reporter = MetaReportGenerator::new(
        generator.clone(),
        RecordLog::open(paths.summaries_log())?,
        paths.clone(),
    );
    let context = RollingContext::new(CONTEXT_PREAMBLE, options.rolling_context_len);
    let worker = AnnotationWorker::new(
        generator,
        context,
        options.batch_size,
        annotated_log,
        summarizer,
        reporter,
        cancel.clone(),
    );

    let run_id = Uuid::new_v4();
    info!(account, %run_id, "Session started");

    Ok(SessionHandle {
        account: account.to_string(),
        run_id,
        started_at: Utc::now(),
        cancel,
        collector: tokio::spawn(collector.run()),
        worker: tokio::spawn(worker.run(rx)),
    })
}
