//! Consumer half of a session: annotates each queued post against the
//! rolling context, persists the result, and triggers batch summaries.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use chat_client::Sampling;
use driftwatch_common::{AnnotatedPost, Post};
use driftwatch_store::RecordLog;

use crate::context::RollingContext;
use crate::queue::PostReceiver;
use crate::report::MetaReportGenerator;
use crate::summarizer::BatchSummarizer;
use crate::traits::Generator;

const ANNOTATION_SAMPLING: Sampling = Sampling {
    temperature: 0.8,
    max_tokens: 1024,
};

/// Stats from one annotation run.
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    pub annotated: u32,
    pub generation_failures: u32,
    pub batches: u32,
    pub meta_report_written: bool,
}

impl std::fmt::Display for WorkerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Annotation Complete ===")?;
        writeln!(f, "Annotated:           {}", self.annotated)?;
        writeln!(f, "Generation failures: {}", self.generation_failures)?;
        writeln!(f, "Batch summaries:     {}", self.batches)?;
        writeln!(
            f,
            "Meta report:         {}",
            if self.meta_report_written {
                "written"
            } else {
                "skipped"
            }
        )?;
        Ok(())
    }
}

pub struct AnnotationWorker {
    generator: Arc<dyn Generator>,
    context: RollingContext,
    batch_size: usize,
    annotated_log: RecordLog<AnnotatedPost>,
    summarizer: BatchSummarizer,
    reporter: MetaReportGenerator,
    cancel: CancellationToken,
}

impl AnnotationWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: Arc<dyn Generator>,
        context: RollingContext,
        batch_size: usize,
        annotated_log: RecordLog<AnnotatedPost>,
        summarizer: BatchSummarizer,
        reporter: MetaReportGenerator,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            context,
            batch_size,
            annotated_log,
            summarizer,
            reporter,
            cancel,
        }
    }

    /// Consume the queue until end-of-stream or cancellation, then flush
    /// the remainder batch and attempt the meta report. One bad generation
    /// call never stops the loop; it becomes a marker annotation.
    pub async fn run(mut self, mut queue: PostReceiver) -> WorkerStats {
        let mut stats = WorkerStats::default();
        let mut pending: Vec<AnnotatedPost> = Vec::new();

        loop {
            let post = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Annotation cancelled, flushing pending work");
                    break;
                }
                next = queue.get() => match next {
                    Some(post) => post,
                    None => break, // queue closed and drained
                },
            };

            let annotated = self.annotate(post).await;
            if annotated.is_error_marker() {
                stats.generation_failures += 1;
            }
            if let Err(e) = self.annotated_log.append(&annotated) {
                warn!(key = %annotated.post.key, error = %e, "Failed to persist annotation");
            }
            stats.annotated += 1;
            pending.push(annotated);

            if pending.len() >= self.batch_size {
                self.summarizer.summarize(std::mem::take(&mut pending)).await;
                stats.batches += 1;
            }
        }

        if !pending.is_empty() {
            self.summarizer.summarize(pending).await;
            stats.batches += 1;
        }

        match self.reporter.generate().await {
            Ok(report) => stats.meta_report_written = report.is_some(),
            Err(e) => warn!(error = %e, "Meta report storage failed"),
        }

        info!(
            annotated = stats.annotated,
            failures = stats.generation_failures,
            batches = stats.batches,
            "Annotation worker finished"
        );
        stats
    }

    async fn annotate(&mut self, post: Post) -> AnnotatedPost {
        let user_turn = format!(
            "[{}] Post from @{}:\n{}\nWrite a brief psychological or strategic interpretation.",
            post.timestamp, post.author, post.body
        );

        let messages = self.context.messages_with(&user_turn);
        let annotation = match self.generator.generate(&messages, ANNOTATION_SAMPLING).await {
            Ok(text) => text,
            Err(e) => {
                warn!(key = %post.key, error = %e, "Generation failed, recording marker");
                format!("[ERROR: {e}]")
            }
        };

        // Error markers enter the context too: the window stays an honest
        // record of what the model was shown and said.
        self.context.record(user_turn, annotation.clone());

        AnnotatedPost { post, annotation }
    }
}
