//! End-of-session meta-report: one narrative across all batch summaries.

use std::sync::Arc;

use tracing::{info, warn};

use chat_client::{Message, Sampling};
use driftwatch_common::{BatchSummary, DriftwatchError, MetaReport};
use driftwatch_store::{RecordLog, SessionPaths};

use crate::traits::Generator;

const META_SAMPLING: Sampling = Sampling {
    temperature: 0.7,
    max_tokens: 4096,
};

const META_PROMPT: &str = "You are a narrative analyst. Given the following set of summary \
reports, produce a comprehensive meta-narrative about this account's behavior. Highlight \
attention, themes, changes in tone, and any psychological or strategic patterns. Do not \
summarize each block; synthesize trends across all of them. Use English only.";

pub struct MetaReportGenerator {
    generator: Arc<dyn Generator>,
    summaries: RecordLog<BatchSummary>,
    paths: SessionPaths,
}

impl MetaReportGenerator {
    pub fn new(
        generator: Arc<dyn Generator>,
        summaries: RecordLog<BatchSummary>,
        paths: SessionPaths,
    ) -> Self {
        Self {
            generator,
            summaries,
            paths,
        }
    }

    /// Synthesize across every persisted batch summary and overwrite the
    /// session's meta-report file. A session with no summaries skips
    /// generation; a backend failure is logged, not propagated, since the
    /// absence of a meta-report is an acceptable terminal state.
    pub async fn generate(&self) -> Result<Option<MetaReport>, DriftwatchError> {
        let summaries: Vec<BatchSummary> = self.summaries.replay()?.collect();
        if summaries.is_empty() {
            info!("No batch summaries, skipping meta report");
            return Ok(None);
        }

        let joined = summaries
            .iter()
            .map(|s| format!("Summary:\n{}", s.summary))
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = vec![Message::user(format!("{META_PROMPT}\n\n{joined}"))];
        match self.generator.generate(&messages, META_SAMPLING).await {
            Ok(text) => {
                self.paths.write_meta_report(&text)?;
                info!(
                    summaries = summaries.len(),
                    path = %self.paths.meta_report().display(),
                    "Meta report written"
                );
                Ok(Some(MetaReport { text }))
            }
            Err(e) => {
                warn!(error = %e, "Meta report generation failed");
                Ok(None)
            }
        }
    }
}
