//! Batch summarization: one narrative synthesis per K annotated posts.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use tracing::{info, warn};

use chat_client::{Message, Sampling};
use driftwatch_common::{AnnotatedPost, BatchSummary};
use driftwatch_store::RecordLog;

use crate::traits::Generator;

const SUMMARY_SAMPLING: Sampling = Sampling {
    temperature: 0.7,
    max_tokens: 2048,
};

const SUMMARY_PROMPT: &str = "The following posts are from one public account, arranged in \
chronological order. Write a single narrative paragraph that captures shifts in tone, \
rhetorical strategy, and attention. Highlight bias, contradictions, or strategic intent. \
Avoid listing or rephrasing each post; this should read like tracing a person's thinking \
over time. Use English only.";

pub struct BatchSummarizer {
    generator: Arc<dyn Generator>,
    log: RecordLog<BatchSummary>,
    session_start: Instant,
}

impl BatchSummarizer {
    pub fn new(
        generator: Arc<dyn Generator>,
        log: RecordLog<BatchSummary>,
        session_start: Instant,
    ) -> Self {
        Self {
            generator,
            log,
            session_start,
        }
    }

    /// Synthesize one summary over the whole batch (never per-item) and
    /// persist it. Backend failure yields a marker summary, not an error;
    /// a failed persist is logged and the summary still returned.
    pub async fn summarize(&self, mut batch: Vec<AnnotatedPost>) -> BatchSummary {
        // Batches can arrive out of source-encounter order when the source
        // interleaves old and new content; order by the posts' own time.
        batch.sort_by(|a, b| a.post.timestamp.cmp(&b.post.timestamp));

        let block = batch
            .iter()
            .map(|item| {
                format!(
                    "[{}] @{} posted:\n{}\nCommentary:\n{}",
                    item.post.timestamp,
                    item.post.author,
                    item.post.body,
                    strip_think_tags(&item.annotation)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = vec![Message::user(format!("{SUMMARY_PROMPT}\n\n{block}"))];
        let summary_text = match self.generator.generate(&messages, SUMMARY_SAMPLING).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, members = batch.len(), "Batch synthesis failed, recording marker");
                format!("[SUMMARY ERROR: {e}]")
            }
        };

        let summary = BatchSummary {
            member_keys: batch.iter().map(|item| item.post.key.clone()).collect(),
            summary: summary_text,
            elapsed_secs: self.session_start.elapsed().as_secs(),
        };

        if let Err(e) = self.log.append(&summary) {
            warn!(error = %e, "Failed to persist batch summary");
        }
        info!(
            members = summary.member_keys.len(),
            elapsed = %format_elapsed(summary.elapsed_secs),
            "Batch summary written"
        );

        summary
    }
}

/// Remove `<think>...</think>` reasoning spans some local models emit, so
/// the synthesis prompt sees only the commentary itself.
pub fn strip_think_tags(text: &str) -> String {
    static THINK_RE: OnceLock<Regex> = OnceLock::new();
    let re = THINK_RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
    re.replace_all(text, "").trim().to_string()
}

/// `MM:SS` rendering of elapsed session time.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
