//! Production timeline source: adapts the actor-run scraping client to the
//! `TimelineSource` seam.

use async_trait::async_trait;
use chrono::SecondsFormat;
use tracing::debug;

use driftwatch_common::{derive_key, DriftwatchError, Post};
use timeline_client::{TimelineClient, TimelinePost};

use crate::traits::TimelineSource;

/// Scrapes a growing window of an account's recent posts, one scrape run
/// per pass. Passes overlap on purpose, the same way re-scanning a
/// scrolled page does; the collector's dedup index absorbs the repeats.
pub struct ApiTimelineSource {
    client: TimelineClient,
    account: String,
    page_size: u32,
    passes_left: u32,
    pass: u32,
}

impl ApiTimelineSource {
    pub fn new(client: TimelineClient, account: &str, page_size: u32, passes: u32) -> Self {
        Self {
            client,
            account: account.to_string(),
            page_size,
            passes_left: passes,
            pass: 0,
        }
    }
}

#[async_trait]
impl TimelineSource for ApiTimelineSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<Post>>, DriftwatchError> {
        if self.passes_left == 0 {
            return Ok(None);
        }
        self.passes_left -= 1;
        self.pass += 1;

        let window = self.page_size.saturating_mul(self.pass);
        let raw = self
            .client
            .scrape_posts(&self.account, window)
            .await
            .map_err(|e| DriftwatchError::SourceUnavailable(e.to_string()))?;

        let mut posts = Vec::with_capacity(raw.len());
        for candidate in raw {
            match convert(candidate, &self.account) {
                Ok(post) => posts.push(post),
                // One unparseable candidate never aborts the pass.
                Err(e) => debug!(error = %e, "Skipping candidate"),
            }
        }
        Ok(Some(posts))
    }
}

/// Convert one dataset record into an accepted `Post`, deriving the
/// canonical key. Records with no text or no timestamp are extraction
/// failures to skip.
fn convert(raw: TimelinePost, account: &str) -> Result<Post, DriftwatchError> {
    let author = raw.author_handle(account).to_string();

    let text = raw
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DriftwatchError::Extraction(format!("candidate from @{author} has no text")))?
        .to_string();

    let timestamp = raw
        .created_at
        .ok_or_else(|| {
            DriftwatchError::Extraction(format!("candidate from @{author} has no timestamp"))
        })?
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let key = derive_key(raw.id.as_deref(), &author, &timestamp);

    let body = if raw.is_repost {
        match raw.repost_of.as_deref() {
            Some(original) => format!("(repost of @{original}) {text}"),
            None => format!("(repost) {text}"),
        }
    } else {
        text
    };

    Ok(Post {
        key,
        timestamp,
        author,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use timeline_client::PostAuthor;

    fn raw(id: Option<&str>, text: Option<&str>) -> TimelinePost {
        TimelinePost {
            id: id.map(String::from),
            text: text.map(String::from),
            created_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
            author: Some(PostAuthor {
                user_name: Some("ada".to_string()),
                display_name: None,
            }),
            url: None,
            is_repost: false,
            repost_of: None,
        }
    }

    #[test]
    fn converts_a_complete_record() {
        let post = convert(raw(Some("42"), Some("  hello  ")), "watched").unwrap();
        assert_eq!(post.key, "42");
        assert_eq!(post.author, "ada");
        assert_eq!(post.body, "hello");
        assert_eq!(post.timestamp, "2026-03-01T12:00:00Z");
    }

    #[test]
    fn missing_id_derives_composite_key() {
        let post = convert(raw(None, Some("hello")), "watched").unwrap();
        assert_eq!(post.key, "ada_2026-03-01T12:00:00Z");
    }

    #[test]
    fn empty_text_is_an_extraction_failure() {
        let err = convert(raw(Some("42"), Some("   ")), "watched").unwrap_err();
        assert!(matches!(err, DriftwatchError::Extraction(_)));
    }

    #[test]
    fn missing_timestamp_is_an_extraction_failure() {
        let mut record = raw(Some("42"), Some("hello"));
        record.created_at = None;
        let err = convert(record, "watched").unwrap_err();
        assert!(matches!(err, DriftwatchError::Extraction(_)));
    }

    #[test]
    fn repost_body_names_the_original_author() {
        let mut record = raw(Some("42"), Some("hello"));
        record.is_repost = true;
        record.repost_of = Some("lovelace".to_string());
        let post = convert(record, "watched").unwrap();
        assert_eq!(post.body, "(repost of @lovelace) hello");
    }
}
