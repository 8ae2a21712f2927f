use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// One unit of ingested timeline content. Immutable once accepted;
/// identity is `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub key: String,
    /// RFC 3339 timestamp assigned by the source. Lexicographic order is
    /// chronological order, which the batch summarizer relies on.
    pub timestamp: String,
    pub author: String,
    pub body: String,
}

/// Canonical dedup key: the source-native post id when the source provides
/// one, otherwise `{author}_{timestamp}`.
pub fn derive_key(native_id: Option<&str>, author: &str, timestamp: &str) -> String {
    match native_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("{author}_{timestamp}"),
    }
}

// ---------------------------------------------------------------------------
// AnnotatedPost
// ---------------------------------------------------------------------------

/// A post plus the commentary generated for it. Written exactly once per
/// accepted post; a failed generation carries an `[ERROR: ...]` marker
/// annotation instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedPost {
    #[serde(flatten)]
    pub post: Post,
    pub annotation: String,
}

impl AnnotatedPost {
    /// Whether the annotation is an in-band failure marker rather than
    /// generated commentary.
    pub fn is_error_marker(&self) -> bool {
        self.annotation.starts_with("[ERROR:")
    }
}

// ---------------------------------------------------------------------------
// BatchSummary
// ---------------------------------------------------------------------------

/// Narrative summary over one batch of K consecutive annotated posts
/// (fewer for the final remainder batch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Keys of the posts in the batch, ascending by timestamp.
    pub member_keys: Vec<String>,
    pub summary: String,
    /// Wall-clock seconds since session start when the summary was produced.
    pub elapsed_secs: u64,
}

// ---------------------------------------------------------------------------
// MetaReport
// ---------------------------------------------------------------------------

/// End-of-session narrative synthesized across all batch summaries.
/// Singleton per session; regenerating overwrites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaReport {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_prefers_native_id() {
        assert_eq!(derive_key(Some("987"), "ada", "2026-01-01T00:00:00Z"), "987");
    }

    #[test]
    fn derive_key_falls_back_to_author_timestamp() {
        assert_eq!(
            derive_key(None, "ada", "2026-01-01T00:00:00Z"),
            "ada_2026-01-01T00:00:00Z"
        );
        assert_eq!(
            derive_key(Some(""), "ada", "2026-01-01T00:00:00Z"),
            "ada_2026-01-01T00:00:00Z"
        );
    }

    #[test]
    fn annotated_post_serializes_flat() {
        let annotated = AnnotatedPost {
            post: Post {
                key: "k1".into(),
                timestamp: "2026-01-01T00:00:00Z".into(),
                author: "ada".into(),
                body: "hello".into(),
            },
            annotation: "a comment".into(),
        };
        let json = serde_json::to_value(&annotated).unwrap();
        assert_eq!(json["key"], "k1");
        assert_eq!(json["annotation"], "a comment");
        assert!(json.get("post").is_none());
    }

    #[test]
    fn error_marker_is_distinguishable() {
        let mut annotated = AnnotatedPost {
            post: Post {
                key: "k".into(),
                timestamp: "t".into(),
                author: "a".into(),
                body: "b".into(),
            },
            annotation: "[ERROR: connection refused]".into(),
        };
        assert!(annotated.is_error_marker());
        annotated.annotation = "ordinary commentary".into();
        assert!(!annotated.is_error_marker());
    }
}
