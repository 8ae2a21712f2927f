use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wrapper for actor API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Metadata for one scrape run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
}

/// Input for the timeline scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeInput {
    pub handles: Vec<String>,
    #[serde(rename = "maxItems")]
    pub max_items: u32,
}

/// A single post from the scraper dataset. The scraper emits whatever it
/// managed to extract, so every field past the URL is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct TimelinePost {
    pub id: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<PostAuthor>,
    pub url: Option<String>,
    #[serde(rename = "isRepost", default)]
    pub is_repost: bool,
    #[serde(rename = "repostOf")]
    pub repost_of: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostAuthor {
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

impl TimelinePost {
    /// Author handle, falling back to the scraped account when the
    /// dataset record has none.
    pub fn author_handle<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.author
            .as_ref()
            .and_then(|a| a.user_name.as_deref())
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_record_with_minimal_fields_parses() {
        let raw = r#"{"id":"123","text":"hello","url":null}"#;
        let post: TimelinePost = serde_json::from_str(raw).unwrap();
        assert_eq!(post.id.as_deref(), Some("123"));
        assert!(!post.is_repost);
        assert_eq!(post.author_handle("fallback"), "fallback");
    }

    #[test]
    fn author_handle_prefers_dataset_author() {
        let raw = r#"{"id":"1","author":{"userName":"someone"}}"#;
        let post: TimelinePost = serde_json::from_str(raw).unwrap();
        assert_eq!(post.author_handle("fallback"), "someone");
    }
}
