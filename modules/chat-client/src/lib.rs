pub mod error;
mod wire;

pub use error::{ChatError, Result};

use tracing::debug;

use wire::{CompletionRequest, CompletionResponse, WireMessage};

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Sampling
// =============================================================================

/// Sampling parameters for one completion call.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Sampling {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

// =============================================================================
// ChatClient
// =============================================================================

/// Client for an OpenAI-compatible `/chat/completions` endpoint
/// (LM Studio, Ollama, vLLM, or the hosted original).
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Bearer token for hosted endpoints. Local servers ignore it.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One synchronous completion over an ordered role-tagged message list.
    pub async fn chat(&self, messages: &[Message], sampling: Sampling) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            stream: false,
        };

        debug!(model = %request.model, messages = messages.len(), "chat completion request");

        let mut builder = self.http.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .ok_or(ChatError::NoContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_tag_roles() {
        assert_eq!(Message::system("s").role, MessageRole::System);
        assert_eq!(Message::user("u").role, MessageRole::User);
        assert_eq!(Message::assistant("a").role, MessageRole::Assistant);
    }

    #[test]
    fn request_serializes_lowercase_roles() {
        let messages = vec![Message::system("be brief"), Message::user("hello")];
        let request = CompletionRequest {
            model: "test-model".to_string(),
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: 0.8,
            max_tokens: 1024,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn response_tolerates_null_content() {
        let raw = r#"{"choices":[{"message":{"content":null}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ChatClient::new("http://127.0.0.1:1234/v1/", "m");
        assert_eq!(client.base_url, "http://127.0.0.1:1234/v1");
    }
}
