use std::env;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Generation backend (OpenAI-compatible)
    pub chat_api_url: String,
    pub chat_model: String,
    pub chat_api_key: Option<String>,

    // Timeline scraping
    pub timeline_api_token: String,

    // Pipeline tuning
    pub rolling_context_len: usize,
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub collect_passes: u32,
    pub page_size: u32,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            chat_api_url: env::var("CHAT_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:1234/v1".to_string()),
            chat_model: required_env("CHAT_MODEL"),
            chat_api_key: env::var("CHAT_API_KEY").ok(),
            timeline_api_token: required_env("TIMELINE_API_TOKEN"),
            rolling_context_len: parsed_env("ROLLING_CONTEXT_LEN", 10),
            batch_size: parsed_env("BATCH_SIZE", 10),
            queue_capacity: parsed_env("QUEUE_CAPACITY", 64),
            collect_passes: parsed_env("COLLECT_PASSES", 50),
            page_size: parsed_env("PAGE_SIZE", 20),
        }
    }

    /// Log the non-secret parts of the configuration.
    pub fn log_redacted(&self) {
        info!(
            chat_api_url = %self.chat_api_url,
            chat_model = %self.chat_model,
            rolling_context_len = self.rolling_context_len,
            batch_size = self.batch_size,
            queue_capacity = self.queue_capacity,
            collect_passes = self.collect_passes,
            page_size = self.page_size,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
