use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimelineError>;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Scrape run ended with status {0}")]
    RunFailed(String),
}

impl From<reqwest::Error> for TimelineError {
    fn from(err: reqwest::Error) -> Self {
        TimelineError::Network(err.to_string())
    }
}
