use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriftwatchError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<std::io::Error> for DriftwatchError {
    fn from(err: std::io::Error) -> Self {
        DriftwatchError::Storage(err.to_string())
    }
}
