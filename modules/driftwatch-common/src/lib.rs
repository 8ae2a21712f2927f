pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::DriftwatchError;
pub use types::{derive_key, AnnotatedPost, BatchSummary, MetaReport, Post};
