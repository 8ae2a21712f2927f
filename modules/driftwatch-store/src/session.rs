//! Per-session storage layout.
//!
//! Each watched account owns `{DATA_DIR}/{account}/` with three append-only
//! record logs plus one overwritable report file:
//!
//! ```text
//! posts.jsonl       raw accepted posts, in acceptance order
//! annotated.jsonl   posts plus generated commentary
//! summaries.jsonl   one record per batch summary
//! meta_report.txt   end-of-session narrative (overwritten on regeneration)
//! ```

use std::path::PathBuf;

use driftwatch_common::DriftwatchError;

/// Root data directory, controlled by `DATA_DIR` env var (default: `"data"`).
pub fn data_dir() -> PathBuf {
    PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// Path bundle for one session's durable state.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    root: PathBuf,
}

impl SessionPaths {
    /// Session rooted under the global data directory.
    pub fn for_account(account: &str) -> Self {
        Self {
            root: data_dir().join(account),
        }
    }

    /// Session rooted at an explicit directory (tests, tooling).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the session directory. Failure here is a session-start
    /// failure and is surfaced to the caller.
    pub fn create(&self) -> Result<(), DriftwatchError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn posts_log(&self) -> PathBuf {
        self.root.join("posts.jsonl")
    }

    pub fn annotated_log(&self) -> PathBuf {
        self.root.join("annotated.jsonl")
    }

    pub fn summaries_log(&self) -> PathBuf {
        self.root.join("summaries.jsonl")
    }

    pub fn meta_report(&self) -> PathBuf {
        self.root.join("meta_report.txt")
    }

    /// Write (overwrite) the meta report.
    pub fn write_meta_report(&self, text: &str) -> Result<(), DriftwatchError> {
        std::fs::write(self.meta_report(), text)?;
        Ok(())
    }

    /// Read the meta report, if one has been generated.
    pub fn read_meta_report(&self) -> Result<Option<String>, DriftwatchError> {
        match std::fs::read_to_string(self.meta_report()) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_the_session_root() {
        let paths = SessionPaths::at("/tmp/driftwatch-test/ada");
        assert!(paths.posts_log().ends_with("ada/posts.jsonl"));
        assert!(paths.annotated_log().ends_with("ada/annotated.jsonl"));
        assert!(paths.summaries_log().ends_with("ada/summaries.jsonl"));
        assert!(paths.meta_report().ends_with("ada/meta_report.txt"));
    }

    #[test]
    fn meta_report_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SessionPaths::at(dir.path());
        paths.create().unwrap();

        assert_eq!(paths.read_meta_report().unwrap(), None);
        paths.write_meta_report("first").unwrap();
        paths.write_meta_report("second").unwrap();
        assert_eq!(paths.read_meta_report().unwrap().as_deref(), Some("second"));
    }
}
