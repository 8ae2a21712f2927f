//! Append-only newline-delimited record logs.
//!
//! One `RecordLog` per stream per session (raw posts, annotated posts,
//! batch summaries). Appends are write-and-flush per record, so a crash
//! loses at most the in-flight line; replay tolerates the truncated or
//! garbled trailing line such a crash leaves behind.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use driftwatch_common::DriftwatchError;

pub struct RecordLog<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> RecordLog<T> {
    /// Open a log at `path`, creating parent directories. The file itself
    /// is created lazily on first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DriftwatchError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            _marker: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one record: serialize to a single JSON line, write,
    /// and flush before returning.
    pub fn append(&self, record: &T) -> Result<(), DriftwatchError> {
        let line = serde_json::to_string(record)
            .map_err(|e| DriftwatchError::Storage(format!("serialize record: {e}")))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }

    /// Replay all previously written records in write order.
    ///
    /// Reopens the file each call, so it works across process restarts.
    /// Malformed lines (a partially-written record from a prior crash, or
    /// any other corruption) are skipped with a warning, never fatal.
    /// A missing file replays as empty.
    pub fn replay(&self) -> Result<impl Iterator<Item = T> + '_, DriftwatchError> {
        let file = match File::open(&self.path) {
            Ok(f) => Some(f),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let lines = file
            .map(|f| BufReader::new(f).lines())
            .into_iter()
            .flatten();

        let path = self.path.clone();
        Ok(lines.filter_map(move |line| {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable log line, skipping");
                    return None;
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            match serde_json::from_str(&line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt log line, skipping");
                    None
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Rec {
        n: u32,
        label: String,
    }

    fn rec(n: u32) -> Rec {
        Rec {
            n,
            label: format!("rec-{n}"),
        }
    }

    #[test]
    fn append_then_replay_preserves_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let log: RecordLog<Rec> = RecordLog::open(dir.path().join("recs.jsonl")).unwrap();

        for n in 0..5 {
            log.append(&rec(n)).unwrap();
        }

        let replayed: Vec<Rec> = log.replay().unwrap().collect();
        assert_eq!(replayed, (0..5).map(rec).collect::<Vec<_>>());
    }

    #[test]
    fn replay_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log: RecordLog<Rec> = RecordLog::open(dir.path().join("never.jsonl")).unwrap();
        assert_eq!(log.replay().unwrap().count(), 0);
    }

    #[test]
    fn replay_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recs.jsonl");
        let log: RecordLog<Rec> = RecordLog::open(&path).unwrap();

        log.append(&rec(1)).unwrap();
        log.append(&rec(2)).unwrap();

        // Simulate a crash mid-append: a truncated trailing line.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"n\":3,\"lab").unwrap();

        let replayed: Vec<Rec> = log.replay().unwrap().collect();
        assert_eq!(replayed, vec![rec(1), rec(2)]);
    }

    #[test]
    fn replay_skips_garbage_in_the_middle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recs.jsonl");
        std::fs::write(
            &path,
            "{\"n\":1,\"label\":\"rec-1\"}\nnot json at all\n{\"n\":2,\"label\":\"rec-2\"}\n",
        )
        .unwrap();

        let log: RecordLog<Rec> = RecordLog::open(&path).unwrap();
        let replayed: Vec<Rec> = log.replay().unwrap().collect();
        assert_eq!(replayed, vec![rec(1), rec(2)]);
    }

    #[test]
    fn append_resumes_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recs.jsonl");
        {
            let log: RecordLog<Rec> = RecordLog::open(&path).unwrap();
            log.append(&rec(1)).unwrap();
        }
        let log: RecordLog<Rec> = RecordLog::open(&path).unwrap();
        log.append(&rec(2)).unwrap();

        let replayed: Vec<Rec> = log.replay().unwrap().collect();
        assert_eq!(replayed, vec![rec(1), rec(2)]);
    }
}
