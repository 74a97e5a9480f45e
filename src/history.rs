//! Persisted benchmark history: one entry per subject version, sorted ascending.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::{BenchmarkEntry, BenchmarkHistory};
use crate::version;

#[derive(Clone, Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history. A missing or unparsable file reads as empty.
    pub fn read(&self) -> BenchmarkHistory {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no readable history, starting empty");
                return BenchmarkHistory::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(history) => history,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history is corrupt, starting empty");
                BenchmarkHistory::default()
            }
        }
    }

    /// Insert `entry`, replacing any entry with the same subject version, and
    /// persist the re-sorted collection. Returns what was written.
    pub fn write(&self, entry: BenchmarkEntry) -> Result<BenchmarkHistory> {
        let mut history = self.read();
        let before = history.benchmarks.len();
        history
            .benchmarks
            .retain(|e| e.subject_version != entry.subject_version);
        if history.benchmarks.len() != before {
            debug!(version = %entry.subject_version, "replacing existing history entry");
        }
        history.benchmarks.push(entry);
        history
            .benchmarks
            .sort_by(|a, b| version::compare(&a.subject_version, &b.subject_version));

        self.persist(&history)?;
        Ok(history)
    }

    fn persist(&self, history: &BenchmarkHistory) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut json = serde_json::to_string_pretty(history)?;
        json.push('\n');

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
