//! Snapshot recorder
//!
//! The history file only ever grows: one compact JSON line per successful
//! tick, opened in append mode for the duration of a single write. The
//! latest file is replaced atomically (temp file in the destination
//! directory, then rename) so a reader never observes a torn snapshot.

use super::Snapshot;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed history line {line}: {source}")]
    MalformedLine {
        line: usize,
        source: serde_json::Error,
    },
}

impl From<tempfile::PersistError> for StoreError {
    fn from(e: tempfile::PersistError) -> Self {
        StoreError::Io(e.error)
    }
}

/// Recording statistics
#[derive(Debug, Default, Clone)]
pub struct StoreStats {
    pub appends: u64,
    pub latest_writes: u64,
    pub last_write: Option<DateTime<Utc>>,
}

/// Writes snapshots to the history and latest files
pub struct SnapshotStore {
    history_file: PathBuf,
    latest_file: PathBuf,
    stats: StoreStats,
}

impl SnapshotStore {
    /// Create a store over the two target paths
    pub fn new(history_file: impl Into<PathBuf>, latest_file: impl Into<PathBuf>) -> Self {
        Self {
            history_file: history_file.into(),
            latest_file: latest_file.into(),
            stats: StoreStats::default(),
        }
    }

    /// History file path
    pub fn history_file(&self) -> &Path {
        &self.history_file
    }

    /// Latest file path
    pub fn latest_file(&self) -> &Path {
        &self.latest_file
    }

    /// Current statistics
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Record one snapshot: history append first, then latest overwrite.
    ///
    /// A partial failure (append succeeded, latest write failed) surfaces as
    /// the failing write's error and is not rolled back.
    pub fn record(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.append_history(snapshot)?;
        self.write_latest(snapshot)?;
        Ok(())
    }

    /// Append one compact JSON line to the history file
    pub fn append_history(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        ensure_parent(&self.history_file)?;

        let line = serde_json::to_string(snapshot)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_file)?;
        writeln!(file, "{}", line)?;

        self.stats.appends += 1;
        self.stats.last_write = Some(Utc::now());
        tracing::debug!(path = ?self.history_file, "Appended snapshot to history");
        Ok(())
    }

    /// Atomically replace the latest file with a pretty-printed snapshot
    pub fn write_latest(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let dir = ensure_parent(&self.latest_file)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.latest_file)?;

        self.stats.latest_writes += 1;
        self.stats.last_write = Some(Utc::now());
        tracing::debug!(path = ?self.latest_file, "Wrote latest snapshot");
        Ok(())
    }

    /// Read the latest snapshot, or None when the file does not exist yet
    pub fn read_latest(&self) -> Result<Option<Snapshot>, StoreError> {
        match fs::read_to_string(&self.latest_file) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the full history in file order
    pub fn read_history(&self) -> Result<Vec<Snapshot>, StoreError> {
        let file = match File::open(&self.history_file) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let snapshot = serde_json::from_str(&line)
                .map_err(|source| StoreError::MalformedLine { line: idx + 1, source })?;
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }

    /// Number of recorded history lines, without deserializing them
    pub fn history_len(&self) -> Result<usize, StoreError> {
        let file = match File::open(&self.history_file) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        for line in BufReader::new(file).lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Create the parent directory if needed and return it
fn ensure_parent(path: &Path) -> Result<&Path, StoreError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    Ok(dir)
}
