//! Durable append-only NDJSON event log.
//!
//! Diverges deliberately from a buffered, rotated writer: each write opens
//! the file, appends one line, flushes, `fsync`s, and closes the handle
//! before control returns to the caller. Durability trumps throughput here:
//! the goal is to bound the replay gap on crash to a single candidate, not
//! to sustain high write throughput. A batched writer could still fsync
//! before each decision is submitted to the server, but this takes the
//! simpler route (one event, one open/append/fsync/close cycle) since the
//! event cadence is bounded by network round-trips, not by log-write cost.

mod event;

pub use event::Event;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use adm_common::Error;

/// Handle to a durable event log file. Holds only the path; each write
/// opens its own handle so a crash mid-write never leaves a dangling
/// buffered writer holding unflushed bytes.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Create (or truncate) a fresh log file at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| Error::LogWrite { path: path.display().to_string(), source })?;
        Ok(EventLog { path })
    }

    /// Attach to an existing log file for resumed appends, without
    /// truncating it. Used by `--resume-from-log`.
    pub fn append_to(path: impl Into<PathBuf>) -> Self {
        EventLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event: open, write one line, flush, fsync, close.
    pub fn append(&self, event: &Event) -> Result<(), Error> {
        let line = serde_json::to_string(event)
            .map_err(|e| Error::LogParse(format!("failed to encode {}: {e}", event.kind_name())))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| Error::LogWrite { path: self.path.display().to_string(), source })?;

        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_all())
            .map_err(|source| Error::LogWrite { path: self.path.display().to_string(), source })
    }
}
