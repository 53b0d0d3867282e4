//! Run transcript.
//!
//! Every user-facing line goes through [`AuditLog::record`], which timestamps
//! it, echoes it to stdout and keeps it in memory. The buffer is written to
//! `audit_log.txt` exactly once, when the owning [`AuditSession`] is dropped.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const AUDIT_LOG_FILE_NAME: &str = "audit_log.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl AuditEntry {
    pub fn formatted(&self) -> String {
        format!("[{}] {}", self.at.format(TIMESTAMP_FORMAT), self.message)
    }
}

#[derive(Debug)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    echo: bool,
    flushed_to: Option<PathBuf>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            echo: true,
            flushed_to: None,
        }
    }

    /// A log that buffers without printing.
    pub fn silent() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let entry = AuditEntry {
            at: Local::now(),
            message: message.into(),
        };

        if self.echo {
            println!("{}", entry.formatted());
        }

        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.message.contains(needle))
    }

    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.formatted());
            out.push('\n');
        }
        out
    }

    pub fn flushed_to(&self) -> Option<&Path> {
        self.flushed_to.as_deref()
    }

    /// Writes the transcript so far. A second call fails; lines recorded
    /// after the flush stay on the console only.
    pub fn flush_to(&mut self, path: &Path) -> Result<()> {
        if let Some(previous) = &self.flushed_to {
            return Err(PipelineError::AuditAlreadyFlushed(previous.clone()));
        }

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.transcript())?;

        debug!(path = %path.display(), entries = self.entries.len(), "audit log flushed");
        self.flushed_to = Some(path.to_path_buf());
        Ok(())
    }
}

/// Owns the run's [`AuditLog`] and flushes it when dropped, on every exit path.
#[derive(Debug)]
pub struct AuditSession {
    log: AuditLog,
    destination: Option<PathBuf>,
    started_at: DateTime<Local>,
}

impl AuditSession {
    pub fn start(mut log: AuditLog) -> Self {
        let started_at = Local::now();
        log.record(format!("Script execution started at {}", started_at.format(TIMESTAMP_FORMAT)));
        Self {
            log,
            destination: None,
            started_at,
        }
    }

    /// Places `audit_log.txt` inside `directory`. The latest call wins.
    pub fn persist_in(&mut self, directory: &Path) {
        self.destination = Some(directory.join(AUDIT_LOG_FILE_NAME));
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn log(&mut self) -> &mut AuditLog {
        &mut self.log
    }

    fn close(&mut self) {
        if let Some(destination) = self.destination.clone() {
            if self.log.flushed_to().is_none() {
                match self.log.flush_to(&destination) {
                    Ok(()) => self
                        .log
                        .record(format!("Audit log file created at: {}", destination.display())),
                    Err(error) => {
                        warn!(path = %destination.display(), %error, "audit log could not be written");
                        self.log.record(format!("Failed to write audit log: {error}"));
                    }
                }
            }
        }

        let ended_at = Local::now();
        let elapsed = ended_at.signed_duration_since(self.started_at);
        self.log
            .record(format!("Script execution completed at {}", ended_at.format(TIMESTAMP_FORMAT)));
        self.log.record(format!(
            "Total execution time: {:.3}s",
            elapsed.num_milliseconds() as f64 / 1000.0
        ));
    }
}

impl Drop for AuditSession {
    fn drop(&mut self) {
        self.close();
    }
}
