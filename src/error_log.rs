//! Append-only record of worker failures.
//!
//! Each failed run adds one line: local timestamp, then the reason.
//! Writing is best effort; a broken log file never takes the process down.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

pub struct ErrorLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `reason`, logging instead of failing if the file is unwritable.
    pub fn record(&self, reason: &str) {
        if let Err(err) = self.try_record(reason) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to append to error log"
            );
        }
    }

    fn try_record(&self, reason: &str) -> io::Result<()> {
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = format!(
            "{} {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            reason.replace('\n', " ")
        );
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
