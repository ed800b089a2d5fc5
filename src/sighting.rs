//! Sighting log.
//!
//! Append-only UTF-8 text record of qualifying detections, one line per
//! cycle: `YYYY-MM-DD HH:MM:SS | <top_class_name>`. The file is opened,
//! appended, and closed on every write so each line is durable on its own,
//! independent of anything that happens to the process later.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SightingLog {
    path: PathBuf,
}

impl SightingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry for the current cycle's top detection.
    pub fn append(&self, top_class: &str) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open sighting log {}", self.path.display()))?;
        let timestamp = Local::now().format(TIME_FORMAT);
        writeln!(file, "{timestamp} | {top_class}")
            .with_context(|| format!("append to sighting log {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
