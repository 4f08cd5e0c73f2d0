use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::prelude::*;

use crate::game::SessionSummary;

/// Append-only CSV of completed sessions
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, summary: &SessionSummary) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // If the file doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let mut log_file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        if needs_header {
            writeln!(log_file, "date,score,hits,best_reaction_ms,mean_reaction_ms")?;
        }

        writeln!(
            log_file,
            "{},{},{},{},{:.1}",
            Local::now().format("%c"),
            summary.score,
            summary.hits,
            summary.best_reaction_ms,
            summary.mean_reaction_ms,
        )
    }
}
