//! Transcript sources feeding the aggregator

mod openclaw;

pub use openclaw::OpenClawParser;

use crate::types::{ClawdashError, RecordSkip, Result, UsageEvent};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One transcript line: a usage event, or the reason it was dropped.
pub type ScannedRecord = std::result::Result<UsageEvent, RecordSkip>;

/// Trait for reading usage records from session transcripts
pub trait TranscriptSource: Send + Sync {
    /// Source name (e.g., "openclaw")
    fn name(&self) -> &str;

    /// Root directory holding the transcripts
    fn data_dir(&self) -> &Path;

    /// Glob pattern for transcript files, relative to `data_dir`
    fn file_pattern(&self) -> &str;

    /// Parse a single file into records, in line order
    fn parse_file(&self, path: &Path) -> Result<Vec<ScannedRecord>>;

    /// Scan every transcript file.
    ///
    /// Fails only when the root directory itself is unavailable; unreadable
    /// subdirectories and files are logged and skipped.
    fn scan(&self) -> Result<Vec<ScannedRecord>> {
        let dir = self.data_dir();
        if !dir.is_dir() {
            return Err(ClawdashError::SourceUnavailable(format!(
                "{} transcripts not found at {}",
                self.name(),
                dir.display()
            )));
        }
        let files = self.collect_files();
        Ok(self.parse_files(&files))
    }

    /// Collect matching files, sorted for a stable record order
    fn collect_files(&self) -> Vec<PathBuf> {
        let pattern = self.data_dir().join(self.file_pattern());
        let mut files: Vec<PathBuf> = match glob::glob(&pattern.to_string_lossy()) {
            Ok(paths) => paths
                .filter_map(|entry| match entry {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(source = self.name(), error = %e, "skipping unreadable path");
                        None
                    }
                })
                .filter(|path| path.is_file())
                .collect(),
            Err(e) => {
                warn!(source = self.name(), error = %e, "invalid transcript pattern");
                Vec::new()
            }
        };
        files.sort();
        files
    }

    /// Parse files in parallel; output keeps the order of `files`
    fn parse_files(&self, files: &[PathBuf]) -> Vec<ScannedRecord> {
        files
            .par_iter()
            .flat_map(|f| match self.parse_file(f) {
                Ok(records) => records,
                Err(e) => {
                    warn!(file = %f.display(), error = %e, "failed to read transcript");
                    Vec::new()
                }
            })
            .collect()
    }
}
