//! Line-oriented text datasets mirrored from the remote root
//!
//! A dataset is a text file (the manifest or the hashes table) that lives under the
//! remote root and is cached under the local root with the same name. Parsing is
//! line by line: [`VersionedDataset`] owns the file handling and statistics, while
//! the concrete datasets supply a line closure and an optional post-processing
//! closure.

use std::path::PathBuf;

use tracing::{debug, error, info};
use url::Url;

use crate::app::client::{DownloadStats, Transport};
use crate::app::models::{FileDescriptor, SyncRoots};
use crate::constants::files;
use crate::errors::{DatasetError, DatasetResult, DownloadResult};

pub mod hashes;
pub mod manifest;

pub use hashes::HashDataset;
pub use manifest::ManifestDataset;

/// What a line closure did with one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line produced an entry
    Accepted,
    /// The line was malformed and ignored
    Skipped,
    /// The line was blank
    Empty,
}

/// Statistics about dataset parsing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStats {
    /// Total lines processed
    pub lines_processed: usize,
    /// Lines that produced an entry
    pub accepted: usize,
    /// Malformed lines skipped
    pub skipped: usize,
    /// Blank lines
    pub empty_lines: usize,
}

impl DatasetStats {
    /// Calculate success rate as percentage of non-blank lines
    pub fn success_rate(&self) -> f64 {
        let meaningful = self.lines_processed - self.empty_lines;
        if meaningful == 0 {
            0.0
        } else {
            (self.accepted as f64 / meaningful as f64) * 100.0
        }
    }

    fn record(&mut self, outcome: LineOutcome) {
        self.lines_processed += 1;
        match outcome {
            LineOutcome::Accepted => self.accepted += 1,
            LineOutcome::Skipped => self.skipped += 1,
            LineOutcome::Empty => self.empty_lines += 1,
        }
    }
}

/// A named text file mirrored from the remote root into the local root
#[derive(Debug, Clone)]
pub struct VersionedDataset {
    name: String,
    descriptor: FileDescriptor,
    stats: DatasetStats,
}

impl VersionedDataset {
    /// Create a dataset backed by the file `name` under both roots
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: FileDescriptor::parse(name),
            stats: DatasetStats::default(),
        }
    }

    /// Name of the backing file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Statistics of the last parse
    pub fn stats(&self) -> &DatasetStats {
        &self.stats
    }

    /// Location of the cached copy
    pub fn local_path(&self, roots: &SyncRoots) -> PathBuf {
        self.descriptor.local_path(roots)
    }

    /// Location of the remote copy
    pub fn remote_url(&self, roots: &SyncRoots) -> DownloadResult<Url> {
        self.descriptor.remote_url(roots)
    }

    /// Parse the cached copy
    ///
    /// Every line is trimmed and handed to `on_line` with its 1-indexed number. An
    /// empty file still yields one empty line 1. `post` runs after the last line.
    /// Returns `Ok(false)` when there is no cached copy.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Io` if the cached copy cannot be read, or the first
    /// error returned by `on_line`.
    pub async fn load<F, P>(
        &mut self,
        roots: &SyncRoots,
        mut on_line: F,
        post: Option<P>,
    ) -> DatasetResult<bool>
    where
        F: FnMut(&str, usize) -> DatasetResult<LineOutcome>,
        P: FnOnce(&DatasetStats),
    {
        let path = self.local_path(roots);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cached {} at {}", self.name, path.display());
                return Ok(false);
            }
            Err(source) => return Err(DatasetError::Io { path, source }),
        };

        let body = bytes.strip_prefix(files::UTF8_BOM).unwrap_or(&bytes);
        let text = String::from_utf8_lossy(body);

        self.stats = DatasetStats::default();
        for (index, line) in text.split('\n').enumerate() {
            let outcome = on_line(line.trim(), index + 1)?;
            self.stats.record(outcome);
        }

        debug!(
            "Parsed {}: {} lines, {} accepted, {} skipped ({:.1}% usable)",
            self.name,
            self.stats.lines_processed,
            self.stats.accepted,
            self.stats.skipped,
            self.stats.success_rate()
        );

        if let Some(post) = post {
            post(&self.stats);
        }

        Ok(true)
    }

    /// Download a fresh copy of the backing file into the local root
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Download` on any transport failure.
    pub async fn fetch(
        &self,
        roots: &SyncRoots,
        transport: &dyn Transport,
        show_progress: bool,
    ) -> DatasetResult<DownloadStats> {
        let url = self.remote_url(roots)?;
        info!("Downloading {} from {}", self.name, url);
        let stats = transport
            .download(&url, &self.local_path(roots), show_progress)
            .await?;
        Ok(stats)
    }

    /// Download a fresh copy and parse it
    ///
    /// Failures are logged and reported as `false`, never raised.
    pub async fn update<F, P>(
        &mut self,
        roots: &SyncRoots,
        transport: &dyn Transport,
        show_progress: bool,
        on_line: F,
        post: Option<P>,
    ) -> bool
    where
        F: FnMut(&str, usize) -> DatasetResult<LineOutcome>,
        P: FnOnce(&DatasetStats),
    {
        if let Err(e) = self.fetch(roots, transport, show_progress).await {
            error!("Could not download {}: {}", self.name, e);
            return false;
        }

        match self.load(roots, on_line, post).await {
            Ok(true) => true,
            Ok(false) => {
                error!("Downloaded {} but no local copy was found", self.name);
                false
            }
            Err(e) => {
                error!("Could not parse {}: {}", self.name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn roots(temp_dir: &TempDir) -> SyncRoots {
        SyncRoots::new("localhost", Some(8080), temp_dir.path()).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut dataset = VersionedDataset::new("Manifest");

        let loaded = dataset
            .load(
                &roots(&temp_dir),
                |_, _| Ok(LineOutcome::Accepted),
                None::<fn(&DatasetStats)>,
            )
            .await
            .unwrap();
        assert!(!loaded);
    }

    #[tokio::test]
    async fn test_load_trims_and_numbers_lines() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(temp_dir.path().join("Data"), "\u{feff}  first \r\nsecond\n\nbad\n")
            .await
            .unwrap();

        let mut dataset = VersionedDataset::new("Data");
        let mut seen = Vec::new();
        let mut post_ran = false;

        let loaded = dataset
            .load(
                &roots(&temp_dir),
                |line, number| {
                    seen.push((number, line.to_string()));
                    Ok(match line {
                        "" => LineOutcome::Empty,
                        "bad" => LineOutcome::Skipped,
                        _ => LineOutcome::Accepted,
                    })
                },
                Some(|stats: &DatasetStats| {
                    post_ran = stats.accepted == 2;
                }),
            )
            .await
            .unwrap();

        assert!(loaded);
        assert!(post_ran);
        assert_eq!(seen[0], (1, "first".to_string()));
        assert_eq!(seen[1], (2, "second".to_string()));
        assert_eq!(seen[3], (4, "bad".to_string()));

        let stats = dataset.stats();
        assert_eq!(stats.lines_processed, 5);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.empty_lines, 2);
    }

    #[tokio::test]
    async fn test_line_error_aborts() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(temp_dir.path().join("Data"), "a\nb\nc")
            .await
            .unwrap();

        let mut dataset = VersionedDataset::new("Data");
        let mut calls = 0;
        let result = dataset
            .load(
                &roots(&temp_dir),
                |_, number| {
                    calls += 1;
                    if number == 2 {
                        Err(DatasetError::Unreachable {
                            name: "Data".to_string(),
                        })
                    } else {
                        Ok(LineOutcome::Accepted)
                    }
                },
                None::<fn(&DatasetStats)>,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_success_rate() {
        let stats = DatasetStats {
            lines_processed: 5,
            accepted: 3,
            skipped: 1,
            empty_lines: 1,
        };
        assert!((stats.success_rate() - 75.0).abs() < f64::EPSILON);
        assert_eq!(DatasetStats::default().success_rate(), 0.0);
    }
}
