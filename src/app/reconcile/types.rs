//! Types shared by the reconciliation engine and its callers

use std::time::Duration;

use crate::app::dataset::HashDataset;
use crate::app::hash::Md5Hash;
use crate::app::models::{FileAction, FileDescriptor, RemoteHashes};
use crate::constants::progress::BYTES_PER_MB;

/// Engine behavior switches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Render per-file progress while downloading
    pub verbose: bool,
}

/// Everything the decision rules look at for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileState<'a> {
    pub hint: FileAction,
    pub local_hash: Option<&'a Md5Hash>,
    pub local_size: Option<u64>,
    pub remote_size: Option<u64>,
    pub remote_hashes: Option<&'a RemoteHashes>,
}

impl<'a> FileState<'a> {
    /// Gather the state of a manifest entry from the hash table
    pub fn of(file: &FileDescriptor, hashes: &'a HashDataset) -> Self {
        Self {
            hint: file.action(),
            local_hash: hashes.local_hash(file.id()),
            local_size: hashes.local_size(file.id()),
            remote_size: hashes.remote_size(file.id()),
            remote_hashes: hashes.remote_hashes(file.id()),
        }
    }
}

/// A decision for one manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub id: String,
    pub action: FileAction,
}

/// Totals of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Bytes received by the final download attempt of each file
    pub bytes_transferred: u64,
    pub files_checked: usize,
    pub created: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Truncated transfers that were attempted a second time
    pub retried: usize,
    pub elapsed: Duration,
}

impl SyncReport {
    /// Transferred size in mebibytes
    pub fn total_mb(&self) -> f64 {
        self.bytes_transferred as f64 / BYTES_PER_MB
    }

    /// Transferred size in gibibytes
    pub fn total_gb(&self) -> f64 {
        self.total_mb() / 1024.0
    }

    /// Wall time in minutes
    pub fn minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    /// Average transfer rate in MB/s, zero for an instant run
    pub fn rate_mb_per_sec(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.total_mb() / seconds
        } else {
            0.0
        }
    }

    /// Whether any file changed on disk
    pub fn changed_anything(&self) -> bool {
        self.created > 0 || self.deleted > 0
    }
}
