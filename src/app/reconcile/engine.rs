//! Decision rules and their execution
//!
//! Every manifest entry is reconciled on its own, in manifest order. The first
//! matching rule wins:
//!
//! 1. no local hash and no delete hint: create
//! 2. known local and remote sizes differ on an unhinted file: create
//! 3. local copy with a delete hint: delete
//! 4. local copy with a create hint: leave it alone
//! 5. local hash not among the published hashes: create
//! 6. otherwise: leave it alone
//!
//! A download that stops short of the published size is removed and attempted once
//! more; the second result is final.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::types::{EngineConfig, FileState, PlannedAction, SyncReport};
use crate::app::client::{DownloadStats, Transport};
use crate::app::dataset::{HashDataset, ManifestDataset};
use crate::app::models::{FileAction, FileDescriptor, SyncRoots};
use crate::app::signals::ShutdownListener;
use crate::errors::{DownloadError, SyncError, SyncResult};

/// Pick the action for one file
pub fn decide_action(state: &FileState<'_>) -> FileAction {
    if state.local_hash.is_none() && state.hint != FileAction::Delete {
        return FileAction::Create;
    }

    if let (Some(local), Some(remote)) = (state.local_size, state.remote_size) {
        if state.hint == FileAction::None && local != remote {
            return FileAction::Create;
        }
    }

    let Some(local_hash) = state.local_hash else {
        return FileAction::None;
    };

    match state.hint {
        FileAction::Delete => FileAction::Delete,
        FileAction::Create => FileAction::None,
        FileAction::None => match state.remote_hashes {
            Some(remote) if !remote.contains(local_hash) => FileAction::Create,
            _ => FileAction::None,
        },
    }
}

/// Decide every manifest entry without touching anything
pub fn plan(manifest: &ManifestDataset, hashes: &HashDataset) -> Vec<PlannedAction> {
    manifest
        .files()
        .iter()
        .map(|file| PlannedAction {
            id: file.id().to_string(),
            action: decide_action(&FileState::of(file, hashes)),
        })
        .collect()
}

/// Converges the local root to the manifest, one file at a time
pub struct SyncEngine<'a> {
    roots: &'a SyncRoots,
    transport: &'a dyn Transport,
    config: EngineConfig,
    shutdown: ShutdownListener,
}

impl<'a> SyncEngine<'a> {
    pub fn new(roots: &'a SyncRoots, transport: &'a dyn Transport, config: EngineConfig) -> Self {
        Self {
            roots,
            transport,
            config,
            shutdown: ShutdownListener::never(),
        }
    }

    /// Stop at the next file boundary or mid-transfer when `shutdown` fires
    pub fn with_shutdown(mut self, shutdown: ShutdownListener) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Decide every manifest entry without touching anything
    pub fn plan(&self, manifest: &ManifestDataset, hashes: &HashDataset) -> Vec<PlannedAction> {
        plan(manifest, hashes)
    }

    /// Reconcile every manifest entry
    ///
    /// Per-file failures are logged and counted, never raised. Local state in
    /// `hashes` follows every completed write and delete.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Interrupted` when shutdown is requested. The file being
    /// transferred at that moment may be left partially written.
    pub async fn run(
        &mut self,
        manifest: &ManifestDataset,
        hashes: &mut HashDataset,
    ) -> SyncResult<SyncReport> {
        let started = Instant::now();
        let mut report = SyncReport::default();

        for file in manifest.files() {
            if self.shutdown.is_triggered() {
                return Err(SyncError::Interrupted);
            }

            report.files_checked += 1;
            match decide_action(&FileState::of(file, hashes)) {
                FileAction::None => {
                    debug!("Skipped {}", file.id());
                    report.skipped += 1;
                }
                FileAction::Delete => {
                    if self.delete(file, hashes).await {
                        report.deleted += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                FileAction::Create => {
                    let bytes = self.create(file, hashes, &mut report).await?;
                    report.bytes_transferred += bytes;
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(
            "Checked {} files: {} updated, {} deleted, {} failed",
            report.files_checked, report.created, report.deleted, report.failed
        );
        Ok(report)
    }

    async fn delete(&self, file: &FileDescriptor, hashes: &mut HashDataset) -> bool {
        let path = file.local_path(self.roots);
        let removed = match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted {}", file.id());
                true
            }
            Err(source) => {
                error!("{}", SyncError::Filesystem { path, source });
                false
            }
        };
        hashes.purge(file.id());
        removed
    }

    async fn create(
        &mut self,
        file: &FileDescriptor,
        hashes: &mut HashDataset,
        report: &mut SyncReport,
    ) -> SyncResult<u64> {
        let mut received = self.fetch(file).await?;

        if let (Some(stats), Some(expected)) = (&received, hashes.remote_size(file.id())) {
            if stats.bytes_written > 0 && stats.bytes_written < expected {
                warn!(
                    "{}: {}, retrying",
                    file.id(),
                    DownloadError::IncompleteDownload {
                        received: stats.bytes_written,
                        expected,
                    }
                );
                let path = file.local_path(self.roots);
                if let Err(source) = tokio::fs::remove_file(&path).await {
                    warn!("{}", SyncError::Filesystem { path, source });
                }
                report.retried += 1;

                if self.shutdown.is_triggered() {
                    return Err(SyncError::Interrupted);
                }
                received = self.fetch(file).await?;
            }
        }

        match received {
            Some(stats) => {
                hashes.record_local(file.id(), stats.md5, stats.bytes_written);
                report.created += 1;
                Ok(stats.bytes_written)
            }
            None => {
                report.failed += 1;
                Ok(0)
            }
        }
    }

    /// One download attempt; `Ok(None)` when the transfer failed
    async fn fetch(&mut self, file: &FileDescriptor) -> SyncResult<Option<DownloadStats>> {
        let url = match file.remote_url(self.roots) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot resolve {}: {}", file.id(), e);
                return Ok(None);
            }
        };
        let destination = file.local_path(self.roots);
        let transport = self.transport;
        let show_progress = self.config.verbose;

        info!("Updating {}", file.id());
        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(SyncError::Interrupted),
            result = transport.download(&url, &destination, show_progress) => result,
        };

        match result {
            Ok(stats) => {
                debug!(
                    "Downloaded {} ({} bytes in {:?})",
                    file.id(),
                    stats.bytes_written,
                    stats.elapsed
                );
                Ok(Some(stats))
            }
            Err(e) => {
                error!("Failed to download {}: {}", file.id(), e);
                Ok(None)
            }
        }
    }
}
