//! Published hashes and sizes, plus the hashes of the local copies
//!
//! Each line of the hashes file is `path<TAB>hashA<TAB>hashB[<TAB>size]`. Either hash
//! identifies an acceptable release of the file. A missing or unparseable size (the
//! file format uses `-1`) means the size is unknown.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::{DatasetStats, LineOutcome, ManifestDataset, VersionedDataset};
use crate::app::client::Transport;
use crate::app::hash::Md5Hash;
use crate::app::models::{FileDescriptor, RemoteHashes, SyncRoots};
use crate::constants::datasets::{HASH_FIELD_SEPARATOR, HASH_MIN_FIELDS};
use crate::constants::HASHES_NAME;
use crate::errors::DatasetResult;

/// Remote hash pairs and sizes keyed by file id, with local state alongside
#[derive(Debug, Clone)]
pub struct HashDataset {
    dataset: VersionedDataset,
    remote: HashMap<String, RemoteHashes>,
    sizes: HashMap<String, u64>,
    local_hashes: HashMap<String, Md5Hash>,
    local_sizes: HashMap<String, u64>,
}

impl Default for HashDataset {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote half of the table, borrowed together by the line parser
struct RemoteTables<'a> {
    remote: &'a mut HashMap<String, RemoteHashes>,
    sizes: &'a mut HashMap<String, u64>,
}

impl RemoteTables<'_> {
    fn clear(&mut self) {
        self.remote.clear();
        self.sizes.clear();
    }

    fn insert(&mut self, file: FileDescriptor, hashes: RemoteHashes, size: Option<u64>) {
        let id = file.id().to_string();
        match size {
            Some(size) => self.sizes.insert(id.clone(), size),
            None => self.sizes.remove(&id),
        };
        self.remote.insert(id, hashes);
    }

    fn parse_line(&mut self, line: &str, number: usize) -> DatasetResult<LineOutcome> {
        if number == 1 {
            self.clear();
        }

        if line.is_empty() {
            return Ok(LineOutcome::Empty);
        }

        let fields: Vec<&str> = line.split(HASH_FIELD_SEPARATOR).collect();
        if fields.len() < HASH_MIN_FIELDS {
            debug!(
                "Skipping hashes line {}: expected at least {} fields, found {}",
                number,
                HASH_MIN_FIELDS,
                fields.len()
            );
            return Ok(LineOutcome::Skipped);
        }

        let file = FileDescriptor::parse(fields[0]);
        if !file.is_valid() {
            debug!("Skipping hashes line {}: invalid path {:?}", number, fields[0]);
            return Ok(LineOutcome::Skipped);
        }

        let size = fields
            .get(HASH_MIN_FIELDS)
            .and_then(|raw| raw.trim().parse::<u64>().ok());

        self.insert(file, RemoteHashes::new(fields[1], fields[2]), size);
        Ok(LineOutcome::Accepted)
    }
}

impl HashDataset {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            dataset: VersionedDataset::new(HASHES_NAME),
            remote: HashMap::new(),
            sizes: HashMap::new(),
            local_hashes: HashMap::new(),
            local_sizes: HashMap::new(),
        }
    }

    fn tables(&mut self) -> (&mut VersionedDataset, RemoteTables<'_>) {
        (
            &mut self.dataset,
            RemoteTables {
                remote: &mut self.remote,
                sizes: &mut self.sizes,
            },
        )
    }

    /// Parse the cached hashes file, replacing any previous remote content
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Io` if the cached copy cannot be read.
    pub async fn load(&mut self, roots: &SyncRoots) -> DatasetResult<bool> {
        let (dataset, mut tables) = self.tables();
        dataset
            .load(
                roots,
                |line, number| tables.parse_line(line, number),
                Some(log_loaded),
            )
            .await
    }

    /// Download a fresh hashes file and parse it
    pub async fn update(
        &mut self,
        roots: &SyncRoots,
        transport: &dyn Transport,
        show_progress: bool,
    ) -> bool {
        let (dataset, mut tables) = self.tables();
        dataset
            .update(
                roots,
                transport,
                show_progress,
                |line, number| tables.parse_line(line, number),
                Some(log_loaded),
            )
            .await
    }

    /// Hash the local copy of every file tracked by the manifest
    ///
    /// Previous local state is discarded. Files without a local copy get no entry.
    /// Returns the number of local files hashed.
    pub async fn build_local_hashes(
        &mut self,
        manifest: &ManifestDataset,
        roots: &SyncRoots,
    ) -> usize {
        self.local_hashes.clear();
        self.local_sizes.clear();

        for file in manifest.files() {
            match file.local_md5(roots).await {
                Ok(Some(hash)) => {
                    let size = file.local_size(roots).await;
                    self.local_hashes.insert(file.id().to_string(), hash);
                    if let Some(size) = size {
                        self.local_sizes.insert(file.id().to_string(), size);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Could not hash local copy of {}: {}", file.id(), e),
            }
        }

        info!("Hashed {} local files", self.local_hashes.len());
        self.local_hashes.len()
    }

    /// Add or replace the published state of a file
    pub fn insert_remote(&mut self, file: FileDescriptor, hashes: RemoteHashes, size: Option<u64>) {
        let (_, mut tables) = self.tables();
        tables.insert(file, hashes, size);
    }

    /// Published hash pair, `None` when the file no longer exists remotely
    pub fn remote_hashes(&self, id: &str) -> Option<&RemoteHashes> {
        self.remote.get(id)
    }

    /// Published size, `None` when unknown
    pub fn remote_size(&self, id: &str) -> Option<u64> {
        self.sizes.get(id).copied()
    }

    /// Hash of the local copy, `None` when there is none or it was not hashed
    pub fn local_hash(&self, id: &str) -> Option<&Md5Hash> {
        self.local_hashes.get(id)
    }

    /// Size of the local copy, `None` when unknown
    pub fn local_size(&self, id: &str) -> Option<u64> {
        self.local_sizes.get(id).copied()
    }

    /// Record the state of a freshly written local copy
    pub fn record_local(&mut self, id: &str, hash: Md5Hash, size: u64) {
        self.local_hashes.insert(id.to_string(), hash);
        self.local_sizes.insert(id.to_string(), size);
    }

    /// Forget the size and local state of a removed file
    ///
    /// The published hash pair stays, so the id still reads as known remotely.
    pub fn purge(&mut self, id: &str) {
        self.sizes.remove(id);
        self.local_hashes.remove(id);
        self.local_sizes.remove(id);
    }

    /// Number of files with published hashes
    pub fn len(&self) -> usize {
        self.remote.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remote.is_empty()
    }

    /// Number of local files with a recorded hash
    pub fn local_len(&self) -> usize {
        self.local_hashes.len()
    }

    /// Parsing statistics of the last load
    pub fn stats(&self) -> &DatasetStats {
        self.dataset.stats()
    }
}

fn log_loaded(stats: &DatasetStats) {
    info!(
        "Loaded {}: {} entries ({} lines skipped)",
        HASHES_NAME, stats.accepted, stats.skipped
    );
}
