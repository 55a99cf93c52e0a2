//! The release manifest: a version tag followed by the authoritative file list
//!
//! ```text
//! [3.1.0.7]
//! art.mul
//! data\+settings.cfg
//! music/-old.mp3
//! ```

use std::collections::HashMap;

use tracing::info;

use super::{DatasetStats, LineOutcome, VersionedDataset};
use crate::app::client::Transport;
use crate::app::models::{FileDescriptor, SyncRoots};
use crate::app::version::VersionTag;
use crate::constants::MANIFEST_NAME;
use crate::errors::{DatasetError, DatasetResult};

/// Ordered file list keyed by file id, plus the release version
#[derive(Debug, Clone)]
pub struct ManifestDataset {
    dataset: VersionedDataset,
    version: VersionTag,
    files: Vec<FileDescriptor>,
    index: HashMap<String, usize>,
}

impl Default for ManifestDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestDataset {
    /// Create an empty manifest at version `0.0.0.0`
    pub fn new() -> Self {
        Self {
            dataset: VersionedDataset::new(MANIFEST_NAME),
            version: VersionTag::zero(),
            files: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Release version from line 1
    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Tracked files in manifest order
    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    /// Look up a file by id
    pub fn get(&self, id: &str) -> Option<&FileDescriptor> {
        self.index.get(id).map(|&position| &self.files[position])
    }

    /// Whether the id is tracked
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Parsing statistics of the last load
    pub fn stats(&self) -> &DatasetStats {
        self.dataset.stats()
    }

    /// The backing dataset
    pub fn dataset(&self) -> &VersionedDataset {
        &self.dataset
    }

    /// Add a file; a duplicate id replaces the entry in its original position
    pub fn insert(&mut self, file: FileDescriptor) {
        insert_entry(&mut self.files, &mut self.index, file);
    }

    /// Parse the cached manifest, replacing any previous content
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Version` if line 1 is not a version tag, or
    /// `DatasetError::Io` if the cached copy cannot be read.
    pub async fn load(&mut self, roots: &SyncRoots) -> DatasetResult<bool> {
        let Self {
            dataset,
            version,
            files,
            index,
        } = self;

        dataset
            .load(
                roots,
                |line, number| parse_line(version, files, index, line, number),
                Some(log_loaded),
            )
            .await
    }

    /// Download a fresh manifest and parse it
    pub async fn update(
        &mut self,
        roots: &SyncRoots,
        transport: &dyn Transport,
        show_progress: bool,
    ) -> bool {
        let Self {
            dataset,
            version,
            files,
            index,
        } = self;

        dataset
            .update(
                roots,
                transport,
                show_progress,
                |line, number| parse_line(version, files, index, line, number),
                Some(log_loaded),
            )
            .await
    }
}

fn insert_entry(
    files: &mut Vec<FileDescriptor>,
    index: &mut HashMap<String, usize>,
    file: FileDescriptor,
) {
    match index.get(file.id()) {
        Some(&position) => files[position] = file,
        None => {
            index.insert(file.id().to_string(), files.len());
            files.push(file);
        }
    }
}

fn parse_line(
    version: &mut VersionTag,
    files: &mut Vec<FileDescriptor>,
    index: &mut HashMap<String, usize>,
    line: &str,
    number: usize,
) -> DatasetResult<LineOutcome> {
    if number == 1 {
        files.clear();
        index.clear();
        *version = VersionTag::zero();
        *version = VersionTag::parse(line).map_err(|source| DatasetError::Version {
            line: number,
            source,
        })?;
        return Ok(LineOutcome::Accepted);
    }

    if line.is_empty() {
        return Ok(LineOutcome::Empty);
    }

    let file = FileDescriptor::parse(line);
    if !file.is_valid() {
        tracing::debug!("Skipping invalid manifest line {}: {:?}", number, line);
        return Ok(LineOutcome::Skipped);
    }

    insert_entry(files, index, file);
    Ok(LineOutcome::Accepted)
}

fn log_loaded(stats: &DatasetStats) {
    info!(
        "Loaded {}: {} files ({} lines skipped)",
        MANIFEST_NAME,
        stats.accepted.saturating_sub(1),
        stats.skipped
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::FileAction;
    use tempfile::TempDir;

    async fn write_manifest(temp_dir: &TempDir, content: &str) -> SyncRoots {
        tokio::fs::write(temp_dir.path().join(MANIFEST_NAME), content)
            .await
            .unwrap();
        SyncRoots::new("localhost", Some(8080), temp_dir.path()).unwrap()
    }

    #[tokio::test]
    async fn test_load_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let roots = write_manifest(
            &temp_dir,
            "[3.1.0.7]\nart.mul\r\ndata\\+settings.cfg\n\n../evil\nmusic/-old.mp3\n",
        )
        .await;

        let mut manifest = ManifestDataset::new();
        assert!(manifest.load(&roots).await.unwrap());

        assert_eq!(manifest.version(), &VersionTag::parse("[3.1.0.7]").unwrap());
        let ids: Vec<&str> = manifest.files().iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec!["art.mul", "data/settings.cfg", "music/old.mp3"]);
        assert_eq!(
            manifest.get("data/settings.cfg").unwrap().action(),
            FileAction::Create
        );
        assert_eq!(
            manifest.get("music/old.mp3").unwrap().action(),
            FileAction::Delete
        );
        assert_eq!(manifest.stats().skipped, 1);
    }

    #[tokio::test]
    async fn test_duplicate_keeps_first_position() {
        let temp_dir = TempDir::new().unwrap();
        let roots = write_manifest(&temp_dir, "[1.0.0.0]\na.bin\nb.bin\n+a.bin\n").await;

        let mut manifest = ManifestDataset::new();
        manifest.load(&roots).await.unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.files()[0].id(), "a.bin");
        assert_eq!(manifest.files()[0].action(), FileAction::Create);
    }

    #[tokio::test]
    async fn test_bad_version_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let roots = write_manifest(&temp_dir, "[1.x.0.0]\na.bin\n").await;

        let mut manifest = ManifestDataset::new();
        let result = manifest.load(&roots).await;
        assert!(matches!(
            result,
            Err(DatasetError::Version { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_reload_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let roots = write_manifest(&temp_dir, "[1.0.0.0]\na.bin\nb.bin\n").await;

        let mut manifest = ManifestDataset::new();
        manifest.load(&roots).await.unwrap();
        assert_eq!(manifest.len(), 2);

        write_manifest(&temp_dir, "[1.0.0.1]\nc.bin\n").await;
        manifest.load(&roots).await.unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(!manifest.contains("a.bin"));
        assert_eq!(manifest.version().to_string(), "1.0.0.1");
    }

    #[tokio::test]
    async fn test_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let roots = SyncRoots::new("localhost", None, temp_dir.path()).unwrap();

        let mut manifest = ManifestDataset::new();
        assert!(!manifest.load(&roots).await.unwrap());
        assert!(manifest.is_empty());
        assert_eq!(manifest.version(), &VersionTag::zero());
    }
}
