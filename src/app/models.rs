//! Data models for Manifest Patcher
//!
//! This module defines the file descriptor parsed from manifest and hash lines, the
//! per-file action hint, the remote hash pair, and the immutable remote/local roots
//! every location is resolved against.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::app::hash::Md5Hash;
use crate::constants::http;
use crate::errors::{DownloadError, DownloadResult};

/// Remote and local roots for one synchronization run
///
/// Built once from configuration and passed by reference; never mutated mid-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRoots {
    remote_base: Url,
    local_root: PathBuf,
}

impl SyncRoots {
    /// Create roots from a remote host (optionally with scheme and path), an optional
    /// port, and a local directory
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidUrl` if the remote root cannot be parsed.
    pub fn new(
        remote_root: &str,
        remote_port: Option<u16>,
        local_root: impl Into<PathBuf>,
    ) -> DownloadResult<Self> {
        let trimmed = remote_root.trim();
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{}://{}", http::DEFAULT_SCHEME, trimmed)
        };

        let invalid = |error: String| DownloadError::InvalidUrl {
            url: remote_root.to_string(),
            error,
        };

        let mut remote_base = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
        if remote_base.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base".to_string()));
        }
        if remote_base.host_str().map_or(true, str::is_empty) {
            return Err(invalid("URL has no host".to_string()));
        }
        if let Some(port) = remote_port {
            remote_base
                .set_port(Some(port))
                .map_err(|_| invalid(format!("cannot set port {}", port)))?;
        }
        if !remote_base.path().ends_with('/') {
            let path = format!("{}/", remote_base.path());
            remote_base.set_path(&path);
        }

        Ok(Self {
            remote_base,
            local_root: local_root.into(),
        })
    }

    /// Base URL every remote resource is resolved against (always ends with `/`)
    pub fn remote_base(&self) -> &Url {
        &self.remote_base
    }

    /// Local directory every file is written under
    pub fn local_root(&self) -> &Path {
        &self.local_root
    }
}

/// Action hint carried by a manifest line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileAction {
    /// No marker
    #[default]
    None,
    /// `+` marker: install once, never refresh
    Create,
    /// `-` marker: remove from the local install
    Delete,
}

impl FileAction {
    /// Decode the marker character at the start of a base filename
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '+' => Some(Self::Create),
            '-' => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Create => "create",
            Self::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// The two hashes published for a file, normalized to lowercase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHashes {
    primary: String,
    secondary: String,
}

impl RemoteHashes {
    /// Create a hash pair, normalizing both values
    pub fn new(primary: &str, secondary: &str) -> Self {
        Self {
            primary: primary.trim().to_lowercase(),
            secondary: secondary.trim().to_lowercase(),
        }
    }

    /// First published hash
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Second published hash
    pub fn secondary(&self) -> &str {
        &self.secondary
    }

    /// Whether a local hash matches either published value
    pub fn contains(&self, hash: &Md5Hash) -> bool {
        let hex = hash.to_hex();
        self.primary == hex || self.secondary == hex
    }
}

/// A tracked file parsed from one manifest or hashes line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    raw_name: String,
    parent: String,
    name: String,
    id: String,
    action: FileAction,
    escapes_root: bool,
}

impl FileDescriptor {
    /// Parse a raw line into a descriptor
    ///
    /// Backslashes become forward slashes, leading slashes and empty or `.` segments
    /// are dropped, and a single `+`/`-` marker on the base filename becomes the
    /// action hint. Parsing never fails; check [`FileDescriptor::is_valid`].
    pub fn parse(raw: &str) -> Self {
        let cleaned = raw.trim().replace('\\', "/");
        let mut segments: Vec<&str> = cleaned
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect();
        let escapes_root = segments.iter().any(|segment| *segment == "..");

        let base = segments.pop().unwrap_or("");
        let (action, name) = match base.chars().next().and_then(FileAction::from_marker) {
            Some(action) => (action, &base[1..]),
            None => (FileAction::None, base),
        };

        let parent = segments.join("/");
        let id = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent, name)
        };

        Self {
            raw_name: raw.to_string(),
            parent,
            name: name.to_string(),
            id,
            action,
            escapes_root,
        }
    }

    /// Normalized relative path, the join key across datasets
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The untouched input line
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Base filename without the action marker
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent directory relative to the root, empty for top-level files
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Action hint from the manifest line
    pub fn action(&self) -> FileAction {
        self.action
    }

    /// False when the resolved name is empty or the path leaves the root
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.escapes_root
    }

    /// Remote URL of this file under the given roots
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::InvalidUrl` if the base URL cannot take path segments.
    pub fn remote_url(&self, roots: &SyncRoots) -> DownloadResult<Url> {
        let mut url = roots.remote_base().clone();
        url.path_segments_mut()
            .map_err(|_| DownloadError::InvalidUrl {
                url: roots.remote_base().to_string(),
                error: "URL cannot take path segments".to_string(),
            })?
            .pop_if_empty()
            .extend(self.id.split('/'));
        Ok(url)
    }

    /// Local path of this file under the given roots
    pub fn local_path(&self, roots: &SyncRoots) -> PathBuf {
        self.id
            .split('/')
            .fold(roots.local_root().to_path_buf(), |path, segment| {
                path.join(segment)
            })
    }

    /// Whether a regular file exists at the local path
    pub async fn local_exists(&self, roots: &SyncRoots) -> bool {
        tokio::fs::metadata(self.local_path(roots))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Size of the local copy, `None` if there is none
    pub async fn local_size(&self, roots: &SyncRoots) -> Option<u64> {
        tokio::fs::metadata(self.local_path(roots))
            .await
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
    }

    /// MD5 of the local copy, `Ok(None)` if there is none
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file exists but cannot be read.
    pub async fn local_md5(&self, roots: &SyncRoots) -> std::io::Result<Option<Md5Hash>> {
        if !self.local_exists(roots).await {
            return Ok(None);
        }
        Md5Hash::of_file(&self.local_path(roots)).await.map(Some)
    }
}

impl fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
