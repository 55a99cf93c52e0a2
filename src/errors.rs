//! Error types for Manifest Patcher
//!
//! Every component owns an error enum; [`AppError`] wraps them for the CLI. Call sites
//! decide between recovering (log and continue) and propagating, following the
//! classification exposed by [`AppError::is_recoverable`].

use std::path::PathBuf;
use thiserror::Error;

/// Version tag errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Tag text could not be parsed into integer components
    #[error("Could not parse the version: {input}")]
    Parse { input: String },

    /// Tags produced by different parsers were compared
    #[error("Cannot compare versions, not the same type ({left} vs {right} components)")]
    TypeMismatch { left: usize, right: usize },
}

/// Download and HTTP transport errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Transfer ended before the declared size was reached
    #[error("Incomplete download: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload { received: u64, expected: u64 },

    /// Progress bar template error
    #[error("Progress display error: {0}")]
    Progress(String),
}

/// Manifest and hash dataset errors
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset could not be obtained remotely and no local copy exists
    #[error("Could not download remote {name}")]
    Unreachable { name: String },

    /// I/O error reading the cached dataset
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The version line of a manifest is malformed
    #[error("Invalid version on line {line}: {source}")]
    Version {
        line: usize,
        #[source]
        source: VersionError,
    },

    /// Invalid hash format
    #[error("Invalid hash format: {hash}. Expected MD5 hex string")]
    InvalidHash { hash: String },

    /// Download of the backing file failed
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Reconciliation engine errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// The run was cancelled by the user
    #[error("Interrupt detected, synchronization aborted")]
    Interrupted,

    /// A filesystem operation on a tracked file failed
    #[error("File cannot be modified: {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file location could not be resolved
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Reading or writing the file failed
    #[error("Configuration file I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Version error
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Dataset error
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Synchronization error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable for a single file
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Download(_)
            | AppError::Sync(SyncError::Filesystem { .. })
            | AppError::Sync(SyncError::Download(_)) => true,

            AppError::Version(_)
            | AppError::Dataset(DatasetError::Unreachable { .. })
            | AppError::Sync(SyncError::Interrupted)
            | AppError::Config(_) => false,

            _ => false,
        }
    }

    /// Whether this error represents a user cancellation
    pub fn is_interrupt(&self) -> bool {
        matches!(self, AppError::Sync(SyncError::Interrupted))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Version(_) => "version",
            AppError::Download(_) => "download",
            AppError::Dataset(_) => "dataset",
            AppError::Sync(_) => "sync",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Version result type alias
pub type VersionResult<T> = std::result::Result<T, VersionError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Dataset result type alias
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Synchronization result type alias
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
