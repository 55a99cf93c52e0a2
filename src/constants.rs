//! Application constants for Manifest Patcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("Manifest-Patcher/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Scheme assumed when the configured remote root has none
    pub const DEFAULT_SCHEME: &str = "http";

    /// TCP keep-alive interval
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections kept per host
    pub const POOL_MAX_PER_HOST: usize = 4;
}

/// Remote dataset files
pub mod datasets {
    /// Name of the manifest file, both remotely and in the local root
    pub const MANIFEST_NAME: &str = "Manifest";

    /// Name of the hashes file, both remotely and in the local root
    pub const HASHES_NAME: &str = "Hashes";

    /// Field separator of the hashes file
    pub const HASH_FIELD_SEPARATOR: char = '\t';

    /// Minimum number of fields on a hashes line (name, hash A, hash B)
    pub const HASH_MIN_FIELDS: usize = 3;
}

/// File operation constants
pub mod files {
    /// Read buffer used when hashing local files (64KB)
    pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

    /// UTF-8 byte order mark stripped from the first downloaded chunk
    pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
}

/// Configuration defaults
pub mod config {
    /// Configuration file name searched for in the working directory
    pub const FILE_NAME: &str = "manifest_patcher.toml";

    /// Alternate configuration file name in the working directory
    pub const ALT_FILE_NAME: &str = "config.toml";

    /// Directory under the user config dir holding the configuration
    pub const APP_DIR: &str = "manifest_patcher";

    /// Default remote root
    pub const DEFAULT_REMOTE_ROOT: &str = "patch.example.com";

    /// Default remote port
    pub const DEFAULT_REMOTE_PORT: u16 = 8080;

    /// Default local root
    pub const DEFAULT_LOCAL_ROOT: &str = "client";
}

/// Progress reporting
pub mod progress {
    /// Spinner tick interval (milliseconds)
    pub const SPINNER_TICK_MS: u64 = 80;

    /// Byte progress bar template
    pub const DOWNLOAD_TEMPLATE: &str =
        "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";

    /// Bytes in a mebibyte, used for human readable rates
    pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
}

// Re-export commonly used constants for convenience
pub use datasets::{HASHES_NAME, MANIFEST_NAME};
pub use http::USER_AGENT;
