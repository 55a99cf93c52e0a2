//! MD5 content hashes for local files
//!
//! Local copies are identified by the MD5 of their on-disk bytes. Hashes are stored
//! as 16-byte arrays and compared against the lowercase hex strings published in
//! the remote hashes file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::constants::files;
use crate::errors::{DatasetError, DatasetResult};

/// MD5 hash stored as its raw 16-byte representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Md5Hash([u8; 16]);

impl Md5Hash {
    /// Create an MD5 hash from a hex string
    ///
    /// # Arguments
    ///
    /// * `hex` - 32-character hexadecimal string (case insensitive)
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::InvalidHash` if the string is not a valid MD5 hex
    /// representation.
    pub fn from_hex(hex: &str) -> DatasetResult<Self> {
        if hex.len() != 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DatasetError::InvalidHash {
                hash: hex.to_string(),
            });
        }

        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| {
                DatasetError::InvalidHash {
                    hash: hex.to_string(),
                }
            })?;
        }

        Ok(Md5Hash(bytes))
    }

    /// Convert the hash to a lowercase 32-character hex string
    pub fn to_hex(&self) -> String {
        use std::fmt::Write;
        self.0.iter().fold(String::with_capacity(32), |mut acc, b| {
            let _ = write!(&mut acc, "{:02x}", b);
            acc
        })
    }

    /// Get the raw byte array representation
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Md5Hash(bytes)
    }

    /// Hash an in-memory buffer
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Md5Hash(md5::compute(data).0)
    }

    /// Hash a file on disk, reading it in fixed-size chunks
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened or read.
    pub async fn of_file(path: &Path) -> std::io::Result<Self> {
        let mut file = File::open(path).await?;
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; files::HASH_BUFFER_SIZE];

        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            context.consume(&buffer[..read]);
        }

        Ok(Md5Hash(context.compute().0))
    }
}

impl fmt::Display for Md5Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Md5Hash {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
