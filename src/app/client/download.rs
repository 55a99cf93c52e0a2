//! Streaming writes of downloaded content to disk
//!
//! Bodies are consumed chunk by chunk: each chunk is written in order, hashed, and
//! counted. Parent directories are created first. A UTF-8 byte order mark is removed
//! only when the very first chunk starts with one.

use std::path::Path;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::app::hash::Md5Hash;
use crate::constants::{files, progress};
use crate::errors::{DownloadError, DownloadResult};

/// Outcome of one completed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadStats {
    /// Bytes written to disk
    pub bytes_written: u64,
    /// Size announced by the server, if any
    pub declared_size: Option<u64>,
    /// Wall time of the transfer
    pub elapsed: Duration,
    /// MD5 of the bytes written to disk
    pub md5: Md5Hash,
}

/// Write a byte stream to `destination`, replacing any existing file
///
/// # Errors
///
/// Returns `DownloadError::Io` on filesystem failures and the converted stream error
/// if the body fails mid-transfer. Bytes already written stay on disk.
pub async fn save_stream<S, B, E>(
    stream: S,
    destination: &Path,
    declared_size: Option<u64>,
    progress: Option<&ProgressBar>,
) -> DownloadResult<DownloadStats>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<DownloadError>,
{
    let started = Instant::now();

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = File::create(destination).await?;
    let mut context = md5::Context::new();
    let mut bytes_written = 0u64;
    let mut first_chunk = true;

    futures::pin_mut!(stream);
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(Into::into)?;
        let mut data = chunk.as_ref();

        if first_chunk {
            data = data.strip_prefix(files::UTF8_BOM).unwrap_or(data);
            first_chunk = false;
        }

        file.write_all(data).await?;
        context.consume(data);
        bytes_written += data.len() as u64;

        if let Some(bar) = progress {
            bar.inc(data.len() as u64);
        }
    }

    file.flush().await?;

    Ok(DownloadStats {
        bytes_written,
        declared_size,
        elapsed: started.elapsed(),
        md5: Md5Hash::from_bytes(context.compute().0),
    })
}

/// Create a byte progress bar for one file
///
/// A spinner is used when the total size is unknown.
pub fn download_progress_bar(total: Option<u64>, label: &str) -> DownloadResult<ProgressBar> {
    let bar = match total {
        Some(total) => {
            let style = ProgressStyle::with_template(progress::DOWNLOAD_TEMPLATE)
                .map_err(|e| DownloadError::Progress(e.to_string()))?
                .progress_chars("#>-");
            ProgressBar::new(total).with_style(style)
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(progress::SPINNER_TICK_MS));
            bar
        }
    };
    bar.set_message(label.to_string());
    Ok(bar)
}
