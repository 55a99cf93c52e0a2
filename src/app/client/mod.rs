//! HTTP transport for fetching datasets and tracked files
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `download`: streaming writes to disk with hashing and BOM handling
//!
//! [`Transport`] is the seam the reconciliation engine and the datasets talk to;
//! [`HttpTransport`] is the production implementation.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

pub mod config;
pub mod download;

pub use config::ClientConfig;
pub use download::{download_progress_bar, save_stream, DownloadStats};

/// Streaming GET of a remote resource into a local file
#[async_trait]
pub trait Transport: Send + Sync {
    /// Download `url` into `destination`, creating parent directories as needed
    ///
    /// When `show_progress` is set the implementation may render a progress bar.
    async fn download(
        &self,
        url: &Url,
        destination: &Path,
        show_progress: bool,
    ) -> DownloadResult<DownloadStats>;
}

/// Transport backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with the given client configuration
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Http` if the client cannot be built
    pub fn new(config: &ClientConfig) -> DownloadResult<Self> {
        let client = config.build_http_client()?;
        tracing::debug!("Created HTTP transport ({})", config.user_agent);
        Ok(Self { client })
    }

    /// Access the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn get(&self, url: &Url) -> DownloadResult<reqwest::Response> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
            });
        }

        tracing::debug!("Successfully fetched response: {}", url);
        Ok(response)
    }

    /// Fetch a small text resource into memory
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on transport failure or a non-success status
    pub async fn fetch_text(&self, url: &Url) -> DownloadResult<String> {
        let response = self.get(url).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn download(
        &self,
        url: &Url,
        destination: &Path,
        show_progress: bool,
    ) -> DownloadResult<DownloadStats> {
        let response = self.get(url).await?;
        let declared_size = response.content_length();

        let progress = if show_progress {
            let label = destination
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| url.to_string());
            Some(download_progress_bar(declared_size, &label)?)
        } else {
            None
        };

        let result = save_stream(
            response.bytes_stream(),
            destination,
            declared_size,
            progress.as_ref(),
        )
        .await;

        if let Some(bar) = progress {
            match &result {
                Ok(_) => bar.finish(),
                Err(_) => bar.abandon(),
            }
        }

        result
    }
}
