//! Core application logic for Manifest Patcher
//!
//! This module contains the transport, the two remote datasets, the data models
//! they share, and the reconciliation engine that acts on them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use manifest_patcher::app::{
//!     ClientConfig, EngineConfig, HashDataset, HttpTransport, ManifestDataset, SyncEngine,
//!     SyncRoots,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let roots = SyncRoots::new("patch.example.com", Some(8080), "client")?;
//! let transport = HttpTransport::new(&ClientConfig::default())?;
//!
//! let mut manifest = ManifestDataset::new();
//! manifest.update(&roots, &transport, false).await;
//!
//! let mut hashes = HashDataset::new();
//! hashes.update(&roots, &transport, false).await;
//! hashes.build_local_hashes(&manifest, &roots).await;
//!
//! let mut engine = SyncEngine::new(&roots, &transport, EngineConfig::default());
//! let report = engine.run(&manifest, &mut hashes).await?;
//! println!("{} files updated", report.created);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dataset;
pub mod hash;
pub mod models;
pub mod reconcile;
pub mod signals;
pub mod version;

// Re-export main public API
pub use client::{ClientConfig, DownloadStats, HttpTransport, Transport};
pub use dataset::{DatasetStats, HashDataset, ManifestDataset};
pub use hash::Md5Hash;
pub use models::{FileAction, FileDescriptor, RemoteHashes, SyncRoots};
pub use reconcile::{EngineConfig, PlannedAction, SyncEngine, SyncReport};
pub use signals::{create_shutdown_channel, ShutdownListener, SignalHandler};
pub use version::VersionTag;
