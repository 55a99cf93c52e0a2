//! Prelude module for Manifest Patcher Library
//!
//! Re-exports the items needed to run a synchronization from library code with a
//! single `use manifest_patcher::prelude::*;` statement.

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    ClientConfig,
    EngineConfig,
    FileAction,
    HashDataset,
    HttpTransport,
    ManifestDataset,
    Md5Hash,
    ShutdownListener,
    SyncEngine,
    SyncReport,
    SyncRoots,
    Transport,
};

pub use crate::config::AppConfig;
