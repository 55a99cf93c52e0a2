//! Manifest Patcher Library
//!
//! Keeps a local install converged to the file set published by a patch server.
//! A versioned manifest names every tracked file, a hashes table publishes the
//! accepted MD5 digests and sizes, and the reconciliation engine fetches, deletes,
//! or leaves each file accordingly.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
