//! Reconciliation of the local root against the manifest
//!
//! [`SyncEngine`] walks the manifest in order, decides per file whether to fetch,
//! delete, or leave it, and executes that decision through a [`Transport`]. The
//! hash table passed in is the only state it mutates.
//!
//! [`Transport`]: crate::app::client::Transport

pub mod engine;
pub mod types;

pub use engine::{decide_action, plan, SyncEngine};
pub use types::{EngineConfig, FileState, PlannedAction, SyncReport};

#[cfg(test)]
mod tests;
