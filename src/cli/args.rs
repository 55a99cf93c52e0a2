//! Command-line argument parsing for Manifest Patcher
//!
//! This module defines the CLI structure using clap derive macros. There is a
//! single command: synchronize the local root with the patch server.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

/// Manifest Patcher - keep a local install in sync with a patch server
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "manifest_patcher",
    version,
    about = "Synchronize a local install with the files listed in a remote manifest",
    long_about = "Downloads the release manifest and published hashes from the patch server,
compares them with the local install, and fetches, replaces, or deletes files until the
local install matches the release."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Start without asking for confirmation
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Enable verbose logging and per-file progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Debug logging
    #[arg(long)]
    pub debug: bool,

    /// Check whether a newer patcher is available and exit (status 1 if so)
    #[arg(long)]
    pub has_update: bool,

    /// Show what would change without touching the local install
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level from the flags and the configuration
    pub fn log_level(&self, config_debug: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.debug || config_debug {
            tracing::Level::DEBUG
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }

    /// Whether per-file progress is shown
    pub fn show_progress(&self, config: &AppConfig) -> bool {
        !self.quiet && (self.verbose || config.behavior.verbose)
    }

    /// Whether the confirmation prompt is skipped
    pub fn skip_prompt(&self, config: &AppConfig) -> bool {
        self.yes || self.dry_run || config.behavior.skip_prompt
    }
}
