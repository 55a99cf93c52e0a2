//! Command-line interface components
//!
//! This module contains CLI-specific code for Manifest Patcher, including
//! argument parsing, terminal output, and user interaction.

pub mod args;
pub mod commands;
pub mod progress;
pub mod startup;

pub use args::Cli;
pub use commands::{handle_has_update, handle_sync};
pub use progress::{format_plan, format_summary, print_plan, print_summary, spinner};
pub use startup::{confirm_location, needs_update, parse_readme_version};
