//! Manifest Patcher CLI application
//!
//! Keeps a local install in sync with the release manifest published by a patch
//! server.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use manifest_patcher::cli::{handle_has_update, handle_sync, Cli};
use manifest_patcher::config::AppConfig;
use manifest_patcher::errors::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) if e.is_interrupt() => {
            eprintln!("Interrupt detected, exiting.");
            1
        }
        Err(e) => {
            error!(category = e.category(), "{}", e);
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(code);
}

/// Main application logic, returning the process exit code
async fn run(cli: Cli) -> Result<i32> {
    let Some((config, config_path)) = AppConfig::load(cli.config.clone()).await? else {
        init_logging(&cli, false);
        let path = AppConfig::default_config_path();
        AppConfig::initialize_first_run(&path).await?;
        println!("📁 Created default configuration file:");
        println!("   {}", path.display());
        println!("   Point [sync] at your patch server, then run the patcher again.");
        return Ok(0);
    };

    init_logging(&cli, config.behavior.debug);
    info!("Manifest Patcher v{} starting", env!("CARGO_PKG_VERSION"));

    // Write back so options added by newer releases appear in the file
    config.save(&config_path).await?;

    if cli.has_update {
        let update_exists = handle_has_update(&config).await?;
        return Ok(if update_exists { 1 } else { 0 });
    }

    handle_sync(&cli, &config).await?;
    Ok(0)
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli, config_debug: bool) {
    let log_level = cli.log_level(config_debug);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("manifest_patcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(log_level == tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    if log_level == tracing::Level::DEBUG {
        info!("Debug logging enabled");
    }
}
