//! Command handlers for the CLI
//!
//! `handle_sync` drives one synchronization run: datasets first, then local
//! hashing, then reconciliation. `handle_has_update` answers the self-update
//! query.

use std::cmp::Ordering;

use tracing::{info, warn};

use super::args::Cli;
use super::progress::{print_plan, print_summary, spinner};
use super::startup::{confirm_location, fetch_remote_version, needs_update, show_update_banner};
use crate::app::client::HttpTransport;
use crate::app::dataset::{HashDataset, ManifestDataset};
use crate::app::models::SyncRoots;
use crate::app::reconcile::{SyncEngine, SyncReport};
use crate::app::signals::{create_shutdown_channel, ShutdownListener, SignalHandler};
use crate::config::AppConfig;
use crate::constants::{HASHES_NAME, MANIFEST_NAME};
use crate::errors::{AppError, DatasetError, Result};

/// Print the published patcher version; `true` when it is newer than this build
pub async fn handle_has_update(config: &AppConfig) -> Result<bool> {
    let readme_url = config.readme_url()?.ok_or_else(|| {
        AppError::generic("self_update.readme_url is not set in the configuration")
    })?;
    let transport = HttpTransport::new(&config.client_config())?;

    let remote = fetch_remote_version(&transport, &readme_url).await?;
    println!("{}", remote);
    needs_update(&remote)
}

/// Run one synchronization
///
/// Returns `Ok(None)` when the user declined or for a dry run.
pub async fn handle_sync(cli: &Cli, config: &AppConfig) -> Result<Option<SyncReport>> {
    let roots = config.sync_roots()?;
    let transport = HttpTransport::new(&config.client_config())?;

    if let Some(readme_url) = config.readme_url()? {
        show_update_banner(&transport, &readme_url).await;
    }

    if !cli.skip_prompt(config) && !confirm_location(roots.local_root())? {
        println!("Aborted, nothing was changed.");
        return Ok(None);
    }

    // Installed after the prompt so Ctrl+C still ends a pending question
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let signals = SignalHandler::new(shutdown_tx).setup();
    let shutdown = ShutdownListener::new(shutdown_rx);
    let result = synchronize(cli, config, &roots, &transport, shutdown).await;
    signals.abort();
    result
}

async fn synchronize(
    cli: &Cli,
    config: &AppConfig,
    roots: &SyncRoots,
    transport: &HttpTransport,
    shutdown: ShutdownListener,
) -> Result<Option<SyncReport>> {
    let show_progress = cli.show_progress(config);

    tokio::fs::create_dir_all(roots.local_root()).await?;
    println!("🔍 Checking for updates.");

    let manifest = refresh_manifest(roots, transport, show_progress).await?;
    println!("📋 Manifest version: {}", manifest.version());

    let mut hashes = refresh_hashes(roots, transport, show_progress).await?;

    let bar = spinner("Generating local hashes...", show_progress);
    let hashed = hashes.build_local_hashes(&manifest, roots).await;
    bar.finish_and_clear();
    info!("{} of {} tracked files present locally", hashed, manifest.len());

    let mut engine_config = config.engine_config();
    engine_config.verbose = show_progress;
    let mut engine = SyncEngine::new(roots, transport, engine_config).with_shutdown(shutdown);

    if cli.dry_run {
        print_plan(&engine.plan(&manifest, &hashes));
        return Ok(None);
    }

    println!("⬇️  Getting updates.");
    let report = engine.run(&manifest, &mut hashes).await?;
    print_summary(&report);
    Ok(Some(report))
}

/// Load the cached manifest and refresh it from the server
///
/// A cached copy is used when the server cannot be reached.
async fn refresh_manifest(
    roots: &SyncRoots,
    transport: &HttpTransport,
    show_progress: bool,
) -> Result<ManifestDataset> {
    let mut manifest = ManifestDataset::new();
    let loaded = match manifest.load(roots).await {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!("Ignoring cached {}: {}", MANIFEST_NAME, e);
            false
        }
    };
    let cached_version = manifest.version().clone();

    if !loaded {
        warn!("Local {} missing, downloading a new one", MANIFEST_NAME);
    }

    let bar = spinner(&format!("Fetching {}...", MANIFEST_NAME), show_progress);
    let updated = manifest.update(roots, transport, false).await;
    bar.finish_and_clear();

    if !updated {
        if loaded && manifest.load(roots).await.unwrap_or(false) {
            warn!("Could not refresh {}, using the cached copy", MANIFEST_NAME);
            return Ok(manifest);
        }
        return Err(DatasetError::Unreachable {
            name: MANIFEST_NAME.to_string(),
        }
        .into());
    }

    if loaded {
        match cached_version.checked_cmp(manifest.version()) {
            Ok(Ordering::Less) => println!(
                "📦 New release: {} -> {}",
                cached_version,
                manifest.version()
            ),
            Ok(_) => println!("✅ Already have the most up-to-date {}.", MANIFEST_NAME),
            Err(e) => warn!("Cannot compare {} versions: {}", MANIFEST_NAME, e),
        }
    }

    Ok(manifest)
}

/// Refresh the hashes from the server, falling back to the cached copy
async fn refresh_hashes(
    roots: &SyncRoots,
    transport: &HttpTransport,
    show_progress: bool,
) -> Result<HashDataset> {
    let mut hashes = HashDataset::new();

    let bar = spinner(&format!("Updating {}...", HASHES_NAME), show_progress);
    let updated = hashes.update(roots, transport, false).await;
    bar.finish_and_clear();

    if updated {
        return Ok(hashes);
    }

    match hashes.load(roots).await {
        Ok(true) => {
            warn!("Could not refresh {}, using the cached copy", HASHES_NAME);
            Ok(hashes)
        }
        Ok(false) | Err(_) => Err(DatasetError::Unreachable {
            name: HASHES_NAME.to_string(),
        }
        .into()),
    }
}
