//! Startup checks for Manifest Patcher
//!
//! This module provides the confirmation prompt shown before touching the local
//! install and the check for a newer patcher release.

use std::cmp::Ordering;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::app::client::HttpTransport;
use crate::app::version::VersionTag;
use crate::errors::{AppError, Result, VersionError};

/// Ask whether to synchronize into `local_root`
///
/// # Errors
///
/// Returns an error when stdin is not a terminal, since nobody could answer.
pub fn confirm_location(local_root: &Path) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(AppError::generic(
            "Cannot ask for confirmation without a terminal. Pass --yes or set behavior.skip_prompt",
        ));
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    ask_location(&mut stdin.lock(), &mut stdout.lock(), local_root).map_err(AppError::Io)
}

/// Prompt on arbitrary streams until the answer is yes or no
///
/// End of input counts as no.
pub fn ask_location<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    local_root: &Path,
) -> io::Result<bool> {
    let situation = if local_root.is_dir() {
        "Directory exists, downloading to"
    } else {
        "Directory does not exist"
    };

    loop {
        writeln!(output)?;
        writeln!(output, "⚠️  {}:", situation)?;
        writeln!(output, "   {}", local_root.display())?;
        write!(output, "   Do you wish to continue ([Y]es / [N]o)? ")?;
        output.flush()?;

        let mut response = String::new();
        if input.read_line(&mut response)? == 0 {
            return Ok(false);
        }

        match response.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            other => debug!("Unrecognized answer: {:?}", other),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadmeHeader {
    version: Vec<u32>,
}

/// Parse the patcher version from the first line of a README
///
/// The first line is a JSON object such as `{"version": [1, 0, 5]}`.
pub fn parse_readme_version(readme: &str) -> Result<VersionTag> {
    let first_line = readme.lines().next().unwrap_or("").trim();
    let header: ReadmeHeader =
        serde_json::from_str(first_line).map_err(|_| VersionError::Parse {
            input: first_line.to_string(),
        })?;
    Ok(VersionTag::from_parts(header.version))
}

/// Whether `remote` is newer than this build
pub fn needs_update(remote: &VersionTag) -> Result<bool> {
    let ordering = VersionTag::current().checked_cmp(remote)?;
    Ok(ordering == Ordering::Less)
}

/// Fetch the published patcher version
pub async fn fetch_remote_version(
    transport: &HttpTransport,
    readme_url: &Url,
) -> Result<VersionTag> {
    let readme = transport.fetch_text(readme_url).await?;
    parse_readme_version(&readme)
}

/// Print a banner when a newer patcher is published; failures only warn
pub async fn show_update_banner(transport: &HttpTransport, readme_url: &Url) {
    match fetch_remote_version(transport, readme_url).await {
        Ok(remote) => match needs_update(&remote) {
            Ok(true) => {
                println!("!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
                println!(
                    "🚀 Manifest Patcher {} is available (running {})",
                    remote,
                    VersionTag::current()
                );
                println!("   See: {}", readme_url);
                println!("!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!");
                println!();
            }
            Ok(false) => debug!("Patcher is up to date ({})", VersionTag::current()),
            Err(e) => warn!("Could not compare patcher versions: {}", e),
        },
        Err(e) => warn!("Could not check for a newer patcher: {}", e),
    }
}
