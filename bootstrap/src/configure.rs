//! Configuration materialization: default `.env` and data directory.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, instrument};

use crate::core::env_template::{EnvSection, render_env_document};
use crate::core::types::ConfigOutcome;
use crate::error::BootstrapError;
use crate::io::atomic::write_atomic;

/// Write the default configuration unless one exists and `force` is unset.
///
/// An existing file is never merged: it is either left byte-for-byte alone or
/// replaced whole.
#[instrument(skip_all, fields(path = %path.display(), force))]
pub fn ensure_configuration(
    path: &Path,
    force: bool,
    defaults: &[EnvSection],
) -> Result<ConfigOutcome, BootstrapError> {
    if path.exists() && !force {
        debug!("configuration present, leaving untouched");
        return Ok(ConfigOutcome::Skipped);
    }
    write_atomic(path, &render_env_document(defaults)).map_err(BootstrapError::Configuration)?;
    info!("configuration written");
    Ok(ConfigOutcome::Written)
}

/// Create the data directory if missing. Returns whether it was created.
pub fn ensure_data_dir(path: &Path) -> Result<bool, BootstrapError> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)
        .with_context(|| format!("create data directory {}", path.display()))
        .map_err(BootstrapError::Configuration)?;
    Ok(true)
}
