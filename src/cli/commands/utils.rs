//! Shared utilities for CLI commands

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::config::{default_state_dir, Config};
use crate::core::plan::LaneFilter;
use crate::core::store::FileStore;
use crate::core::workbench::Workbench;

/// State directory from the flag or environment, else the platform default
pub fn state_dir(global: &GlobalOpts) -> PathBuf {
    global.state_dir.clone().unwrap_or_else(default_state_dir)
}

/// Open the persisted session
pub fn open_workbench(global: &GlobalOpts) -> Result<Workbench<FileStore>> {
    let dir = state_dir(global);
    let config = Config::load(&dir).into_diagnostic()?;
    let store = FileStore::open(&dir).into_diagnostic()?;
    tracing::debug!("Using state directory {}", dir.display());
    Ok(Workbench::open(store, config))
}

/// Lane filter from an argument, falling back to the configured lanes
pub fn resolve_lanes(arg: Option<&str>, config: &Config) -> Result<LaneFilter> {
    match arg {
        Some(lanes) => lanes
            .parse::<LaneFilter>()
            .map_err(|e| miette::miette!("{}", e)),
        None => Ok(config.lanes()),
    }
}
