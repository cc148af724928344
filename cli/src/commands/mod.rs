pub mod access;
pub mod green;
pub mod icvu;
pub mod query;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use livability::LivabilityConfig;

use crate::cli::Cli;

/// Config named by `--config`, or the defaults.
pub fn load_config(cli: &Cli) -> Result<LivabilityConfig> {
    LivabilityConfig::load(cli.config.as_deref())
}

/// Resolve an output path, refusing stdout.
pub fn output_path(output: &Option<PathBuf>, default: &str) -> Result<PathBuf> {
    let path = output.clone().unwrap_or_else(|| default.into());
    if path == Path::new("-") {
        bail!("stdout is not supported; provide a real file path.");
    }
    Ok(path)
}
