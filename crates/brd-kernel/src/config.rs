//! Configuration file loading

use brd_core::{ConfigError, EngineConfig};
use std::path::{Path, PathBuf};

/// Kernel errors
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// Config file could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config content rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Load engine configuration; no path means defaults
///
/// # Errors
/// Unreadable file, bad TOML, or a zero limit.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, KernelError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| KernelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_toml_str(&text)?;
    tracing::debug!(path = %path.display(), ?config, "configuration loaded");
    Ok(config)
}
