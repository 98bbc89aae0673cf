//! Subcommand implementations.

pub mod ask;
pub mod embed_orders;
pub mod init;
pub mod load_orders;
pub mod load_text;
pub mod serve;
pub mod status;

use salesrag_config::AppConfig;
use std::path::{Path, PathBuf};

/// Load from `--config` if given, otherwise from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Where the config file lives for this invocation.
pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}
