// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the SOUSCHEF_HOME environment variable for isolation.
// When SOUSCHEF_HOME is set, config and data live under that directory.
// When unset, config uses ~/.souschef/ and data uses XDG_DATA_HOME/souschef.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the SOUSCHEF_HOME override, if set.
fn souschef_home() -> Option<PathBuf> {
    std::env::var_os("SOUSCHEF_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory on exotic hosts.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $SOUSCHEF_HOME/ or ~/.souschef/
pub fn config_dir() -> PathBuf {
    if let Some(home) = souschef_home() {
        return home;
    }
    dirs_home().join(".souschef")
}

/// Data directory: $SOUSCHEF_HOME/data/ or ~/.local/share/souschef/
pub fn data_dir() -> PathBuf {
    if let Some(home) = souschef_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "souschef") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Default database path
pub fn db_path() -> PathBuf {
    data_dir().join("souschef.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure all required directories exist
pub async fn ensure_dirs() -> anyhow::Result<()> {
    for dir in [config_dir(), data_dir()] {
        tokio::fs::create_dir_all(&dir).await?;
    }
    Ok(())
}
