//! Default locations and tilde (`~`) expansion.

use std::path::{Path, PathBuf};

/// `~/.lokal`, falling back to `$HOME` or the working directory.
pub fn default_home() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    home.join(".lokal")
}

/// `<config dir>/lokal/config.toml`.
pub fn default_config_file() -> PathBuf {
    let config_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    config_dir.join("lokal").join("config.toml")
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
