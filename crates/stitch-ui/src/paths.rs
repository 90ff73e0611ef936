// crates/stitch-ui/src/paths.rs
// Single source of truth for where Stitch keeps its settings and config.

use std::path::{Path, PathBuf};

/// Overrides the app data directory (tests, portable installs).
pub const DATA_DIR_ENV: &str = "STITCH_DATA_DIR";

/// `%APPDATA%\Stitch` on Windows, `~/.local/share/stitch` elsewhere.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "windows")]
    let dir = std::env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("Stitch");
    #[cfg(not(target_os = "windows"))]
    let dir = std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(".local").join("share"))
        .unwrap_or_else(|_| std::env::temp_dir())
        .join("stitch");
    dir
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.json")
}
