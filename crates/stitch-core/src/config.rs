// crates/stitch-core/src/config.rs
//
// User-tunable knobs, read from config.json in the app data directory.
// Every field has a default so a missing or partial file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::timeline::DEFAULT_CANVAS;

pub const SAMPLES_DIR_ENV: &str = "STITCH_SAMPLES_DIR";

/// Order in which directory entries are concatenated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationOrder {
    /// Sorted by file name, identical on every platform.
    #[default]
    FileName,
    /// Whatever `read_dir` yields.
    Filesystem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// A cached timeline for the same directory is used as-is, forever.
    #[default]
    TrustForever,
    /// Reuse the cache only while file names, sizes and mtimes are unchanged.
    Fingerprint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaErrorPolicy {
    /// Stop the build and report the file that failed.
    #[default]
    Abort,
    /// Log the file and keep going without it.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas_width:     u32,
    pub canvas_height:    u32,
    pub samples_dir:      Option<PathBuf>,
    pub sample_extension: String,
    pub order:            EnumerationOrder,
    pub cache:            CachePolicy,
    pub on_media_error:   MediaErrorPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width:     DEFAULT_CANVAS.0,
            canvas_height:    DEFAULT_CANVAS.1,
            samples_dir:      None,
            sample_extension: "mp4".into(),
            order:            EnumerationOrder::default(),
            cache:            CachePolicy::default(),
            on_media_error:   MediaErrorPolicy::default(),
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults on any problem. The env override
    /// for the samples directory is applied last.
    pub fn load(path: &Path) -> Self {
        let mut config = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("[config] ignoring malformed {}: {e}", path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        };
        if let Some(dir) = std::env::var_os(SAMPLES_DIR_ENV) {
            config.samples_dir = Some(PathBuf::from(dir));
        }
        config
    }

    pub fn canvas(&self) -> (u32, u32) {
        (self.canvas_width.max(2), self.canvas_height.max(2))
    }

    /// Where the bundled samples live: explicit setting, then
    /// `<exe dir>/resources/samples`, then `./assets/samples`.
    pub fn resolve_samples_dir(&self) -> PathBuf {
        if let Some(dir) = &self.samples_dir {
            return dir.clone();
        }
        let beside_exe = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|p| p.join("resources").join("samples")));
        match beside_exe {
            Some(dir) if dir.is_dir() => dir,
            _ => PathBuf::from("assets").join("samples"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "order": "filesystem", "cache": "fingerprint" }"#).unwrap();
        assert_eq!(cfg.order, EnumerationOrder::Filesystem);
        assert_eq!(cfg.cache, CachePolicy::Fingerprint);
        assert_eq!(cfg.canvas(), (1280, 720));
        assert_eq!(cfg.on_media_error, MediaErrorPolicy::Abort);
        assert_eq!(cfg.sample_extension, "mp4");
    }

    #[test]
    fn explicit_samples_dir_wins() {
        let cfg = Config { samples_dir: Some("/opt/samples".into()), ..Config::default() };
        assert_eq!(cfg.resolve_samples_dir(), PathBuf::from("/opt/samples"));
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let cfg = Config::load(&path);
        assert_eq!(cfg.canvas(), (1280, 720));
    }
}
