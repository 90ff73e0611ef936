// crates/stitch-ui/src/helpers/log.rs
//
// Subscriber setup for the `tracing` calls made across all three crates.
//
// In release builds with `windows_subsystem = "windows"` (double-click launch)
// there is no console attached, so stderr output is silently discarded.
// Every event is therefore written to stderr AND appended to a file in the
// OS temp directory, visible regardless of launch mode.
//
// File: %TEMP%\stitch.log (or $TMPDIR/stitch.log), append-only.
// Filter: RUST_LOG, default `info`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("stitch.log")
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// only report that a subscriber is already set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let file = OpenOptions::new().create(true).append(true).open(log_path());
    let result = match file {
        Ok(f) => builder
            .with_ansi(false)
            .with_writer(std::io::stderr.and(Mutex::new(f)))
            .try_init(),
        Err(e) => {
            eprintln!("[log] cannot open {}: {e}", log_path().display());
            builder.with_writer(std::io::stderr).try_init()
        }
    };

    match result {
        Ok(()) => tracing::info!("[log] writing to {}", log_path().display()),
        Err(e) => eprintln!("[log] subscriber not installed: {e}"),
    }
}
