// crates/stitch-media/src/copier.rs
//
// Copies the bundled sample videos into the chosen directory.
// Skip-if-exists by file name, so running it again is a no-op.

use std::fs;
use std::path::{Path, PathBuf};

use stitch_core::latch::CancelToken;
use stitch_core::WorkflowError;

use crate::directory::DirectoryHandle;

/// The read-only set of sample files shipped with the app.
#[derive(Clone, Debug)]
pub struct SampleBundle {
    pub dir:       PathBuf,
    pub extension: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied:  Vec<String>,
    pub skipped: Vec<String>,
}

impl SampleBundle {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self { dir: dir.into(), extension: extension.into() }
    }

    /// Sample files in the bundle, sorted by name. A missing bundle
    /// directory is an empty bundle.
    pub fn files(&self) -> Result<Vec<PathBuf>, WorkflowError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("[copy] sample bundle {} not found", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(WorkflowError::fs(&self.dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| WorkflowError::fs(&self.dir, e))?.path();
            if path.is_file() && self.matches_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

pub fn copy_samples(
    dir:    &DirectoryHandle,
    bundle: &SampleBundle,
    cancel: &CancelToken,
) -> Result<CopyReport, WorkflowError> {
    let scope = dir.begin_access()?;
    let mut report = CopyReport::default();

    for sample in bundle.files()? {
        cancel.check()?;

        let Some(name) = sample.file_name() else { continue };
        let dest = scope.path().join(name);
        let name = name.to_string_lossy().into_owned();

        if dest.exists() {
            report.skipped.push(name);
            continue;
        }
        fs::copy(&sample, &dest).map_err(|e| WorkflowError::fs(&dest, e))?;
        tracing::info!("[copy] {name} → {}", scope.path().display());
        report.copied.push(name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn bundle_with(names: &[&str]) -> (tempfile::TempDir, SampleBundle) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        let bundle = SampleBundle::new(dir.path(), "mp4");
        (dir, bundle)
    }

    fn listing(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir).unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn only_matching_extension_is_bundled() {
        let (_keep, bundle) = bundle_with(&["b.mp4", "a.MP4", "notes.txt"]);
        let names: Vec<_> = bundle.files().unwrap().iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MP4", "b.mp4"]);
    }

    #[test]
    fn copy_twice_is_idempotent() {
        let (_keep, bundle) = bundle_with(&["a.mp4", "b.mp4"]);
        let dest = tempfile::tempdir().unwrap();
        let handle = DirectoryHandle::new(dest.path());
        let cancel = CancelToken::new();

        let first = copy_samples(&handle, &bundle, &cancel).unwrap();
        let after_first = listing(dest.path());
        let second = copy_samples(&handle, &bundle, &cancel).unwrap();

        assert_eq!(first.copied.len(), 2);
        assert!(second.copied.is_empty());
        assert_eq!(second.skipped.len(), 2);
        assert_eq!(listing(dest.path()), after_first);
        assert_eq!(handle.open_scopes(), 0);
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let (_keep, bundle) = bundle_with(&["a.mp4"]);
        let dest = tempfile::tempdir().unwrap();
        fs::write(dest.path().join("a.mp4"), b"user's own file").unwrap();

        let report = copy_samples(&DirectoryHandle::new(dest.path()), &bundle, &CancelToken::new()).unwrap();

        assert_eq!(report.skipped, vec!["a.mp4".to_string()]);
        assert_eq!(fs::read(dest.path().join("a.mp4")).unwrap(), b"user's own file");
    }

    #[test]
    fn cancelled_copy_releases_scope() {
        let (_keep, bundle) = bundle_with(&["a.mp4"]);
        let dest = tempfile::tempdir().unwrap();
        let handle = DirectoryHandle::new(dest.path());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = copy_samples(&handle, &bundle, &cancel).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(handle.open_scopes(), 0);
        assert!(listing(dest.path()).is_empty());
    }

    #[test]
    fn missing_destination_fails_before_copying() {
        let (_keep, bundle) = bundle_with(&["a.mp4"]);
        let handle = DirectoryHandle::new("/no/such/stitch/destination");
        let err = copy_samples(&handle, &bundle, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, WorkflowError::Permission { .. }));
        assert_eq!(handle.open_scopes(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn failed_copy_stops_and_releases_scope() {
        let (_keep, bundle) = bundle_with(&["A.mp4", "B.mp4", "C.mp4"]);
        let dest = tempfile::tempdir().unwrap();
        // A dangling link reads as absent, but copying through it fails.
        std::os::unix::fs::symlink(dest.path().join("gone/B.mp4"), dest.path().join("B.mp4")).unwrap();
        let handle = DirectoryHandle::new(dest.path());

        let err = copy_samples(&handle, &bundle, &CancelToken::new()).unwrap_err();

        assert!(matches!(err, WorkflowError::Filesystem { .. }), "{err}");
        assert_eq!(handle.open_scopes(), 0);
        let names = listing(dest.path());
        assert!(names.contains("A.mp4"));
        assert!(!names.contains("C.mp4"));
        assert!(!dest.path().join("gone").exists());
    }

    #[test]
    fn missing_bundle_copies_nothing() {
        let dest = tempfile::tempdir().unwrap();
        let bundle = SampleBundle::new("/no/such/bundle", "mp4");
        let report = copy_samples(&DirectoryHandle::new(dest.path()), &bundle, &CancelToken::new()).unwrap();
        assert_eq!(report, CopyReport::default());
    }
}
