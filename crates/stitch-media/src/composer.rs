// crates/stitch-media/src/composer.rs
//
// Builds the concatenated timeline from a directory, or loads it from the
// settings cache when one exists.
//
// Build: every regular file in the directory, one at a time, in the
// configured order. Each file's video tracks are appended back-to-back at the
// end of the single output track; audio and everything else is ignored.
// The cache is written only after a complete build.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use stitch_core::config::{CachePolicy, Config, EnumerationOrder, MediaErrorPolicy};
use stitch_core::helpers::time::format_secs;
use stitch_core::latch::CancelToken;
use stitch_core::media_types::{TrackInfo, TrackKind};
use stitch_core::settings::{SettingsStore, TIMELINE_KEY};
use stitch_core::timeline::{Timeline, TIMELINE_FORMAT_VERSION};
use stitch_core::WorkflowError;

use crate::directory::DirectoryHandle;
use crate::probe::MediaProbe;

#[derive(Clone, Debug)]
pub struct BuildOptions {
    pub canvas:         (u32, u32),
    pub order:          EnumerationOrder,
    pub cache:          CachePolicy,
    pub on_media_error: MediaErrorPolicy,
}

impl From<&Config> for BuildOptions {
    fn from(config: &Config) -> Self {
        Self {
            canvas:         config.canvas(),
            order:          config.order,
            cache:          config.cache,
            on_media_error: config.on_media_error,
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub timeline:   Timeline,
    pub from_cache: bool,
    /// Files left out under `MediaErrorPolicy::Skip`.
    pub skipped:    Vec<String>,
}

// ── Cache ─────────────────────────────────────────────────────────────────────

/// Name, size and mtime of one directory entry at build time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStamp {
    pub name:          String,
    pub size:          u64,
    pub modified_secs: u64,
}

#[derive(Serialize, Deserialize)]
struct CacheEnvelope {
    timeline:    Timeline,
    fingerprint: Vec<SourceStamp>,
}

pub struct TimelineCache<'a> {
    store:  &'a dyn SettingsStore,
    policy: CachePolicy,
}

impl<'a> TimelineCache<'a> {
    pub fn new(store: &'a dyn SettingsStore, policy: CachePolicy) -> Self {
        Self { store, policy }
    }

    /// The cached timeline for `dir`, if there is a usable one.
    /// Under `TrustForever` this never looks at the directory.
    pub fn load(
        &self,
        dir:   &DirectoryHandle,
        order: EnumerationOrder,
    ) -> Result<Option<Timeline>, WorkflowError> {
        let Some(bytes) = self.store.get(TIMELINE_KEY) else { return Ok(None) };

        let envelope: CacheEnvelope = match serde_json::from_slice(&bytes) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!("[compose] {}", WorkflowError::CacheCorrupt(e.to_string()));
                return Ok(None);
            }
        };
        if envelope.timeline.version != TIMELINE_FORMAT_VERSION {
            tracing::info!("[compose] cached timeline has an old format, rebuilding");
            return Ok(None);
        }
        if !envelope.timeline.belongs_to(dir.path()) {
            tracing::info!(
                "[compose] cached timeline is for {}, rebuilding",
                envelope.timeline.directory.display()
            );
            return Ok(None);
        }

        if self.policy == CachePolicy::Fingerprint {
            let scope = dir.begin_access()?;
            let current = fingerprint(&list_sources(scope.path(), order)?)?;
            if current != envelope.fingerprint {
                tracing::info!("[compose] directory contents changed, rebuilding");
                return Ok(None);
            }
        }

        Ok(Some(envelope.timeline))
    }

    pub fn save(&self, timeline: &Timeline, fingerprint: Vec<SourceStamp>) -> Result<(), WorkflowError> {
        let bytes = serde_json::to_vec(&CacheEnvelope { timeline: timeline.clone(), fingerprint })
            .map_err(|e| WorkflowError::Store(e.to_string()))?;
        self.store.set(TIMELINE_KEY, bytes)
    }
}

// ── Enumeration ───────────────────────────────────────────────────────────────

/// Regular, non-hidden files directly inside `dir`.
pub fn list_sources(dir: &Path, order: EnumerationOrder) -> Result<Vec<PathBuf>, WorkflowError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| WorkflowError::fs(dir, e))? {
        let entry = entry.map_err(|e| WorkflowError::fs(dir, e))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && path.is_file() {
            files.push(path);
        }
    }
    if order == EnumerationOrder::FileName {
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }
    Ok(files)
}

fn fingerprint(files: &[PathBuf]) -> Result<Vec<SourceStamp>, WorkflowError> {
    files.iter().map(|path| {
        let meta = fs::metadata(path).map_err(|e| WorkflowError::fs(path, e))?;
        let modified_secs = meta.modified().ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(SourceStamp { name: file_name(path), size: meta.len(), modified_secs })
    }).collect()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap_or_default().to_string_lossy().into_owned()
}

// ── Concatenation ─────────────────────────────────────────────────────────────

/// Appends every video track of one source, in stream order, at the end of
/// `timeline`. Returns how many segments were added.
pub fn append_video_tracks(timeline: &mut Timeline, source: &str, tracks: &[TrackInfo]) -> usize {
    tracks.iter()
        .filter(|t| t.kind == TrackKind::Video)
        .filter_map(|t| timeline.append_track(source, t.index, t.range))
        .count()
}

// ── Build or load ─────────────────────────────────────────────────────────────

pub fn build_or_load_timeline(
    dir:     &DirectoryHandle,
    cache:   &TimelineCache<'_>,
    probe:   &dyn MediaProbe,
    options: &BuildOptions,
    cancel:  &CancelToken,
) -> Result<BuildOutcome, WorkflowError> {
    if let Some(timeline) = cache.load(dir, options.order)? {
        tracing::info!(
            "[compose] using cached timeline: {} segment(s), {}",
            timeline.segments.len(),
            format_secs(timeline.duration_us())
        );
        return Ok(BuildOutcome { timeline, from_cache: true, skipped: Vec::new() });
    }

    let scope = dir.begin_access()?;
    let sources = list_sources(scope.path(), options.order)?;
    let mut timeline = Timeline::new(scope.path(), options.canvas);
    let mut skipped = Vec::new();

    for path in &sources {
        cancel.check()?;
        let name = file_name(path);

        let tracks = match probe.load_tracks(path) {
            Ok(tracks) => tracks,
            Err(e) if options.on_media_error == MediaErrorPolicy::Skip => {
                tracing::warn!("[compose] skipping {name}: {e:#}");
                skipped.push(name);
                continue;
            }
            Err(e) => {
                return Err(WorkflowError::MediaLoad { path: path.clone(), reason: format!("{e:#}") });
            }
        };

        let added = append_video_tracks(&mut timeline, &name, &tracks);
        tracing::debug!("[compose] {name}: {added} video segment(s)");
    }

    cancel.check()?;
    let stamps = fingerprint(&sources)?;
    cache.save(&timeline, stamps)?;
    drop(scope);

    tracing::info!(
        "[compose] built timeline: {} segment(s) from {} file(s), {}",
        timeline.segments.len(),
        sources.len(),
        format_secs(timeline.duration_us())
    );
    Ok(BuildOutcome { timeline, from_cache: false, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stitch_core::settings::MemoryStore;
    use stitch_core::timeline::{TimeRange, MICROS_PER_SEC};

    fn secs(s: i64) -> TimeRange { TimeRange::new(0, s * MICROS_PER_SEC) }

    /// Track layouts keyed by file name; anything else fails to load.
    struct FakeProbe {
        layouts: HashMap<String, Vec<TrackInfo>>,
        loads:   AtomicUsize,
    }

    impl FakeProbe {
        fn abc() -> Self {
            let mut layouts = HashMap::new();
            layouts.insert("A.mp4".into(), vec![TrackInfo::video(0, secs(5)), TrackInfo::audio(1, secs(5))]);
            layouts.insert("B.mp4".into(), vec![TrackInfo::video(0, secs(3))]);
            layouts.insert("C.mp4".into(), vec![TrackInfo::audio(0, secs(4))]);
            Self { layouts, loads: AtomicUsize::new(0) }
        }
    }

    impl MediaProbe for FakeProbe {
        fn load_tracks(&self, path: &Path) -> anyhow::Result<Vec<TrackInfo>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.layouts.get(&file_name(path)).cloned()
                .ok_or_else(|| anyhow::anyhow!("Invalid data found when processing input"))
        }
    }

    fn dir_with(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        dir
    }

    #[test]
    fn audio_only_files_contribute_nothing() {
        let dir = dir_with(&["A.mp4", "B.mp4", "C.mp4"]);
        let store = MemoryStore::new();
        let cache = TimelineCache::new(&store, CachePolicy::TrustForever);
        let handle = DirectoryHandle::new(dir.path());

        let out = build_or_load_timeline(
            &handle, &cache, &FakeProbe::abc(), &BuildOptions::default(), &CancelToken::new(),
        ).unwrap();

        assert!(!out.from_cache);
        let t = &out.timeline;
        assert_eq!(t.segments.len(), 2);
        let durations: Vec<_> = t.segments.iter().map(|s| s.source_range.duration_us).collect();
        assert_eq!(durations, vec![5 * MICROS_PER_SEC, 3 * MICROS_PER_SEC]);
        assert_eq!(t.duration_us(), 8 * MICROS_PER_SEC);
        assert_eq!(t.segments[0].source, "A.mp4");
        assert_eq!(t.canvas, (1280, 720));
        assert_eq!(handle.open_scopes(), 0);
        assert!(store.contains(TIMELINE_KEY));
    }

    #[test]
    fn second_run_uses_cache_without_probing() {
        let dir = dir_with(&["A.mp4", "B.mp4", "C.mp4"]);
        let store = MemoryStore::new();
        let cache = TimelineCache::new(&store, CachePolicy::TrustForever);
        let handle = DirectoryHandle::new(dir.path());
        let options = BuildOptions::default();

        let first = build_or_load_timeline(&handle, &cache, &FakeProbe::abc(), &options, &CancelToken::new()).unwrap();

        // Even with the directory gone, the cache answers.
        fs::remove_file(dir.path().join("A.mp4")).unwrap();
        let probe = FakeProbe::abc();
        let second = build_or_load_timeline(&handle, &cache, &probe, &options, &CancelToken::new()).unwrap();

        assert!(second.from_cache);
        assert_eq!(probe.loads.load(Ordering::SeqCst), 0);
        assert_eq!(second.timeline, first.timeline);
    }

    #[test]
    fn fingerprint_policy_rebuilds_after_changes() {
        let dir = dir_with(&["A.mp4", "B.mp4"]);
        let store = MemoryStore::new();
        let cache = TimelineCache::new(&store, CachePolicy::Fingerprint);
        let handle = DirectoryHandle::new(dir.path());
        let options = BuildOptions { cache: CachePolicy::Fingerprint, ..BuildOptions::default() };

        build_or_load_timeline(&handle, &cache, &FakeProbe::abc(), &options, &CancelToken::new()).unwrap();
        let again = build_or_load_timeline(&handle, &cache, &FakeProbe::abc(), &options, &CancelToken::new()).unwrap();
        assert!(again.from_cache);

        fs::remove_file(dir.path().join("B.mp4")).unwrap();
        let rebuilt = build_or_load_timeline(&handle, &cache, &FakeProbe::abc(), &options, &CancelToken::new()).unwrap();
        assert!(!rebuilt.from_cache);
        assert_eq!(rebuilt.timeline.segments.len(), 1);
    }

    #[test]
    fn cache_for_another_directory_is_ignored() {
        let first_dir = dir_with(&["A.mp4"]);
        let second_dir = dir_with(&["B.mp4"]);
        let store = MemoryStore::new();
        let cache = TimelineCache::new(&store, CachePolicy::TrustForever);
        let options = BuildOptions::default();

        build_or_load_timeline(&DirectoryHandle::new(first_dir.path()), &cache, &FakeProbe::abc(), &options, &CancelToken::new()).unwrap();
        let out = build_or_load_timeline(&DirectoryHandle::new(second_dir.path()), &cache, &FakeProbe::abc(), &options, &CancelToken::new()).unwrap();

        assert!(!out.from_cache);
        assert_eq!(out.timeline.segments[0].source, "B.mp4");
    }

    #[test]
    fn unreadable_file_aborts_without_caching() {
        let dir = dir_with(&["A.mp4", "broken.mp4"]);
        let store = MemoryStore::new();
        let cache = TimelineCache::new(&store, CachePolicy::TrustForever);
        let handle = DirectoryHandle::new(dir.path());

        let err = build_or_load_timeline(
            &handle, &cache, &FakeProbe::abc(), &BuildOptions::default(), &CancelToken::new(),
        ).unwrap_err();

        match err {
            WorkflowError::MediaLoad { path, .. } => assert!(path.ends_with("broken.mp4")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!store.contains(TIMELINE_KEY));
        assert_eq!(handle.open_scopes(), 0);
    }

    #[test]
    fn skip_policy_leaves_bad_files_out() {
        let dir = dir_with(&["A.mp4", "broken.mp4", "B.mp4"]);
        let store = MemoryStore::new();
        let cache = TimelineCache::new(&store, CachePolicy::TrustForever);
        let options = BuildOptions { on_media_error: MediaErrorPolicy::Skip, ..BuildOptions::default() };

        let out = build_or_load_timeline(
            &DirectoryHandle::new(dir.path()), &cache, &FakeProbe::abc(), &options, &CancelToken::new(),
        ).unwrap();

        assert_eq!(out.skipped, vec!["broken.mp4".to_string()]);
        assert_eq!(out.timeline.segments.len(), 2);
    }

    #[test]
    fn cancellation_stops_the_build() {
        let dir = dir_with(&["A.mp4", "B.mp4"]);
        let store = MemoryStore::new();
        let cache = TimelineCache::new(&store, CachePolicy::TrustForever);
        let cancel = CancelToken::new();
        cancel.cancel();

        let probe = FakeProbe::abc();
        let err = build_or_load_timeline(
            &DirectoryHandle::new(dir.path()), &cache, &probe, &BuildOptions::default(), &cancel,
        ).unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(probe.loads.load(Ordering::SeqCst), 0);
        assert!(!store.contains(TIMELINE_KEY));
    }

    #[test]
    fn corrupt_cache_is_a_miss() {
        let dir = dir_with(&["B.mp4"]);
        let store = MemoryStore::new();
        store.set(TIMELINE_KEY, b"\x00garbage".to_vec()).unwrap();
        let cache = TimelineCache::new(&store, CachePolicy::TrustForever);

        let out = build_or_load_timeline(
            &DirectoryHandle::new(dir.path()), &cache, &FakeProbe::abc(), &BuildOptions::default(), &CancelToken::new(),
        ).unwrap();
        assert!(!out.from_cache);
        assert_eq!(out.timeline.duration_us(), 3 * MICROS_PER_SEC);
    }

    #[test]
    fn hidden_files_and_subdirectories_are_not_sources() {
        let dir = dir_with(&["b.mp4", "a.mp4", ".DS_Store"]);
        fs::create_dir(dir.path().join("nested")).unwrap();
        let names: Vec<_> = list_sources(dir.path(), EnumerationOrder::FileName).unwrap()
            .iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.mp4", "b.mp4"]);
    }

    #[test]
    fn multiple_video_tracks_are_appended_in_stream_order() {
        let mut t = Timeline::new("/x", (1280, 720));
        let tracks = vec![
            TrackInfo::video(0, secs(2)),
            TrackInfo::audio(1, secs(2)),
            TrackInfo::video(2, secs(1)),
        ];
        assert_eq!(append_video_tracks(&mut t, "multi.mov", &tracks), 2);
        let indices: Vec<_> = t.segments.iter().map(|s| s.track_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(t.duration_us(), 3 * MICROS_PER_SEC);
    }
}
