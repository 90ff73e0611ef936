// crates/stitch-core/src/timeline.rs
//
// The concatenated timeline: one video track made of segments laid end to
// end. Built once from a directory, cached as JSON, replayed on later runs.
//
// Time is integer microseconds so "starts where the previous one ended" is
// exact; floating seconds are only produced for display.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkflowError;

/// Bump when the cached layout changes; older caches are then rebuilt.
pub const TIMELINE_FORMAT_VERSION: u32 = 1;

pub const DEFAULT_CANVAS: (u32, u32) = (1280, 720);

pub const MICROS_PER_SEC: i64 = 1_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_us:    i64,
    pub duration_us: i64,
}

impl TimeRange {
    pub fn new(start_us: i64, duration_us: i64) -> Self {
        Self { start_us, duration_us }
    }

    pub fn end_us(&self) -> i64 {
        self.start_us + self.duration_us
    }
}

/// A contiguous range of one source file's video track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id:           Uuid,
    /// File name inside the timeline's directory.
    pub source:       String,
    /// Stream index of the video track inside `source`.
    pub track_index:  usize,
    pub source_range: TimeRange,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub version:   u32,
    pub directory: PathBuf,
    pub canvas:    (u32, u32),
    pub segments:  Vec<Segment>,
}

impl Timeline {
    pub fn new(directory: impl Into<PathBuf>, canvas: (u32, u32)) -> Self {
        Self {
            version:   TIMELINE_FORMAT_VERSION,
            directory: directory.into(),
            canvas,
            segments:  Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn duration_us(&self) -> i64 {
        self.segments.iter().map(|s| s.source_range.duration_us).sum()
    }

    /// Appends `range` of a source's video track at the current end of the
    /// timeline and returns where it landed. Empty ranges add nothing.
    pub fn append_track(
        &mut self,
        source:      impl Into<String>,
        track_index: usize,
        range:       TimeRange,
    ) -> Option<i64> {
        if range.duration_us <= 0 {
            return None;
        }
        let at = self.duration_us();
        self.segments.push(Segment {
            id: Uuid::new_v4(),
            source: source.into(),
            track_index,
            source_range: range,
        });
        Some(at)
    }

    /// `(timeline_start_us, segment)` for every segment, in order, gap-free.
    pub fn placements(&self) -> impl Iterator<Item = (i64, &Segment)> + '_ {
        self.segments.iter().scan(0i64, |at, seg| {
            let start = *at;
            *at += seg.source_range.duration_us;
            Some((start, seg))
        })
    }

    /// Index of the segment playing at timeline position `t_us`.
    pub fn segment_at(&self, t_us: i64) -> Option<usize> {
        self.placements()
            .position(|(start, seg)| t_us >= start && t_us < start + seg.source_range.duration_us)
    }

    pub fn source_path(&self, segment: &Segment) -> PathBuf {
        self.directory.join(&segment.source)
    }

    pub fn belongs_to(&self, directory: &Path) -> bool {
        self.directory == directory
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkflowError> {
        serde_json::to_vec(self).map_err(|e| WorkflowError::Store(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkflowError> {
        let timeline: Timeline = serde_json::from_slice(bytes)
            .map_err(|e| WorkflowError::CacheCorrupt(e.to_string()))?;
        if timeline.version != TIMELINE_FORMAT_VERSION {
            return Err(WorkflowError::CacheCorrupt(format!(
                "format version {} (expected {TIMELINE_FORMAT_VERSION})",
                timeline.version
            )));
        }
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: i64) -> i64 { s * MICROS_PER_SEC }

    fn sample() -> Timeline {
        let mut t = Timeline::new("/media/samples", DEFAULT_CANVAS);
        t.append_track("A.mp4", 0, TimeRange::new(0, secs(5)));
        t.append_track("B.mp4", 1, TimeRange::new(secs(1), secs(3)));
        t
    }

    #[test]
    fn appended_segments_are_back_to_back() {
        let mut t = Timeline::new("/x", DEFAULT_CANVAS);
        assert_eq!(t.append_track("A.mp4", 0, TimeRange::new(0, secs(5))), Some(0));
        assert_eq!(t.append_track("B.mp4", 0, TimeRange::new(0, secs(3))), Some(secs(5)));
        assert_eq!(t.duration_us(), secs(8));

        let starts: Vec<i64> = t.placements().map(|(s, _)| s).collect();
        assert_eq!(starts, vec![0, secs(5)]);
    }

    #[test]
    fn placements_have_no_gap_or_overlap() {
        let t = sample();
        let mut end = 0;
        for (start, seg) in t.placements() {
            assert_eq!(start, end);
            end = start + seg.source_range.duration_us;
        }
        assert_eq!(end, t.duration_us());
    }

    #[test]
    fn empty_range_is_ignored() {
        let mut t = Timeline::new("/x", DEFAULT_CANVAS);
        assert_eq!(t.append_track("A.mp4", 0, TimeRange::new(0, 0)), None);
        assert!(t.is_empty());
    }

    #[test]
    fn segment_at_finds_the_playing_segment() {
        let t = sample();
        assert_eq!(t.segment_at(0), Some(0));
        assert_eq!(t.segment_at(secs(5) - 1), Some(0));
        assert_eq!(t.segment_at(secs(5)), Some(1));
        assert_eq!(t.segment_at(secs(7)), Some(1));
        assert!(t.segment_at(secs(8)).is_none());
        assert!(t.segment_at(-1).is_none());
    }

    #[test]
    fn cache_round_trip_keeps_order_and_durations() {
        let t = sample();
        let back = Timeline::from_bytes(&t.to_bytes().unwrap()).unwrap();
        assert_eq!(back.segments.len(), 2);
        let order: Vec<_> = back.segments.iter().map(|s| s.source.clone()).collect();
        assert_eq!(order, vec!["A.mp4", "B.mp4"]);
        let durations: Vec<_> = back.segments.iter().map(|s| s.source_range.duration_us).collect();
        assert_eq!(durations, vec![secs(5), secs(3)]);
        assert_eq!(back, t);
    }

    #[test]
    fn garbage_and_future_versions_are_rejected() {
        assert!(matches!(
            Timeline::from_bytes(b"not json"),
            Err(WorkflowError::CacheCorrupt(_))
        ));
        let mut t = sample();
        t.version = TIMELINE_FORMAT_VERSION + 1;
        let bytes = serde_json::to_vec(&t).unwrap();
        assert!(matches!(Timeline::from_bytes(&bytes), Err(WorkflowError::CacheCorrupt(_))));
    }

    #[test]
    fn source_path_joins_directory() {
        let t = sample();
        assert_eq!(t.source_path(&t.segments[1]), PathBuf::from("/media/samples/B.mp4"));
        assert!(t.belongs_to(Path::new("/media/samples")));
    }
}
