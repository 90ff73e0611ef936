// crates/stitch-core/src/media_types.rs
//
// Types that flow between stitch-media and stitch-ui.
// No egui, no ffmpeg: just plain data.

use uuid::Uuid;

use crate::timeline::TimeRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Other,
}

/// One stream inside a source file, as reported by a probe.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackInfo {
    /// Stream index inside the container.
    pub index: usize,
    pub kind:  TrackKind,
    pub range: TimeRange,
}

impl TrackInfo {
    pub fn video(index: usize, range: TimeRange) -> Self {
        Self { index, kind: TrackKind::Video, range }
    }

    pub fn audio(index: usize, range: TimeRange) -> Self {
        Self { index, kind: TrackKind::Audio, range }
    }
}

/// A decoded frame from the playback pipeline, stamped with timeline time.
pub struct PlaybackFrame {
    pub segment:      Uuid,
    pub timestamp_us: i64,
    pub width:        u32,
    pub height:       u32,
    pub data:         Vec<u8>, // RGBA
}
