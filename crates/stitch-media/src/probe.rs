// crates/stitch-media/src/probe.rs
//
// Track metadata loading. The builder only needs "which streams does this
// file have, what kind are they, and what time range do they cover". The
// MediaProbe trait is that question, FfmpegProbe answers it in-process.

use std::path::Path;

use anyhow::{anyhow, Result};
use ffmpeg_the_third as ffmpeg;
use ffmpeg::media::Type;

use stitch_core::media_types::{TrackInfo, TrackKind};
use stitch_core::timeline::{TimeRange, MICROS_PER_SEC};

pub trait MediaProbe: Send + Sync {
    fn load_tracks(&self, path: &Path) -> Result<Vec<TrackInfo>>;
}

pub struct FfmpegProbe;

impl FfmpegProbe {
    pub fn new() -> Self { Self }
}

impl Default for FfmpegProbe {
    fn default() -> Self { Self::new() }
}

impl MediaProbe for FfmpegProbe {
    fn load_tracks(&self, path: &Path) -> Result<Vec<TrackInfo>> {
        let ctx = ffmpeg::format::input(path)
            .map_err(|e| anyhow!("open failed: {e}"))?;

        // Container duration is in AV_TIME_BASE units (microseconds).
        let container_us = if ctx.duration() > 0 {
            Some(ctx.duration() * MICROS_PER_SEC / ffmpeg::ffi::AV_TIME_BASE as i64)
        } else {
            None
        };

        let mut tracks = Vec::new();
        for stream in ctx.streams() {
            let tb = stream.time_base();
            let (num, den) = (tb.numerator(), tb.denominator());

            let start_us = match stream.start_time() {
                ts if ts == ffmpeg::ffi::AV_NOPTS_VALUE => 0,
                ts => to_micros(ts, num, den).max(0),
            };
            let duration_us = match stream.duration() {
                d if d > 0 => to_micros(d, num, den),
                // Some muxers only record the container duration.
                _ => container_us.map(|c| (c - start_us).max(0)).unwrap_or(0),
            };

            tracks.push(TrackInfo {
                index: stream.index(),
                kind:  kind_of(stream.parameters().medium()),
                range: TimeRange::new(start_us, duration_us),
            });
        }

        tracing::debug!("[probe] {} stream(s) ← {}", tracks.len(), path.display());
        Ok(tracks)
    }
}

fn kind_of(medium: Type) -> TrackKind {
    match medium {
        Type::Video      => TrackKind::Video,
        Type::Audio      => TrackKind::Audio,
        Type::Subtitle   => TrackKind::Subtitle,
        Type::Data       => TrackKind::Data,
        _                => TrackKind::Other,
    }
}

/// `ts` in `num/den` seconds → microseconds, without overflowing on long files.
pub(crate) fn to_micros(ts: i64, num: i32, den: i32) -> i64 {
    if den == 0 {
        return 0;
    }
    (ts as i128 * num as i128 * MICROS_PER_SEC as i128 / den as i128) as i64
}

/// Inverse of `to_micros`, used when seeking a stream to a source offset.
pub(crate) fn from_micros(us: i64, num: i32, den: i32) -> i64 {
    if num == 0 {
        return 0;
    }
    (us as i128 * den as i128 / (num as i128 * MICROS_PER_SEC as i128)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescales_common_time_bases() {
        // 90 kHz MPEG clock: 450000 ticks = 5 s.
        assert_eq!(to_micros(450_000, 1, 90_000), 5 * MICROS_PER_SEC);
        // 1/30000 time base (29.97 fps files).
        assert_eq!(to_micros(90_000, 1, 30_000), 3 * MICROS_PER_SEC);
        assert_eq!(from_micros(5 * MICROS_PER_SEC, 1, 90_000), 450_000);
    }

    #[test]
    fn zero_denominator_is_harmless() {
        assert_eq!(to_micros(10, 1, 0), 0);
        assert_eq!(from_micros(10, 0, 1), 0);
    }

    #[test]
    fn media_types_map_to_track_kinds() {
        assert_eq!(kind_of(Type::Video), TrackKind::Video);
        assert_eq!(kind_of(Type::Audio), TrackKind::Audio);
        assert_eq!(kind_of(Type::Attachment), TrackKind::Other);
    }

    #[test]
    fn missing_file_is_an_error() {
        let _ = ffmpeg::init();
        let err = FfmpegProbe::new()
            .load_tracks(Path::new("/definitely/not/here.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("open failed"));
    }
}
