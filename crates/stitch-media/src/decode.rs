// crates/stitch-media/src/decode.rs
//
// SegmentDecoder: stateful decoder for one timeline segment. Opens the
// segment's source, seeks near the start of its range, and hands back RGBA
// frames scaled to fit the timeline canvas until the range is exhausted.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};

use stitch_core::timeline::TimeRange;

use crate::probe::{from_micros, to_micros};

pub struct DecodedFrame {
    pub data:      Vec<u8>, // RGBA, tightly packed
    pub width:     u32,
    pub height:    u32,
    /// Presentation time inside the source file.
    pub source_us: i64,
}

pub struct SegmentDecoder {
    pub path:   PathBuf,
    ictx:       ffmpeg::format::context::Input,
    decoder:    ffmpeg::decoder::video::Video,
    stream_idx: usize,
    tb_num:     i32,
    tb_den:     i32,
    range:      TimeRange,
    last_pts:   i64,
    out_w:      u32,
    out_h:      u32,
    scaler:     SwsContext,
    /// EOF has been sent; only frames still buffered in the decoder remain.
    flushing:   bool,
}

/// Where a decoded frame falls relative to the segment's source range.
#[derive(Debug, PartialEq, Eq)]
enum Placement {
    Before,
    Inside,
    After,
}

fn place(source_us: i64, range: &TimeRange) -> Placement {
    if source_us < range.start_us {
        Placement::Before
    } else if source_us >= range.end_us() {
        Placement::After
    } else {
        Placement::Inside
    }
}

/// Largest even-sized box with the source aspect that fits inside `canvas`.
pub fn fit_within(src: (u32, u32), canvas: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (src.0.max(1) as f64, src.1.max(1) as f64);
    let (cw, ch) = (canvas.0.max(2) as f64, canvas.1.max(2) as f64);
    let scale = (cw / sw).min(ch / sh);
    let w = ((sw * scale).round() as u32).max(2) & !1;
    let h = ((sh * scale).round() as u32).max(2) & !1;
    (w, h)
}

impl SegmentDecoder {
    pub fn open(path: &Path, stream_idx: usize, range: TimeRange, canvas: (u32, u32)) -> Result<Self> {
        let mut ictx = ffmpeg::format::input(path)?;

        // Second context for decoder params (avoids borrow conflict with ictx).
        let ictx2  = ffmpeg::format::input(path)?;
        let stream = ictx2.stream(stream_idx)
            .ok_or_else(|| anyhow!("stream {stream_idx} missing in {}", path.display()))?;
        let tb = stream.time_base();
        let (tb_num, tb_den) = (tb.numerator(), tb.denominator());
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = dec_ctx.decoder().video()?;

        let seek_ts = from_micros(range.start_us, tb_num, tb_den);
        if range.start_us > 0 {
            // Container-level seek lands on the keyframe at or before the start;
            // next_frame() discards everything before the range.
            let global = range.start_us * ffmpeg::ffi::AV_TIME_BASE as i64 / 1_000_000;
            let _ = ictx.seek(global, ..=global);
        }

        let (out_w, out_h) = fit_within((decoder.width(), decoder.height()), canvas);
        let scaler = SwsContext::get(
            decoder.format(), decoder.width(), decoder.height(),
            Pixel::RGBA, out_w, out_h, Flags::BILINEAR,
        )?;

        Ok(Self {
            path: path.to_path_buf(), ictx, decoder, stream_idx,
            tb_num, tb_den, range, last_pts: seek_ts, out_w, out_h, scaler,
            flushing: false,
        })
    }

    /// Next frame inside the segment's range, or None once the range (or the
    /// file) is exhausted.
    pub fn next_frame(&mut self) -> Option<DecodedFrame> {
        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        loop {
            // Drain what the decoder already holds before feeding it more.
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded.pts().unwrap_or(self.last_pts + 1);
                self.last_pts = pts;
                let source_us = to_micros(pts, self.tb_num, self.tb_den);

                match place(source_us, &self.range) {
                    Placement::Before => continue,
                    Placement::After  => return None,
                    Placement::Inside => return self.convert(&decoded, source_us),
                }
            }

            if self.flushing {
                return None;
            }
            match self.next_packet() {
                Some(packet) => {
                    let _ = self.decoder.send_packet(&packet);
                }
                None => {
                    // End of file: the decoder may still hold delayed frames.
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let idx = self.stream_idx;
        self.ictx.packets()
            .flatten()
            .find(|(stream, _)| stream.index() == idx)
            .map(|(_, packet)| packet)
    }

    fn convert(&mut self, decoded: &ffmpeg::util::frame::video::Video, source_us: i64) -> Option<DecodedFrame> {
        let mut out = ffmpeg::util::frame::video::Video::empty();
        self.scaler.run(decoded, &mut out).ok()?;
        let stride = out.stride(0);
        let raw    = out.data(0);
        let row    = self.out_w as usize * 4;
        let data: Vec<u8> = (0..self.out_h as usize)
            .flat_map(|y| &raw[y * stride..y * stride + row])
            .copied()
            .collect();
        Some(DecodedFrame { data, width: self.out_w, height: self.out_h, source_us })
    }
}
