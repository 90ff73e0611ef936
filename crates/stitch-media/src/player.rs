// crates/stitch-media/src/player.rs
//
// PlaybackSession: a decode thread bound to one Timeline. It walks the
// segments in order, decodes each one through a SegmentDecoder, and pushes
// frames stamped with *timeline* time into a bounded channel. A full channel
// blocks the thread, which is the rate limiter; the UI pulls frames when
// their timestamp is due.
//
// Created fresh each run, never persisted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};

use stitch_core::media_types::PlaybackFrame;
use stitch_core::timeline::Timeline;

use crate::decode::SegmentDecoder;

/// ~1 s of lookahead at 30 fps.
const FRAME_QUEUE: usize = 32;

enum PlaybackCmd {
    /// Decode from timeline position `at_us`.
    Start { at_us: i64 },
    Stop,
}

pub struct PlaybackSession {
    pub frames: Receiver<PlaybackFrame>,
    cmd_tx:     Sender<PlaybackCmd>,
    timeline:   Arc<Timeline>,
    /// Set once the decode thread has queued the last frame of the timeline.
    finished:   Arc<AtomicBool>,
    shutdown:   Arc<AtomicBool>,
}

impl PlaybackSession {
    /// Spawns the decode thread and starts decoding at the beginning.
    pub fn start(timeline: Timeline) -> Self {
        let timeline = Arc::new(timeline);
        let (cmd_tx, cmd_rx)     = bounded::<PlaybackCmd>(4);
        let (frame_tx, frames)   = bounded::<PlaybackFrame>(FRAME_QUEUE);
        let finished             = Arc::new(AtomicBool::new(false));
        let shutdown             = Arc::new(AtomicBool::new(false));

        let tl = Arc::clone(&timeline);
        let fin = Arc::clone(&finished);
        let sd = Arc::clone(&shutdown);
        let spawned = thread::Builder::new()
            .name("stitch-playback".into())
            .spawn(move || playback_loop(&tl, cmd_rx, frame_tx, &fin, &sd));
        if let Err(e) = spawned {
            tracing::error!("[pb] could not start playback thread: {e}");
        }

        let session = Self { frames, cmd_tx, timeline, finished, shutdown };
        session.send(PlaybackCmd::Start { at_us: 0 });
        session
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// True once every frame of the timeline has been queued.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Throws away queued frames and decodes again from the beginning.
    pub fn restart(&self) {
        self.finished.store(false, Ordering::Release);
        while self.frames.try_recv().is_ok() {}
        self.send(PlaybackCmd::Start { at_us: 0 });
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.send(PlaybackCmd::Stop);
        // Unblock a send() stuck on a full queue.
        while self.frames.try_recv().is_ok() {}
    }

    fn send(&self, cmd: PlaybackCmd) {
        let _ = self.cmd_tx.try_send(cmd);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Decode thread ─────────────────────────────────────────────────────────────

struct Cursor {
    segment: usize,
    decoder: Option<SegmentDecoder>,
    /// Timeline position the first frame must not precede.
    from_us: i64,
}

fn playback_loop(
    timeline: &Timeline,
    cmd_rx:   Receiver<PlaybackCmd>,
    frame_tx: Sender<PlaybackFrame>,
    finished: &AtomicBool,
    shutdown: &AtomicBool,
) {
    let placements: Vec<(i64, usize)> = timeline.placements()
        .enumerate()
        .map(|(i, (start, _))| (start, i))
        .collect();
    let mut cursor: Option<Cursor> = None;

    loop {
        if shutdown.load(Ordering::Relaxed) { return; }

        let Some(cur) = cursor.as_mut() else {
            // Idle: block until told to start.
            match cmd_rx.recv() {
                Ok(PlaybackCmd::Start { at_us }) => cursor = seek(timeline, at_us),
                Ok(PlaybackCmd::Stop) => {}
                Err(_) => return,
            }
            continue;
        };

        match cmd_rx.try_recv() {
            Ok(PlaybackCmd::Start { at_us }) => { cursor = seek(timeline, at_us); continue; }
            Ok(PlaybackCmd::Stop) => { cursor = None; continue; }
            Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => {}
        }

        let Some(&(seg_start, seg_idx)) = placements.get(cur.segment) else {
            tracing::info!("[pb] end of timeline");
            finished.store(true, Ordering::Release);
            cursor = None;
            continue;
        };
        let segment = &timeline.segments[seg_idx];

        if cur.decoder.is_none() {
            let path = timeline.source_path(segment);
            match SegmentDecoder::open(&path, segment.track_index, segment.source_range, timeline.canvas) {
                Ok(d) => {
                    tracing::debug!("[pb] segment {} ← {}", cur.segment, path.display());
                    cur.decoder = Some(d);
                }
                Err(e) => {
                    tracing::warn!("[pb] cannot open {}: {e}; skipping segment", path.display());
                    cur.segment += 1;
                    continue;
                }
            }
        }

        let next = cur.decoder.as_mut().and_then(|d| d.next_frame());
        match next {
            Some(frame) => {
                let timestamp_us = seg_start + (frame.source_us - segment.source_range.start_us);
                if timestamp_us < cur.from_us { continue; }
                let f = PlaybackFrame {
                    segment: segment.id,
                    timestamp_us,
                    width:  frame.width,
                    height: frame.height,
                    data:   frame.data,
                };
                // Blocks while the queue is full; a Stop/Start arriving
                // meanwhile is picked up after this frame is taken.
                select! {
                    send(frame_tx, f) -> res => {
                        if res.is_err() { return; }
                    }
                    recv(cmd_rx) -> cmd => {
                        match cmd {
                            Ok(PlaybackCmd::Start { at_us }) => cursor = seek(timeline, at_us),
                            Ok(PlaybackCmd::Stop) => cursor = None,
                            Err(_) => return,
                        }
                    }
                }
            }
            None => {
                cur.decoder = None;
                cur.segment += 1;
            }
        }
    }
}

fn seek(timeline: &Timeline, at_us: i64) -> Option<Cursor> {
    let at_us = at_us.clamp(0, timeline.duration_us());
    // Past the end means "nothing left to play".
    let segment = timeline.segment_at(at_us).unwrap_or(timeline.segments.len());
    Some(Cursor { segment, decoder: None, from_us: at_us })
}
