// crates/stitch-ui/src/modules/player_view.rs
//
// The player: one texture filling the window's content area, fed by the
// PlaybackSession's frame channel and paced by a wall clock.
//
// Frames arrive stamped with timeline time. FrameGate holds at most one
// pending frame and releases it only once the clock reaches its timestamp,
// so the decode thread can run ahead without the picture racing ahead of
// real time. The clock does not start until the first frame is on screen.

use crossbeam_channel::Receiver;
use egui::{Align, Color32, Layout, Pos2, Rect, RichText, TextureHandle, TextureOptions, Ui, Vec2};

use stitch_core::helpers::time::format_timecode;
use stitch_core::media_types::PlaybackFrame;
use stitch_media::PlaybackSession;

use crate::theme::{ACCENT, DARK_TEXT_DIM, OVERLAY_BG};

/// One frame at 30 fps; frames older than this behind the clock are skipped.
const LATE_US:  i64 = 33_333;
/// A frame may go up one 60 Hz tick early.
const EARLY_US: i64 = 16_667;

const BAR_H: f32 = 44.0;

// ── FrameGate ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FrameGate {
    pending: Option<PlaybackFrame>,
}

impl FrameGate {
    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// The frame to show at `clock_us`, if one is due.
    pub fn poll(&mut self, frames: &Receiver<PlaybackFrame>, clock_us: i64) -> Option<PlaybackFrame> {
        // Step 1: fill the slot.
        if self.pending.is_none() {
            self.pending = frames.try_recv().ok();
        }

        // Step 2: fast-forward past frames that are already late.
        while self.pending.as_ref().is_some_and(|f| f.timestamp_us < clock_us - LATE_US) {
            match frames.try_recv() {
                Ok(newer) => self.pending = Some(newer),
                Err(_)    => break,
            }
        }

        // Step 3: release when due, and pre-pull the next one.
        let due = self.pending.as_ref().is_some_and(|f| f.timestamp_us <= clock_us + EARLY_US);
        if !due {
            return None;
        }
        let frame = self.pending.take();
        self.pending = frames.try_recv().ok();
        frame
    }
}

/// Largest rect with `size`'s aspect ratio centred inside `outer`.
pub fn fit_rect(outer: Rect, size: Vec2) -> Rect {
    if size.x <= 0.0 || size.y <= 0.0 {
        return outer;
    }
    let scale = (outer.width() / size.x).min(outer.height() / size.y);
    Rect::from_center_size(outer.center(), size * scale)
}

// ── PlayerView ────────────────────────────────────────────────────────────────

pub struct PlayerView {
    gate:     FrameGate,
    texture:  Option<TextureHandle>,
    clock_us: i64,
    playing:  bool,
    /// Set once the first frame has been uploaded; the clock waits for it.
    started:  bool,
}

impl Default for PlayerView {
    fn default() -> Self {
        Self { gate: FrameGate::default(), texture: None, clock_us: 0, playing: true, started: false }
    }
}

impl PlayerView {
    pub fn new() -> Self { Self::default() }

    /// Back to an empty, auto-playing view for a new session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Pulls due frames and advances the clock. Call every frame before ui().
    pub fn tick(&mut self, session: &PlaybackSession, ctx: &egui::Context) {
        if let Some(f) = self.gate.poll(&session.frames, self.clock_us) {
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [f.width as usize, f.height as usize], &f.data,
            );
            if let Some(tex) = self.texture.as_mut() {
                tex.set(image, TextureOptions::LINEAR);
            } else {
                self.texture = Some(ctx.load_texture("stitch-frame", image, TextureOptions::LINEAR));
            }
            self.started = true;
        }

        let drained = session.is_finished() && self.gate.is_empty() && session.frames.is_empty();
        if self.playing && drained {
            if self.started {
                tracing::info!("[player] reached the end");
                self.clock_us = self.clock_us.max(session.timeline().duration_us());
            } else {
                tracing::warn!("[player] timeline produced no frames");
            }
            self.playing = false;
        }

        if self.playing {
            if self.started {
                let dt = ctx.input(|i| i.stable_dt as f64);
                self.clock_us += (dt * 1_000_000.0) as i64;
            }
            ctx.request_repaint();
        }
    }

    fn toggle(&mut self, session: &PlaybackSession) {
        if self.playing {
            self.playing = false;
            return;
        }
        if session.is_finished() && self.gate.is_empty() && session.frames.is_empty() {
            session.restart();
            self.gate.clear();
            self.clock_us = 0;
            self.started  = false;
        }
        self.playing = true;
    }

    pub fn ui(&mut self, ui: &mut Ui, session: &PlaybackSession) {
        let rect = ui.max_rect();
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::BLACK);

        if let Some(tex) = &self.texture {
            painter.image(
                tex.id(),
                fit_rect(rect, tex.size_vec2()),
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if ui.input(|i| i.key_pressed(egui::Key::Space)) {
            self.toggle(session);
        }

        // Transport shows while paused or under the pointer.
        if !self.playing || ui.rect_contains_pointer(rect) {
            self.transport(ui, rect, session);
        }
    }

    fn transport(&mut self, ui: &mut Ui, rect: Rect, session: &PlaybackSession) {
        let total = session.timeline().duration_us();
        let bar = Rect::from_min_max(Pos2::new(rect.left(), rect.bottom() - BAR_H), rect.max).shrink(6.0);
        let mut child = ui.new_child(egui::UiBuilder::new()
            .max_rect(bar)
            .layout(Layout::left_to_right(Align::Center)));

        egui::Frame::new()
            .fill(OVERLAY_BG)
            .corner_radius(egui::CornerRadius::same(6))
            .inner_margin(egui::Margin::symmetric(8, 4))
            .show(&mut child, |ui| {
                ui.horizontal(|ui| {
                    let icon = if self.playing { "⏸" } else { "▶" };
                    if ui.button(RichText::new(icon).size(16.0).color(ACCENT)).clicked() {
                        self.toggle(session);
                    }
                    ui.add_space(8.0);
                    let shown = self.clock_us.min(total);
                    ui.label(
                        RichText::new(format!("{} / {}", format_timecode(shown), format_timecode(total)))
                            .monospace()
                            .color(DARK_TEXT_DIM),
                    );
                });
            });
    }
}
