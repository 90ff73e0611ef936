// crates/stitch-ui/src/app.rs
//
// StitchApp: the controller. Owns the runtime context, the current Stage and
// the view modules. Every frame it
//   1. signals readiness (the window exists once update() runs),
//   2. answers folder prompts from the workflow,
//   3. drains workflow events into the Stage,
//   4. draws the player and the status overlay.

use std::time::Duration;

use eframe::egui;

use stitch_core::helpers::time::format_secs;
use stitch_core::state::Stage;
use stitch_media::WorkflowEvent;

use crate::context::AppContext;
use crate::modules::player_view::PlayerView;
use crate::modules::status::{self, StatusAction};
use crate::paths;
use crate::picker;
use crate::theme::configure_style;

/// How often to wake up and poll the workflow while nothing is animating.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct StitchApp {
    context: AppContext,
    stage:   Stage,
    player:  PlayerView,
}

impl StitchApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        configure_style(&cc.egui_ctx);
        // Pin to dark mode so OS theme changes don't overwrite ours.
        cc.egui_ctx.options_mut(|o| {
            o.theme_preference = egui::ThemePreference::Dark;
        });

        let mut context = AppContext::from_data_dir(&paths::app_data_dir());
        context.start_workflow();

        Self { context, stage: Stage::Idle, player: PlayerView::new() }
    }

    fn advance(&mut self, next: Stage) {
        if !self.stage.can_advance_to(&next) {
            tracing::warn!("[app] unexpected transition {:?} → {:?}", self.stage, next);
        }
        tracing::info!("[app] stage: {}", next.label());
        self.stage = next;
    }

    fn poll_workflow(&mut self) {
        let events: Vec<WorkflowEvent> = match &self.context.workflow {
            Some(w) => w.events.try_iter().collect(),
            None    => return,
        };

        for event in events {
            match event {
                WorkflowEvent::Stage(stage) => self.advance(stage),
                WorkflowEvent::Copied(report) => {
                    tracing::debug!("[app] copied {:?}, kept {:?}", report.copied, report.skipped);
                }
                WorkflowEvent::TimelineReady { timeline, from_cache } => {
                    tracing::info!(
                        "[app] timeline ready: {} segments, {} ({})",
                        timeline.segments.len(),
                        format_secs(timeline.duration_us()),
                        if from_cache { "cached" } else { "built" },
                    );
                    self.player.reset();
                    self.context.start_playback(timeline);
                    self.advance(Stage::Playing);
                }
                WorkflowEvent::Failed(notice) => self.advance(Stage::Failed(notice)),
                WorkflowEvent::Cancelled      => self.advance(Stage::Cancelled),
            }
        }
    }

    fn handle(&mut self, action: StatusAction) {
        match action {
            StatusAction::ChooseAnotherFolder => {
                if let Err(e) = self.context.forget_directory() {
                    tracing::error!("[app] could not forget the folder: {e}");
                    if let Some(notice) = e.notice() {
                        self.stage = Stage::Failed(notice);
                    }
                    return;
                }
                self.player.reset();
                self.stage = Stage::Idle;
                self.context.start_workflow();
            }
        }
    }
}

// ── eframe::App ───────────────────────────────────────────────────────────────

impl eframe::App for StitchApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        tracing::info!("[app] exiting");
        self.context.shutdown();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.context.readiness.signal();
        picker::serve_prompts(&self.context.prompts);
        self.poll_workflow();

        if let Some(session) = &self.context.playback {
            self.player.tick(session, ctx);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                if let Some(session) = &self.context.playback {
                    self.player.ui(ui, session);
                }
            });

        if let Some(action) = status::show(ctx, &self.stage) {
            self.handle(action);
        }

        if !self.stage.is_terminal() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}
