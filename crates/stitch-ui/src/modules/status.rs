// crates/stitch-ui/src/modules/status.rs
//
// Centered card shown over the player while the workflow runs, after it
// fails, or after it is cancelled. Hidden while playing.

use egui::{Align2, RichText};

use stitch_core::state::Stage;

use crate::theme::{ACCENT, DARK_BG_2, DARK_BORDER, DARK_TEXT_DIM, ERROR};

pub enum StatusAction {
    /// Forget the folder and run the workflow again.
    ChooseAnotherFolder,
}

pub fn show(ctx: &egui::Context, stage: &Stage) -> Option<StatusAction> {
    if matches!(stage, Stage::Playing) {
        return None;
    }

    let mut action = None;
    egui::Area::new(egui::Id::new("status_overlay"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Frame::new()
                .fill(DARK_BG_2)
                .stroke(egui::Stroke::new(1.0, DARK_BORDER))
                .corner_radius(egui::CornerRadius::same(6))
                .inner_margin(egui::Margin::same(16))
                .show(ui, |ui| {
                    ui.set_max_width(420.0);
                    match stage {
                        Stage::Failed(notice) => {
                            ui.label(RichText::new(stage.label()).size(16.0).strong().color(ERROR));
                            ui.add_space(4.0);
                            ui.label(RichText::new(&notice.message).color(DARK_TEXT_DIM));
                            if notice.can_retry {
                                ui.add_space(10.0);
                                if ui.button(RichText::new("Choose another folder").color(ACCENT)).clicked() {
                                    action = Some(StatusAction::ChooseAnotherFolder);
                                }
                            }
                        }
                        Stage::Cancelled => {
                            ui.label(RichText::new(stage.label()).size(16.0).color(DARK_TEXT_DIM));
                        }
                        _ => {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(RichText::new(stage.label()).size(14.0));
                            });
                        }
                    }
                });
        });
    action
}
