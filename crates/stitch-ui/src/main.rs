#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod context;
mod helpers;
mod modules;
mod paths;
mod picker;
mod theme;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> eframe::Result {
    helpers::log::init();

    // A failed init surfaces later as a media load failure on screen, which
    // is more useful to the user than a process that never opens a window.
    if let Err(e) = ffmpeg_the_third::init() {
        tracing::error!("[main] FFmpeg init failed: {e}");
    }

    let native_options = eframe::NativeOptions {
        centered: true,
        viewport: egui::ViewportBuilder::default()
            .with_title("Stitch")
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([320.0, 180.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Stitch",
        native_options,
        Box::new(|cc| Ok(Box::new(app::StitchApp::new(cc)))),
    )
}
