// crates/stitch-ui/src/picker.rs
//
// The native folder dialog. rfd's dialog must run on the UI thread on macOS,
// so the workflow only ever sees a ChannelPicker; this side answers its
// prompts from update().

use stitch_media::PromptServer;

/// Shows one blocking folder dialog per pending prompt.
pub fn serve_prompts(server: &PromptServer) {
    server.serve(|title| {
        tracing::info!("[picker] asking for a folder");
        let choice = rfd::FileDialog::new().set_title(title).pick_folder();
        match &choice {
            Some(path) => tracing::info!("[picker] chose {}", path.display()),
            None       => tracing::info!("[picker] dialog dismissed"),
        }
        choice
    });
}
