// crates/stitch-media/src/lib.rs
//
// Filesystem and FFmpeg side of Stitch. No egui dependency: stitch-ui
// talks to this crate through the workflow event channel, the prompt
// channel and the playback frame channel only.

pub mod composer;
pub mod copier;
pub mod decode;
pub mod directory;
pub mod picker;
pub mod player;
pub mod probe;
pub mod workflow;

pub use composer::{build_or_load_timeline, BuildOptions, BuildOutcome, TimelineCache};
pub use copier::{copy_samples, CopyReport, SampleBundle};
pub use directory::{resolve_directory, DirectoryHandle, FolderPicker, PickOutcome};
pub use picker::{prompt_channel, ChannelPicker, PromptServer};
pub use player::PlaybackSession;
pub use probe::{FfmpegProbe, MediaProbe};
pub use workflow::{run_workflow, spawn_workflow, WorkflowDeps, WorkflowEvent, WorkflowHandle};
