// crates/stitch-core/src/lib.rs
//
// Plain data and policies shared by stitch-media and stitch-ui.
// No egui, no ffmpeg, no threads of its own.

pub mod config;
pub mod error;
pub mod helpers;
pub mod latch;
pub mod media_types;
pub mod settings;
pub mod state;
pub mod timeline;

pub use error::{ErrorKind, WorkflowError};
pub use latch::{CancelToken, Latch, Readiness};
pub use settings::SettingsStore;
pub use timeline::{Segment, TimeRange, Timeline};
