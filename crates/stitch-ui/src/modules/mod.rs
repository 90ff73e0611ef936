// crates/stitch-ui/src/modules/mod.rs
//
// View modules. The player fills the central panel; the status overlay floats
// above it while the workflow runs or after it fails.

pub mod player_view;
pub mod status;
