// crates/stitch-core/src/state.rs
//
// The controller's state machine. One workflow instance walks the chain
//
//   Idle → ResolvingDirectory → CopyingSamples → BuildingOrLoadingTimeline → Playing
//
// once, forward only. Any live stage can end in Failed or Cancelled.

use crate::error::ErrorKind;

/// What the user sees when a stage fails.
#[derive(Clone, Debug, PartialEq)]
pub struct FailureNotice {
    pub kind:      ErrorKind,
    pub message:   String,
    /// Offer "choose another folder".
    pub can_retry: bool,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Stage {
    #[default]
    Idle,
    ResolvingDirectory,
    CopyingSamples,
    BuildingOrLoadingTimeline,
    Playing,
    Failed(FailureNotice),
    Cancelled,
}

impl Stage {
    fn ordinal(&self) -> Option<u8> {
        match self {
            Stage::Idle                      => Some(0),
            Stage::ResolvingDirectory        => Some(1),
            Stage::CopyingSamples            => Some(2),
            Stage::BuildingOrLoadingTimeline => Some(3),
            Stage::Playing                   => Some(4),
            Stage::Failed(_) | Stage::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Playing | Stage::Failed(_) | Stage::Cancelled)
    }

    pub fn can_advance_to(&self, next: &Stage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.ordinal(), next.ordinal()) {
            (Some(cur), Some(n)) => n == cur + 1,
            // Failure and cancellation are reachable from any live stage.
            (Some(_), None)      => true,
            (None, _)            => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Idle                      => "Starting…",
            Stage::ResolvingDirectory        => "Choose a folder for the sample videos",
            Stage::CopyingSamples            => "Copying sample videos…",
            Stage::BuildingOrLoadingTimeline => "Building timeline…",
            Stage::Playing                   => "Playing",
            Stage::Failed(_)                 => "Something went wrong",
            Stage::Cancelled                 => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_only_moves_forward_one_step() {
        assert!(Stage::Idle.can_advance_to(&Stage::ResolvingDirectory));
        assert!(Stage::ResolvingDirectory.can_advance_to(&Stage::CopyingSamples));
        assert!(Stage::CopyingSamples.can_advance_to(&Stage::BuildingOrLoadingTimeline));
        assert!(Stage::BuildingOrLoadingTimeline.can_advance_to(&Stage::Playing));

        assert!(!Stage::Idle.can_advance_to(&Stage::CopyingSamples));
        assert!(!Stage::CopyingSamples.can_advance_to(&Stage::ResolvingDirectory));
    }

    #[test]
    fn terminal_stages_stay_put() {
        let failed = Stage::Failed(FailureNotice {
            kind: ErrorKind::Filesystem, message: "x".into(), can_retry: true,
        });
        assert!(Stage::CopyingSamples.can_advance_to(&failed));
        assert!(Stage::ResolvingDirectory.can_advance_to(&Stage::Cancelled));
        assert!(!failed.can_advance_to(&Stage::Idle));
        assert!(!Stage::Playing.can_advance_to(&Stage::Cancelled));
        assert!(!Stage::Cancelled.can_advance_to(&Stage::ResolvingDirectory));
    }
}
