// crates/stitch-media/src/workflow.rs
//
// The controller workflow, run once per window on a background thread:
//
//   resolve directory → copy samples → build or load timeline
//
// Each stage waits for the previous one. A single CancelToken covers the
// whole run and is checked at every stage boundary (and inside the stages,
// per file). Results reach the UI as WorkflowEvents; the one top-level
// handler in spawn_workflow turns errors into a FailureNotice, or into a
// silent Cancelled, and never takes the process down.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use stitch_core::latch::{CancelToken, Readiness};
use stitch_core::settings::SettingsStore;
use stitch_core::state::{FailureNotice, Stage};
use stitch_core::timeline::Timeline;
use stitch_core::WorkflowError;

use crate::composer::{build_or_load_timeline, BuildOptions, BuildOutcome, TimelineCache};
use crate::copier::{copy_samples, CopyReport, SampleBundle};
use crate::directory::{resolve_directory, FolderPicker};
use crate::probe::MediaProbe;

pub struct WorkflowDeps {
    pub store:     Arc<dyn SettingsStore>,
    pub picker:    Arc<dyn FolderPicker>,
    pub probe:     Arc<dyn MediaProbe>,
    pub readiness: Readiness,
    pub bundle:    SampleBundle,
    pub options:   BuildOptions,
}

#[derive(Debug)]
pub enum WorkflowEvent {
    Stage(Stage),
    Copied(CopyReport),
    TimelineReady { timeline: Timeline, from_cache: bool },
    Failed(FailureNotice),
    Cancelled,
}

/// Runs every stage on the calling thread. `events` receives a `Stage` event
/// as each stage begins, plus the copy report.
pub fn run_workflow(
    deps:   &WorkflowDeps,
    cancel: &CancelToken,
    events: &Sender<WorkflowEvent>,
) -> Result<BuildOutcome, WorkflowError> {
    let emit = |e: WorkflowEvent| { let _ = events.send(e); };

    emit(WorkflowEvent::Stage(Stage::ResolvingDirectory));
    let dir = resolve_directory(deps.store.as_ref(), deps.picker.as_ref(), &deps.readiness, cancel)?;
    cancel.check()?;

    emit(WorkflowEvent::Stage(Stage::CopyingSamples));
    let report = copy_samples(&dir, &deps.bundle, cancel)?;
    tracing::info!("[workflow] samples: {} copied, {} already present", report.copied.len(), report.skipped.len());
    emit(WorkflowEvent::Copied(report));
    cancel.check()?;

    emit(WorkflowEvent::Stage(Stage::BuildingOrLoadingTimeline));
    let cache = TimelineCache::new(deps.store.as_ref(), deps.options.cache);
    let outcome = build_or_load_timeline(&dir, &cache, deps.probe.as_ref(), &deps.options, cancel)?;
    cancel.check()?;

    Ok(outcome)
}

pub struct WorkflowHandle {
    pub events: Receiver<WorkflowEvent>,
    cancel:     CancelToken,
    thread:     Option<JoinHandle<()>>,
}

impl WorkflowHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Waits for the workflow thread to exit.
    pub fn join(mut self) {
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for WorkflowHandle {
    fn drop(&mut self) {
        // Dropping the controller cancels its workflow. The thread is not
        // joined here: it may be parked in an FFmpeg call and will exit at
        // its next checkpoint.
        self.cancel.cancel();
    }
}

pub fn spawn_workflow(deps: WorkflowDeps) -> WorkflowHandle {
    let (tx, events) = unbounded();
    let cancel = CancelToken::new();
    let token = cancel.clone();

    let spawned = thread::Builder::new()
        .name("stitch-workflow".into())
        .spawn(move || {
            let result = run_workflow(&deps, &token, &tx);
            let _ = tx.send(into_event(result));
        });

    let thread = match spawned {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::error!("[workflow] could not start: {e}");
            None
        }
    };

    WorkflowHandle { events, cancel, thread }
}

fn into_event(result: Result<BuildOutcome, WorkflowError>) -> WorkflowEvent {
    match result {
        Ok(outcome) => WorkflowEvent::TimelineReady {
            timeline:   outcome.timeline,
            from_cache: outcome.from_cache,
        },
        Err(e) => match e.notice() {
            Some(notice) => {
                tracing::error!("[workflow] failed: {e}");
                WorkflowEvent::Failed(notice)
            }
            None => {
                tracing::info!("[workflow] cancelled");
                WorkflowEvent::Cancelled
            }
        },
    }
}
