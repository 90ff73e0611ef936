// crates/stitch-media/src/picker.rs
//
// Folder prompts that must run on the UI thread.
//
// The workflow thread holds a ChannelPicker; the UI thread holds the matching
// PromptServer and calls serve() once per frame. A prompt travels as a
// PromptRequest carrying its own one-shot reply channel. If the workflow is
// cancelled while a prompt is outstanding, the waiting side marks the request
// abandoned and releases its guard; the UI skips abandoned requests and a
// late answer lands in a channel nobody reads.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};

use stitch_core::latch::CancelToken;

use crate::directory::{FolderPicker, PickOutcome};

pub const PROMPT_TITLE: &str = "Resources will be copied here.";

pub struct PromptRequest {
    pub title: &'static str,
    reply:     Sender<Option<PathBuf>>,
    abandoned: Arc<AtomicBool>,
}

impl PromptRequest {
    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct PromptCounters {
    outstanding: AtomicUsize,
    released:    AtomicUsize,
}

/// Held by the waiting side for the lifetime of one prompt.
struct PromptGuard {
    counters:  Arc<PromptCounters>,
    abandoned: Arc<AtomicBool>,
    answered:  bool,
}

impl Drop for PromptGuard {
    fn drop(&mut self) {
        if !self.answered {
            self.abandoned.store(true, Ordering::SeqCst);
        }
        self.counters.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct ChannelPicker {
    tx:       Sender<PromptRequest>,
    counters: Arc<PromptCounters>,
}

pub struct PromptServer {
    rx: Receiver<PromptRequest>,
}

pub fn prompt_channel() -> (ChannelPicker, PromptServer) {
    let (tx, rx) = unbounded();
    (
        ChannelPicker { tx, counters: Arc::new(PromptCounters::default()) },
        PromptServer { rx },
    )
}

impl ChannelPicker {
    /// Prompts currently waiting for an answer.
    pub fn outstanding(&self) -> usize {
        self.counters.outstanding.load(Ordering::SeqCst)
    }

    /// Prompts whose guard has been released, answered or not.
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }
}

impl FolderPicker for ChannelPicker {
    fn pick(&self, cancel: &CancelToken) -> PickOutcome {
        let (reply_tx, reply_rx) = bounded(1);
        let abandoned = Arc::new(AtomicBool::new(false));

        self.counters.outstanding.fetch_add(1, Ordering::SeqCst);
        let mut guard = PromptGuard {
            counters:  Arc::clone(&self.counters),
            abandoned: Arc::clone(&abandoned),
            answered:  false,
        };

        let request = PromptRequest { title: PROMPT_TITLE, reply: reply_tx, abandoned };
        if self.tx.send(request).is_err() {
            // UI side is gone; nobody can answer.
            return PickOutcome::Cancelled;
        }

        let cancelled = cancel.waiter();
        select! {
            recv(cancelled) -> _ => PickOutcome::Cancelled,
            recv(reply_rx) -> answer => {
                guard.answered = true;
                // select! picks at random when both are ready; a cancelled
                // pick must never hand back a folder.
                if cancel.is_cancelled() {
                    return PickOutcome::Cancelled;
                }
                match answer {
                    Ok(Some(path)) => PickOutcome::Chosen(path),
                    Ok(None)       => PickOutcome::Dismissed,
                    Err(_)         => PickOutcome::Cancelled,
                }
            }
        }
    }
}

impl PromptServer {
    /// Answers every pending, non-abandoned prompt with `ask`. Call from the
    /// UI thread. Returns how many prompts were shown.
    pub fn serve(&self, mut ask: impl FnMut(&str) -> Option<PathBuf>) -> usize {
        let mut shown = 0;
        while let Ok(request) = self.rx.try_recv() {
            if request.is_abandoned() {
                tracing::debug!("[picker] dropping abandoned prompt");
                continue;
            }
            shown += 1;
            let answer = ask(request.title);
            let _ = request.reply.send(answer);
        }
        shown
    }

    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }
}
