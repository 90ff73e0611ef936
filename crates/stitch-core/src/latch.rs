// crates/stitch-core/src/latch.rs
//
// One-shot signals for the workflow thread.
//
// A Latch is a crossbeam channel that never carries a message: opening it
// drops the only Sender, so every Receiver handed out by waiter() becomes
// ready (Disconnected) at the same moment. That makes it usable inside
// crossbeam_channel::select! next to any other channel, which is how the
// workflow waits on "picker answered" OR "cancelled" without polling.
//
//   Latch       the primitive
//   CancelToken cancellation for the whole workflow
//   Readiness   "the window exists" signal from the UI thread

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::WorkflowError;

// ── Latch ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Latch {
    inner: Arc<LatchInner>,
}

struct LatchInner {
    open:   AtomicBool,
    sender: Mutex<Option<Sender<()>>>,
    rx:     Receiver<()>,
}

impl Latch {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(LatchInner {
                open:   AtomicBool::new(false),
                sender: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    /// Opens the latch. Returns true only for the call that actually opened it.
    pub fn open(&self) -> bool {
        let was_open = self.inner.open.swap(true, Ordering::SeqCst);
        // Dropping the sender disconnects every waiter at once.
        self.inner.sender.lock().take();
        !was_open
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// A receiver that becomes ready (with a disconnect error) once the latch opens.
    pub fn waiter(&self) -> Receiver<()> {
        self.inner.rx.clone()
    }
}

impl Default for Latch {
    fn default() -> Self { Self::new() }
}

// ── CancelToken ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct CancelToken {
    latch: Latch,
}

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) {
        if self.latch.open() {
            tracing::debug!("[cancel] workflow cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.latch.is_open()
    }

    /// Stage-boundary checkpoint.
    pub fn check(&self) -> Result<(), WorkflowError> {
        if self.is_cancelled() { Err(WorkflowError::Cancelled) } else { Ok(()) }
    }

    pub fn waiter(&self) -> Receiver<()> {
        self.latch.waiter()
    }
}

// ── Readiness ─────────────────────────────────────────────────────────────────

/// Set by the UI thread once the main window exists. The workflow must not
/// touch the picker before that.
#[derive(Clone, Default)]
pub struct Readiness {
    latch:    Latch,
    counters: Arc<ObserverCounters>,
}

#[derive(Default)]
struct ObserverCounters {
    active:   AtomicUsize,
    released: AtomicUsize,
}

/// One registered wait. Released exactly once, on drop, whatever way the
/// wait ended.
pub struct Observation {
    counters: Arc<ObserverCounters>,
}

impl Drop for Observation {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Readiness {
    pub fn new() -> Self { Self::default() }

    pub fn signal(&self) {
        if self.latch.open() {
            tracing::debug!("[ready] window attached");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.latch.is_open()
    }

    pub fn observe(&self) -> Observation {
        self.counters.active.fetch_add(1, Ordering::SeqCst);
        Observation { counters: Arc::clone(&self.counters) }
    }

    /// Blocks until the window is attached or `cancel` fires.
    pub fn wait(&self, cancel: &CancelToken) -> Result<(), WorkflowError> {
        cancel.check()?;
        if self.is_ready() {
            return Ok(());
        }
        let _observation = self.observe();
        let ready     = self.latch.waiter();
        let cancelled = cancel.waiter();
        // select! picks at random when both fire; re-checking in the ready arm
        // keeps a cancelled workflow from going on to prompt.
        select! {
            recv(cancelled) -> _ => Err(WorkflowError::Cancelled),
            recv(ready) -> _ => cancel.check(),
        }
    }

    pub fn active_observers(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    pub fn released_observers(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn open_is_idempotent() {
        let latch = Latch::new();
        assert!(!latch.is_open());
        assert!(latch.open());
        assert!(!latch.open());
        assert!(latch.is_open());
    }

    #[test]
    fn waiters_wake_when_opened() {
        let latch = Latch::new();
        let rx = latch.waiter();
        assert!(rx.try_recv().is_err());
        latch.open();
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_err());
        assert!(rx.is_empty());
        // Disconnected, not timed out.
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(10)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn cancel_check_fails_after_cancel() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        token.clone().cancel();
        assert!(matches!(token.check(), Err(WorkflowError::Cancelled)));
    }

    #[test]
    fn wait_returns_once_signalled_from_another_thread() {
        let ready = Readiness::new();
        let cancel = CancelToken::new();
        let signaller = ready.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            signaller.signal();
        });
        assert!(ready.wait(&cancel).is_ok());
        t.join().unwrap();
        assert_eq!(ready.active_observers(), 0);
        assert_eq!(ready.released_observers(), 1);
    }

    #[test]
    fn wait_after_ready_does_not_register() {
        let ready = Readiness::new();
        ready.signal();
        assert!(ready.wait(&CancelToken::new()).is_ok());
        assert_eq!(ready.released_observers(), 0);
    }

    #[test]
    fn cancelled_wait_releases_observer_once() {
        let ready = Readiness::new();
        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });
        assert!(matches!(ready.wait(&cancel), Err(WorkflowError::Cancelled)));
        t.join().unwrap();
        assert_eq!(ready.active_observers(), 0);
        assert_eq!(ready.released_observers(), 1);
    }

    #[test]
    fn cancel_then_ready_still_reports_cancelled() {
        for _ in 0..20 {
            let ready = Arc::new(Readiness::new());
            let cancel = CancelToken::new();
            let (r, c) = (Arc::clone(&ready), cancel.clone());
            let t = thread::spawn(move || {
                thread::sleep(Duration::from_millis(2));
                c.cancel();
                r.signal();
            });
            assert!(matches!(ready.wait(&cancel), Err(WorkflowError::Cancelled)));
            t.join().unwrap();
        }
    }
}
