//! Per-exchange completion tracking.
//!
//! An exchange is armed when it enters the pipeline and finalized exactly once, by
//! whichever of the completion signals gets to the guard first:
//!
//! - [`Trigger::Finish`] - the response was fully produced
//! - [`Trigger::Close`] - the response was dropped before completing
//! - [`Trigger::Error`] - the handler or response body failed
//! - [`Trigger::Timeout`] - nothing else fired within the force-log window
//! - [`Trigger::Manual`] - a handler called [`FinalizeHandle::finalize`]
//!
//! Every trigger after the first is a no-op.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Signal that finalized an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Finish,
    Close,
    Error,
    Timeout,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Finish => "finish",
            Trigger::Close => "close",
            Trigger::Error => "error",
            Trigger::Timeout => "timeout",
            Trigger::Manual => "manual",
        };
        f.write_str(s)
    }
}

type FinalizeFn = Box<dyn FnOnce(Trigger) + Send>;

struct TrackerState {
    finalized: AtomicBool,
    on_finalize: Mutex<Option<FinalizeFn>>,
    timeout: Mutex<Option<JoinHandle<()>>>,
}

/// ARMED -> FINALIZED state machine for one exchange.
#[derive(Clone)]
pub struct CompletionTracker {
    state: Arc<TrackerState>,
}

impl CompletionTracker {
    /// Arm a tracker that calls `on_finalize` once.
    ///
    /// The timeout task needs a tokio runtime. Outside of one the tracker is armed
    /// without a timeout and only the other triggers can finalize it.
    pub fn arm<F>(force_after: Duration, on_finalize: F) -> Self
    where
        F: FnOnce(Trigger) + Send + 'static,
    {
        let tracker = Self {
            state: Arc::new(TrackerState {
                finalized: AtomicBool::new(false),
                on_finalize: Mutex::new(Some(Box::new(on_finalize))),
                timeout: Mutex::new(None),
            }),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let timer = tracker.clone();
                let task = runtime.spawn(async move {
                    tokio::time::sleep(force_after).await;
                    timer.finalize(Trigger::Timeout);
                });
                tracker.store_timeout(task);
            }
            Err(_) => {
                warn!("no tokio runtime, access log timeout backstop disabled");
            }
        }

        tracker
    }

    fn store_timeout(&self, task: JoinHandle<()>) {
        if let Ok(mut slot) = self.state.timeout.lock() {
            *slot = Some(task);
        }
        // Finalized between spawn and store
        if self.is_finalized() {
            self.cancel_timeout();
        }
    }

    fn cancel_timeout(&self) {
        let task = self.state.timeout.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            task.abort();
        }
    }

    /// Attempt the transition to FINALIZED. Returns `true` only for the call that won.
    pub fn finalize(&self, trigger: Trigger) -> bool {
        if self
            .state
            .finalized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if trigger == Trigger::Timeout {
            // The running timer is the caller; just release its handle
            if let Ok(mut slot) = self.state.timeout.lock() {
                slot.take();
            }
        } else {
            self.cancel_timeout();
        }

        let callback = self
            .state
            .on_finalize
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());

        debug!(%trigger, "exchange finalized");
        if let Some(callback) = callback {
            callback(trigger);
        }
        true
    }

    pub fn is_finalized(&self) -> bool {
        self.state.finalized.load(Ordering::Acquire)
    }

    /// Capability handed to handlers for early finalization.
    pub fn handle(&self) -> FinalizeHandle {
        FinalizeHandle {
            tracker: self.clone(),
        }
    }
}

impl fmt::Debug for CompletionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionTracker")
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

/// Lets a cooperating handler (a long-lived upgraded connection, say) finalize its
/// exchange before the response completes.
#[derive(Clone, Debug)]
pub struct FinalizeHandle {
    tracker: CompletionTracker,
}

impl FinalizeHandle {
    /// Finalize now. Returns `false` if the exchange was already finalized.
    pub fn finalize(&self) -> bool {
        self.tracker.finalize(Trigger::Manual)
    }

    pub fn is_finalized(&self) -> bool {
        self.tracker.is_finalized()
    }
}
