use super::state::{COMPLETED, NOTIFIED, QUEUED, RUNNING, SUSPENDED};
use crate::error::{Error, Result};
use crate::pool::{panic_message, PoolCore};

use std::cell::UnsafeCell;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::task::{Context, Poll, Wake, Waker};

/// Terminal slot of a frame: empty until the body finishes, then either the
/// value or the failure it propagated.
pub(crate) enum Outcome<T> {
    Pending,
    Value(T),
    Failure(Error),
}

/// Heap frame of one suspended computation.
///
/// Holds the body itself, the outcome slot, the scheduling state machine,
/// the executor injected before the first resumption, and the single caller
/// to resume at completion.
pub(crate) struct Frame<T> {
    /// The suspended body. The RUNNING state guarantees exclusive access.
    future: UnsafeCell<Pin<Box<dyn Future<Output = Result<T>> + Send>>>,

    /// Written exactly once, when the body reaches its terminal result.
    outcome: UnsafeCell<Outcome<T>>,

    /// One of SUSPENDED, QUEUED, RUNNING, NOTIFIED, COMPLETED.
    state: AtomicUsize,

    /// Pool every resumption of this frame is dispatched onto.
    executor: OnceLock<Arc<PoolCore>>,

    /// Task awaiting this one; woken exactly once, at completion.
    caller: Mutex<Option<Waker>>,

    /// Top-level frames have no caller; their failure is logged instead of
    /// re-raised.
    detached: AtomicBool,
}

unsafe impl<T: Send> Send for Frame<T> {}
unsafe impl<T: Send> Sync for Frame<T> {}

impl<T: Send + 'static> Frame<T> {
    pub(crate) fn new<F>(body: F) -> Frame<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Frame {
            future: UnsafeCell::new(Box::pin(body)),
            outcome: UnsafeCell::new(Outcome::Pending),
            state: AtomicUsize::new(SUSPENDED),
            executor: OnceLock::new(),
            caller: Mutex::new(None),
            detached: AtomicBool::new(false),
        }
    }

    /// Injects the pool this frame resumes on. Must happen before the first
    /// resumption; the slot is written once and later calls are ignored.
    pub(crate) fn bind_executor(&self, pool: Arc<PoolCore>) {
        let _ = self.executor.set(pool);
    }

    pub(crate) fn mark_detached(&self) {
        self.detached.store(true, Ordering::Release);
    }

    /// Registers the caller to resume at completion. The latest waker wins.
    pub(crate) fn set_caller(&self, waker: Waker) {
        *self.caller.lock().unwrap() = Some(waker);
    }

    pub(crate) fn state(&self) -> usize {
        self.state.load(Ordering::Acquire)
    }

    fn executor(&self) -> &Arc<PoolCore> {
        self.executor
            .get()
            .expect("task resumed before an executor was injected")
    }

    /// Enqueues the next resumption on the executor.
    pub(crate) fn schedule(self: &Arc<Self>) {
        self.state.store(QUEUED, Ordering::Release);
        let frame = Arc::clone(self);
        self.executor().submit(move || frame.resume());
    }

    /// One resumption: polls the body until it parks again or finishes.
    fn resume(self: Arc<Self>) {
        let current = self.state.load(Ordering::Acquire);
        if current != QUEUED && current != NOTIFIED {
            // Stale resumption; tolerated, not fatal.
            return;
        }
        if self
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = Waker::from(Arc::clone(&self));
        let mut cx = Context::from_waker(&waker);

        // Safety: RUNNING is exclusive, so nothing else touches the body.
        let polled = panic::catch_unwind(AssertUnwindSafe(|| unsafe {
            (*self.future.get()).as_mut().poll(&mut cx)
        }));

        match polled {
            Ok(Poll::Pending) => {
                if self
                    .state
                    .compare_exchange(RUNNING, SUSPENDED, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // Woken while running: go around again.
                    self.schedule();
                }
            }
            Ok(Poll::Ready(result)) => {
                let outcome = match result {
                    Ok(value) => Outcome::Value(value),
                    Err(err) => Outcome::Failure(err),
                };
                self.complete(outcome);
            }
            Err(payload) => {
                let message = panic_message(&*payload).to_owned();
                self.complete(Outcome::Failure(Error::Task(message)));
            }
        }
    }

    fn complete(&self, outcome: Outcome<T>) {
        if self.detached.load(Ordering::Acquire) {
            if let Outcome::Failure(err) = &outcome {
                log::error!("detached task failed: {err}");
            }
        }

        // Safety: still RUNNING here, so the slot is ours alone.
        unsafe {
            *self.outcome.get() = outcome;
        }
        self.state.store(COMPLETED, Ordering::Release);

        // Exactly-once resumption of whoever awaits us.
        let caller = self.caller.lock().unwrap().take();
        if let Some(waker) = caller {
            waker.wake();
        }
    }

    /// Takes the terminal result. Only legal once the state is COMPLETED,
    /// and only once: a frame has a single awaiter.
    pub(crate) fn take_outcome(&self) -> Result<T> {
        debug_assert_eq!(self.state(), COMPLETED);

        // Safety: COMPLETED means the writer is done and gone.
        let outcome = unsafe { std::mem::replace(&mut *self.outcome.get(), Outcome::Pending) };
        match outcome {
            Outcome::Value(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
            Outcome::Pending => panic!("task outcome taken twice"),
        }
    }
}

impl<T: Send + 'static> Wake for Frame<T> {
    /// Routes a wake back through the pool: a SUSPENDED frame is queued for
    /// resumption, a RUNNING one is flagged to re-queue itself. Resumption
    /// therefore always happens on a worker thread, never on the thread
    /// that delivered the wake.
    fn wake(self: Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                SUSPENDED => {
                    if self
                        .state
                        .compare_exchange(SUSPENDED, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        let frame = Arc::clone(&self);
                        self.executor().submit(move || frame.resume());
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Queued, notified or completed: nothing to do.
                _ => return,
            }
        }
    }
}
