use crate::error::{Error, Result};
use crate::pool::WorkerPool;
use crate::reactor::event::{Event, Interest};
use crate::reactor::poller::{EventPoller, MAX_EVENTS};
use crate::task::Task;

use std::collections::HashMap;
use std::future::Future;
use std::os::fd::RawFd;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::task::{Context, Poll, Waker};

/// One pending suspension on an fd: the handle to resume and the readiness
/// it asked for.
struct Waiter {
    waker: Waker,
    interest: Interest,
}

/// The reactor.
///
/// Owns the [`EventPoller`], shares the [`WorkerPool`], and keeps the table
/// mapping each fd to its single pending waiter. Suspension goes through
/// [`await_fd`](IoContext::await_fd); [`run`](IoContext::run) drives the
/// event loop on the calling thread and dispatches every resumption onto
/// the pool, so a task body never blocks the loop.
///
/// At most one waiter is stored per fd. A second `await_fd` on an fd whose
/// waiter is still pending overwrites it, and the prior waiter is never
/// resumed. That is a bug in the caller; the reactor logs it and carries on.
pub struct IoContext {
    pool: Arc<WorkerPool>,
    poller: EventPoller,
    waiters: Mutex<HashMap<RawFd, Waiter>>,
    running: AtomicBool,
}

impl IoContext {
    /// Builds a reactor over an existing pool and poller.
    pub fn new(pool: Arc<WorkerPool>, poller: EventPoller) -> IoContext {
        IoContext {
            pool,
            poller,
            waiters: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
        }
    }

    /// The pool resumptions are dispatched onto.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Registers a new fd with the poller.
    pub fn add_fd(&self, fd: RawFd, interest: Interest) -> Result<()> {
        self.poller.add(fd, interest)?;
        log::info!("reactor: fd {fd} registered ({interest:?})");
        Ok(())
    }

    /// Rewrites the kernel-side interest mask of `fd`.
    pub fn modify_fd(&self, fd: RawFd, interest: Interest) -> Result<()> {
        self.poller.modify(fd, interest)?;
        log::info!("reactor: fd {fd} modified ({interest:?})");
        Ok(())
    }

    /// Deregisters `fd`, discarding any pending waiter on it.
    ///
    /// A discarded waiter is never resumed; the frame it belonged to stays
    /// parked until its owner drops it.
    pub fn remove_fd(&self, fd: RawFd) -> Result<()> {
        let orphan = self.waiters.lock().unwrap().remove(&fd);
        let removed = self.poller.remove(fd);
        // Dropped outside the lock: tearing down an orphaned frame can close
        // sockets that re-enter remove_fd.
        drop(orphan);
        removed?;
        log::info!("reactor: fd {fd} removed");
        Ok(())
    }

    /// Interest currently requested by the pending waiter on `fd`, or
    /// [`Interest::NONE`] when there is none. Lets callers OR a new
    /// readiness class into whatever is already being waited for.
    pub fn get_events(&self, fd: RawFd) -> Interest {
        self.waiters
            .lock()
            .unwrap()
            .get(&fd)
            .map(|w| w.interest)
            .unwrap_or(Interest::NONE)
    }

    /// The primitive suspension point: parks the calling task until the
    /// poller reports readiness on `fd`.
    ///
    /// The fd must already be registered via [`add_fd`](IoContext::add_fd).
    /// Any readiness resumes the waiter; the caller retries its non-blocking
    /// syscall and suspends again if it still would block.
    pub fn await_fd(&self, fd: RawFd, interest: Interest) -> FdAwaiter<'_> {
        FdAwaiter {
            ctx: self,
            fd,
            interest,
            registered: false,
        }
    }

    /// Launches a top-level task: the pool becomes its executor, its result
    /// is discarded, and a failure is logged rather than re-raised.
    pub fn spawn<T: Send + 'static>(&self, task: Task<T>) {
        let (frame, scheduled) = task.into_parts();
        if scheduled {
            log::error!("spawn: task was already scheduled once; ignoring");
            return;
        }
        frame.bind_executor(self.pool.core());
        frame.mark_detached();
        frame.schedule();
    }

    /// Runs the event loop on the calling thread until [`stop`](IoContext::stop).
    ///
    /// Starts the pool (idempotent), then repeatedly waits for readiness and
    /// hands each ready fd's waiter back to the pool. The waiter's wake
    /// enqueues the resumption, so task bodies never run on this thread.
    pub fn run(&self) {
        self.running.store(true, Ordering::Release);
        self.pool.run();
        log::info!("reactor: event loop running");

        let mut events: Vec<Event> = Vec::with_capacity(MAX_EVENTS);
        while self.running.load(Ordering::Acquire) {
            match self.poller.wait(&mut events, -1) {
                Ok(_) => {}
                Err(Error::Interrupted) => continue,
                Err(err) => {
                    log::error!("reactor: wait failed: {err}");
                    continue;
                }
            }

            for event in &events {
                let waiter = self.waiters.lock().unwrap().remove(&event.fd);
                match waiter {
                    Some(waiter) => {
                        log::debug!(
                            "reactor: fd {} ready ({:?}), resuming waiter",
                            event.fd,
                            event.readiness
                        );
                        waiter.waker.wake();
                    }
                    None => {
                        // Stale event racing a removal; harmless.
                        log::debug!("reactor: fd {} ready but no waiter", event.fd);
                    }
                }
            }
        }

        log::info!("reactor: event loop stopped");
    }

    /// Stops the loop and drains the pool. The loop exits after the next
    /// `wait` returns, which [`EventPoller::notify`] makes immediate.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.poller.notify();
        self.pool.stop();
    }

    /// Drives `task` to completion from outside the runtime, blocking the
    /// calling thread. Starts the pool if it is not running yet.
    pub fn block_on<T: Send + 'static>(&self, task: Task<T>) -> Result<T> {
        self.pool.run();

        let (tx, rx) = mpsc::channel();
        self.spawn(Task::new(async move {
            let _ = tx.send(task.await);
            Ok(())
        }));

        match rx.recv() {
            Ok(result) => result,
            Err(_) => Err(Error::Task(
                "worker pool shut down before the task completed".into(),
            )),
        }
    }
}

/// Awaiter returned by [`IoContext::await_fd`].
///
/// The first poll stores the waiter in the table and pushes the interest to
/// the poller, atomically under the table mutex. The next poll, which only
/// happens after the reactor woke us, reports readiness.
pub struct FdAwaiter<'a> {
    ctx: &'a IoContext,
    fd: RawFd,
    interest: Interest,
    registered: bool,
}

impl Future for FdAwaiter<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if this.registered {
            return Poll::Ready(());
        }

        let prior = {
            let mut waiters = this.ctx.waiters.lock().unwrap();
            let prior = waiters.insert(
                this.fd,
                Waiter {
                    waker: cx.waker().clone(),
                    interest: this.interest,
                },
            );

            if let Err(err) = this.ctx.poller.modify(this.fd, this.interest) {
                // Suspension cannot fail loudly: drop the registration and
                // leave the caller parked. The fd should have been added
                // with add_fd before being awaited.
                waiters.remove(&this.fd);
                log::error!("reactor: fd {} modify failed during suspend: {err}", this.fd);
            } else {
                log::info!("reactor: fd {} waiting ({:?})", this.fd, this.interest);
            }

            prior
        };

        if prior.is_some() {
            log::warn!("reactor: fd {} already had a waiter; overwriting", this.fd);
        }
        // The overwritten waiter (if any) is dropped here, outside the lock.
        drop(prior);

        this.registered = true;
        Poll::Pending
    }
}
