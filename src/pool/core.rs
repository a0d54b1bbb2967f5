use crate::task::context;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

/// A queued unit of work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of OS threads draining a FIFO queue of closures.
///
/// The queue is unbounded and `submit` never blocks. Each closure runs on
/// exactly one worker; closures submitted by a single thread are dequeued
/// in submission order, while nothing is promised across submitters. A
/// panicking closure is caught and logged, and the worker moves on.
///
/// `stop` drains: workers finish everything already queued, then exit, and
/// the call returns only once every worker thread has been joined. For that
/// reason `stop` must not be called from a worker.
pub struct WorkerPool {
    /// Queue state shared with the workers and with suspended task frames.
    core: Arc<PoolCore>,
    threads: usize,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a pool that will run `threads` workers once started.
    ///
    /// # Panics
    ///
    /// Panics if `threads == 0`.
    pub fn new(threads: usize) -> WorkerPool {
        assert!(threads > 0, "worker pool needs at least one thread");

        WorkerPool {
            core: Arc::new(PoolCore {
                queue: Mutex::new(VecDeque::new()),
                available: Condvar::new(),
                running: AtomicBool::new(false),
                waiting: AtomicUsize::new(0),
            }),
            threads,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Number of worker threads this pool was configured with.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Jobs currently sitting in the queue.
    pub fn pending(&self) -> usize {
        self.core.queue.lock().unwrap().len()
    }

    /// Enqueues a unit of work and wakes one parked worker.
    ///
    /// Safe from any thread, including from inside a running job; reentrant
    /// submission is routine.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.core.submit_boxed(Box::new(job));
    }

    /// The shared queue handle that task frames schedule themselves onto.
    pub(crate) fn core(&self) -> Arc<PoolCore> {
        Arc::clone(&self.core)
    }

    /// Starts the workers. Idempotent: a second call logs and returns.
    pub fn run(&self) {
        if self.core.running.swap(true, Ordering::AcqRel) {
            log::debug!("worker pool already running");
            return;
        }

        log::info!("starting worker pool with {} threads", self.threads);
        let mut workers = self.workers.lock().unwrap();
        for id in 0..self.threads {
            let core = Arc::clone(&self.core);
            workers.push(std::thread::spawn(move || Worker::new(id, core).run()));
        }
    }

    /// Signals drain and joins every worker: everything already submitted
    /// still runs, and when this returns the thread set is empty.
    pub fn stop(&self) {
        if !self.core.running.swap(false, Ordering::AcqRel) {
            log::debug!("worker pool already stopped");
            return;
        }

        self.core.available.notify_all();
        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        for handle in workers {
            let _ = handle.join();
        }
        log::info!("worker pool stopped");
    }

    /// Signals drain and abandons the threads without joining. Only for
    /// catastrophic teardown paths.
    pub fn stop_hard(&self) {
        if !self.core.running.swap(false, Ordering::AcqRel) {
            log::debug!("worker pool already stopped");
            return;
        }

        self.core.available.notify_all();
        self.workers.lock().unwrap().clear();
        log::warn!("worker pool stopped without joining its threads");
    }
}

/// The queue half of the pool: what workers drain and what submitters and
/// suspended task frames push into.
pub(crate) struct PoolCore {
    queue: Mutex<VecDeque<Job>>,
    available: Condvar,
    running: AtomicBool,
    waiting: AtomicUsize,
}

impl PoolCore {
    pub(crate) fn submit_boxed(&self, job: Job) {
        {
            let mut queue = self.queue.lock().unwrap();
            queue.push_back(job);
        }
        if self.waiting.load(Ordering::Acquire) > 0 {
            self.available.notify_one();
        }
    }

    pub(crate) fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_boxed(Box::new(job));
    }

    /// Blocks until a job is available, or until shutdown once the queue
    /// has drained.
    fn next_job(&self) -> Option<Job> {
        let mut queue = self.queue.lock().unwrap();
        loop {
            if let Some(job) = queue.pop_front() {
                return Some(job);
            }
            if !self.running.load(Ordering::Acquire) {
                return None;
            }
            self.waiting.fetch_add(1, Ordering::AcqRel);
            queue = self.available.wait(queue).unwrap();
            self.waiting.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// A single pool thread.
struct Worker {
    id: usize,
    core: Arc<PoolCore>,
}

impl Worker {
    fn new(id: usize, core: Arc<PoolCore>) -> Worker {
        Worker { id, core }
    }

    /// Pops jobs in FIFO order until told to drain. Every job runs with the
    /// queue handle installed in the thread-local context, so tasks polled
    /// by the job can hand the executor on to tasks they await.
    fn run(self) {
        log::debug!("worker {} started", self.id);

        while let Some(job) = self.core.next_job() {
            let outcome = context::enter_pool(Arc::clone(&self.core), || {
                panic::catch_unwind(AssertUnwindSafe(job))
            });
            if let Err(payload) = outcome {
                log::error!("worker {}: job panicked: {}", self.id, panic_message(&*payload));
            }
        }

        log::debug!("worker {} exiting", self.id);
    }
}

/// Best-effort rendering of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
