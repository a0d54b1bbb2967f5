use super::core::{Job, WorkerPool};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// FIFO serializer layered on a [`WorkerPool`].
///
/// At most one job of a strand runs at any moment, in submission order,
/// while different strands on the same pool still run in parallel. Useful
/// for guarding per-connection state without a lock around the work itself.
pub struct Strand {
    pool: Arc<WorkerPool>,
    state: Arc<StrandState>,
}

struct StrandState {
    queue: Mutex<VecDeque<Job>>,
    /// True while a job of this strand is queued on the pool or running.
    active: AtomicBool,
}

impl Strand {
    pub fn new(pool: Arc<WorkerPool>) -> Strand {
        Strand {
            pool,
            state: Arc::new(StrandState {
                queue: Mutex::new(VecDeque::new()),
                active: AtomicBool::new(false),
            }),
        }
    }

    /// Enqueues a job behind everything already submitted to this strand.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let kick = {
            let mut queue = self.state.queue.lock().unwrap();
            queue.push_back(Box::new(job));
            // Only the submitter that flips the flag may start the chain;
            // never while holding the queue lock.
            !self.state.active.swap(true, Ordering::AcqRel)
        };

        if kick {
            Strand::schedule_next(Arc::clone(&self.state), Arc::clone(&self.pool));
        }
    }

    /// Pops the next job and hands it to the pool; the job re-enters here
    /// once it has run, keeping the chain alive until the queue drains.
    fn schedule_next(state: Arc<StrandState>, pool: Arc<WorkerPool>) {
        let next = {
            let mut queue = state.queue.lock().unwrap();
            match queue.pop_front() {
                Some(job) => job,
                None => {
                    state.active.store(false, Ordering::Release);
                    return;
                }
            }
        };

        let chain_state = Arc::clone(&state);
        let chain_pool = Arc::clone(&pool);
        pool.submit(move || {
            next();
            Strand::schedule_next(chain_state, chain_pool);
        });
    }
}
