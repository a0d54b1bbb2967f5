use crate::error::Result;
use crate::pool::WorkerPool;
use crate::reactor::poller::EventPoller;
use crate::reactor::IoContext;

use std::sync::Arc;
use std::thread;

/// Configures and creates an [`IoContext`].
///
/// # Examples
///
/// ```rust,ignore
/// let ctx = Builder::new()
///     .worker_threads(4)
///     .build()?;
/// ```
pub struct Builder {
    worker_threads: usize,
}

impl Builder {
    /// Defaults to one worker per logical CPU (at least one).
    pub fn new() -> Builder {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Builder { worker_threads }
    }

    /// Sets the worker thread count.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Builder {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Creates the poller and the pool and wires them into a reactor.
    /// Nothing runs until [`IoContext::run`] is called.
    pub fn build(self) -> Result<IoContext> {
        let pool = Arc::new(WorkerPool::new(self.worker_threads));
        let poller = EventPoller::new()?;
        Ok(IoContext::new(pool, poller))
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}
