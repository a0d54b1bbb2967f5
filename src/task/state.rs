/// Parked at a suspension point (or not yet started) and not scheduled.
pub(crate) const SUSPENDED: usize = 0;

/// Sitting in the pool queue, waiting for a worker.
pub(crate) const QUEUED: usize = 1;

/// Being polled by a worker. At most one thread observes this at a time.
pub(crate) const RUNNING: usize = 2;

/// Woken while RUNNING; re-queued as soon as the current poll finishes.
pub(crate) const NOTIFIED: usize = 3;

/// Terminal: the outcome slot is filled and the caller, if any, was resumed.
pub(crate) const COMPLETED: usize = 4;
