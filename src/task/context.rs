use crate::pool::PoolCore;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Queue handle of the pool driving the job currently executing on
    /// this thread.
    ///
    /// Workers install it around every job, so a task awaited inside
    /// another task can inject its parent's executor into its own frame.
    static CURRENT_POOL: RefCell<Option<Arc<PoolCore>>> = const { RefCell::new(None) };
}

/// Runs `f` with `pool` installed as the thread's current executor, then
/// restores whatever was there before.
pub(crate) fn enter_pool<R>(pool: Arc<PoolCore>, f: impl FnOnce() -> R) -> R {
    CURRENT_POOL.with(|cell| {
        let prev = cell.replace(Some(pool));
        let out = f();
        cell.replace(prev);
        out
    })
}

/// The executor of the job currently running on this thread, if any.
pub(crate) fn current_pool() -> Option<Arc<PoolCore>> {
    CURRENT_POOL.with(|cell| cell.borrow().clone())
}
