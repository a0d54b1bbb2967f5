use super::context;
use super::core::Frame;
use super::state::COMPLETED;
use crate::error::Result;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A one-shot suspending computation producing a `Result<T>`.
///
/// A task is created suspended: nothing runs until it is either handed to
/// [`IoContext::spawn`](crate::IoContext::spawn) or awaited from inside
/// another task. Awaiting schedules it on the awaiting task's executor and
/// parks the caller; when the body reaches its terminal result the caller
/// is resumed exactly once and receives the value, or the failure the body
/// propagated (a panic surfaces as [`Error::Task`](crate::Error::Task)).
///
/// Dropping an unfinished task abandons its frame; dropping a finished one
/// discards the stored result.
pub struct Task<T> {
    frame: Arc<Frame<T>>,
    scheduled: bool,
}

impl<T: Send + 'static> Task<T> {
    /// Wraps a suspending body.
    pub fn new<F>(body: F) -> Task<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Task {
            frame: Arc::new(Frame::new(body)),
            scheduled: false,
        }
    }

    pub(crate) fn into_parts(self) -> (Arc<Frame<T>>, bool) {
        let Task { frame, scheduled } = self;
        (frame, scheduled)
    }
}

impl<T: Send + 'static> Future for Task<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if !this.scheduled {
            // First await: the task inherits the executor of whatever is
            // being polled on this thread right now.
            let pool = context::current_pool()
                .expect("a task can only be awaited from inside the worker pool");
            this.frame.bind_executor(pool);
            this.frame.set_caller(cx.waker().clone());
            this.scheduled = true;
            this.frame.schedule();
            return Poll::Pending;
        }

        if this.frame.state() == COMPLETED {
            return Poll::Ready(this.frame.take_outcome());
        }

        // Keep the freshest caller, then check again so a completion landing
        // in between cannot strand us.
        this.frame.set_caller(cx.waker().clone());
        if this.frame.state() == COMPLETED {
            return Poll::Ready(this.frame.take_outcome());
        }

        Poll::Pending
    }
}
