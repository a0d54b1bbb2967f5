use std::io;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the reactor core and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller handed the runtime something unusable: a zero-sized pool,
    /// a task spawned twice, a default context installed twice.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A poller ctl operation (register, modify, deregister) failed.
    #[error("poller {op} failed: {source}")]
    Poller {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// A syscall failed with something other than EAGAIN/EWOULDBLOCK.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A task body failed or panicked. Stored in the frame and re-raised
    /// when the task is awaited.
    #[error("task failed: {0}")]
    Task(String),

    /// A blocking wait was cut short by a signal. The event loop treats
    /// this as "go around again".
    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Captures the current OS error as a poller ctl failure.
    pub(crate) fn poller(op: &'static str) -> Error {
        Error::Poller {
            op,
            source: io::Error::last_os_error(),
        }
    }
}
