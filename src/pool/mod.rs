//! Worker threads and the FIFO queue that feeds them.

mod core;
mod strand;

pub use self::core::WorkerPool;
pub use self::strand::Strand;

pub(crate) use self::core::{panic_message, PoolCore};
