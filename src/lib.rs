//! # Coriolis
//!
//! **Coriolis** is a single-process, event-driven TCP runtime: a worker
//! pool, an epoll poller and a suspending-task machinery wired together so
//! that server and client logic reads as linear code while kernel
//! readiness notifications drive all progress.
//!
//! The core is the reactor triangle:
//!
//! - a **[`pool::WorkerPool`]** of OS threads draining a FIFO queue of work
//! - an **event poller** tracking interest on a set of file descriptors
//! - **[`Task`]s** whose await points register fd interest and whose
//!   resumptions are dispatched back onto the pool
//!
//! [`IoContext`] binds the three: `await_fd` is the primitive suspension
//! point, `spawn` launches a top-level task, and `run` drives the event
//! loop on the calling thread. Above it sit thin adapters
//! ([`net::Acceptor`], [`net::Socket`]) that try their non-blocking
//! syscall first and suspend only on EAGAIN.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use coriolis::io::Buffer;
//! use coriolis::net::Acceptor;
//! use coriolis::{Builder, Task};
//! use std::sync::Arc;
//!
//! let ctx = Arc::new(Builder::new().worker_threads(4).build()?);
//! let acceptor = Acceptor::bind(ctx.clone(), "127.0.0.1:18080")?;
//!
//! ctx.spawn(Task::new(async move {
//!     loop {
//!         let socket = acceptor.accept().await?;
//!         let mut buffer = Buffer::new();
//!         socket.read(&mut buffer).await?;
//!         socket.write(&mut buffer).await?;
//!     }
//! }));
//!
//! ctx.run(); // event loop on this thread
//! ```
//!
//! ## Modules
//!
//! - [`net`] — TCP acceptor and socket adapters
//! - [`io`] — the growable I/O buffer and a file helper
//! - [`pool`] — the worker pool and a FIFO strand over it
//! - [`protocol`] — JSON and HTTP/1 leaves
//! - [`alloc`] — size-class freelist allocation
//! - [`tools`] — lazy finite sequences
//! - [`global`] — the optional process-default context
//!
//! Logging goes through the `log` facade: registrations at INFO, per-I/O
//! byte counts at DEBUG, waiter overwrites at WARN, swallowed failures and
//! unexpected syscall errors at ERROR.

mod builder;
mod error;

pub mod alloc;
pub mod global;
pub mod io;
pub mod net;
pub mod pool;
pub mod protocol;
pub mod reactor;
pub mod task;
pub mod tools;

pub use builder::Builder;
pub use error::{Error, Result};
pub use reactor::event::Interest;
pub use reactor::{FdAwaiter, IoContext};
pub use task::Task;
