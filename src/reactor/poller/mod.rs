//! Readiness polling backend.
//!
//! The poller translates abstract interest updates into kernel calls and
//! drains ready events for the reactor. Only the Linux `epoll` facility is
//! supported; the rest of the crate talks to it exclusively through
//! [`EventPoller`].

mod epoll;

pub use epoll::{EventPoller, MAX_EVENTS};
