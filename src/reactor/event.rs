use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::os::fd::RawFd;

/// The readiness classes a waiter can subscribe to.
///
/// `Interest` is a set over {READ, WRITE, HANGUP, ERROR}, stored in the
/// poller's native bit representation. HANGUP and ERROR are delivered to
/// whatever waiter is parked on the fd, regardless of what it asked for:
/// the waiter retries its non-blocking syscall and observes the condition
/// there (EOF as a zero-length read, the pending error as an errno).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Interest(u32);

impl Interest {
    /// Registered with the poller but subscribed to nothing.
    pub const NONE: Interest = Interest(0);

    /// Readable: a read on the fd would not return EAGAIN.
    pub const READ: Interest = Interest(libc::EPOLLIN as u32);

    /// Writable: a write on the fd would not return EAGAIN.
    pub const WRITE: Interest = Interest(libc::EPOLLOUT as u32);

    /// The peer hung up. Wakes read and write waiters alike.
    pub const HANGUP: Interest = Interest(libc::EPOLLHUP as u32);

    /// An error condition is pending on the fd.
    pub const ERROR: Interest = Interest(libc::EPOLLERR as u32);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Interest) -> bool {
        self.0 & other.0 == other.0
    }

    pub(crate) fn bits(self) -> u32 {
        self.0
    }

    pub(crate) fn from_bits(bits: u32) -> Interest {
        Interest(bits)
    }
}

impl BitOr for Interest {
    type Output = Interest;

    fn bitor(self, rhs: Interest) -> Interest {
        Interest(self.0 | rhs.0)
    }
}

impl BitOrAssign for Interest {
    fn bitor_assign(&mut self, rhs: Interest) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }

        let mut names = Vec::new();
        if self.contains(Interest::READ) {
            names.push("READ");
        }
        if self.contains(Interest::WRITE) {
            names.push("WRITE");
        }
        if self.contains(Interest::HANGUP) {
            names.push("HANGUP");
        }
        if self.contains(Interest::ERROR) {
            names.push("ERROR");
        }

        if names.is_empty() {
            return write!(f, "Interest({:#x})", self.0);
        }
        f.write_str(&names.join("|"))
    }
}

/// A readiness report for one registered fd.
///
/// Produced by the poller's `wait` and consumed by the reactor, which looks
/// up the fd's pending waiter and hands it back to the pool. The reported
/// mask is informational only: any readiness resumes the waiter.
#[derive(Clone, Copy, Debug)]
pub struct Event {
    /// The file descriptor that became ready.
    pub fd: RawFd,

    /// What the kernel reported for it.
    pub readiness: Interest,
}
