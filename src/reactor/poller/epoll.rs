//! Linux `epoll` poller.
//!
//! Responsibilities:
//! - register file descriptors with an interest mask
//! - block waiting for readiness and hand the events to the reactor
//! - let other threads interrupt a blocking wait via `notify`
//!
//! Registration state lives in the kernel: `add` fails on an fd that is
//! already registered, `modify` and `remove` fail on one that is not.

use crate::error::{Error, Result};
use crate::reactor::event::{Event, Interest};

use libc::{
    epoll_create1, epoll_ctl, epoll_event, epoll_wait, EPOLL_CLOEXEC, EPOLL_CTL_ADD, EPOLL_CTL_DEL,
    EPOLL_CTL_MOD,
};
use std::io;
use std::os::fd::RawFd;

/// Token reserved for the internal wake eventfd. Real fds are non-negative,
/// so this value can never collide with one.
const WAKE_TOKEN: u64 = u64::MAX;

/// Upper bound on events drained by a single `wait`.
pub const MAX_EVENTS: usize = 64;

/// Thin wrapper over an epoll instance plus an eventfd wake channel.
///
/// The wake channel lets `stop` interrupt a `wait` that would otherwise
/// block until the next readiness event. The underlying facility is safe
/// under concurrent ctl calls and one concurrent wait, which is exactly how
/// the reactor uses it.
pub struct EventPoller {
    epoll: RawFd,
    wakefd: RawFd,
}

impl EventPoller {
    /// Creates the epoll instance and registers the eventfd wake source.
    pub fn new() -> Result<EventPoller> {
        let epoll = unsafe { epoll_create1(EPOLL_CLOEXEC) };
        if epoll < 0 {
            return Err(Error::poller("create"));
        }

        let wakefd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if wakefd < 0 {
            let err = Error::poller("create");
            unsafe { libc::close(epoll) };
            return Err(err);
        }

        let mut ev = epoll_event {
            events: libc::EPOLLIN as u32,
            u64: WAKE_TOKEN,
        };
        let rc = unsafe { epoll_ctl(epoll, EPOLL_CTL_ADD, wakefd, &mut ev) };
        if rc < 0 {
            let err = Error::poller("register");
            unsafe {
                libc::close(wakefd);
                libc::close(epoll);
            }
            return Err(err);
        }

        Ok(EventPoller { epoll, wakefd })
    }

    /// Registers `fd` with the given interest set.
    pub fn add(&self, fd: RawFd, interest: Interest) -> Result<()> {
        self.ctl(EPOLL_CTL_ADD, "register", fd, interest)
    }

    /// Replaces the interest set of an already registered fd.
    pub fn modify(&self, fd: RawFd, interest: Interest) -> Result<()> {
        self.ctl(EPOLL_CTL_MOD, "modify", fd, interest)
    }

    /// Deregisters `fd`.
    pub fn remove(&self, fd: RawFd) -> Result<()> {
        let rc = unsafe { epoll_ctl(self.epoll, EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if rc < 0 {
            return Err(Error::poller("deregister"));
        }
        Ok(())
    }

    fn ctl(&self, op: libc::c_int, name: &'static str, fd: RawFd, interest: Interest) -> Result<()> {
        let mut ev = epoll_event {
            events: interest.bits(),
            u64: fd as u64,
        };
        let rc = unsafe { epoll_ctl(self.epoll, op, fd, &mut ev) };
        if rc < 0 {
            return Err(Error::poller(name));
        }
        Ok(())
    }

    /// Blocks up to `timeout_ms` milliseconds (negative blocks forever) and
    /// fills `events` with up to [`MAX_EVENTS`] readiness reports, returning
    /// how many were written. A timeout yields 0.
    ///
    /// A signal interruption surfaces as [`Error::Interrupted`]; the caller
    /// is expected to resume its loop.
    pub fn wait(&self, events: &mut Vec<Event>, timeout_ms: i32) -> Result<usize> {
        let mut buf: [epoll_event; MAX_EVENTS] = unsafe { std::mem::zeroed() };

        let n = unsafe { epoll_wait(self.epoll, buf.as_mut_ptr(), MAX_EVENTS as i32, timeout_ms) };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Err(Error::Interrupted);
            }
            return Err(Error::Io(err));
        }

        events.clear();
        for i in 0..n as usize {
            let ev = buf[i];
            if ev.u64 == WAKE_TOKEN {
                self.drain_wake();
                continue;
            }
            events.push(Event {
                fd: ev.u64 as RawFd,
                readiness: Interest::from_bits(ev.events),
            });
        }

        Ok(events.len())
    }

    /// Forces a blocked `wait` to return.
    pub fn notify(&self) {
        let one: u64 = 1;
        unsafe {
            libc::write(self.wakefd, &one as *const u64 as *const libc::c_void, 8);
        }
    }

    fn drain_wake(&self) {
        let mut buf = 0u64;
        unsafe {
            libc::read(self.wakefd, &mut buf as *mut u64 as *mut libc::c_void, 8);
        }
    }
}

impl Drop for EventPoller {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.wakefd);
            libc::close(self.epoll);
        }
    }
}
