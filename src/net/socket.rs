use super::sys::sys_close;
use crate::error::{Error, Result};
use crate::io::Buffer;
use crate::reactor::event::Interest;
use crate::reactor::IoContext;

use std::io;
use std::os::fd::RawFd;
use std::sync::Arc;

/// A connected, non-blocking TCP socket driven by the reactor.
///
/// Reads and writes are retry loops: try the syscall first, and only when
/// the kernel reports EAGAIN suspend on the fd's readiness. The task that
/// performs the I/O should own the socket, so the fd stays valid for as
/// long as anything can be suspended on it.
pub struct Socket {
    fd: RawFd,
    ctx: Arc<IoContext>,
}

impl Socket {
    /// Adopts a connected non-blocking fd, registering it with the poller
    /// with an empty interest set: nothing is pending until the first await.
    ///
    /// The socket takes ownership of `fd` and closes it on drop.
    pub fn new(fd: RawFd, ctx: Arc<IoContext>) -> Result<Socket> {
        if let Err(err) = ctx.add_fd(fd, Interest::NONE) {
            sys_close(fd);
            return Err(err);
        }
        Ok(Socket { fd, ctx })
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Reads whatever the socket currently holds into `buffer`, suspending
    /// on EAGAIN until the fd turns readable. Returns the byte count of the
    /// one successful read; 0 means EOF.
    pub async fn read(&self, buffer: &mut Buffer) -> Result<usize> {
        loop {
            match buffer.read_fd(self.fd) {
                Ok(n) => {
                    log::debug!("socket: fd {} read {n} bytes", self.fd);
                    return Ok(n);
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    let interest = self.ctx.get_events(self.fd) | Interest::READ;
                    self.ctx.await_fd(self.fd, interest).await;
                }
                Err(err) => {
                    log::error!("socket: read on fd {} failed: {err}", self.fd);
                    return Err(Error::Io(err));
                }
            }
        }
    }

    /// Writes the readable slice of `buffer`, suspending on EAGAIN until
    /// the fd turns writable. Returns how many bytes the kernel took, or 0
    /// immediately when the buffer holds nothing.
    pub async fn write(&self, buffer: &mut Buffer) -> Result<usize> {
        loop {
            if buffer.readable_bytes() == 0 {
                return Ok(0);
            }
            match buffer.write_fd(self.fd) {
                Ok(n) => {
                    log::debug!("socket: fd {} wrote {n} bytes", self.fd);
                    return Ok(n);
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    let interest = self.ctx.get_events(self.fd) | Interest::WRITE;
                    self.ctx.await_fd(self.fd, interest).await;
                }
                Err(err) => {
                    log::error!("socket: write on fd {} failed: {err}", self.fd);
                    return Err(Error::Io(err));
                }
            }
        }
    }

    /// Deregisters and closes the fd.
    pub fn close(&mut self) {
        if self.fd >= 0 {
            if let Err(err) = self.ctx.remove_fd(self.fd) {
                log::warn!("socket: deregister of fd {} failed: {err}", self.fd);
            }
            sys_close(self.fd);
            self.fd = -1;
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close();
    }
}
