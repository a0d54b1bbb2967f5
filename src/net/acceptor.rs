use super::socket::Socket;
use super::sys::{
    parse_addr, sys_accept, sys_bind, sys_close, sys_listen, sys_set_reuseaddr, sys_socket,
    sys_sockname,
};
use crate::error::{Error, Result};
use crate::reactor::event::Interest;
use crate::reactor::IoContext;

use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::os::fd::RawFd;
use std::sync::Arc;

/// A listening IPv4 endpoint producing connected [`Socket`]s.
pub struct Acceptor {
    fd: RawFd,
    ctx: Arc<IoContext>,
}

impl Acceptor {
    /// Binds a non-blocking listening socket on `address` (`"ip:port"`),
    /// with `SO_REUSEADDR` and the system maximum backlog, and registers it
    /// with the reactor for read readiness.
    pub fn bind(ctx: Arc<IoContext>, address: &str) -> Result<Acceptor> {
        let addr = parse_addr(address)?;
        let fd = sys_socket()?;

        if let Err(err) = setup_listener(fd, &addr) {
            sys_close(fd);
            return Err(err.into());
        }

        let acceptor = Acceptor { fd, ctx };
        acceptor.ctx.add_fd(fd, Interest::READ)?;
        Ok(acceptor)
    }

    /// Accepts the next connection, suspending while none is pending.
    pub async fn accept(&self) -> Result<Socket> {
        loop {
            match sys_accept(self.fd) {
                Ok(client) => {
                    log::debug!("acceptor: fd {} accepted connection fd {client}", self.fd);
                    return Socket::new(client, Arc::clone(&self.ctx));
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    self.ctx.await_fd(self.fd, Interest::READ).await;
                }
                Err(err) => {
                    log::error!("acceptor: accept on fd {} failed: {err}", self.fd);
                    return Err(Error::Io(err));
                }
            }
        }
    }

    /// The bound local address. Useful after binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(sys_sockname(self.fd)?)
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Deregisters and closes the listening socket.
    pub fn close(&mut self) {
        if self.fd >= 0 {
            if let Err(err) = self.ctx.remove_fd(self.fd) {
                log::warn!("acceptor: deregister of fd {} failed: {err}", self.fd);
            }
            sys_close(self.fd);
            self.fd = -1;
        }
    }
}

impl Drop for Acceptor {
    fn drop(&mut self) {
        self.close();
    }
}

fn setup_listener(fd: RawFd, addr: &SocketAddrV4) -> io::Result<()> {
    sys_set_reuseaddr(fd)?;
    sys_bind(fd, addr)?;
    sys_listen(fd)
}
