use std::io;
use std::os::fd::RawFd;

/// Reserved region before the readable data, so a small header can be
/// prepended without shifting the payload.
const CHEAP_PREPEND: usize = 8;

/// Initial payload capacity.
const INITIAL_SIZE: usize = 1024;

/// Stack-side spill area for `read_fd`.
const EXTRA_BUF: usize = 64 * 1024;

/// Growable byte buffer with separate read and write cursors.
///
/// Layout: `[prependable | readable | writable]`. Appending first tries the
/// writable tail, then compacts the readable region back to the prepend
/// mark, and only grows the backing storage when both fail. `read_fd` and
/// `write_fd` are the two syscall entry points the socket adapters loop
/// over; both are single-shot and report EAGAIN through the error's
/// `WouldBlock` kind.
pub struct Buffer {
    storage: Vec<u8>,
    read_index: usize,
    write_index: usize,
}

impl Buffer {
    pub fn new() -> Buffer {
        Buffer::with_capacity(INITIAL_SIZE)
    }

    pub fn with_capacity(initial: usize) -> Buffer {
        Buffer {
            storage: vec![0; CHEAP_PREPEND + initial],
            read_index: CHEAP_PREPEND,
            write_index: CHEAP_PREPEND,
        }
    }

    pub fn readable_bytes(&self) -> usize {
        self.write_index - self.read_index
    }

    pub fn writable_bytes(&self) -> usize {
        self.storage.len() - self.write_index
    }

    pub fn prependable_bytes(&self) -> usize {
        self.read_index
    }

    /// The readable slice, without consuming it.
    pub fn peek(&self) -> &[u8] {
        &self.storage[self.read_index..self.write_index]
    }

    /// Consumes `len` readable bytes; everything, if `len` overshoots.
    pub fn retrieve(&mut self, len: usize) {
        if len < self.readable_bytes() {
            self.read_index += len;
        } else {
            self.retrieve_all();
        }
    }

    pub fn retrieve_all(&mut self) {
        self.read_index = CHEAP_PREPEND;
        self.write_index = CHEAP_PREPEND;
    }

    /// Consumes up to `len` readable bytes and returns them as a string.
    pub fn retrieve_as_string(&mut self, len: usize) -> String {
        let len = len.min(self.readable_bytes());
        let taken =
            String::from_utf8_lossy(&self.storage[self.read_index..self.read_index + len])
                .into_owned();
        self.retrieve(len);
        taken
    }

    pub fn retrieve_all_as_string(&mut self) -> String {
        self.retrieve_as_string(self.readable_bytes())
    }

    /// Appends bytes, compacting or growing as needed.
    pub fn append(&mut self, data: &[u8]) {
        if data.len() > self.writable_bytes() {
            self.make_space(data.len());
        }
        self.storage[self.write_index..self.write_index + data.len()].copy_from_slice(data);
        self.write_index += data.len();
    }

    fn make_space(&mut self, len: usize) {
        if self.writable_bytes() + self.prependable_bytes() < len + CHEAP_PREPEND {
            self.storage.resize(self.write_index + len, 0);
        } else {
            // Slide the readable region back to the prepend mark.
            let readable = self.readable_bytes();
            self.storage.copy_within(self.read_index..self.write_index, CHEAP_PREPEND);
            self.read_index = CHEAP_PREPEND;
            self.write_index = CHEAP_PREPEND + readable;
        }
    }

    /// Scatter-reads from `fd`: the writable tail first, spilling into a
    /// 64 KiB stack buffer that is appended afterwards. One `readv` per
    /// call; 0 means EOF, `WouldBlock` means come back after readiness.
    pub fn read_fd(&mut self, fd: RawFd) -> io::Result<usize> {
        let mut extra = [0u8; EXTRA_BUF];
        let writable = self.writable_bytes();

        let iov = [
            libc::iovec {
                iov_base: unsafe { self.storage.as_mut_ptr().add(self.write_index) }
                    as *mut libc::c_void,
                iov_len: writable,
            },
            libc::iovec {
                iov_base: extra.as_mut_ptr() as *mut libc::c_void,
                iov_len: EXTRA_BUF,
            },
        ];
        let iovcnt: libc::c_int = if writable < EXTRA_BUF { 2 } else { 1 };

        let n = unsafe { libc::readv(fd, iov.as_ptr(), iovcnt) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        let n = n as usize;
        if n <= writable {
            self.write_index += n;
        } else {
            self.write_index = self.storage.len();
            self.append(&extra[..n - writable]);
        }
        Ok(n)
    }

    /// Writes the readable slice to `fd` in one syscall and consumes
    /// whatever the kernel took.
    pub fn write_fd(&mut self, fd: RawFd) -> io::Result<usize> {
        let n = unsafe {
            libc::write(
                fd,
                self.storage.as_ptr().add(self.read_index) as *const libc::c_void,
                self.readable_bytes(),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        self.retrieve(n as usize);
        Ok(n as usize)
    }
}

impl Default for Buffer {
    fn default() -> Buffer {
        Buffer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn append_and_retrieve() {
        let mut buffer = Buffer::new();
        assert_eq!(buffer.readable_bytes(), 0);
        assert_eq!(buffer.prependable_bytes(), CHEAP_PREPEND);

        buffer.append(b"hello world");
        assert_eq!(buffer.readable_bytes(), 11);
        assert_eq!(buffer.peek(), b"hello world");

        buffer.retrieve(6);
        assert_eq!(buffer.peek(), b"world");

        assert_eq!(buffer.retrieve_all_as_string(), "world");
        assert_eq!(buffer.readable_bytes(), 0);
        assert_eq!(buffer.prependable_bytes(), CHEAP_PREPEND);
    }

    #[test]
    fn overshooting_retrieve_resets() {
        let mut buffer = Buffer::new();
        buffer.append(b"abc");
        buffer.retrieve(100);
        assert_eq!(buffer.readable_bytes(), 0);
        assert_eq!(buffer.prependable_bytes(), CHEAP_PREPEND);
    }

    #[test]
    fn compacts_before_growing() {
        let mut buffer = Buffer::with_capacity(16);
        buffer.append(&[b'a'; 12]);
        buffer.retrieve(10);

        // 2 readable left; 14 writable after compaction, no growth needed.
        let before = buffer.storage.len();
        buffer.append(&[b'b'; 10]);
        assert_eq!(buffer.storage.len(), before);
        assert_eq!(buffer.readable_bytes(), 12);
        assert_eq!(buffer.prependable_bytes(), CHEAP_PREPEND);
    }

    #[test]
    fn grows_when_compaction_is_not_enough() {
        let mut buffer = Buffer::with_capacity(8);
        buffer.append(&[b'x'; 64]);
        assert_eq!(buffer.readable_bytes(), 64);
        assert_eq!(buffer.peek(), &[b'x'; 64][..]);
    }

    #[test]
    fn pipe_round_trip_and_eagain() {
        let mut fds = [0; 2];
        let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK) };
        assert_eq!(rc, 0);
        let (rx, tx) = (fds[0], fds[1]);

        let mut buffer = Buffer::new();
        // Nothing written yet: the saved errno surfaces as WouldBlock.
        let err = buffer.read_fd(rx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WouldBlock);

        buffer.append(b"through the pipe");
        let sent = buffer.write_fd(tx).unwrap();
        assert_eq!(sent, 16);
        assert_eq!(buffer.readable_bytes(), 0);

        let mut incoming = Buffer::new();
        let received = incoming.read_fd(rx).unwrap();
        assert_eq!(received, 16);
        assert_eq!(incoming.retrieve_all_as_string(), "through the pipe");

        unsafe {
            libc::close(rx);
            libc::close(tx);
        }
    }
}
