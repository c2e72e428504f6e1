use std::io::{self, ErrorKind, Read};
use std::os::fd::AsRawFd;

use crate::error::{Result, TransportError};
use crate::traits::ByteSource;

/// Adapts a descriptor-backed reader (pipe, stdin, socket, file) into a
/// [`ByteSource`] that never blocks.
///
/// Each read is preceded by a zero-timeout `poll`. When the descriptor has
/// nothing ready the source reports `Ok(0)`, so the reader loop keeps
/// checking its stop signal. End of stream surfaces as
/// [`TransportError::Closed`].
///
/// Wrap an unbuffered reader. A buffering reader such as `std::io::Stdin`
/// can hold bytes the descriptor no longer reports; duplicate the
/// descriptor into a `File` instead.
pub struct PollSource<R> {
    inner: R,
}

impl<R: Read + AsRawFd + Send> PollSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    fn ready(&self) -> Result<bool> {
        let mut pollfd = libc::pollfd {
            fd: self.inner.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        // SAFETY: one valid pollfd; the descriptor stays open for the call
        // because `inner` owns it.
        let ready = unsafe { libc::poll(&mut pollfd, 1, 0) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(TransportError::Io(err));
        }

        // Hang-up and error flags still need a read to surface them.
        let wake = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;
        Ok(ready > 0 && pollfd.revents & wake != 0)
    }
}

impl<R: Read + AsRawFd + Send> ByteSource for PollSource<R> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || !self.ready()? {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<R> std::fmt::Debug for PollSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollSource").finish_non_exhaustive()
    }
}
