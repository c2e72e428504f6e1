use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};

/// A non-blocking source of raw bytes.
///
/// `read_available` copies whatever is currently available into `buf` and
/// returns the number of bytes copied. `Ok(0)` means nothing is available
/// right now; it never signals end of stream. A source that can end reports
/// it with [`TransportError::Closed`].
pub trait ByteSource: Send {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// A sink for outbound bytes.
pub trait ByteSink {
    /// Write every byte of `data`, blocking until the sink accepted them.
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_available(buf)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_bytes(data)
    }
}

/// Adapts any [`Read`] (file, pipe, stdin) into a [`ByteSource`].
///
/// A zero-length read from the inner reader is end of stream and surfaces as
/// [`TransportError::Closed`]. `WouldBlock` maps to "nothing available".
///
/// The inner `read` is called as is, so a blocking reader blocks the reader
/// loop and a stop request waits for the next byte or end of stream. Use
/// `PollSource` for pipes and terminals that can stay open and idle.
pub struct ReadSource<R> {
    inner: R,
}

impl<R: Read + Send> ReadSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the adapter and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Send> ByteSource for ReadSource<R> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
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

/// Adapts any [`Write`] into a [`ByteSink`].
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Consume the adapter and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for WriteSink<W> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        self.inner.flush().map_err(TransportError::Io)
    }
}

impl<R> std::fmt::Debug for ReadSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSource").finish_non_exhaustive()
    }
}
