//! A stream full of predictable implementations, suitable for testing behavior of proxies.
//!
//! [`MockIo`] produces a repeating alphabet when read, records everything written
//! to it, and counts every call. It can be configured to fail every operation, or
//! to fail once a byte budget for reads or writes has been used up.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::stream::{Close, Connection};

/// The message carried by every error a [`MockIo`] returns.
pub const MOCK_ERROR: &str = "ERROR!";

fn mock_error() -> io::Error {
    io::Error::other(MOCK_ERROR)
}

/// Fill `buf` with a repeating lowercase alphabet, starting at `a`.
pub fn alphabet(buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = b'a' + (i % 26) as u8;
    }
}

/// Number of times each operation was called on a [`MockIo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCounts {
    /// Calls to read
    pub read: usize,
    /// Calls to write
    pub write: usize,
    /// Calls to flush
    pub flush: usize,
    /// Calls to close, or shutdown for async streams
    pub close: usize,
    /// Calls to local_addr
    pub local_addr: usize,
    /// Calls to remote_addr
    pub remote_addr: usize,
    /// Calls to set_deadline
    pub set_deadline: usize,
    /// Calls to set_read_deadline
    pub set_read_deadline: usize,
    /// Calls to set_write_deadline
    pub set_write_deadline: usize,
}

/// A mock stream which implements every capability.
#[derive(Debug, Default)]
pub struct MockIo {
    written: Vec<u8>,
    counts: Mutex<MockCounts>,
    read_budget: Option<usize>,
    write_budget: Option<usize>,
    failing: bool,
}

impl MockIo {
    /// A mock stream where every operation succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock stream where every operation fails with [`MOCK_ERROR`].
    ///
    /// Calls are still counted.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Allow `budget` bytes to be read in total, after which reads fail.
    pub fn fail_after_read(mut self, budget: usize) -> Self {
        self.read_budget = Some(budget);
        self
    }

    /// Allow `budget` bytes to be written in total, after which writes fail.
    pub fn fail_after_write(mut self, budget: usize) -> Self {
        self.write_budget = Some(budget);
        self
    }

    /// Everything which was accepted by writes so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// A snapshot of the call counts.
    pub fn counts(&self) -> MockCounts {
        *self.counts.lock()
    }

    fn outcome(&self) -> io::Result<()> {
        if self.failing {
            Err(mock_error())
        } else {
            Ok(())
        }
    }

    fn do_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.counts.get_mut().read += 1;
        self.outcome()?;

        let n = match &mut self.read_budget {
            Some(0) => return Err(mock_error()),
            Some(budget) => {
                let n = buf.len().min(*budget);
                *budget -= n;
                n
            }
            None => buf.len(),
        };

        alphabet(&mut buf[..n]);
        Ok(n)
    }

    fn do_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.counts.get_mut().write += 1;
        self.outcome()?;

        let n = match &mut self.write_budget {
            Some(0) => return Err(mock_error()),
            Some(budget) => {
                let n = buf.len().min(*budget);
                *budget -= n;
                n
            }
            None => buf.len(),
        };

        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn do_flush(&mut self) -> io::Result<()> {
        self.counts.get_mut().flush += 1;
        self.outcome()
    }

    fn do_close(&mut self) -> io::Result<()> {
        self.counts.get_mut().close += 1;
        self.outcome()
    }
}

impl io::Read for MockIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.do_read(buf)
    }
}

impl io::Write for MockIo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.do_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.do_flush()
    }
}

impl Close for MockIo {
    fn close(&mut self) -> io::Result<()> {
        self.do_close()
    }
}

impl Connection for MockIo {
    type Addr = SocketAddr;

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.counts.lock().local_addr += 1;
        Ok(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 1))
    }

    fn remote_addr(&self) -> io::Result<SocketAddr> {
        self.counts.lock().remote_addr += 1;
        Ok(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 2))
    }

    fn set_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        self.counts.lock().set_deadline += 1;
        self.outcome()
    }

    fn set_read_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        self.counts.lock().set_read_deadline += 1;
        self.outcome()
    }

    fn set_write_deadline(&self, _deadline: Option<Instant>) -> io::Result<()> {
        self.counts.lock().set_write_deadline += 1;
        self.outcome()
    }
}

impl AsyncRead for MockIo {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let n = this.do_read(buf.initialize_unfilled())?;
        buf.advance(n);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIo {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        Poll::Ready(self.get_mut().do_write(buf))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(self.get_mut().do_flush())
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(self.get_mut().do_close())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read as _, Write as _};

    use super::*;

    use static_assertions::assert_impl_all;

    assert_impl_all!(MockIo: Send, Sync, Unpin, AsyncRead, AsyncWrite, Connection, Close);

    #[test]
    fn read_budget() {
        let mut mock = MockIo::new().fail_after_read(3);
        let mut buf = [0u8; 5];
        assert_eq!(mock.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(mock.read(&mut buf).unwrap_err().to_string(), MOCK_ERROR);
        assert_eq!(mock.counts().read, 2);
    }

    #[test]
    fn write_budget() {
        let mut mock = MockIo::new().fail_after_write(2);
        assert_eq!(mock.write(b"xyz").unwrap(), 2);
        assert!(mock.write(b"z").is_err());
        assert_eq!(mock.written(), b"xy");
    }

    #[test]
    fn failing_counts_calls() {
        let mut mock = MockIo::failing();
        assert!(mock.close().is_err());
        assert!(mock.set_deadline(None).is_err());
        assert_eq!(mock.counts().close, 1);
        assert_eq!(mock.counts().set_deadline, 1);
    }
}
