//! The logged I/O proxy.
//!
//! [`LoggedIo`] forwards every call to the stream it wraps, and then tells its
//! [`Report`]er what happened. Results are returned exactly as the wrapped stream
//! produced them.
//!
//! Reporting follows a fixed contract:
//!
//! - Reads and writes report only the bytes actually transferred, and only when
//!   at least one byte was transferred.
//! - Failed operations report the error with the [`Location`] of the call.
//! - Close always reports the close, and then the error if closing failed.
//! - Address lookups are never reported, and deadlines only report errors.

use std::io::{self, IoSlice};
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Instant;

use pin_project::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::error::{Capability, Error};
use crate::report::{Location, Report};
use crate::stream::dynamic::{DynAddr, DynTarget};
use crate::stream::{Close, Connection};

/// A stream proxy which reports every read, write, error and close.
///
/// `LoggedIo` implements each of [`io::Read`], [`io::Write`], [`Close`],
/// [`Connection`], [`AsyncRead`] and [`AsyncWrite`] whenever the wrapped stream
/// does, so it can be used anywhere the wrapped stream could, including inside
/// another `LoggedIo`.
///
/// ```
/// use std::io::{Cursor, Read};
/// use loggedio::LoggedIo;
/// use loggedio::report::{Event, Recorder};
///
/// let recorder = Recorder::new();
/// let mut proxy = LoggedIo::new(Cursor::new(b"hello".to_vec()), &recorder);
///
/// let mut buf = [0u8; 8];
/// let n = proxy.read(&mut buf).unwrap();
/// assert_eq!(n, 5);
/// assert_eq!(recorder.take(), [Event::Read(b"hello".to_vec())]);
/// ```
#[pin_project]
#[derive(Debug, Clone)]
pub struct LoggedIo<T, R> {
    #[pin]
    target: T,
    reporter: R,
}

impl<T, R> LoggedIo<T, R> {
    /// Wrap `target`, reporting its events to `reporter`.
    pub fn new(target: T, reporter: R) -> Self {
        Self { target, reporter }
    }

    /// Get a reference to the proxied stream.
    pub fn get_ref(&self) -> &T {
        &self.target
    }

    /// Get a mutable reference to the proxied stream.
    ///
    /// Operations performed directly on the stream are not reported.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Get a pinned mutable reference to the proxied stream.
    pub fn get_pin_mut(self: Pin<&mut Self>) -> Pin<&mut T> {
        self.project().target
    }

    /// The reporter events are sent to.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Unwrap the proxied stream, discarding the reporter.
    pub fn into_inner(self) -> T {
        self.target
    }

    /// Unwrap the proxied stream and the reporter.
    pub fn into_parts(self) -> (T, R) {
        (self.target, self.reporter)
    }
}

fn report_read<R: Report + ?Sized>(reporter: &R, filled: &[u8]) {
    if !filled.is_empty() {
        reporter.on_read(filled);
    }
}

fn report_transfer<R, F>(reporter: &R, location: Location, result: &io::Result<usize>, data: F)
where
    R: Report + ?Sized,
    F: FnOnce(&R, usize),
{
    match result {
        Ok(0) => {}
        Ok(n) => data(reporter, *n),
        Err(error) => reporter.on_error(location, error),
    }
}

fn report_write<R: Report + ?Sized>(reporter: &R, buf: &[u8], result: &io::Result<usize>) {
    report_transfer(reporter, Location::Write, result, |reporter, n| {
        reporter.on_write(&buf[..n])
    });
}

fn report_write_vectored<R: Report + ?Sized>(
    reporter: &R,
    bufs: &[IoSlice<'_>],
    result: &io::Result<usize>,
) {
    report_transfer(reporter, Location::Write, result, |reporter, n| {
        let mut remaining = n;
        for buf in bufs {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(buf.len());
            if take > 0 {
                reporter.on_write(&buf[..take]);
            }
            remaining -= take;
        }
    });
}

fn report_close<R: Report + ?Sized>(reporter: &R, result: &io::Result<()>) {
    tracing::trace!(ok = result.is_ok(), "proxied stream closed");
    reporter.on_close();
    if let Err(error) = result {
        reporter.on_error(Location::Close, error);
    }
}

fn report_error<R: Report + ?Sized>(reporter: &R, location: Location, result: &io::Result<()>) {
    if let Err(error) = result {
        reporter.on_error(location, error);
    }
}

impl<T, R> io::Read for LoggedIo<T, R>
where
    T: io::Read,
    R: Report,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.target.read(buf);
        report_transfer(&self.reporter, Location::Read, &result, |reporter, n| {
            reporter.on_read(&buf[..n])
        });
        result
    }
}

impl<T, R> io::Write for LoggedIo<T, R>
where
    T: io::Write,
    R: Report,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.target.write(buf);
        report_write(&self.reporter, buf, &result);
        result
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        let result = self.target.write_vectored(bufs);
        report_write_vectored(&self.reporter, bufs, &result);
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.target.flush()
    }
}

impl<T, R> Close for LoggedIo<T, R>
where
    T: Close,
    R: Report,
{
    fn close(&mut self) -> io::Result<()> {
        let result = self.target.close();
        report_close(&self.reporter, &result);
        result
    }
}

impl<T, R> Connection for LoggedIo<T, R>
where
    T: Connection,
    R: Report,
{
    type Addr = T::Addr;

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.target.local_addr()
    }

    fn remote_addr(&self) -> io::Result<Self::Addr> {
        self.target.remote_addr()
    }

    fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        let result = self.target.set_deadline(deadline);
        report_error(&self.reporter, Location::SetDeadline, &result);
        result
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        let result = self.target.set_read_deadline(deadline);
        report_error(&self.reporter, Location::SetReadDeadline, &result);
        result
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        let result = self.target.set_write_deadline(deadline);
        report_error(&self.reporter, Location::SetWriteDeadline, &result);
        result
    }
}

impl<T, R> AsyncRead for LoggedIo<T, R>
where
    T: AsyncRead,
    R: Report,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        let before = buf.filled().len();
        let result = ready!(this.target.poll_read(cx, buf));
        match &result {
            Ok(()) => report_read(this.reporter, &buf.filled()[before..]),
            Err(error) => this.reporter.on_error(Location::Read, error),
        }
        Poll::Ready(result)
    }
}

impl<T, R> AsyncWrite for LoggedIo<T, R>
where
    T: AsyncWrite,
    R: Report,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        let this = self.project();
        let result = ready!(this.target.poll_write(cx, buf));
        report_write(this.reporter, buf, &result);
        Poll::Ready(result)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        self.project().target.poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        let this = self.project();
        let result = ready!(this.target.poll_shutdown(cx));
        report_close(this.reporter, &result);
        Poll::Ready(result)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<Result<usize, io::Error>> {
        let this = self.project();
        let result = ready!(this.target.poll_write_vectored(cx, bufs));
        report_write_vectored(this.reporter, bufs, &result);
        Poll::Ready(result)
    }

    fn is_write_vectored(&self) -> bool {
        self.target.is_write_vectored()
    }
}

/// Checked operations for proxies around a [`DynTarget`].
///
/// Each method first checks that the target was declared with the capability
/// it needs. If it was not, [`Error::Unsupported`] is returned, nothing is
/// forwarded, and nothing is reported. Otherwise the operation behaves exactly
/// like its trait counterpart, with I/O errors returned as [`Error::Io`].
impl<T, R> LoggedIo<DynTarget<T>, R>
where
    R: Report,
{
    /// Checked [`io::Read::read`].
    pub fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.target.ensure(Capability::Read, "read")?;
        Ok(io::Read::read(self, buf)?)
    }

    /// Checked [`io::Write::write`].
    pub fn try_write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.target.ensure(Capability::Write, "write")?;
        Ok(io::Write::write(self, buf)?)
    }

    /// Checked [`Close::close`].
    pub fn try_close(&mut self) -> Result<(), Error> {
        self.target.ensure(Capability::Close, "close")?;
        Ok(Close::close(self)?)
    }

    /// Checked [`Connection::local_addr`].
    pub fn try_local_addr(&self) -> Result<DynAddr, Error> {
        self.target.ensure(Capability::Connection, "local_addr")?;
        Ok(Connection::local_addr(self)?)
    }

    /// Checked [`Connection::remote_addr`].
    pub fn try_remote_addr(&self) -> Result<DynAddr, Error> {
        self.target.ensure(Capability::Connection, "remote_addr")?;
        Ok(Connection::remote_addr(self)?)
    }

    /// Checked [`Connection::set_deadline`].
    pub fn try_set_deadline(&self, deadline: Option<Instant>) -> Result<(), Error> {
        self.target.ensure(Capability::Connection, "set_deadline")?;
        Ok(Connection::set_deadline(self, deadline)?)
    }

    /// Checked [`Connection::set_read_deadline`].
    pub fn try_set_read_deadline(&self, deadline: Option<Instant>) -> Result<(), Error> {
        self.target
            .ensure(Capability::Connection, "set_read_deadline")?;
        Ok(Connection::set_read_deadline(self, deadline)?)
    }

    /// Checked [`Connection::set_write_deadline`].
    pub fn try_set_write_deadline(&self, deadline: Option<Instant>) -> Result<(), Error> {
        self.target
            .ensure(Capability::Connection, "set_write_deadline")?;
        Ok(Connection::set_write_deadline(self, deadline)?)
    }
}
