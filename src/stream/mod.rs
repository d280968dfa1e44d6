//! Capability traits for proxied streams, and their implementations.
//!
//! Reading and writing use the standard [`std::io::Read`] and [`std::io::Write`]
//! traits (or tokio's [`AsyncRead`](tokio::io::AsyncRead) and
//! [`AsyncWrite`](tokio::io::AsyncWrite)). The standard library has no trait for
//! explicitly closing a stream or for socket-like addressing and deadlines, so those
//! capabilities are described here by [`Close`] and [`Connection`].
//!
//! # Modules
//!
//! - [`tcp`] - implementations for [`std::net::TcpStream`]
//! - [`unix`] - implementations for [`std::os::unix::net::UnixStream`]
//! - [`dynamic`] - a wrapper which declares capabilities at runtime
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::time::{Duration, Instant};
//! use loggedio::{Close, Connection};
//!
//! # fn example() -> std::io::Result<()> {
//! let mut stream = std::net::TcpStream::connect("127.0.0.1:8080")?;
//! stream.set_read_deadline(Some(Instant::now() + Duration::from_secs(5)))?;
//! println!("connected {}", stream.info()?);
//! stream.close()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use crate::info::ConnectionInfo;

pub mod dynamic;
pub mod tcp;
#[cfg(unix)]
pub mod unix;

/// A stream which can be explicitly closed.
pub trait Close {
    /// Close the stream.
    ///
    /// Errors describe the failure to close. The stream should not be used
    /// for further I/O after this has been called, whatever the outcome.
    fn close(&mut self) -> io::Result<()>;
}

impl<T: Close + ?Sized> Close for &mut T {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<T: Close + ?Sized> Close for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// A connected stream with addresses and deadlines.
///
/// A deadline is an absolute point in time after which blocking reads or writes
/// fail with a timeout. Passing `None` clears the deadline.
pub trait Connection {
    /// The address type for this connection.
    type Addr: fmt::Display + fmt::Debug + Send;

    /// The local address of the connection.
    fn local_addr(&self) -> io::Result<Self::Addr>;

    /// The remote address of the connection.
    fn remote_addr(&self) -> io::Result<Self::Addr>;

    /// Set the deadline for both reads and writes.
    fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_deadline(deadline)?;
        self.set_write_deadline(deadline)
    }

    /// Set the deadline for reads.
    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()>;

    /// Set the deadline for writes.
    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()>;

    /// Get the local and remote address of this connection at once.
    fn info(&self) -> io::Result<ConnectionInfo<Self::Addr>> {
        Ok(ConnectionInfo {
            local_addr: self.local_addr()?,
            remote_addr: self.remote_addr()?,
        })
    }
}

impl<T: Connection + ?Sized> Connection for &mut T {
    type Addr = T::Addr;

    fn local_addr(&self) -> io::Result<Self::Addr> {
        (**self).local_addr()
    }

    fn remote_addr(&self) -> io::Result<Self::Addr> {
        (**self).remote_addr()
    }

    fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_deadline(deadline)
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(deadline)
    }
}

impl<T: Connection + ?Sized> Connection for Box<T> {
    type Addr = T::Addr;

    fn local_addr(&self) -> io::Result<Self::Addr> {
        (**self).local_addr()
    }

    fn remote_addr(&self) -> io::Result<Self::Addr> {
        (**self).remote_addr()
    }

    fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_deadline(deadline)
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_write_deadline(deadline)
    }
}

/// Convert an absolute deadline into the relative timeout std sockets expect.
///
/// std rejects a zero timeout, so a deadline which has already passed becomes
/// the smallest representable timeout instead.
pub(crate) fn deadline_to_timeout(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|at| {
        let remaining = at.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            Duration::from_nanos(1)
        } else {
            remaining
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_deadline_is_no_timeout() {
        assert_eq!(deadline_to_timeout(None), None);
    }

    #[test]
    fn elapsed_deadline_is_never_zero() {
        let past = Instant::now()
            .checked_sub(Duration::from_secs(1))
            .unwrap_or_else(Instant::now);
        let timeout = deadline_to_timeout(Some(past)).unwrap();
        assert!(!timeout.is_zero());
    }

    #[test]
    fn future_deadline_is_relative() {
        let timeout = deadline_to_timeout(Some(Instant::now() + Duration::from_secs(60))).unwrap();
        assert!(timeout > Duration::from_secs(50));
        assert!(timeout <= Duration::from_secs(60));
    }
}
