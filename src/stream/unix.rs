//! Capability implementations for [`std::os::unix::net::UnixStream`].

use std::fmt;
use std::io;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Instant;

use super::{Close, Connection, deadline_to_timeout};

/// Address of one end of a unix stream.
///
/// Unnamed sockets (such as those from [`UnixStream::pair`]) have no path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnixAddr {
    path: Option<PathBuf>,
}

impl UnixAddr {
    /// The filesystem path of the socket, if it is bound to one.
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }
}

impl From<std::os::unix::net::SocketAddr> for UnixAddr {
    fn from(addr: std::os::unix::net::SocketAddr) -> Self {
        Self {
            path: addr.as_pathname().map(ToOwned::to_owned),
        }
    }
}

impl fmt::Display for UnixAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "unix://{}", path.display()),
            None => f.write_str("unix://(unnamed)"),
        }
    }
}

impl Close for UnixStream {
    /// Shuts down both halves of the connection.
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

impl Connection for UnixStream {
    type Addr = UnixAddr;

    fn local_addr(&self) -> io::Result<UnixAddr> {
        UnixStream::local_addr(self).map(UnixAddr::from)
    }

    fn remote_addr(&self) -> io::Result<UnixAddr> {
        self.peer_addr().map(UnixAddr::from)
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(deadline_to_timeout(deadline))
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_write_timeout(deadline_to_timeout(deadline))
    }
}
