//! Connection Information

use std::fmt;

/// The local and remote addresses of a connection, captured together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo<Addr> {
    /// The local address for this connection.
    pub local_addr: Addr,

    /// The remote address for this connection.
    pub remote_addr: Addr,
}

impl<Addr> Default for ConnectionInfo<Addr>
where
    Addr: Default,
{
    fn default() -> Self {
        Self {
            local_addr: Addr::default(),
            remote_addr: Addr::default(),
        }
    }
}

impl<Addr> ConnectionInfo<Addr> {
    /// The local address for this connection
    pub fn local_addr(&self) -> &Addr {
        &self.local_addr
    }

    /// The remote address for this connection
    pub fn remote_addr(&self) -> &Addr {
        &self.remote_addr
    }

    /// Map the addresses in this connection info to a new type.
    pub fn map<T, F>(self, f: F) -> ConnectionInfo<T>
    where
        F: Fn(Addr) -> T,
    {
        ConnectionInfo {
            local_addr: f(self.local_addr),
            remote_addr: f(self.remote_addr),
        }
    }
}

impl<Addr> fmt::Display for ConnectionInfo<Addr>
where
    Addr: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.local_addr, self.remote_addr)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use super::*;

    #[test]
    fn display_and_map() {
        let info = ConnectionInfo {
            local_addr: SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 1000),
            remote_addr: SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 2000),
        };
        assert_eq!(info.to_string(), "127.0.0.1:1000 -> 127.0.0.1:2000");

        let ports = info.map(|addr| addr.port());
        assert_eq!(*ports.local_addr(), 1000);
        assert_eq!(*ports.remote_addr(), 2000);
    }
}
