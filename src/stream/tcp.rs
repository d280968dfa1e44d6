//! Capability implementations for [`std::net::TcpStream`].
//!
//! Addresses are canonicalized, so IPv4 peers of dual-stack sockets are reported
//! as plain IPv4 addresses rather than IPv4-mapped IPv6 addresses.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Instant;

use super::{Close, Connection, deadline_to_timeout};

/// Canonicalize a socket address, converting IPv4-mapped IPv6 addresses
/// into standard IPv4 addresses.
///
/// IPv4 clients connecting to dual-stack (IPv4/IPv6) servers appear as
/// IPv4-mapped IPv6 addresses (e.g., `::ffff:192.0.2.1`), this converts them
/// back to regular IPv4 addresses (`192.0.2.1`).
pub(crate) fn make_canonical(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        std::net::IpAddr::V4(_) => addr,
        std::net::IpAddr::V6(ip) => {
            if let Some(ip) = ip.to_ipv4_mapped() {
                SocketAddr::new(std::net::IpAddr::V4(ip), addr.port())
            } else {
                addr
            }
        }
    }
}

impl Close for TcpStream {
    /// Shuts down both halves of the connection.
    ///
    /// The socket itself is released when the stream is dropped.
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

impl Connection for TcpStream {
    type Addr = SocketAddr;

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self).map(make_canonical)
    }

    fn remote_addr(&self) -> io::Result<SocketAddr> {
        self.peer_addr().map(make_canonical)
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_read_timeout(deadline_to_timeout(deadline))
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.set_write_timeout(deadline_to_timeout(deadline))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read as _, Write as _};
    use std::net::{Ipv4Addr, Ipv6Addr, TcpListener};
    use std::time::Duration;

    use super::*;

    fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn canonical_ipv4_mapped() {
        let mapped = SocketAddr::new(Ipv4Addr::LOCALHOST.to_ipv6_mapped().into(), 80);
        assert_eq!(
            make_canonical(mapped),
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 80)
        );

        let v6 = SocketAddr::new(Ipv6Addr::LOCALHOST.into(), 80);
        assert_eq!(make_canonical(v6), v6);
    }

    #[test]
    fn connection_addresses() {
        let (client, server) = pair();

        let info = Connection::info(&client).unwrap();
        assert_eq!(info.remote_addr, Connection::local_addr(&server).unwrap());
        assert_eq!(info.local_addr, Connection::remote_addr(&server).unwrap());
    }

    #[test]
    fn read_deadline_times_out() {
        let (mut client, _server) = pair();

        client
            .set_read_deadline(Some(Instant::now() + Duration::from_millis(20)))
            .unwrap();
        let mut buf = [0u8; 4];
        let err = client.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));

        client.set_deadline(None).unwrap();
        assert_eq!(client.read_timeout().unwrap(), None);
        assert_eq!(client.write_timeout().unwrap(), None);
    }

    #[test]
    fn close_shuts_down() {
        let (mut client, mut server) = pair();

        client.write_all(b"bye").unwrap();
        client.close().unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"bye");
    }
}
