//! # loggedio: transparent stream proxies which report their traffic
//!
//! loggedio wraps a byte stream (a socket, a pipe, anything which reads and
//! writes) in a [`LoggedIo`] proxy. Every operation is forwarded to the wrapped
//! stream unchanged, and its outcome is then handed to a [`Report`]er: the bytes
//! that were actually read or written, errors tagged with the operation they
//! came from, and close calls. Data and error semantics of the wrapped stream are
//! never altered, which makes the proxy suitable for debugging or auditing
//! traffic in place.
//!
//! ## Capabilities
//!
//! A proxy implements exactly the stream traits its target implements:
//!
//! - [`std::io::Read`] and [`std::io::Write`]
//! - [`tokio::io::AsyncRead`] and [`tokio::io::AsyncWrite`]
//! - [`Close`], for explicitly closing a stream
//! - [`Connection`], for addresses and deadlines
//!
//! When the capabilities of a target are only known at runtime, wrap it in a
//! [`DynTarget`] which declares them explicitly, and use the `try_*` methods on
//! the proxy to get an [`Error::Unsupported`] instead of a panic.
//!
//! ## Reporting
//!
//! The [`report`] module provides reporters built from closures, from templates
//! rendered to a [`sink`], and raw dumps of each direction. The convenience
//! constructors ([`string_to_log`], [`hex_to_writer`], [`dump_to_files`] and
//! friends) and the [`Builder`] wire these up for common cases.
//!
//! ```
//! use std::io::{Read, Write};
//! use loggedio::string_to_writer;
//!
//! let target = std::io::Cursor::new(b"abc".to_vec());
//! let mut proxy = string_to_writer(target, Vec::new(), "R [%v]", "W [%v]", "E [%v: %v]", "C");
//!
//! let mut buf = [0u8; 3];
//! proxy.read_exact(&mut buf).unwrap();
//! proxy.write_all(b"test").unwrap();
//!
//! let (_, reporter) = proxy.into_parts();
//! assert_eq!(reporter.into_sink().into_inner(), b"R [abc]W [test]");
//! ```
//!
//! ## Tower
//!
//! [`LoggedIoLayer`] wraps every stream returned by a connector-style tower
//! service in a proxy.
//!
//! ## Feature Flags
//!
//! - `mock`: Exposes the [`mock`] module, a configurable stream for testing
//!   code which uses proxies.

pub mod builder;
pub mod error;
pub mod format;
pub mod info;
pub mod layer;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod proxy;
pub mod report;
pub mod sink;
pub mod stream;

pub use self::builder::{
    Builder, dump_to_files, dump_to_writers, generic, hex_to_log, hex_to_writer, string_to_log,
    string_to_writer,
};
pub use self::error::{Capability, Error, UnsupportedCapability};
pub use self::layer::LoggedIoLayer;
pub use self::proxy::LoggedIo;
pub use self::report::{Location, Report};
pub use self::stream::dynamic::{DynAddr, DynTarget};
pub use self::stream::{Close, Connection};

/// Test fixtures
#[cfg(test)]
#[allow(dead_code)]
pub(crate) mod fixtures {

    use std::sync::Once;

    /// Registers a global default tracing subscriber when called for the first time. This is intended
    /// for use in tests.
    pub fn subscribe() {
        static INSTALL_TRACING_SUBSCRIBER: Once = Once::new();
        INSTALL_TRACING_SUBSCRIBER.call_once(|| {
            let subscriber = tracing_subscriber::FmtSubscriber::builder()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .finish();
            tracing::subscriber::set_global_default(subscriber).unwrap();
        });
    }
}
