//! Error types for logged I/O proxies.
//!
//! I/O errors from the proxied stream are never wrapped by the proxy itself, they
//! flow through as [`std::io::Error`]. The types here only exist for the dynamic
//! dispatch path, where a target may be asked for a capability it never declared.

use std::fmt;
use std::io;

use thiserror::Error;

/// A capability set which a proxied target may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Capability {
    /// Reading bytes, see [`std::io::Read`].
    Read,

    /// Writing bytes, see [`std::io::Write`].
    Write,

    /// Closing the stream, see [`crate::Close`].
    Close,

    /// Addresses and deadlines, see [`crate::Connection`].
    Connection,
}

impl Capability {
    /// The name of the trait which provides this capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "Read",
            Capability::Write => "Write",
            Capability::Close => "Close",
            Capability::Connection => "Connection",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The proxied target does not provide the capability an operation needs.
///
/// This is a wiring bug, not a runtime condition. It is never reported to the
/// proxy's reporter.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("proxied target does not support {capability} (called {operation})")]
pub struct UnsupportedCapability {
    capability: Capability,
    operation: &'static str,
}

impl UnsupportedCapability {
    pub(crate) fn new(capability: Capability, operation: &'static str) -> Self {
        Self {
            capability,
            operation,
        }
    }

    /// The capability which was missing.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// The operation which needed the capability.
    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

/// Error returned by the checked operations on a dynamically dispatched proxy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The target was not declared with the capability this operation needs.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedCapability),

    /// The target returned an I/O error, unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// The I/O error from the target, if this was one.
    pub fn as_io(&self) -> Option<&io::Error> {
        match self {
            Error::Io(error) => Some(error),
            Error::Unsupported(_) => None,
        }
    }

    /// The missing capability, if this was a capability mismatch.
    pub fn unsupported(&self) -> Option<&UnsupportedCapability> {
        match self {
            Error::Unsupported(error) => Some(error),
            Error::Io(_) => None,
        }
    }
}
