//! Runtime-declared capabilities for proxied targets.
//!
//! [`DynTarget`] pairs a value with an explicit declaration of which capability
//! sets it provides. Each declaration requires the matching trait bound, so a
//! target can never claim a capability it doesn't have. Which capabilities were
//! declared is only checked when an operation is called, on every call.
//!
//! Calling an undeclared capability through the standard traits panics. Use the
//! `try_*` methods on [`LoggedIo`](crate::LoggedIo) to get an
//! [`UnsupportedCapability`] error instead.

use std::any::Any;
use std::fmt;
use std::io;
use std::time::Instant;

use crate::error::{Capability, UnsupportedCapability};

use super::{Close, Connection};

type ReadFn<T> = fn(&mut T, &mut [u8]) -> io::Result<usize>;
type CloseFn<T> = fn(&mut T) -> io::Result<()>;

struct WriteFns<T> {
    write: fn(&mut T, &[u8]) -> io::Result<usize>,
    flush: fn(&mut T) -> io::Result<()>,
}

impl<T> Clone for WriteFns<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WriteFns<T> {}

struct ConnectionFns<T> {
    local_addr: fn(&T) -> io::Result<DynAddr>,
    remote_addr: fn(&T) -> io::Result<DynAddr>,
    set_deadline: fn(&T, Option<Instant>) -> io::Result<()>,
    set_read_deadline: fn(&T, Option<Instant>) -> io::Result<()>,
    set_write_deadline: fn(&T, Option<Instant>) -> io::Result<()>,
}

impl<T> Clone for ConnectionFns<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ConnectionFns<T> {}

trait ErasedAddr: fmt::Display + fmt::Debug + Send {
    fn as_any(&self) -> &dyn Any;
}

impl<A> ErasedAddr for A
where
    A: fmt::Display + fmt::Debug + Send + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A connection address with its concrete type erased.
pub struct DynAddr(Box<dyn ErasedAddr>);

impl DynAddr {
    fn new<A>(addr: A) -> Self
    where
        A: fmt::Display + fmt::Debug + Send + 'static,
    {
        Self(Box::new(addr))
    }

    /// The concrete address, if it has type `A`.
    pub fn downcast_ref<A: 'static>(&self) -> Option<&A> {
        self.0.as_any().downcast_ref()
    }
}

impl fmt::Debug for DynAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for DynAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A target together with the capability sets it was declared to provide.
///
/// ```
/// use std::io::{Cursor, Read};
/// use loggedio::{Capability, DynTarget};
///
/// let mut target = DynTarget::new(Cursor::new(b"abc".to_vec())).readable();
/// assert!(target.supports(Capability::Read));
/// assert!(!target.supports(Capability::Close));
///
/// let mut buf = [0u8; 3];
/// target.read_exact(&mut buf).unwrap();
/// ```
pub struct DynTarget<T> {
    inner: T,
    read: Option<ReadFn<T>>,
    write: Option<WriteFns<T>>,
    close: Option<CloseFn<T>>,
    connection: Option<ConnectionFns<T>>,
}

impl<T> DynTarget<T> {
    /// Wrap `inner` without declaring any capabilities.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            read: None,
            write: None,
            close: None,
            connection: None,
        }
    }

    /// Declare that the target can be read from.
    pub fn readable(mut self) -> Self
    where
        T: io::Read,
    {
        self.read = Some(<T as io::Read>::read as ReadFn<T>);
        self
    }

    /// Declare that the target can be written to.
    pub fn writable(mut self) -> Self
    where
        T: io::Write,
    {
        self.write = Some(WriteFns {
            write: <T as io::Write>::write,
            flush: <T as io::Write>::flush,
        });
        self
    }

    /// Declare that the target can be closed.
    pub fn closable(mut self) -> Self
    where
        T: Close,
    {
        self.close = Some(<T as Close>::close as CloseFn<T>);
        self
    }

    /// Declare that the target has addresses and deadlines.
    pub fn connection(mut self) -> Self
    where
        T: Connection,
        T::Addr: 'static,
    {
        self.connection = Some(ConnectionFns {
            local_addr: |target: &T| target.local_addr().map(DynAddr::new),
            remote_addr: |target: &T| target.remote_addr().map(DynAddr::new),
            set_deadline: <T as Connection>::set_deadline,
            set_read_deadline: <T as Connection>::set_read_deadline,
            set_write_deadline: <T as Connection>::set_write_deadline,
        });
        self
    }

    /// Wrap a target which provides every capability.
    pub fn full(inner: T) -> Self
    where
        T: io::Read + io::Write + Close + Connection,
        T::Addr: 'static,
    {
        Self::new(inner)
            .readable()
            .writable()
            .closable()
            .connection()
    }

    /// Whether the target was declared with `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.read.is_some(),
            Capability::Write => self.write.is_some(),
            Capability::Close => self.close.is_some(),
            Capability::Connection => self.connection.is_some(),
        }
    }

    /// Check that `capability` was declared before calling `operation`.
    pub(crate) fn ensure(
        &self,
        capability: Capability,
        operation: &'static str,
    ) -> Result<(), UnsupportedCapability> {
        if self.supports(capability) {
            Ok(())
        } else {
            let error = UnsupportedCapability::new(capability, operation);
            tracing::trace!(%error, "capability check failed");
            Err(error)
        }
    }

    /// Get a reference to the wrapped target.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Get a mutable reference to the wrapped target.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the target, discarding the capability declaration.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[track_caller]
fn require<F>(
    slot: Option<F>,
    capability: Capability,
    operation: &'static str,
) -> F {
    match slot {
        Some(f) => f,
        None => {
            let error = UnsupportedCapability::new(capability, operation);
            tracing::trace!(%error, "capability check failed");
            panic!("{error}")
        }
    }
}

impl<T> fmt::Debug for DynTarget<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let capabilities: Vec<Capability> = [
            Capability::Read,
            Capability::Write,
            Capability::Close,
            Capability::Connection,
        ]
        .into_iter()
        .filter(|capability| self.supports(*capability))
        .collect();

        f.debug_struct("DynTarget")
            .field("inner", &self.inner)
            .field("capabilities", &capabilities)
            .finish()
    }
}

impl<T> io::Read for DynTarget<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = require(self.read, Capability::Read, "read");
        read(&mut self.inner, buf)
    }
}

impl<T> io::Write for DynTarget<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let fns = require(self.write, Capability::Write, "write");
        (fns.write)(&mut self.inner, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let fns = require(self.write, Capability::Write, "flush");
        (fns.flush)(&mut self.inner)
    }
}

impl<T> Close for DynTarget<T> {
    fn close(&mut self) -> io::Result<()> {
        let close = require(self.close, Capability::Close, "close");
        close(&mut self.inner)
    }
}

impl<T> Connection for DynTarget<T> {
    type Addr = DynAddr;

    fn local_addr(&self) -> io::Result<DynAddr> {
        let fns = require(self.connection, Capability::Connection, "local_addr");
        (fns.local_addr)(&self.inner)
    }

    fn remote_addr(&self) -> io::Result<DynAddr> {
        let fns = require(self.connection, Capability::Connection, "remote_addr");
        (fns.remote_addr)(&self.inner)
    }

    fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        let fns = require(self.connection, Capability::Connection, "set_deadline");
        (fns.set_deadline)(&self.inner, deadline)
    }

    fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        let fns = require(self.connection, Capability::Connection, "set_read_deadline");
        (fns.set_read_deadline)(&self.inner, deadline)
    }

    fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        let fns = require(self.connection, Capability::Connection, "set_write_deadline");
        (fns.set_write_deadline)(&self.inner, deadline)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read as _, Write as _};
    use std::net::{Ipv4Addr, SocketAddr};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::mock::MockIo;

    fn panics<F: FnOnce() -> R, R>(f: F) -> bool {
        catch_unwind(AssertUnwindSafe(f)).is_err()
    }

    #[test]
    fn full_target_forwards_everything() {
        let mut target = DynTarget::full(MockIo::new());

        let mut buf = [0u8; 3];
        assert_eq!(target.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(target.write(b"xyz").unwrap(), 3);
        target.flush().unwrap();
        target.close().unwrap();
        target.set_deadline(None).unwrap();
        target.set_read_deadline(None).unwrap();
        target.set_write_deadline(None).unwrap();

        let local = target.local_addr().unwrap();
        assert_eq!(
            local.downcast_ref::<SocketAddr>(),
            Some(&SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 1))
        );
        assert_eq!(target.remote_addr().unwrap().to_string(), "127.0.0.1:2");

        let mock = target.into_inner();
        assert_eq!(mock.written(), b"xyz");
        assert_eq!(mock.counts().close, 1);
        assert_eq!(mock.counts().set_deadline, 1);
        assert_eq!(mock.counts().set_read_deadline, 1);
        assert_eq!(mock.counts().set_write_deadline, 1);
        assert_eq!(mock.counts().local_addr, 1);
        assert_eq!(mock.counts().remote_addr, 1);
    }

    #[test]
    fn undeclared_capabilities_panic() {
        let mut target = DynTarget::new(MockIo::new()).readable();

        assert!(!panics(|| target.read(&mut [0u8; 1])));
        assert!(panics(|| target.write(&[1])));
        assert!(panics(|| target.flush()));
        assert!(panics(|| target.close()));
        assert!(panics(|| target.local_addr()));
        assert!(panics(|| target.remote_addr()));
        assert!(panics(|| target.set_deadline(None)));
        assert!(panics(|| target.set_read_deadline(None)));
        assert!(panics(|| target.set_write_deadline(None)));

        assert_eq!(target.get_ref().counts().close, 0);
    }

    #[test]
    fn undeclared_read_panics() {
        let mut target = DynTarget::new(MockIo::new()).writable();

        assert!(panics(|| target.read(&mut [0u8; 1])));
        assert!(!panics(|| target.write(&[1])));
        assert_eq!(target.get_ref().counts().read, 0);
    }

    #[test]
    fn ensure_reports_operation() {
        let target = DynTarget::new(MockIo::new()).closable();
        assert!(target.ensure(Capability::Close, "close").is_ok());

        let error = target.ensure(Capability::Write, "write").unwrap_err();
        assert_eq!(error.capability(), Capability::Write);
        assert_eq!(error.operation(), "write");
    }

    #[test]
    fn debug_lists_capabilities() {
        let target = DynTarget::new(MockIo::new()).writable().closable();
        let debug = format!("{target:?}");
        assert!(debug.contains("capabilities: [Write, Close]"), "{debug}");
    }
}
