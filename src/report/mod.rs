//! Reporting of stream events.
//!
//! A [`Report`] receives every event a [`LoggedIo`](crate::LoggedIo) observes:
//! the bytes which were read, the bytes which were written, errors together with
//! the [`Location`] they came from, and close calls. Reporters are called after
//! the operation on the proxied stream has completed.
//!
//! Three reporters are provided:
//!
//! - [`Callbacks`] - four user-supplied closures
//! - [`Formatted`] - formats events with [`Template`](crate::format::Template)s
//!   and sends them to a [`Sink`](crate::sink::Sink)
//! - [`Dump`] - copies raw bytes to one sink per direction

use std::fmt;
use std::io;
use std::sync::Arc;

mod dump;
mod formatted;

pub use self::dump::Dump;
pub use self::formatted::{Formatted, Templates};

/// Where an error was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Location {
    /// Reading from the proxied stream
    Read,

    /// Writing to the proxied stream
    Write,

    /// Closing the proxied stream
    Close,

    /// Setting both deadlines on the proxied stream
    SetDeadline,

    /// Setting the read deadline on the proxied stream
    SetReadDeadline,

    /// Setting the write deadline on the proxied stream
    SetWriteDeadline,

    /// Dumping read bytes to their sink
    ReadSink,

    /// Dumping written bytes to their sink
    WriteSink,
}

impl Location {
    /// The tag used when this location is reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Read => "Read()",
            Location::Write => "Write()",
            Location::Close => "Close()",
            Location::SetDeadline => "SetDeadline()",
            Location::SetReadDeadline => "SetReadDeadline()",
            Location::SetWriteDeadline => "SetWriteDeadline()",
            Location::ReadSink => "read sink",
            Location::WriteSink => "write sink",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the events observed by a proxy.
///
/// Every method defaults to doing nothing, so implementations only need to
/// handle the events they care about. Methods take `&self`, reporters which keep
/// state should use interior mutability.
///
/// A panic in a reporter propagates to the caller of the proxied operation.
pub trait Report {
    /// Bytes were read. `data` is never empty.
    fn on_read(&self, data: &[u8]) {
        let _ = data;
    }

    /// Bytes were written. `data` is never empty, and may be a prefix of what the
    /// caller tried to write.
    fn on_write(&self, data: &[u8]) {
        let _ = data;
    }

    /// An operation failed.
    fn on_error(&self, location: Location, error: &io::Error) {
        let _ = (location, error);
    }

    /// The stream was closed, successfully or not.
    fn on_close(&self) {}
}

/// Reports nothing.
impl Report for () {}

impl<R: Report + ?Sized> Report for &R {
    fn on_read(&self, data: &[u8]) {
        (**self).on_read(data)
    }

    fn on_write(&self, data: &[u8]) {
        (**self).on_write(data)
    }

    fn on_error(&self, location: Location, error: &io::Error) {
        (**self).on_error(location, error)
    }

    fn on_close(&self) {
        (**self).on_close()
    }
}

impl<R: Report + ?Sized> Report for Box<R> {
    fn on_read(&self, data: &[u8]) {
        (**self).on_read(data)
    }

    fn on_write(&self, data: &[u8]) {
        (**self).on_write(data)
    }

    fn on_error(&self, location: Location, error: &io::Error) {
        (**self).on_error(location, error)
    }

    fn on_close(&self) {
        (**self).on_close()
    }
}

impl<R: Report + ?Sized> Report for Arc<R> {
    fn on_read(&self, data: &[u8]) {
        (**self).on_read(data)
    }

    fn on_write(&self, data: &[u8]) {
        (**self).on_write(data)
    }

    fn on_error(&self, location: Location, error: &io::Error) {
        (**self).on_error(location, error)
    }

    fn on_close(&self) {
        (**self).on_close()
    }
}

/// A reporter built from four closures, one per event.
///
/// Use [`noop`] in place of any callback which should do nothing.
#[derive(Clone)]
pub struct Callbacks<FR, FW, FE, FC> {
    on_read: FR,
    on_write: FW,
    on_error: FE,
    on_close: FC,
}

impl<FR, FW, FE, FC> Callbacks<FR, FW, FE, FC>
where
    FR: Fn(&[u8]),
    FW: Fn(&[u8]),
    FE: Fn(Location, &io::Error),
    FC: Fn(),
{
    /// Create a reporter from the four event callbacks.
    pub fn new(on_read: FR, on_write: FW, on_error: FE, on_close: FC) -> Self {
        Self {
            on_read,
            on_write,
            on_error,
            on_close,
        }
    }
}

impl<FR, FW, FE, FC> fmt::Debug for Callbacks<FR, FW, FE, FC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

impl<FR, FW, FE, FC> Report for Callbacks<FR, FW, FE, FC>
where
    FR: Fn(&[u8]),
    FW: Fn(&[u8]),
    FE: Fn(Location, &io::Error),
    FC: Fn(),
{
    fn on_read(&self, data: &[u8]) {
        (self.on_read)(data)
    }

    fn on_write(&self, data: &[u8]) {
        (self.on_write)(data)
    }

    fn on_error(&self, location: Location, error: &io::Error) {
        (self.on_error)(location, error)
    }

    fn on_close(&self) {
        (self.on_close)()
    }
}

/// A callback which ignores its arguments.
///
/// ```
/// use loggedio::report::{Callbacks, noop};
///
/// let reporter = Callbacks::new(
///     |data: &[u8]| println!("read {} bytes", data.len()),
///     |_: &[u8]| {},
///     |_, _: &std::io::Error| {},
///     noop,
/// );
/// # let _ = reporter;
/// ```
pub fn noop() {}

/// Records every event it receives, in order.
///
/// Useful for asserting on what a proxy reported.
#[derive(Debug, Default)]
pub struct Recorder {
    events: parking_lot::Mutex<Vec<Event>>,
}

/// A single reported event, as captured by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Bytes which were read
    Read(Vec<u8>),

    /// Bytes which were written
    Write(Vec<u8>),

    /// An error, with its location and message
    Error(Location, String),

    /// A close call
    Close,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every event recorded so far, leaving the recorder empty.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    /// A copy of every event recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl Report for Recorder {
    fn on_read(&self, data: &[u8]) {
        self.events.lock().push(Event::Read(data.to_vec()));
    }

    fn on_write(&self, data: &[u8]) {
        self.events.lock().push(Event::Write(data.to_vec()));
    }

    fn on_error(&self, location: Location, error: &io::Error) {
        self.events
            .lock()
            .push(Event::Error(location, error.to_string()));
    }

    fn on_close(&self) {
        self.events.lock().push(Event::Close);
    }
}
