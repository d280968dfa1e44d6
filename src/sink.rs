//! Destinations for formatted reports.
//!
//! A [`Sink`] accepts one rendered report at a time. [`LogSink`] turns reports
//! into `tracing` events, [`WriterSink`] writes them to any [`io::Write`], and
//! [`Destination`] opens a writer sink by name.

use std::fmt;
use std::fs::File;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;

/// A destination which accepts rendered reports.
pub trait Sink {
    /// Emit one report.
    fn emit(&self, report: &[u8]) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for &S {
    fn emit(&self, report: &[u8]) -> io::Result<()> {
        (**self).emit(report)
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn emit(&self, report: &[u8]) -> io::Result<()> {
        (**self).emit(report)
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn emit(&self, report: &[u8]) -> io::Result<()> {
        (**self).emit(report)
    }
}

/// Emits each report as a `tracing` event with target `loggedio`.
///
/// Where the events end up is decided by the subscriber the application has
/// installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSink {
    level: Level,
}

impl LogSink {
    /// Emit reports at `level`.
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// The level reports are emitted at.
    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl Sink for LogSink {
    fn emit(&self, report: &[u8]) -> io::Result<()> {
        let report = String::from_utf8_lossy(report);
        match self.level {
            Level::TRACE => tracing::trace!(target: "loggedio", "{report}"),
            Level::DEBUG => tracing::debug!(target: "loggedio", "{report}"),
            Level::INFO => tracing::info!(target: "loggedio", "{report}"),
            Level::WARN => tracing::warn!(target: "loggedio", "{report}"),
            _ => tracing::error!(target: "loggedio", "{report}"),
        }
        Ok(())
    }
}

/// Writes each report to an [`io::Write`].
///
/// The writer is held behind a mutex, so one sink can be shared between
/// proxies, or between the read and write halves of a connection.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> WriterSink<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Run `f` with access to the writer.
    pub fn with<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        let mut writer = self.writer.lock();
        f(&mut *writer)
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink")
            .field("writer", &std::any::type_name::<W>())
            .finish()
    }
}

impl<W: io::Write> Sink for WriterSink<W> {
    fn emit(&self, report: &[u8]) -> io::Result<()> {
        self.writer.lock().write_all(report)
    }
}

/// A boxed writer, as opened by a [`Destination`].
pub type BoxWriter = Box<dyn io::Write + Send>;

/// A named destination for dumped bytes.
///
/// The names `stdout`, `stderr` and `null` are special, any other name is a
/// path to a file.
///
/// ```
/// use loggedio::sink::Destination;
///
/// assert_eq!("stdout".parse::<Destination>().unwrap(), Destination::Stdout);
/// assert_eq!(
///     "traffic.bin".parse::<Destination>().unwrap(),
///     Destination::File("traffic.bin".into())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The process's standard output
    Stdout,

    /// The process's standard error
    Stderr,

    /// Discard everything
    Null,

    /// A file, which is created or truncated when opened
    File(PathBuf),
}

impl Destination {
    /// Open the destination as a writer.
    ///
    /// If a file can't be created a warning is logged and the returned writer
    /// discards everything.
    pub fn open(&self) -> BoxWriter {
        match self {
            Destination::Stdout => Box::new(io::stdout()),
            Destination::Stderr => Box::new(io::stderr()),
            Destination::Null => Box::new(io::sink()),
            Destination::File(path) => match File::create(path) {
                Ok(file) => Box::new(file),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "unable to create dump file, discarding");
                    Box::new(io::sink())
                }
            },
        }
    }

    /// Open the destination as a sink.
    pub fn sink(&self) -> WriterSink<BoxWriter> {
        WriterSink::new(self.open())
    }
}

impl From<&str> for Destination {
    fn from(name: &str) -> Self {
        match name {
            "stdout" => Destination::Stdout,
            "stderr" => Destination::Stderr,
            "null" => Destination::Null,
            path => Destination::File(PathBuf::from(path)),
        }
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(Destination::from(name))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str("stdout"),
            Destination::Stderr => f.write_str("stderr"),
            Destination::Null => f.write_str("null"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use static_assertions::assert_impl_all;

    assert_impl_all!(WriterSink<Vec<u8>>: Sink, Send, Sync);
    assert_impl_all!(WriterSink<BoxWriter>: Sink, Send, Sync);
    assert_impl_all!(LogSink: Sink, Send, Sync, Copy);

    #[test]
    fn writer_sink_appends() {
        let sink = WriterSink::new(Vec::new());
        sink.emit(b"R [abc]").unwrap();
        sink.emit(b"C").unwrap();
        assert_eq!(sink.into_inner(), b"R [abc]C");
    }

    #[test]
    fn log_sink_emits() {
        crate::fixtures::subscribe();
        for level in [Level::TRACE, Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR] {
            LogSink::new(level).emit(b"W [test]").unwrap();
        }
        assert_eq!(LogSink::default().level(), Level::INFO);
    }

    #[test]
    fn special_names() {
        assert_eq!(Destination::from("stderr"), Destination::Stderr);
        assert_eq!(Destination::from("null"), Destination::Null);
        assert_eq!(Destination::from("stdout").to_string(), "stdout");
        assert_eq!(
            Destination::from("./out.txt"),
            Destination::File(PathBuf::from("./out.txt"))
        );
    }

    #[test]
    fn file_destination_truncates() {
        let path = std::env::temp_dir().join(format!("loggedio-sink-{}.txt", std::process::id()));
        std::fs::write(&path, b"stale contents").unwrap();

        let destination = Destination::File(path.clone());
        destination.sink().emit(b"fresh").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unopenable_file_discards() {
        crate::fixtures::subscribe();
        let path = std::env::temp_dir()
            .join("loggedio-missing-directory")
            .join("nested")
            .join("dump.bin");
        let sink = Destination::File(path.clone()).sink();
        sink.emit(b"dropped").unwrap();
        assert!(!path.exists());
    }
}
