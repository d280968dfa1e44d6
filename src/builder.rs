//! Constructors for commonly used proxies.
//!
//! The free functions here each build a [`LoggedIo`] with one of the provided
//! reporters. [`Builder`] covers the same ground for formatted reports, one
//! setting at a time.

use std::io;

use tracing::Level;

use crate::LoggedIo;
use crate::format::{Encoding, Template};
use crate::report::{Callbacks, Dump, Formatted, Location, Templates};
use crate::sink::{BoxWriter, Destination, LogSink, Sink, WriterSink};

/// Indicates that the builder still requires a sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeedsSink {
    _priv: (),
}

/// Configures a [`Formatted`] reporter and wraps targets with it.
///
/// Templates start out as `read: %v`, `write: %v`, `%v: %v` for errors and
/// `closed` for close, with text encoding. A sink must be chosen before
/// anything can be wrapped.
///
/// ```
/// use std::io::Write;
/// use loggedio::Builder;
///
/// let mut proxy = Builder::new()
///     .read_format("")
///     .write_format("W [%v]")
///     .hex()
///     .to_writer(Vec::new())
///     .wrap(Vec::new());
///
/// proxy.write_all(&[1, 2, 3]).unwrap();
///
/// let (_, reporter) = proxy.into_parts();
/// assert_eq!(reporter.into_sink().into_inner(), b"W [01 02 03]");
/// ```
#[derive(Debug, Clone)]
pub struct Builder<S = NeedsSink> {
    templates: Templates,
    encoding: Encoding,
    sink: S,
}

impl Builder<NeedsSink> {
    /// Start a builder with the default templates.
    pub fn new() -> Self {
        Self {
            templates: Templates::new("read: %v", "write: %v", "%v: %v", "closed"),
            encoding: Encoding::Text,
            sink: NeedsSink::default(),
        }
    }
}

impl Default for Builder<NeedsSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Builder<S> {
    /// Template for read events, taking the payload.
    pub fn read_format(mut self, template: impl Into<Template>) -> Self {
        self.templates.read = template.into();
        self
    }

    /// Template for write events, taking the payload.
    pub fn write_format(mut self, template: impl Into<Template>) -> Self {
        self.templates.write = template.into();
        self
    }

    /// Template for error events, taking the location and then the error.
    pub fn error_format(mut self, template: impl Into<Template>) -> Self {
        self.templates.error = template.into();
        self
    }

    /// Literal message for close events.
    pub fn close_message(mut self, message: impl Into<String>) -> Self {
        self.templates.close = message.into();
        self
    }

    /// Render payloads as hex.
    pub fn hex(self) -> Self {
        self.encoding(Encoding::Hex)
    }

    /// Render payloads as text.
    pub fn text(self) -> Self {
        self.encoding(Encoding::Text)
    }

    /// Set how payloads are rendered.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Emit reports as `tracing` events at `INFO`.
    pub fn to_log(self) -> Builder<LogSink> {
        self.to_sink(LogSink::default())
    }

    /// Emit reports as `tracing` events at `level`.
    pub fn to_log_at(self, level: Level) -> Builder<LogSink> {
        self.to_sink(LogSink::new(level))
    }

    /// Write reports to `writer`.
    pub fn to_writer<W: io::Write>(self, writer: W) -> Builder<WriterSink<W>> {
        self.to_sink(WriterSink::new(writer))
    }

    /// Emit reports to `sink`.
    pub fn to_sink<N: Sink>(self, sink: N) -> Builder<N> {
        Builder {
            templates: self.templates,
            encoding: self.encoding,
            sink,
        }
    }
}

impl<S: Sink> Builder<S> {
    /// Build the reporter.
    pub fn build(self) -> Formatted<S> {
        Formatted::new(self.templates, self.encoding, self.sink)
    }

    /// Wrap `target` in a proxy using the configured reporter.
    pub fn wrap<T>(self, target: T) -> LoggedIo<T, Formatted<S>> {
        LoggedIo::new(target, self.build())
    }
}

/// Wrap `target`, reporting each event to one of four callbacks.
///
/// Pass [`noop`](crate::report::noop) for any event which shouldn't be reported.
pub fn generic<T, FR, FW, FE, FC>(
    target: T,
    on_read: FR,
    on_write: FW,
    on_error: FE,
    on_close: FC,
) -> LoggedIo<T, Callbacks<FR, FW, FE, FC>>
where
    FR: Fn(&[u8]),
    FW: Fn(&[u8]),
    FE: Fn(Location, &io::Error),
    FC: Fn(),
{
    LoggedIo::new(target, Callbacks::new(on_read, on_write, on_error, on_close))
}

fn formatted<T, S: Sink>(
    target: T,
    sink: S,
    encoding: Encoding,
    templates: Templates,
) -> LoggedIo<T, Formatted<S>> {
    LoggedIo::new(target, Formatted::new(templates, encoding, sink))
}

/// Wrap `target`, logging payloads as text to `log`.
///
/// An empty template or close message disables reporting of that event.
pub fn string_to_log<T>(
    target: T,
    log: LogSink,
    read: &str,
    write: &str,
    error: &str,
    close: &str,
) -> LoggedIo<T, Formatted<LogSink>> {
    formatted(
        target,
        log,
        Encoding::Text,
        Templates::new(read, write, error, close),
    )
}

/// Wrap `target`, logging payloads as hex to `log`.
pub fn hex_to_log<T>(
    target: T,
    log: LogSink,
    read: &str,
    write: &str,
    error: &str,
    close: &str,
) -> LoggedIo<T, Formatted<LogSink>> {
    formatted(
        target,
        log,
        Encoding::Hex,
        Templates::new(read, write, error, close),
    )
}

/// Wrap `target`, writing payloads as text to `writer`.
pub fn string_to_writer<T, W: io::Write>(
    target: T,
    writer: W,
    read: &str,
    write: &str,
    error: &str,
    close: &str,
) -> LoggedIo<T, Formatted<WriterSink<W>>> {
    formatted(
        target,
        WriterSink::new(writer),
        Encoding::Text,
        Templates::new(read, write, error, close),
    )
}

/// Wrap `target`, writing payloads as hex to `writer`.
pub fn hex_to_writer<T, W: io::Write>(
    target: T,
    writer: W,
    read: &str,
    write: &str,
    error: &str,
    close: &str,
) -> LoggedIo<T, Formatted<WriterSink<W>>> {
    formatted(
        target,
        WriterSink::new(writer),
        Encoding::Hex,
        Templates::new(read, write, error, close),
    )
}

/// The reporter built by [`dump_to_writers`].
pub type WriterDump<RW, WW, NW> = Dump<WriterSink<RW>, WriterSink<WW>, WriterSink<NW>>;

/// Wrap `target`, copying read bytes to `reads` and written bytes to `writes`.
///
/// Errors and close messages are written to `notify`.
pub fn dump_to_writers<T, RW, WW, NW>(
    target: T,
    reads: RW,
    writes: WW,
    notify: NW,
    error: &str,
    close: &str,
) -> LoggedIo<T, WriterDump<RW, WW, NW>>
where
    RW: io::Write,
    WW: io::Write,
    NW: io::Write,
{
    LoggedIo::new(
        target,
        Dump::new(
            WriterSink::new(reads),
            WriterSink::new(writes),
            WriterSink::new(notify),
            error,
            close,
        ),
    )
}

/// Wrap `target`, dumping to named [`Destination`]s.
///
/// `stdout`, `stderr` and `null` name the standard streams and a discarding
/// sink, any other name is a file which is created or truncated. A file which
/// can't be created is replaced by a discarding sink.
pub fn dump_to_files<T>(
    target: T,
    reads: &str,
    writes: &str,
    notify: &str,
    error: &str,
    close: &str,
) -> LoggedIo<T, WriterDump<BoxWriter, BoxWriter, BoxWriter>> {
    let open = |name: &str| Destination::from(name).open();
    dump_to_writers(target, open(reads), open(writes), open(notify), error, close)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::{Read as _, Write as _};
    use std::time::Instant;

    use super::*;
    use crate::mock::MockIo;
    use crate::stream::{Close as _, Connection as _};

    const READ: &str = "R [%v]";
    const WRITE: &str = "W [%v]";
    const ERROR: &str = "E [%v: %v]";
    const CLOSE: &str = "C";

    fn drive<T>(proxy: &mut LoggedIo<T, impl crate::Report>)
    where
        T: io::Read + io::Write + crate::Close + crate::Connection,
    {
        let mut buf = [0u8; 3];
        let _ = proxy.read(&mut buf);
        let _ = proxy.write(b"test");
        let _ = proxy.close();
        let deadline = Some(Instant::now());
        let _ = proxy.set_deadline(deadline);
        let _ = proxy.set_read_deadline(deadline);
        let _ = proxy.set_write_deadline(deadline);
    }

    fn written<T, W>(proxy: LoggedIo<T, Formatted<WriterSink<W>>>) -> W {
        proxy.into_parts().1.into_sink().into_inner()
    }

    #[test]
    fn string_to_writer_formats_events() {
        let mut proxy = string_to_writer(MockIo::new(), Vec::new(), READ, WRITE, ERROR, CLOSE);
        drive(&mut proxy);
        assert_eq!(
            String::from_utf8(written(proxy)).unwrap(),
            "R [abc]W [test]C"
        );
    }

    #[test]
    fn string_to_writer_reports_every_failure() {
        let mut proxy = string_to_writer(MockIo::failing(), Vec::new(), READ, WRITE, ERROR, CLOSE);
        drive(&mut proxy);
        assert_eq!(
            String::from_utf8(written(proxy)).unwrap(),
            concat!(
                "E [Read(): ERROR!]",
                "E [Write(): ERROR!]",
                "CE [Close(): ERROR!]",
                "E [SetDeadline(): ERROR!]",
                "E [SetReadDeadline(): ERROR!]",
                "E [SetWriteDeadline(): ERROR!]",
            )
        );
    }

    #[test]
    fn hex_to_writer_formats_events() {
        let mut proxy = hex_to_writer(MockIo::new(), Vec::new(), READ, WRITE, ERROR, CLOSE);
        let mut buf = [0u8; 3];
        proxy.read_exact(&mut buf).unwrap();
        proxy.write_all(&[0x01, 0x02, 0xae, 0xf1]).unwrap();
        assert_eq!(
            String::from_utf8(written(proxy)).unwrap(),
            "R [61 62 63]W [01 02 ae f1]"
        );
    }

    #[test]
    fn hex_writes_use_write_template() {
        let mut proxy = hex_to_writer(MockIo::new(), Vec::new(), "", WRITE, "", "");
        let _ = proxy.read(&mut [0u8; 4]).unwrap();
        proxy.write_all(b"abc").unwrap();
        assert_eq!(String::from_utf8(written(proxy)).unwrap(), "W [61 62 63]");
    }

    #[test]
    fn empty_templates_disable_events() {
        let mut proxy = string_to_writer(MockIo::failing(), Vec::new(), READ, "", ERROR, "");
        let _ = proxy.write(b"test");
        let _ = proxy.close();
        assert_eq!(
            String::from_utf8(written(proxy)).unwrap(),
            "E [Write(): ERROR!]E [Close(): ERROR!]"
        );
    }

    #[test]
    fn log_constructors() {
        crate::fixtures::subscribe();
        let mut proxy = string_to_log(MockIo::new(), LogSink::default(), READ, WRITE, ERROR, CLOSE);
        drive(&mut proxy);
        assert_eq!(proxy.reporter().sink().level(), Level::INFO);

        let mut proxy = hex_to_log(
            MockIo::failing(),
            LogSink::new(Level::DEBUG),
            READ,
            WRITE,
            ERROR,
            CLOSE,
        );
        drive(&mut proxy);
        assert_eq!(proxy.reporter().encoding(), Encoding::Hex);
    }

    #[test]
    fn generic_callbacks() {
        let events = RefCell::new(Vec::new());
        let mut proxy = generic(
            MockIo::new(),
            |data: &[u8]| events.borrow_mut().push(format!("r:{}", data.len())),
            |data: &[u8]| events.borrow_mut().push(format!("w:{}", data.len())),
            |location, error: &io::Error| events.borrow_mut().push(format!("{location} {error}")),
            crate::report::noop,
        );
        drive(&mut proxy);
        drop(proxy);
        assert_eq!(*events.borrow(), ["r:3", "w:4"]);
    }

    #[test]
    fn dump_to_writers_separates_directions() {
        let mut proxy = dump_to_writers(
            MockIo::new().fail_after_write(2),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            ERROR,
            CLOSE,
        );
        let mut buf = [0u8; 2];
        proxy.read_exact(&mut buf).unwrap();
        assert!(proxy.write_all(b"xyz").is_err());
        proxy.close().unwrap();

        let (reads, writes, notify) = proxy.into_parts().1.into_sinks();
        assert_eq!(reads.into_inner(), b"ab");
        assert_eq!(writes.into_inner(), b"xy");
        assert_eq!(
            String::from_utf8(notify.into_inner()).unwrap(),
            "E [Write(): ERROR!]C"
        );
    }

    #[test]
    fn dump_to_files_writes_each_file() {
        let dir = std::env::temp_dir().join(format!("loggedio-dump-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let mut proxy = dump_to_files(
            MockIo::new(),
            &path("reads.bin"),
            &path("writes.bin"),
            "null",
            ERROR,
            CLOSE,
        );
        let mut buf = [0u8; 3];
        proxy.read_exact(&mut buf).unwrap();
        proxy.write_all(b"hello").unwrap();
        drop(proxy);

        assert_eq!(std::fs::read(path("reads.bin")).unwrap(), b"abc");
        assert_eq!(std::fs::read(path("writes.bin")).unwrap(), b"hello");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn builder_defaults() {
        let mut proxy = Builder::new().to_writer(Vec::new()).wrap(MockIo::failing());
        let _ = proxy.write(b"x");
        let _ = proxy.close();
        assert_eq!(
            String::from_utf8(written(proxy)).unwrap(),
            "Write(): ERROR!closedClose(): ERROR!"
        );
    }

    #[test]
    fn builder_configures_reporter() {
        let reporter = Builder::new()
            .read_format(READ)
            .write_format(String::from(WRITE))
            .error_format(ERROR)
            .close_message(CLOSE)
            .hex()
            .text()
            .to_log_at(Level::TRACE)
            .build();

        assert_eq!(reporter.encoding(), Encoding::Text);
        assert_eq!(reporter.sink().level(), Level::TRACE);
        assert_eq!(
            *reporter.templates(),
            Templates::new(READ, WRITE, ERROR, CLOSE)
        );
        assert_eq!(Builder::default().to_log().build().sink().level(), Level::INFO);
    }

    #[test]
    fn nested_string_and_hex_report_inner_first() {
        let sink = WriterSink::new(Vec::new());
        let inner = Builder::new()
            .read_format(READ)
            .write_format("HW [%v]")
            .hex()
            .to_sink(&sink)
            .wrap(MockIo::new());
        let mut outer = Builder::new()
            .write_format("SW [%v]")
            .to_sink(&sink)
            .wrap(inner);

        outer.write_all(b"test").unwrap();
        drop(outer);
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            "HW [74 65 73 74]SW [test]"
        );
    }
}
