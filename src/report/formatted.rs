use std::fmt;
use std::io;

use crate::format::{Encoding, Template};
use crate::sink::Sink;

use super::{Location, Report};

/// Templates for each kind of event.
///
/// The read and write templates take the rendered payload as their only
/// argument. The error template takes the [`Location`] and then the error. The
/// close message is emitted literally.
///
/// An empty template (or close message) disables reporting of that event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Templates {
    /// Template for read events
    pub read: Template,

    /// Template for write events
    pub write: Template,

    /// Template for error events
    pub error: Template,

    /// Message for close events
    pub close: String,
}

impl Templates {
    /// Build a set of templates from their strings.
    pub fn new(read: &str, write: &str, error: &str, close: &str) -> Self {
        Self {
            read: Template::new(read),
            write: Template::new(write),
            error: Template::new(error),
            close: close.to_owned(),
        }
    }
}

/// A reporter which formats events with templates and emits them to a sink.
///
/// ```
/// use std::io::Write;
/// use loggedio::LoggedIo;
/// use loggedio::format::Encoding;
/// use loggedio::report::{Formatted, Templates};
/// use loggedio::sink::WriterSink;
///
/// let reporter = Formatted::new(
///     Templates::new("R [%v]", "W [%v]", "E [%v: %v]", "C"),
///     Encoding::Text,
///     WriterSink::new(Vec::new()),
/// );
/// let mut proxy = LoggedIo::new(Vec::new(), reporter);
/// proxy.write_all(b"test").unwrap();
///
/// let (_, reporter) = proxy.into_parts();
/// assert_eq!(reporter.into_sink().into_inner(), b"W [test]");
/// ```
pub struct Formatted<S> {
    templates: Templates,
    encoding: Encoding,
    sink: S,
}

impl<S> Formatted<S> {
    /// Create a reporter which renders payloads with `encoding`.
    pub fn new(templates: Templates, encoding: Encoding, sink: S) -> Self {
        Self {
            templates,
            encoding,
            sink,
        }
    }

    /// The templates used by this reporter.
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// The encoding used for payloads.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The sink reports are emitted to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwrap the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: Sink> Formatted<S> {
    fn emit(&self, report: &[u8]) {
        if let Err(error) = self.sink.emit(report) {
            tracing::warn!(%error, "unable to emit report");
        }
    }

    fn payload(&self, template: &Template, data: &[u8]) {
        if template.is_disabled() {
            return;
        }
        let payload = self.encoding.render(data);
        self.emit(template.render(&[&payload]).as_bytes());
    }
}

impl<S> fmt::Debug for Formatted<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatted")
            .field("templates", &self.templates)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl<S: Sink> Report for Formatted<S> {
    fn on_read(&self, data: &[u8]) {
        self.payload(&self.templates.read, data);
    }

    fn on_write(&self, data: &[u8]) {
        self.payload(&self.templates.write, data);
    }

    fn on_error(&self, location: Location, error: &io::Error) {
        if self.templates.error.is_disabled() {
            return;
        }
        self.emit(self.templates.error.render(&[&location, error]).as_bytes());
    }

    fn on_close(&self) {
        if self.templates.close.is_empty() {
            return;
        }
        self.emit(self.templates.close.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::WriterSink;

    fn formatted(encoding: Encoding, templates: Templates) -> Formatted<WriterSink<Vec<u8>>> {
        Formatted::new(templates, encoding, WriterSink::new(Vec::new()))
    }

    fn contents(reporter: Formatted<WriterSink<Vec<u8>>>) -> String {
        String::from_utf8(reporter.into_sink().into_inner()).unwrap()
    }

    #[test]
    fn text_events() {
        let reporter = formatted(
            Encoding::Text,
            Templates::new("R [%v]", "W [%v]", "E [%v: %v]", "C"),
        );
        reporter.on_read(b"abc");
        reporter.on_write(b"test");
        reporter.on_close();
        reporter.on_error(Location::Close, &io::Error::other("ERROR!"));
        assert_eq!(contents(reporter), "R [abc]W [test]CE [Close(): ERROR!]");
    }

    #[test]
    fn hex_events_use_their_own_template() {
        let reporter = formatted(
            Encoding::Hex,
            Templates::new("R [%v]", "W [%v]", "E [%v: %v]", "C"),
        );
        reporter.on_read(b"abc");
        reporter.on_write(&[1, 2, 3]);
        assert_eq!(contents(reporter), "R [61 62 63]W [01 02 03]");
    }

    #[test]
    fn write_template_alone_enables_writes() {
        let reporter = formatted(Encoding::Hex, Templates::new("", "W [%v]", "", ""));
        reporter.on_read(b"abc");
        reporter.on_write(&[0xae]);
        reporter.on_error(Location::Write, &io::Error::other("ignored"));
        reporter.on_close();
        assert_eq!(contents(reporter), "W [ae]");
    }

    #[test]
    fn sink_failures_are_swallowed() {
        struct Broken;
        impl Sink for Broken {
            fn emit(&self, _: &[u8]) -> io::Result<()> {
                Err(io::Error::other("broken sink"))
            }
        }

        crate::fixtures::subscribe();
        let reporter = Formatted::new(Templates::new("%v", "%v", "%v", "C"), Encoding::Text, Broken);
        reporter.on_read(b"a");
        reporter.on_close();
    }
}
