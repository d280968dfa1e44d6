use std::fmt;
use std::io;

use crate::format::Template;
use crate::sink::Sink;

use super::{Location, Report};

/// A reporter which copies raw bytes to one sink per direction.
///
/// Read bytes go to the `reads` sink and written bytes to the `writes` sink,
/// unchanged. Errors (rendered with the error template) and close messages go to
/// the `notify` sink. A failure to dump bytes is itself reported as an error at
/// [`Location::ReadSink`] or [`Location::WriteSink`].
pub struct Dump<RS, WS, NS> {
    reads: RS,
    writes: WS,
    notify: NS,
    error: Template,
    close: String,
}

impl<RS, WS, NS> Dump<RS, WS, NS> {
    /// Create a dumping reporter.
    ///
    /// `error` takes the location and the error, in that order. An empty `error`
    /// template or `close` message disables that report.
    pub fn new(reads: RS, writes: WS, notify: NS, error: &str, close: &str) -> Self {
        Self {
            reads,
            writes,
            notify,
            error: Template::new(error),
            close: close.to_owned(),
        }
    }

    /// The sink for read bytes.
    pub fn reads(&self) -> &RS {
        &self.reads
    }

    /// The sink for written bytes.
    pub fn writes(&self) -> &WS {
        &self.writes
    }

    /// The sink for errors and close messages.
    pub fn notify(&self) -> &NS {
        &self.notify
    }

    /// Unwrap the three sinks.
    pub fn into_sinks(self) -> (RS, WS, NS) {
        (self.reads, self.writes, self.notify)
    }
}

impl<RS, WS, NS> fmt::Debug for Dump<RS, WS, NS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dump")
            .field("error", &self.error)
            .field("close", &self.close)
            .finish_non_exhaustive()
    }
}

impl<RS, WS, NS> Report for Dump<RS, WS, NS>
where
    RS: Sink,
    WS: Sink,
    NS: Sink,
{
    fn on_read(&self, data: &[u8]) {
        if let Err(error) = self.reads.emit(data) {
            self.on_error(Location::ReadSink, &error);
        }
    }

    fn on_write(&self, data: &[u8]) {
        if let Err(error) = self.writes.emit(data) {
            self.on_error(Location::WriteSink, &error);
        }
    }

    fn on_error(&self, location: Location, error: &io::Error) {
        if self.error.is_disabled() {
            return;
        }
        let report = self.error.render(&[&location, error]);
        if let Err(error) = self.notify.emit(report.as_bytes()) {
            tracing::warn!(%error, "unable to emit report");
        }
    }

    fn on_close(&self) {
        if self.close.is_empty() {
            return;
        }
        if let Err(error) = self.notify.emit(self.close.as_bytes()) {
            tracing::warn!(%error, "unable to emit report");
        }
    }
}
