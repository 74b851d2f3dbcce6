//! Output and error channels for task results.
//!
//! Successful results go to the output channel and failures to the error
//! channel. [`StdReporter`] maps these to stdout and stderr; tests use
//! [`MemoryReporter`](crate::backends::mock::MemoryReporter) to capture lines.

use std::io::{self, Write};
use tracing::debug;

/// Destination for human-readable report lines.
pub trait Reporter: Send + Sync {
    /// Emits a line on the output channel.
    fn out(&self, line: &str);

    /// Emits a line on the error channel.
    fn err(&self, line: &str);
}

/// Writes output lines to stdout and error lines to stderr.
///
/// Write failures (a closed pipe, for example) are dropped so a reader
/// going away never interrupts the cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdReporter;

impl Reporter for StdReporter {
    fn out(&self, line: &str) {
        write_line(io::stdout().lock(), line);
    }

    fn err(&self, line: &str) {
        write_line(io::stderr().lock(), line);
    }
}

fn write_line<W: Write>(mut writer: W, line: &str) {
    if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
        debug!(error = %e, "dropping report line");
    }
}
