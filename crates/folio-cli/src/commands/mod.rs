//! Subcommand implementations.

pub mod clear;
pub mod index;
pub mod ls;
pub mod paths;
pub mod precache;
pub mod query;
pub mod stats;
pub mod status;

use folio_core::{LoggingProgress, ProgressSink};
use std::io::{self, Write};

/// Progress sink for a long-running command.
///
/// Draws a percentage line on stderr, or hands reports to the log when
/// `quiet` is set.
pub fn progress_sink(task: &str, quiet: bool) -> Box<dyn ProgressSink> {
    if quiet {
        return Box::new(LoggingProgress::new(task));
    }
    Box::new(|percent: f64| {
        eprint!("{}", progress_line(percent));
        let _ = io::stderr().flush();
    })
}

fn progress_line(percent: f64) -> String {
    format!("\r  Progress: {:>5.1}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line() {
        assert_eq!(progress_line(7.31), "\r  Progress:   7.3%");
        assert_eq!(progress_line(100.0), "\r  Progress: 100.0%");
    }

    #[test]
    fn test_quiet_sink_accepts_reports() {
        let sink = progress_sink("index", true);
        sink.report(50.0);
        sink.report(100.0);
    }
}
