//! Progress reporting for long-running scans.
//!
//! A [`ProgressSink`] receives a percentage in `0.0..=100.0`. The index
//! builder reports once per completed project; the pre-cache pass reports
//! once per folder. Sinks must be cheap: they are called from the scan loop
//! and there is no backpressure.

/// Receiver of coarse-grained completion percentages.
pub trait ProgressSink: Send + Sync {
    /// Called with the current completion percentage
    fn report(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, percent: f64) {
        self(percent)
    }
}

/// A sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: f64) {}
}

/// A simple progress reporter that logs to tracing
pub struct LoggingProgress {
    label: String,
}

impl LoggingProgress {
    pub fn new(label: impl Into<String>) -> Self {
        LoggingProgress {
            label: label.into(),
        }
    }
}

impl ProgressSink for LoggingProgress {
    fn report(&self, percent: f64) {
        tracing::debug!(task = %self.label, percent, "Progress");
    }
}

/// Percentage of `done` out of `total`, clamped to 100.
pub(crate) fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done as f64 / total as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn closure_sink_receives_reports() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: f64| seen.lock().push(p);
        sink.report(50.0);
        sink.report(100.0);
        assert_eq!(*seen.lock(), vec![50.0, 100.0]);
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(9, 4), 100.0);
        assert_eq!(percent(0, 0), 100.0);
    }
}
