use std::sync::Mutex;

/// Batch counters, shared between the pixel loop and the annotator bridge.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub annotated: usize,
    pub skipped: usize,
    pub write_failures: usize,
    pub intervals: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_annotated(&self, intervals: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.annotated += 1;
            metrics.intervals += intervals;
        }
    }

    pub fn record_skipped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped += 1;
        }
    }

    pub fn record_write_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.write_failures += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
