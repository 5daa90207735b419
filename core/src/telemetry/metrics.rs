use serde::Serialize;
use std::sync::Mutex;

/// Cycle counters for one polling service.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Point-in-time copy of a recorder's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub cycles: usize,
    pub errors: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_cycle(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cycles += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
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
