use std::sync::Mutex;

use serde::Serialize;

/// Counters gathered while scanning and loading a data directory.
pub struct IngestMetrics {
    inner: Mutex<IngestSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSnapshot {
    pub accepted: usize,
    pub dropped: usize,
    pub files_loaded: usize,
    pub rows_loaded: usize,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(IngestSnapshot::default()),
        }
    }

    pub fn record_accepted(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.accepted += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped += 1;
        }
    }

    pub fn record_loaded(&self, rows: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.files_loaded += 1;
            metrics.rows_loaded += rows;
        }
    }

    pub fn snapshot(&self) -> IngestSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}
