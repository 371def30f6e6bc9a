//! Fixed-capacity sparkline ring buffer, keyed by field name (spec.md
//! §4.3.6). Grounded on the prior generation's diff-tracking `TableState`
//! ring-ish bookkeeping, but purpose-built here for point history rather
//! than per-row diffing.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub indexing_rate: f64,
    pub search_rate: f64,
    pub index_latency_ms: f64,
    pub search_latency_ms: f64,
}

/// Named fields a caller can project out of a [`MetricPoint`] via
/// [`SparklineHistory::values`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    IndexingRate,
    SearchRate,
    IndexLatencyMs,
    SearchLatencyMs,
}

impl Field {
    fn project(self, p: &MetricPoint) -> f64 {
        match self {
            Field::IndexingRate => p.indexing_rate,
            Field::SearchRate => p.search_rate,
            Field::IndexLatencyMs => p.index_latency_ms,
            Field::SearchLatencyMs => p.search_latency_ms,
        }
    }
}

const DEFAULT_CAPACITY: usize = 60;

/// Fixed-capacity ring buffer of metric points. `push` overwrites the
/// oldest entry once full; `values` always returns oldest-first.
#[derive(Debug, Clone)]
pub struct SparklineHistory {
    buf: Vec<Option<MetricPoint>>,
    head: usize,
    size: usize,
}

impl Default for SparklineHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SparklineHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "sparkline capacity must be positive");
        Self {
            buf: vec![None; capacity],
            head: 0,
            size: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn push(&mut self, point: MetricPoint) {
        let cap = self.buf.len();
        self.buf[self.head] = Some(point);
        self.head = (self.head + 1) % cap;
        if self.size < cap {
            self.size += 1;
        }
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.size = 0;
        for slot in &mut self.buf {
            *slot = None;
        }
    }

    /// Oldest-first slice of the named field's values.
    pub fn values(&self, field: Field) -> Vec<f64> {
        let cap = self.buf.len();
        let start = (self.head + cap - self.size) % cap;
        (0..self.size)
            .map(|i| {
                let idx = (start + i) % cap;
                field.project(self.buf[idx].as_ref().expect("within populated range"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(rate: f64) -> MetricPoint {
        MetricPoint {
            timestamp: Utc::now(),
            indexing_rate: rate,
            search_rate: rate,
            index_latency_ms: rate,
            search_latency_ms: rate,
        }
    }

    #[test]
    fn len_never_exceeds_capacity() {
        let mut h = SparklineHistory::with_capacity(3);
        for i in 0..10 {
            h.push(point(i as f64));
            assert!(h.len() <= 3);
        }
    }

    #[test]
    fn values_are_oldest_first_after_wraparound() {
        let mut h = SparklineHistory::with_capacity(3);
        for i in 0..5 {
            h.push(point(i as f64));
        }
        // Only the last 3 pushes (2, 3, 4) should remain, oldest first.
        assert_eq!(h.values(Field::IndexingRate), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn clear_resets_state() {
        let mut h = SparklineHistory::with_capacity(3);
        h.push(point(1.0));
        h.push(point(2.0));
        h.clear();
        assert_eq!(h.len(), 0);
        assert!(h.values(Field::IndexingRate).is_empty());
    }

    #[test]
    fn exact_capacity_push_preserves_order() {
        let mut h = SparklineHistory::with_capacity(60);
        for i in 0..60 {
            h.push(point(i as f64));
        }
        let values = h.values(Field::SearchRate);
        assert_eq!(values.len(), 60);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[59], 59.0);
    }
}
