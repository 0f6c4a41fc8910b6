//! Performance timer: per-node processing-time statistics.
//!
//! Grounded on `tutti-core/src/metering/cpu.rs`'s rolling-window approach,
//! trimmed to the average/min/max triple spec.md §4.C requires. Timings are
//! recorded from the RT thread (cheap, lock-free) and read from any thread
//! through a [`dashmap::DashMap`], following the same concurrent-map pattern
//! `tutti-core`'s MIDI registries use.

use dashmap::DashMap;

use crate::lockfree::AtomicFlag;

/// The special node id used for whole-engine timings (spec.md §4.C).
pub const ENGINE_TIMING_ID: i64 = -1;

const WINDOW_LEN: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct TimingStats {
    pub avg_ns: f64,
    pub min_ns: f64,
    pub max_ns: f64,
}

struct NodeWindow {
    samples: Vec<f64>,
    write_pos: usize,
    filled: usize,
}

impl NodeWindow {
    fn new() -> Self {
        Self {
            samples: vec![0.0; WINDOW_LEN],
            write_pos: 0,
            filled: 0,
        }
    }

    fn push(&mut self, ns: f64) {
        self.samples[self.write_pos] = ns;
        self.write_pos = (self.write_pos + 1) % WINDOW_LEN;
        self.filled = (self.filled + 1).min(WINDOW_LEN);
    }

    fn stats(&self) -> Option<TimingStats> {
        if self.filled == 0 {
            return None;
        }
        let active = &self.samples[..self.filled];
        let sum: f64 = active.iter().sum();
        let min = active.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = active.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(TimingStats {
            avg_ns: sum / self.filled as f64,
            min_ns: min,
            max_ns: max,
        })
    }
}

/// Collects per-processor processing-time statistics over a rolling window.
pub struct PerformanceTimer {
    enabled: AtomicFlag,
    windows: DashMap<i64, NodeWindow>,
}

impl Default for PerformanceTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceTimer {
    pub fn new() -> Self {
        Self {
            enabled: AtomicFlag::new(false),
            windows: DashMap::new(),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Record one processing call's duration for `node_id`. No-op while disabled.
    pub fn record(&self, node_id: i64, duration_ns: f64) {
        if !self.enabled.get() {
            return;
        }
        self.windows.entry(node_id).or_insert_with(NodeWindow::new).push(duration_ns);
    }

    pub fn timings_for_node(&self, node_id: i64) -> Option<TimingStats> {
        self.windows.get(&node_id).and_then(|w| w.stats())
    }

    pub fn clear_timings_for_node(&self, node_id: i64) -> bool {
        self.windows.remove(&node_id).is_some()
    }

    pub fn clear_all_timings(&self) {
        self.windows.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timer_records_nothing() {
        let t = PerformanceTimer::new();
        t.record(1, 100.0);
        assert!(t.timings_for_node(1).is_none());
    }

    #[test]
    fn enabled_timer_reports_avg_min_max() {
        let t = PerformanceTimer::new();
        t.set_enabled(true);
        for ns in [10.0, 20.0, 30.0] {
            t.record(1, ns);
        }
        let stats = t.timings_for_node(1).unwrap();
        assert!((stats.avg_ns - 20.0).abs() < 1e-9);
        assert_eq!(stats.min_ns, 10.0);
        assert_eq!(stats.max_ns, 30.0);
    }

    #[test]
    fn engine_id_is_independent_bucket() {
        let t = PerformanceTimer::new();
        t.set_enabled(true);
        t.record(ENGINE_TIMING_ID, 5.0);
        t.record(1, 999.0);
        assert_eq!(t.timings_for_node(ENGINE_TIMING_ID).unwrap().avg_ns, 5.0);
    }

    #[test]
    fn clear_single_node() {
        let t = PerformanceTimer::new();
        t.set_enabled(true);
        t.record(1, 1.0);
        t.record(2, 2.0);
        assert!(t.clear_timings_for_node(1));
        assert!(t.timings_for_node(1).is_none());
        assert!(t.timings_for_node(2).is_some());
    }

    #[test]
    fn clear_all() {
        let t = PerformanceTimer::new();
        t.set_enabled(true);
        t.record(1, 1.0);
        t.record(2, 2.0);
        t.clear_all_timings();
        assert!(t.timings_for_node(1).is_none());
        assert!(t.timings_for_node(2).is_none());
    }

    #[test]
    fn window_rolls_over_oldest_samples() {
        let t = PerformanceTimer::new();
        t.set_enabled(true);
        for i in 0..(WINDOW_LEN + 10) {
            t.record(1, i as f64);
        }
        let stats = t.timings_for_node(1).unwrap();
        // Oldest 10 samples (0..10) should have been evicted; min should be >= 10.
        assert!(stats.min_ns >= 10.0);
    }
}
