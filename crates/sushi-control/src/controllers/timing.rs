//! Timing sub-controller (spec.md §4.G Timing).

use std::sync::Arc;

use sushi_core::{TimingStats, ENGINE_TIMING_ID};

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::CpuTimings;

pub struct TimingController {
    engine: Arc<Engine>,
}

impl TimingController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn get_timing_statistics_enabled(&self) -> bool {
        self.engine.timer.enabled()
    }

    pub fn set_timing_statistics_enabled(&self, enabled: bool) -> ControlStatus {
        self.engine.timer.set_enabled(enabled);
        ControlStatus::Ok
    }

    pub fn get_engine_timings(&self) -> (ControlStatus, Option<CpuTimings>) {
        self.timings_for(ENGINE_TIMING_ID)
    }

    pub fn get_track_timings(&self, track_id: u32) -> (ControlStatus, Option<CpuTimings>) {
        if self.engine.container.read().track(track_id).is_none() {
            return (ControlStatus::NotFound, None);
        }
        self.timings_for(track_id as i64)
    }

    pub fn get_processor_timings(&self, processor_id: u32) -> (ControlStatus, Option<CpuTimings>) {
        if self.engine.container.read().processor(processor_id).is_none() {
            return (ControlStatus::NotFound, None);
        }
        self.timings_for(processor_id as i64)
    }

    pub fn reset_engine_timings(&self) -> ControlStatus {
        self.reset(ENGINE_TIMING_ID)
    }

    pub fn reset_track_timings(&self, track_id: u32) -> ControlStatus {
        self.reset(track_id as i64)
    }

    pub fn reset_processor_timings(&self, processor_id: u32) -> ControlStatus {
        self.reset(processor_id as i64)
    }

    pub fn reset_all_timings(&self) -> ControlStatus {
        self.engine.timer.clear_all_timings();
        ControlStatus::Ok
    }

    fn timings_for(&self, node: i64) -> (ControlStatus, Option<CpuTimings>) {
        if !self.engine.timer.enabled() {
            return (ControlStatus::UnsupportedOperation, None);
        }
        let stats: Option<TimingStats> = self.engine.timer.timings_for_node(node);
        (ControlStatus::Ok, stats.map(CpuTimings::from))
    }

    fn reset(&self, node: i64) -> ControlStatus {
        if !self.engine.timer.enabled() {
            return ControlStatus::UnsupportedOperation;
        }
        self.engine.timer.clear_timings_for_node(node);
        ControlStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;

    #[test]
    fn getters_report_unsupported_when_disabled() {
        let engine = test_engine();
        let timing = TimingController::new(engine);
        assert_eq!(timing.get_engine_timings().0, ControlStatus::UnsupportedOperation);
    }

    #[test]
    fn enabling_allows_reads() {
        let engine = test_engine();
        engine.timer.set_enabled(true);
        engine.timer.record(ENGINE_TIMING_ID, 100.0);
        let timing = TimingController::new(engine);
        let (status, stats) = timing.get_engine_timings();
        assert_eq!(status, ControlStatus::Ok);
        assert!(stats.is_some());
    }

    #[test]
    fn unknown_track_is_not_found() {
        let engine = test_engine();
        engine.timer.set_enabled(true);
        let timing = TimingController::new(engine);
        assert_eq!(timing.get_track_timings(42).0, ControlStatus::NotFound);
    }
}
