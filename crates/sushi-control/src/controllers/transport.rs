//! Transport sub-controller (spec.md §4.G Transport).
//!
//! Getters read the transport's atomic snapshot directly; setters post a
//! [`TransportChange`](sushi_dispatch::event::TransportChange) event rather
//! than mutating `Transport` in place, preserving spec.md §4.B's "transport
//! is written only from the RT thread".

use std::sync::Arc;

use sushi_dispatch::event::{EventPayload, TransportChange};

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::{PlayingMode, SyncMode, TimeSignature};

pub struct TransportController {
    engine: Arc<Engine>,
}

impl TransportController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn get_samplerate(&self) -> f64 {
        self.engine.transport.sample_rate()
    }

    pub fn get_tempo(&self) -> f32 {
        self.engine.transport.tempo()
    }

    pub fn set_tempo(&self, bpm: f32) -> ControlStatus {
        if !(20.0..=999.0).contains(&bpm) {
            return ControlStatus::OutOfRange;
        }
        self.post(TransportChange::SetTempo(bpm))
    }

    pub fn get_time_signature(&self) -> TimeSignature {
        crate::wire::time_signature_to_wire(self.engine.transport.time_signature())
    }

    pub fn set_time_signature(&self, signature: TimeSignature) -> ControlStatus {
        if signature.numerator == 0 || signature.denominator == 0 {
            return ControlStatus::InvalidArguments;
        }
        self.post(TransportChange::SetTimeSignature(crate::wire::time_signature_from_wire(signature)))
    }

    pub fn get_playing_mode(&self) -> PlayingMode {
        crate::wire::playing_mode_to_wire(self.engine.transport.playing_mode())
    }

    pub fn set_playing_mode(&self, mode: PlayingMode) -> ControlStatus {
        self.post(TransportChange::SetPlayingMode(crate::wire::playing_mode_from_wire(mode)))
    }

    pub fn get_sync_mode(&self) -> SyncMode {
        crate::wire::sync_mode_to_wire(self.engine.transport.sync_mode())
    }

    pub fn set_sync_mode(&self, mode: SyncMode) -> ControlStatus {
        self.post(TransportChange::SetSyncMode(crate::wire::sync_mode_from_wire(mode)))
    }

    fn post(&self, change: TransportChange) -> ControlStatus {
        match self.engine.post(EventPayload::TransportChange(change)) {
            Ok(()) => ControlStatus::Ok,
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;

    #[test]
    fn rejects_tempo_out_of_range() {
        let transport = TransportController::new(test_engine());
        assert_eq!(transport.set_tempo(5.0), ControlStatus::OutOfRange);
    }

    #[test]
    fn set_tempo_posts_but_is_not_visible_until_drained() {
        let engine = test_engine();
        let transport = TransportController::new(engine.clone());
        assert_eq!(transport.set_tempo(140.0), ControlStatus::Ok);
        // Not yet applied: the change is staged on the RT heap, not written
        // directly, until the RT thread drains it.
        assert_eq!(transport.get_tempo(), engine.config.initial_tempo);
    }

    #[test]
    fn rejects_zero_time_signature() {
        let transport = TransportController::new(test_engine());
        assert_eq!(
            transport.set_time_signature(TimeSignature { numerator: 0, denominator: 4 }),
            ControlStatus::InvalidArguments
        );
    }
}
