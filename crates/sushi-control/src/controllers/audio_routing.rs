//! AudioRouting sub-controller (spec.md §4.G AudioRouting): engine
//! channel <-> track channel connection queries and mutations.
//!
//! Delegates straight to [`crate::audio_routing::AudioRoutingTable`], which
//! is already safe to mutate from any thread — there is nothing here for a
//! worker-thread lambda to protect, the same reasoning
//! [`crate::controllers::midi::MidiController`] applies to
//! `sushi-midi`'s routing tables. This controller's only job is the
//! existence checks the bare table can't perform: a dangling track id or
//! an out-of-range engine/track channel number.

use std::sync::Arc;

use crate::audio_routing::AudioConnection;
use crate::engine::Engine;
use crate::status::ControlStatus;

pub struct AudioRoutingController {
    engine: Arc<Engine>,
}

impl AudioRoutingController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn get_input_connections(&self) -> Vec<AudioConnection> {
        self.engine.audio_routing.input_connections()
    }

    pub fn get_output_connections(&self) -> Vec<AudioConnection> {
        self.engine.audio_routing.output_connections()
    }

    fn track_channels(&self, track_id: u32) -> Option<usize> {
        self.engine.container.read().track(track_id).map(|t| t.kind.channels())
    }

    pub fn connect_input_channel_to_track(&self, engine_channel: usize, track_id: u32, track_channel: usize) -> ControlStatus {
        let Some(channels) = self.track_channels(track_id) else {
            return ControlStatus::InvalidArguments;
        };
        if engine_channel >= self.engine.input_audio_channels || track_channel >= channels {
            return ControlStatus::OutOfRange;
        }
        self.engine.audio_routing.connect_input_channel_to_track(engine_channel, track_id, track_channel)
    }

    pub fn connect_output_channel_to_track(&self, engine_channel: usize, track_id: u32, track_channel: usize) -> ControlStatus {
        let Some(channels) = self.track_channels(track_id) else {
            return ControlStatus::InvalidArguments;
        };
        if engine_channel >= self.engine.output_audio_channels || track_channel >= channels {
            return ControlStatus::OutOfRange;
        }
        self.engine.audio_routing.connect_output_channel_to_track(engine_channel, track_id, track_channel)
    }

    pub fn disconnect_input(&self, engine_channel: usize, track_id: u32, track_channel: usize) -> ControlStatus {
        self.engine.audio_routing.disconnect_input(engine_channel, track_id, track_channel)
    }

    pub fn disconnect_output(&self, engine_channel: usize, track_id: u32, track_channel: usize) -> ControlStatus {
        self.engine.audio_routing.disconnect_output(engine_channel, track_id, track_channel)
    }

    pub fn disconnect_all_inputs_from_track(&self, track_id: u32) -> ControlStatus {
        self.engine.audio_routing.disconnect_all_inputs_from_track(track_id)
    }

    pub fn disconnect_all_outputs_from_track(&self, track_id: u32) -> ControlStatus {
        self.engine.audio_routing.disconnect_all_outputs_from_track(track_id)
    }
}
