//! Session sub-controller (spec.md §4.J): assembles and restores the
//! full `SessionState` tree against this crate's concrete `Engine`.
//!
//! `SessionHostAdapter` is the `sushi-session::SessionHost` implementation
//! this workspace supplies, keeping `sushi-session` itself free of any
//! `sushi-control` dependency (its own doc comment: "sushi-control
//! implements it over the real container, transport and MIDI dispatcher").
//! Restore runs as the body of one worker-thread lambda, matching
//! `sushi_session::restore_session`'s doc note that it is "intended to run
//! as the body of a single lambda event on the dispatcher".

use std::sync::atomic::Ordering;
use std::sync::Arc;

use sushi_core::{PluginFormat, Processor, ProcessorType, Track, TrackKind};
use sushi_session::{
    AudioConnection as WireAudioConnection, CcConnection, EngineState, KbdConnection, KbdOutputConnection,
    MidiState, OscState, PcConnection, PluginClass, SessionHost, SessionState, TrackState, WirePluginType,
    WireTrackType,
};

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::{
    midi_channel_from_wire, midi_channel_to_wire, plugin_format_from_wire, plugin_format_to_wire,
    playing_mode_from_wire, playing_mode_to_wire, sync_mode_from_wire, sync_mode_to_wire, time_signature_from_wire,
    time_signature_to_wire,
};

struct SessionHostAdapter {
    engine: Arc<Engine>,
}

impl SessionHost for SessionHostAdapter {
    fn available_audio_channels(&self) -> (usize, usize) {
        (self.engine.input_audio_channels, self.engine.output_audio_channels)
    }

    fn available_midi_ports(&self) -> (u32, u32) {
        (self.engine.midi.routing.num_input_ports(), self.engine.midi.routing.num_output_ports())
    }

    fn is_rt_running(&self) -> bool {
        self.engine.rt_running.load(Ordering::Acquire)
    }

    fn pause_audio(&mut self) {
        self.engine.rt_running.store(false, Ordering::Release);
    }

    fn unpause_audio(&mut self) {
        self.engine.rt_running.store(true, Ordering::Release);
    }

    fn clear_graph(&mut self) {
        let track_ids: Vec<u32> = self.engine.container.read().all_tracks().iter().map(|t| t.id()).collect();
        for track_id in track_ids {
            let child_ids: Vec<u32> = self
                .engine
                .container
                .read()
                .track_processors(track_id)
                .map(|ps| ps.iter().map(|p| p.id).collect())
                .unwrap_or_default();
            for processor_id in child_ids.into_iter().rev() {
                let mut container = self.engine.container.write();
                let _ = container.remove_from_track(processor_id, track_id);
                let _ = container.remove_processor(processor_id);
                drop(container);
                self.engine.midi.routing.remove_all_routes_for(processor_id);
                self.engine.bypass.remove(&processor_id);
                self.engine.processor_state.remove(&processor_id);
            }
            self.engine.audio_routing.remove_all_routes_for_track(track_id);
            let _ = self.engine.container.write().remove_track(track_id);
            self.engine.processor_state.remove(&track_id);
        }
    }

    fn create_track(&mut self, track: &TrackState) -> sushi_session::Result<u32> {
        let kind = match track.track_type {
            WireTrackType::Pre => TrackKind::Pre,
            WireTrackType::Post => TrackKind::Post,
            WireTrackType::Regular if track.buses > 1 => TrackKind::Multibus { buses: track.buses },
            WireTrackType::Regular => TrackKind::Regular { channels: track.channels },
        };
        let id = self.engine.ids.next_id();
        let processor = Processor::new(id, &track.name, &track.label, ProcessorType::Internal { uid: "track".into() }, track.channels, track.channels);
        let built = Track::new(processor, kind);
        self.engine
            .container
            .write()
            .add_track(built)
            .map_err(|_| sushi_session::Error::RestoreFailed { reason: format!("duplicate track name {}", track.name) })?;
        Ok(id)
    }

    fn create_processor(&mut self, plugin: &PluginClass) -> sushi_session::Result<u32> {
        let id = self.engine.ids.next_id();
        let processor_type = if plugin.plugin_type == WirePluginType::Internal {
            ProcessorType::Internal { uid: plugin.uid.clone() }
        } else {
            ProcessorType::External { uid: plugin.uid.clone(), path: plugin.path.clone(), format: plugin_format_from_wire(plugin.plugin_type) }
        };
        let processor = Processor::new(id, &plugin.name, &plugin.label, processor_type, 2, 2);
        self.engine
            .container
            .write()
            .add_processor(processor)
            .map_err(|_| sushi_session::Error::RestoreFailed { reason: format!("duplicate processor name {}", plugin.name) })?;
        Ok(id)
    }

    fn add_plugin_to_track(&mut self, processor_id: u32, track_id: u32) -> sushi_session::Result<()> {
        self.engine
            .container
            .write()
            .add_to_track(processor_id, track_id, None)
            .map_err(|err| sushi_session::Error::RestoreFailed { reason: err.to_string() })
    }

    fn set_track_state(&mut self, track_id: u32, state: &[u8]) {
        if !state.is_empty() {
            self.engine.processor_state.insert(track_id, state.to_vec());
        }
    }

    fn set_plugin_state(&mut self, processor_id: u32, state: &[u8]) {
        if !state.is_empty() {
            self.engine.processor_state.insert(processor_id, state.to_vec());
        }
    }

    fn restore_engine_state(&mut self, engine_state: &EngineState) {
        self.engine.transport.set_tempo(engine_state.tempo);
        self.engine.transport.set_time_signature(time_signature_from_wire(engine_state.time_signature));
        self.engine.transport.set_playing_mode(playing_mode_from_wire(engine_state.playing_mode));
        self.engine.transport.set_sync_mode(sync_mode_from_wire(engine_state.sync_mode));
        self.engine.input_clip_detection.store(engine_state.input_clip_detection, Ordering::Release);
        self.engine.output_clip_detection.store(engine_state.output_clip_detection, Ordering::Release);
        self.engine.master_limiter.store(engine_state.master_limiter, Ordering::Release);
        for c in &engine_state.audio_input_connections {
            self.engine.audio_routing.connect_input_channel_to_track(c.engine_channel, c.track, c.track_channel);
        }
        for c in &engine_state.audio_output_connections {
            self.engine.audio_routing.connect_output_channel_to_track(c.engine_channel, c.track, c.track_channel);
        }
    }

    fn restore_midi_state(&mut self, midi: &MidiState) {
        for c in &midi.kbd_connections {
            self.engine.midi.routing.connect_kbd_to_track(c.port, midi_channel_from_wire(c.channel), c.track, c.raw);
        }
        for c in &midi.kbd_output_connections {
            self.engine.midi.routing.connect_track_to_kbd_output(c.track, c.port, midi_channel_from_wire(c.channel));
        }
        for c in &midi.cc_connections {
            self.engine
                .midi
                .routing
                .connect_cc_to_parameter(c.port, midi_channel_from_wire(c.channel), c.cc, c.processor, c.parameter, c.min, c.max, c.relative);
        }
        for c in &midi.pc_connections {
            self.engine.midi.routing.connect_pc_to_processor(c.port, midi_channel_from_wire(c.channel), c.processor);
        }
        for &port in &midi.clock_enabled_ports {
            self.engine.midi.routing.set_clock_output_enabled(port, true);
        }
    }

    fn restore_osc_state(&mut self, osc: &OscState) {
        self.engine.osc.restore_state(osc);
    }
}

pub struct SessionController {
    engine: Arc<Engine>,
}

impl SessionController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Assemble the current engine state into a `SessionState` tree
    /// (spec.md §4.J `save_session`). Runs synchronously against a read
    /// snapshot of the container; no pausing is required for a save.
    pub fn save_session(&self) -> SessionState {
        let container = self.engine.container.read();
        let tracks = container
            .all_tracks()
            .into_iter()
            .map(|track| {
                let plugins = track
                    .chain
                    .iter()
                    .filter_map(|&id| container.processor(id))
                    .map(|p| self.save_plugin(p))
                    .collect();
                TrackState {
                    id: track.id(),
                    name: track.processor.name.clone(),
                    label: track.processor.label.clone(),
                    channels: track.kind.channels(),
                    buses: track.kind.buses(),
                    track_type: crate::wire::track_kind_to_wire(&track.kind).into(),
                    state: self.engine.processor_state.get(&track.id()).map(|s| s.clone()).unwrap_or_default(),
                    plugins,
                }
            })
            .collect();

        SessionState {
            save_date: sushi_session::save_date_now(),
            sushi_info: self.engine.build_info.clone(),
            osc_state: self.engine.osc.save_state(),
            midi_state: self.save_midi_state(),
            engine_state: self.save_engine_state(),
            tracks,
        }
    }

    fn save_plugin(&self, processor: &Processor) -> PluginClass {
        let (uid, path, plugin_type) = match &processor.processor_type {
            ProcessorType::Internal { uid } => (uid.clone(), String::new(), WirePluginType::Internal),
            ProcessorType::External { uid, path, format } => (uid.clone(), path.clone(), plugin_format_to_wire(*format)),
        };
        PluginClass {
            id: processor.id,
            name: processor.name.clone(),
            label: processor.label.clone(),
            uid,
            path,
            plugin_type,
            state: self.engine.processor_state.get(&processor.id).map(|s| s.clone()).unwrap_or_default(),
        }
    }

    fn save_midi_state(&self) -> MidiState {
        let routing = &self.engine.midi.routing;
        MidiState {
            input_port_count: routing.num_input_ports(),
            output_port_count: routing.num_output_ports(),
            kbd_connections: routing
                .all_kbd_connections()
                .into_iter()
                .map(|(port, channel, r)| KbdConnection { port, channel: midi_channel_to_wire(channel), track: r.track, raw: r.raw })
                .collect(),
            kbd_output_connections: routing
                .all_kbd_output_connections()
                .into_iter()
                .map(|(track, s)| KbdOutputConnection { track, port: s.port, channel: midi_channel_to_wire(s.channel) })
                .collect(),
            cc_connections: routing
                .all_cc_connections()
                .into_iter()
                .map(|(port, channel, cc, b)| CcConnection {
                    port,
                    channel: midi_channel_to_wire(channel),
                    cc,
                    processor: b.processor,
                    parameter: b.parameter,
                    min: b.min,
                    max: b.max,
                    relative: b.relative,
                })
                .collect(),
            pc_connections: routing
                .all_pc_connections()
                .into_iter()
                .map(|(port, channel, b)| PcConnection { port, channel: midi_channel_to_wire(channel), processor: b.processor })
                .collect(),
            clock_enabled_ports: routing.clock_enabled_ports(),
        }
    }

    fn save_engine_state(&self) -> EngineState {
        EngineState {
            sample_rate: self.engine.transport.sample_rate(),
            tempo: self.engine.transport.tempo(),
            playing_mode: playing_mode_to_wire(self.engine.transport.playing_mode()),
            sync_mode: sync_mode_to_wire(self.engine.transport.sync_mode()),
            time_signature: time_signature_to_wire(self.engine.transport.time_signature()),
            input_clip_detection: self.engine.input_clip_detection.load(Ordering::Acquire),
            output_clip_detection: self.engine.output_clip_detection.load(Ordering::Acquire),
            master_limiter: self.engine.master_limiter.load(Ordering::Acquire),
            min_input_channels: self.engine.input_audio_channels,
            min_output_channels: self.engine.output_audio_channels,
            audio_input_connections: self
                .engine
                .audio_routing
                .input_connections()
                .into_iter()
                .map(|c| WireAudioConnection { engine_channel: c.engine_channel, track: c.track, track_channel: c.track_channel })
                .collect(),
            audio_output_connections: self
                .engine
                .audio_routing
                .output_connections()
                .into_iter()
                .map(|c| WireAudioConnection { engine_channel: c.engine_channel, track: c.track, track_channel: c.track_channel })
                .collect(),
        }
    }

    /// Restore `state` onto the live engine, following the documented
    /// 9-step sequence. Runs synchronously on the calling thread: the
    /// graph edits it performs must already be serialized with any other
    /// worker-thread activity by the caller (spec.md §5).
    pub fn restore_session(&self, state: &SessionState) -> ControlStatus {
        let mut host = SessionHostAdapter { engine: self.engine.clone() };
        match sushi_session::restore_session(state, &mut host) {
            Ok(()) => {
                self.engine.notify(sushi_dispatch::Notification::TrackUpdate {
                    track: 0,
                    action: sushi_dispatch::GraphAction::Added,
                });
                ControlStatus::Ok
            }
            Err(sushi_session::Error::InsufficientChannels { .. }) => ControlStatus::InvalidArguments,
            Err(sushi_session::Error::InsufficientMidiPorts { .. }) => ControlStatus::InvalidArguments,
            Err(sushi_session::Error::RestoreFailed { .. }) => ControlStatus::Error,
        }
    }
}

impl From<sushi_core::PluginFormat> for WirePluginType {
    fn from(format: PluginFormat) -> Self {
        plugin_format_to_wire(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::audio_graph::AudioGraphController;
    use crate::tests_support::test_engine;

    #[test]
    fn round_trips_a_track_and_processor() {
        let engine = test_engine();
        let graph = AudioGraphController::new(engine.clone());
        let (status, track_id) = graph.create_track("Drums", 2);
        assert_eq!(status, ControlStatus::Ok);
        engine.drain_worker();

        let (status, proc_id) = graph.create_processor_on_track(
            "G1",
            "sushi.testing.gain",
            "",
            crate::wire::PluginType::Internal,
            track_id,
            None,
        );
        assert_eq!(status, ControlStatus::Ok);
        engine.drain_worker();
        let _ = proc_id;

        let session = SessionController::new(engine.clone());
        let saved = session.save_session();
        assert_eq!(saved.tracks.len(), 1);
        assert_eq!(saved.tracks[0].plugins.len(), 1);

        assert_eq!(session.restore_session(&saved), ControlStatus::Ok);
        let restored = session.save_session();
        assert_eq!(restored.tracks.len(), 1);
        assert_eq!(restored.tracks[0].name, "Drums");
        assert_eq!(restored.tracks[0].plugins[0].uid, "sushi.testing.gain");
    }

    #[test]
    fn restore_rejects_when_engine_has_fewer_midi_ports() {
        let engine = test_engine();
        let session = SessionController::new(engine);
        let mut state = session.save_session();
        state.midi_state.input_port_count = 999;
        assert_eq!(session.restore_session(&state), ControlStatus::InvalidArguments);
    }
}
