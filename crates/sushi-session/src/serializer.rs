//! The save/restore state machine (spec.md §4.J).

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::state::{
    AudioConnection, CcConnection, EngineState, KbdConnection, KbdOutputConnection, MidiState, OscState,
    PcConnection, SessionState, TrackState,
};

/// Everything the restore state machine needs from the live engine. Kept as
/// a trait so this crate never depends on `sushi-control`'s concrete
/// façade; `sushi-control` implements it over the real container, transport
/// and MIDI dispatcher.
pub trait SessionHost {
    fn available_audio_channels(&self) -> (usize, usize);
    fn available_midi_ports(&self) -> (u32, u32);
    fn is_rt_running(&self) -> bool;
    fn pause_audio(&mut self);
    fn unpause_audio(&mut self);

    /// Delete every track's processors bottom-up, then the track itself.
    fn clear_graph(&mut self);

    /// Recreate a track (respecting its variant) and return its new id.
    fn create_track(&mut self, track: &TrackState) -> Result<u32>;

    /// Recreate a processor (not yet state-applied) and return its new id.
    fn create_processor(&mut self, plugin: &crate::state::PluginClass) -> Result<u32>;

    fn add_plugin_to_track(&mut self, processor_id: u32, track_id: u32) -> Result<()>;

    fn set_track_state(&mut self, track_id: u32, state: &[u8]);
    fn set_plugin_state(&mut self, processor_id: u32, state: &[u8]);

    fn restore_engine_state(&mut self, engine: &EngineState);
    fn restore_midi_state(&mut self, midi: &MidiState);
    fn restore_osc_state(&mut self, osc: &OscState);
}

/// Pre-flight validation (spec.md §4.J): the session must not declare more
/// resources than the live engine can provide.
pub fn validate_preflight(state: &SessionState, host: &impl SessionHost) -> Result<()> {
    let (required_in, required_out) = state.required_channels();
    let (available_in, available_out) = host.available_audio_channels();
    if required_in > available_in || required_out > available_out {
        return Err(Error::InsufficientChannels {
            required: required_in.max(required_out),
            available: available_in.max(available_out),
        });
    }
    let (required_in_ports, required_out_ports) = state.required_midi_ports();
    let (available_in_ports, available_out_ports) = host.available_midi_ports();
    if required_in_ports > available_in_ports || required_out_ports > available_out_ports {
        return Err(Error::InsufficientMidiPorts {
            required: required_in_ports.max(required_out_ports) as usize,
            available: available_in_ports.max(available_out_ports) as usize,
        });
    }
    Ok(())
}

/// Execute the 9-step restore sequence documented in spec.md §4.J. Intended
/// to run as the body of a single lambda event on the dispatcher.
pub fn restore_session(state: &SessionState, host: &mut impl SessionHost) -> Result<()> {
    validate_preflight(state, host)?;

    // 1. Pause the audio frontend if currently running.
    let was_running = host.is_rt_running();
    if was_running {
        host.pause_audio();
    }

    // 2. Clear the graph: delete all processors bottom-up, then the tracks.
    host.clear_graph();

    // 3. Recreate tracks in saved order.
    let mut track_ids = Vec::with_capacity(state.tracks.len());
    for track in &state.tracks {
        let id = host.create_track(track)?;
        track_ids.push(id);
    }

    // 4. Recreate plugins per track in saved order; no state applied yet.
    let mut plugin_ids: Vec<Vec<u32>> = Vec::with_capacity(state.tracks.len());
    for (track, &track_id) in state.tracks.iter().zip(&track_ids) {
        let mut ids = Vec::with_capacity(track.plugins.len());
        for plugin in &track.plugins {
            let processor_id = host.create_processor(plugin)?;
            host.add_plugin_to_track(processor_id, track_id)?;
            ids.push(processor_id);
        }
        plugin_ids.push(ids);
    }

    // 5. Second pass: apply track state and each plugin's opaque state.
    for ((track, &track_id), ids) in state.tracks.iter().zip(&track_ids).zip(&plugin_ids) {
        host.set_track_state(track_id, &track.state);
        for (plugin, &processor_id) in track.plugins.iter().zip(ids) {
            host.set_plugin_state(processor_id, &plugin.state);
        }
    }

    // `create_track`/`create_processor` hand back fresh ids (the container's
    // id generator keeps running, it never replays saved ids), so every
    // routing row saved under the old ids must be translated before it is
    // reconnected, or it would reference ids that no longer exist (spec.md
    // §3's live-id invariant).
    let id_map = build_id_map(state, &track_ids, &plugin_ids);

    // 6. Restore engine state: tempo, sync, transport, time-sig, clip/limiter
    // flags, then rebuild audio connections.
    host.restore_engine_state(&remap_engine_state(&state.engine_state, &id_map));

    // 7. Restore MIDI state: connections, then clock outputs.
    host.restore_midi_state(&remap_midi_state(&state.midi_state, &id_map));

    // 8. Restore OSC state.
    host.restore_osc_state(&state.osc_state);

    // 9. Un-pause the audio frontend if it was paused in step 1.
    if was_running {
        host.unpause_audio();
    }

    Ok(())
}

/// Maps the id a track or processor was saved under onto the fresh id it was
/// just recreated with, keyed by recreation order (`track_ids`/`plugin_ids`
/// line up positionally with `state.tracks`/`state.tracks[i].plugins`).
fn build_id_map(state: &SessionState, track_ids: &[u32], plugin_ids: &[Vec<u32>]) -> HashMap<u32, u32> {
    let mut map = HashMap::new();
    for (track, &new_id) in state.tracks.iter().zip(track_ids) {
        map.insert(track.id, new_id);
    }
    for (track, ids) in state.tracks.iter().zip(plugin_ids) {
        for (plugin, &new_id) in track.plugins.iter().zip(ids) {
            map.insert(plugin.id, new_id);
        }
    }
    map
}

fn remap_track(map: &HashMap<u32, u32>, old: u32, row_desc: &str) -> Option<u32> {
    match map.get(&old) {
        Some(&new) => Some(new),
        None => {
            tracing::warn!(old_track = old, row = row_desc, "dropping saved route: track id not present in restored session");
            None
        }
    }
}

fn remap_processor(map: &HashMap<u32, u32>, old: u32, row_desc: &str) -> Option<u32> {
    match map.get(&old) {
        Some(&new) => Some(new),
        None => {
            tracing::warn!(old_processor = old, row = row_desc, "dropping saved route: processor id not present in restored session");
            None
        }
    }
}

/// Translate every `track`/`processor` id embedded in `engine`'s audio
/// connections from its saved value onto the id the entity was just
/// recreated with. Rows whose referenced id vanished (should not happen for
/// a session produced by `save_session`) are dropped rather than left
/// dangling.
fn remap_engine_state(engine: &EngineState, id_map: &HashMap<u32, u32>) -> EngineState {
    let remap_connections = |connections: &[AudioConnection], row_desc: &str| -> Vec<AudioConnection> {
        connections
            .iter()
            .filter_map(|c| {
                remap_track(id_map, c.track, row_desc)
                    .map(|track| AudioConnection { engine_channel: c.engine_channel, track, track_channel: c.track_channel })
            })
            .collect()
    };
    EngineState {
        audio_input_connections: remap_connections(&engine.audio_input_connections, "audio_input_connection"),
        audio_output_connections: remap_connections(&engine.audio_output_connections, "audio_output_connection"),
        ..engine.clone()
    }
}

/// Translate every `track`/`processor` id embedded in `midi`'s connection
/// tables, the same way [`remap_engine_state`] does for audio routing.
fn remap_midi_state(midi: &MidiState, id_map: &HashMap<u32, u32>) -> MidiState {
    MidiState {
        kbd_connections: midi
            .kbd_connections
            .iter()
            .filter_map(|c| {
                remap_track(id_map, c.track, "kbd_connection")
                    .map(|track| KbdConnection { port: c.port, channel: c.channel, track, raw: c.raw })
            })
            .collect(),
        kbd_output_connections: midi
            .kbd_output_connections
            .iter()
            .filter_map(|c| {
                remap_track(id_map, c.track, "kbd_output_connection")
                    .map(|track| KbdOutputConnection { track, port: c.port, channel: c.channel })
            })
            .collect(),
        cc_connections: midi
            .cc_connections
            .iter()
            .filter_map(|c| {
                remap_processor(id_map, c.processor, "cc_connection").map(|processor| CcConnection {
                    port: c.port,
                    channel: c.channel,
                    cc: c.cc,
                    processor,
                    parameter: c.parameter,
                    min: c.min,
                    max: c.max,
                    relative: c.relative,
                })
            })
            .collect(),
        pc_connections: midi
            .pc_connections
            .iter()
            .filter_map(|c| {
                remap_processor(id_map, c.processor, "pc_connection")
                    .map(|processor| PcConnection { port: c.port, channel: c.channel, processor })
            })
            .collect(),
        ..midi.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::*;

    struct FakeHost {
        audio_channels: (usize, usize),
        midi_ports: (u32, u32),
        rt_running: bool,
        paused: bool,
        next_id: u32,
        log: Vec<String>,
        last_engine_state: Option<EngineState>,
        last_midi_state: Option<MidiState>,
    }

    impl FakeHost {
        fn new() -> Self {
            Self {
                audio_channels: (8, 8),
                midi_ports: (2, 2),
                rt_running: true,
                paused: false,
                next_id: 0,
                log: Vec::new(),
                last_engine_state: None,
                last_midi_state: None,
            }
        }
    }

    impl SessionHost for FakeHost {
        fn available_audio_channels(&self) -> (usize, usize) {
            self.audio_channels
        }
        fn available_midi_ports(&self) -> (u32, u32) {
            self.midi_ports
        }
        fn is_rt_running(&self) -> bool {
            self.rt_running
        }
        fn pause_audio(&mut self) {
            self.paused = true;
            self.log.push("pause".into());
        }
        fn unpause_audio(&mut self) {
            self.paused = false;
            self.log.push("unpause".into());
        }
        fn clear_graph(&mut self) {
            self.log.push("clear".into());
        }
        fn create_track(&mut self, track: &TrackState) -> Result<u32> {
            self.next_id += 1;
            self.log.push(format!("create_track:{}", track.name));
            Ok(self.next_id)
        }
        fn create_processor(&mut self, plugin: &PluginClass) -> Result<u32> {
            self.next_id += 1;
            self.log.push(format!("create_processor:{}", plugin.name));
            Ok(self.next_id)
        }
        fn add_plugin_to_track(&mut self, processor_id: u32, track_id: u32) -> Result<()> {
            self.log.push(format!("attach:{processor_id}->{track_id}"));
            Ok(())
        }
        fn set_track_state(&mut self, track_id: u32, _state: &[u8]) {
            self.log.push(format!("track_state:{track_id}"));
        }
        fn set_plugin_state(&mut self, processor_id: u32, _state: &[u8]) {
            self.log.push(format!("plugin_state:{processor_id}"));
        }
        fn restore_engine_state(&mut self, engine: &EngineState) {
            self.log.push("engine".into());
            self.last_engine_state = Some(engine.clone());
        }
        fn restore_midi_state(&mut self, midi: &MidiState) {
            self.log.push("midi".into());
            self.last_midi_state = Some(midi.clone());
        }
        fn restore_osc_state(&mut self, _osc: &OscState) {
            self.log.push("osc".into());
        }
    }

    fn sample_state() -> SessionState {
        SessionState {
            save_date: "0".into(),
            sushi_info: BuildInfo {
                version: "1.0.0".into(),
                build_options: vec![],
                build_date: "today".into(),
                commit_hash: "abc".into(),
                audio_block_size: 64,
            },
            osc_state: OscState::default(),
            midi_state: MidiState { input_port_count: 1, output_port_count: 1, ..Default::default() },
            engine_state: EngineState {
                sample_rate: 48000.0,
                tempo: 120.0,
                playing_mode: WirePlayingMode::Stopped,
                sync_mode: WireSyncMode::Internal,
                time_signature: WireTimeSignature { numerator: 4, denominator: 4 },
                input_clip_detection: false,
                output_clip_detection: false,
                master_limiter: false,
                min_input_channels: 2,
                min_output_channels: 2,
                audio_input_connections: vec![],
                audio_output_connections: vec![],
            },
            tracks: vec![TrackState {
                id: 100,
                name: "T1".into(),
                label: "T1".into(),
                channels: 2,
                buses: 1,
                track_type: WireTrackType::Regular,
                state: vec![],
                plugins: vec![PluginClass {
                    id: 101,
                    name: "G1".into(),
                    label: "Gain".into(),
                    uid: "sushi.testing.gain".into(),
                    path: String::new(),
                    plugin_type: WirePluginType::Internal,
                    state: vec![1, 2, 3],
                }],
            }],
        }
    }

    #[test]
    fn restore_follows_the_documented_step_order() {
        let state = sample_state();
        let mut host = FakeHost::new();
        restore_session(&state, &mut host).unwrap();

        let expected: Vec<String> = [
            "pause",
            "clear",
            "create_track:T1",
            "create_processor:G1",
            "attach:2->1",
            "track_state:1",
            "plugin_state:2",
            "engine",
            "midi",
            "osc",
            "unpause",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(host.log, expected);
    }

    #[test]
    fn restore_remaps_saved_routing_ids_onto_freshly_created_ids() {
        let mut state = sample_state();
        // Routing saved under the old ids (track=100, processor=101) from
        // `sample_state`'s single track/plugin.
        state.engine_state.audio_input_connections = vec![AudioConnection { engine_channel: 2, track: 100, track_channel: 0 }];
        state.midi_state.cc_connections = vec![CcConnection {
            port: 0,
            channel: WireMidiChannel::Channel(4),
            cc: 0x43,
            processor: 101,
            parameter: 0,
            min: 0.0,
            max: 100.0,
            relative: false,
        }];

        let mut host = FakeHost::new();
        restore_session(&state, &mut host).unwrap();

        // `FakeHost::create_track`/`create_processor` assign fresh ids 1 and
        // 2 respectively (see the step-order test above); the saved rows
        // must come out pointing at those, not at 100/101.
        let engine_state = host.last_engine_state.expect("restore_engine_state should have been called");
        assert_eq!(engine_state.audio_input_connections, vec![AudioConnection { engine_channel: 2, track: 1, track_channel: 0 }]);

        let midi_state = host.last_midi_state.expect("restore_midi_state should have been called");
        assert_eq!(midi_state.cc_connections[0].processor, 2);
    }

    #[test]
    fn preflight_rejects_when_engine_has_fewer_channels() {
        let state = sample_state();
        let mut host = FakeHost::new();
        host.audio_channels = (1, 1);
        assert!(matches!(restore_session(&state, &mut host), Err(Error::InsufficientChannels { .. })));
    }

    #[test]
    fn preflight_rejects_when_engine_has_fewer_midi_ports() {
        let state = sample_state();
        let mut host = FakeHost::new();
        host.midi_ports = (0, 0);
        assert!(matches!(restore_session(&state, &mut host), Err(Error::InsufficientMidiPorts { .. })));
    }

    #[test]
    fn skips_pause_unpause_when_not_running() {
        let state = sample_state();
        let mut host = FakeHost::new();
        host.rt_running = false;
        restore_session(&state, &mut host).unwrap();
        assert!(!host.log.contains(&"pause".to_string()));
        assert!(!host.log.contains(&"unpause".to_string()));
    }
}
