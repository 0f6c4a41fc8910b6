//! Midi sub-controller (spec.md §4.G Midi): wraps `sushi-midi`'s routing
//! tables with the processor/track existence checks the bare table can't
//! perform on its own, returning `invalid_id` for a dangling reference.
//!
//! Calls the routing table directly rather than posting a lambda: the
//! table is already safe to mutate from any thread (`DashMap`-backed, see
//! `sushi-midi::routing`), matching the precedent set by
//! [`crate::controllers::audio_routing::AudioRoutingController`] for the
//! other per-row routing table in this workspace.

use std::sync::Arc;

use sushi_session::{CcConnection, KbdConnection, KbdOutputConnection, PcConnection};

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::{midi_channel_from_wire, midi_channel_to_wire, MidiChannel};

pub struct MidiController {
    engine: Arc<Engine>,
}

impl MidiController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn get_input_ports(&self) -> u32 {
        self.engine.midi.routing.num_input_ports()
    }

    pub fn get_output_ports(&self) -> u32 {
        self.engine.midi.routing.num_output_ports()
    }

    // -- enumeration --------------------------------------------------------

    pub fn get_all_kbd_input_connections(&self) -> Vec<KbdConnection> {
        self.engine
            .midi
            .routing
            .all_kbd_connections()
            .into_iter()
            .map(|(port, channel, r)| KbdConnection {
                port,
                channel: midi_channel_to_wire(channel),
                track: r.track,
                raw: r.raw,
            })
            .collect()
    }

    pub fn get_all_kbd_output_connections(&self) -> Vec<KbdOutputConnection> {
        self.engine
            .midi
            .routing
            .all_kbd_output_connections()
            .into_iter()
            .map(|(track, s)| KbdOutputConnection { track, port: s.port, channel: midi_channel_to_wire(s.channel) })
            .collect()
    }

    pub fn get_all_cc_input_connections(&self) -> Vec<CcConnection> {
        self.engine
            .midi
            .routing
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
            .collect()
    }

    pub fn get_all_pc_input_connections(&self) -> Vec<PcConnection> {
        self.engine
            .midi
            .routing
            .all_pc_connections()
            .into_iter()
            .map(|(port, channel, b)| PcConnection { port, channel: midi_channel_to_wire(channel), processor: b.processor })
            .collect()
    }

    pub fn get_cc_input_connections_for_processor(&self, processor_id: u32) -> Vec<CcConnection> {
        self.get_all_cc_input_connections().into_iter().filter(|c| c.processor == processor_id).collect()
    }

    pub fn get_pc_input_connections_for_processor(&self, processor_id: u32) -> Vec<PcConnection> {
        self.get_all_pc_input_connections().into_iter().filter(|c| c.processor == processor_id).collect()
    }

    /// Route one raw MIDI message arriving on `port` (spec.md §4.E): the
    /// entry point the audio front-end driver calls with bytes read off a
    /// hardware port. Returns the number of control-plane events posted.
    pub fn receive_midi(&self, port: u32, bytes: &[u8]) -> ControlStatus {
        match self.engine.route_midi_input(port, bytes) {
            Ok(_) => ControlStatus::Ok,
            Err(err) => err.into(),
        }
    }

    // -- clock ----------------------------------------------------------

    pub fn set_midi_clock_output_enabled(&self, port: u32, enabled: bool) -> ControlStatus {
        self.engine.midi.routing.set_clock_output_enabled(port, enabled).into()
    }

    pub fn get_midi_clock_output_enabled(&self, port: u32) -> bool {
        self.engine.midi.routing.is_clock_output_enabled(port)
    }

    // -- mutations ------------------------------------------------------

    fn track_exists(&self, track_id: u32) -> bool {
        self.engine.container.read().track(track_id).is_some()
    }

    fn processor_exists(&self, processor_id: u32) -> bool {
        self.engine.container.read().processor(processor_id).is_some()
    }

    pub fn connect_kbd_input_to_track(&self, port: u32, channel: MidiChannel, track_id: u32, raw: bool) -> ControlStatus {
        if !self.track_exists(track_id) {
            return ControlStatus::InvalidArguments;
        }
        self.engine.midi.routing.connect_kbd_to_track(port, midi_channel_from_wire(channel), track_id, raw).into()
    }

    pub fn disconnect_kbd_input_from_track(&self, port: u32, channel: MidiChannel, track_id: u32) -> ControlStatus {
        self.engine.midi.routing.disconnect_kbd_from_track(port, midi_channel_from_wire(channel), track_id).into()
    }

    pub fn connect_kbd_output_from_track(&self, track_id: u32, port: u32, channel: MidiChannel) -> ControlStatus {
        if !self.track_exists(track_id) {
            return ControlStatus::InvalidArguments;
        }
        self.engine.midi.routing.connect_track_to_kbd_output(track_id, port, midi_channel_from_wire(channel)).into()
    }

    pub fn disconnect_kbd_output_from_track(&self, track_id: u32, port: u32, channel: MidiChannel) -> ControlStatus {
        self.engine.midi.routing.disconnect_track_from_kbd_output(track_id, port, midi_channel_from_wire(channel)).into()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn connect_cc_to_parameter(
        &self,
        port: u32,
        channel: MidiChannel,
        cc: u8,
        processor_id: u32,
        parameter_id: u32,
        min: f32,
        max: f32,
        relative: bool,
    ) -> ControlStatus {
        if !self.processor_exists(processor_id) {
            return ControlStatus::InvalidArguments;
        }
        self.engine
            .midi
            .routing
            .connect_cc_to_parameter(port, midi_channel_from_wire(channel), cc, processor_id, parameter_id, min, max, relative)
            .into()
    }

    pub fn disconnect_cc_from_parameter(&self, port: u32, channel: MidiChannel, cc: u8, processor_id: u32, parameter_id: u32) -> ControlStatus {
        self.engine
            .midi
            .routing
            .disconnect_cc_from_parameter(port, midi_channel_from_wire(channel), cc, processor_id, parameter_id)
            .into()
    }

    pub fn connect_pc_to_processor(&self, port: u32, channel: MidiChannel, processor_id: u32) -> ControlStatus {
        if !self.processor_exists(processor_id) {
            return ControlStatus::InvalidArguments;
        }
        self.engine.midi.routing.connect_pc_to_processor(port, midi_channel_from_wire(channel), processor_id).into()
    }

    pub fn disconnect_pc_from_processor(&self, port: u32, channel: MidiChannel, processor_id: u32) -> ControlStatus {
        self.engine.midi.routing.disconnect_pc_from_processor(port, midi_channel_from_wire(channel), processor_id).into()
    }

    pub fn disconnect_all_cc_from_processor(&self, processor_id: u32) -> ControlStatus {
        self.engine.midi.routing.disconnect_all_cc_from_processor(processor_id);
        ControlStatus::Ok
    }

    pub fn disconnect_all_pc_from_processor(&self, processor_id: u32) -> ControlStatus {
        self.engine.midi.routing.disconnect_all_pc_from_processor(processor_id);
        ControlStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;

    fn make_track(engine: &Arc<Engine>) -> u32 {
        let id = engine.ids.next_id();
        let processor = sushi_core::Processor::new(id, "T1", "T1", sushi_core::ProcessorType::Internal { uid: "track".into() }, 2, 2);
        engine.container.write().add_track(sushi_core::Track::new(processor, sushi_core::TrackKind::Regular { channels: 2 })).unwrap();
        id
    }

    #[test]
    fn connect_kbd_requires_live_track() {
        let engine = test_engine();
        let midi = MidiController::new(engine);
        assert_eq!(midi.connect_kbd_input_to_track(0, MidiChannel::Channel(1), 42, false), ControlStatus::InvalidArguments);
    }

    #[test]
    fn connect_and_enumerate_kbd_connection() {
        let engine = test_engine();
        let track_id = make_track(&engine);
        let midi = MidiController::new(engine);
        assert_eq!(midi.connect_kbd_input_to_track(0, MidiChannel::Channel(1), track_id, false), ControlStatus::Ok);
        let rows = midi.get_all_kbd_input_connections();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].track, track_id);
    }

    #[test]
    fn clock_enable_reports_port_bounds() {
        let engine = test_engine();
        let midi = MidiController::new(engine);
        assert_eq!(midi.set_midi_clock_output_enabled(0, true), ControlStatus::Ok);
        assert!(midi.get_midi_clock_output_enabled(0));
        assert_eq!(midi.set_midi_clock_output_enabled(99, true), ControlStatus::InvalidArguments);
    }

    #[test]
    fn disconnect_all_cc_from_processor_clears_rows() {
        let engine = test_engine();
        let proc_id = engine.ids.next_id();
        engine
            .container
            .write()
            .add_processor(sushi_core::Processor::new(proc_id, "G1", "G1", sushi_core::ProcessorType::Internal { uid: "sushi.testing.gain".into() }, 2, 2))
            .unwrap();
        let midi = MidiController::new(engine);
        midi.connect_cc_to_parameter(0, MidiChannel::Channel(1), 10, proc_id, 0, 0.0, 1.0, false);
        assert_eq!(midi.disconnect_all_cc_from_processor(proc_id), ControlStatus::Ok);
        assert!(midi.get_cc_input_connections_for_processor(proc_id).is_empty());
    }

    #[test]
    fn receive_midi_routes_a_bound_cc_into_a_parameter_change() {
        let engine = test_engine();
        let proc_id = engine.ids.next_id();
        engine
            .container
            .write()
            .add_processor(sushi_core::Processor::new(proc_id, "G1", "G1", sushi_core::ProcessorType::Internal { uid: "sushi.testing.gain".into() }, 2, 2))
            .unwrap();
        let midi = MidiController::new(engine.clone());
        assert_eq!(midi.connect_cc_to_parameter(0, MidiChannel::Channel(4), 0x43, proc_id, 0, 0.0, 100.0, false), ControlStatus::Ok);

        assert_eq!(midi.receive_midi(0, &[0xB3, 0x43, 0x4B]), ControlStatus::Ok);
        engine.drain_worker();
        engine.drain_rt_default(0);

        let value = engine.parameter_values.get(&(proc_id, 0)).map(|v| *v).unwrap();
        assert!((value - (75.0 / 127.0 * 100.0)).abs() < 1e-3);
    }
}
