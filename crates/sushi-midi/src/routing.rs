//! MIDI routing tables: the five keyed maps of spec.md §4.E.
//!
//! Mutated only on the worker thread; the `DashMap`s allow the MIDI input
//! thread to perform lookups under a reader lock that no other reader ever
//! contests, matching §5's concurrency model and the sharding style of
//! `tutti-midi-io/src/cc/manager.rs`'s `CCMappingManager`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use sushi_dispatch::event::MidiChannel;

use crate::status::ConnectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PortChannel {
    port: u32,
    channel: MidiChannel,
}

/// A keyboard-event receiver row: input (port, channel) → track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KbdReceiver {
    pub track: u32,
    /// If true, raw MIDI bytes are forwarded untouched ("wrapped MIDI").
    pub raw: bool,
}

/// A keyboard-event sender row: track → output (port, channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KbdSender {
    pub port: u32,
    pub channel: MidiChannel,
}

/// A CC-to-parameter binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcBinding {
    pub processor: u32,
    pub parameter: u32,
    pub min: f32,
    pub max: f32,
    pub relative: bool,
}

/// A program-change-to-processor binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcBinding {
    pub processor: u32,
}

fn channel_is_valid(channel: MidiChannel) -> bool {
    match channel {
        MidiChannel::Omni => true,
        MidiChannel::Channel(c) => (1..=16).contains(&c),
    }
}

/// Owns the five routing tables and enforces the connect/disconnect
/// mutation contract.
pub struct RoutingTables {
    num_input_ports: u32,
    num_output_ports: u32,
    kbd_receivers: DashMap<PortChannel, Vec<KbdReceiver>>,
    kbd_senders: DashMap<u32, Vec<KbdSender>>,
    cc_bindings: DashMap<(PortChannel, u8), Vec<CcBinding>>,
    pc_bindings: DashMap<PortChannel, Vec<PcBinding>>,
    clock_enabled: Arc<DashMap<u32, AtomicBool>>,
    next_cc_learn_id: AtomicU32,
}

impl RoutingTables {
    pub fn new(num_input_ports: u32, num_output_ports: u32) -> Self {
        let clock_enabled = DashMap::new();
        for port in 0..num_output_ports {
            clock_enabled.insert(port, AtomicBool::new(false));
        }
        Self {
            num_input_ports,
            num_output_ports,
            kbd_receivers: DashMap::new(),
            kbd_senders: DashMap::new(),
            cc_bindings: DashMap::new(),
            pc_bindings: DashMap::new(),
            clock_enabled: Arc::new(clock_enabled),
            next_cc_learn_id: AtomicU32::new(0),
        }
    }

    pub fn num_input_ports(&self) -> u32 {
        self.num_input_ports
    }

    pub fn num_output_ports(&self) -> u32 {
        self.num_output_ports
    }

    fn check_input(&self, port: u32, channel: MidiChannel) -> Option<ConnectionStatus> {
        if port >= self.num_input_ports {
            return Some(ConnectionStatus::InvalidPort);
        }
        if !channel_is_valid(channel) {
            return Some(ConnectionStatus::InvalidChannel);
        }
        None
    }

    fn check_output(&self, port: u32, channel: MidiChannel) -> Option<ConnectionStatus> {
        if port >= self.num_output_ports {
            return Some(ConnectionStatus::InvalidPort);
        }
        if !channel_is_valid(channel) {
            return Some(ConnectionStatus::InvalidChannel);
        }
        None
    }

    // -- keyboard receivers (input port+channel -> track) ----------------

    pub fn connect_kbd_to_track(&self, port: u32, channel: MidiChannel, track: u32, raw: bool) -> ConnectionStatus {
        if let Some(status) = self.check_input(port, channel) {
            return status;
        }
        let key = PortChannel { port, channel };
        let mut rows = self.kbd_receivers.entry(key).or_default();
        let receiver = KbdReceiver { track, raw };
        if rows.contains(&receiver) {
            return ConnectionStatus::AlreadyConnected;
        }
        rows.push(receiver);
        ConnectionStatus::Ok
    }

    pub fn disconnect_kbd_from_track(&self, port: u32, channel: MidiChannel, track: u32) -> ConnectionStatus {
        if let Some(status) = self.check_input(port, channel) {
            return status;
        }
        let key = PortChannel { port, channel };
        match self.kbd_receivers.get_mut(&key) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|r| r.track != track);
                if rows.len() == before {
                    ConnectionStatus::NotConnected
                } else {
                    ConnectionStatus::Ok
                }
            }
            None => ConnectionStatus::NotConnected,
        }
    }

    /// Receivers matching `port`/`channel`, including rows registered for `Omni`.
    pub fn kbd_receivers_for(&self, port: u32, channel: MidiChannel) -> Vec<KbdReceiver> {
        let mut out = Vec::new();
        if let Some(rows) = self.kbd_receivers.get(&PortChannel { port, channel: MidiChannel::Omni }) {
            out.extend(rows.iter().copied());
        }
        if channel != MidiChannel::Omni {
            if let Some(rows) = self.kbd_receivers.get(&PortChannel { port, channel }) {
                out.extend(rows.iter().copied());
            }
        }
        out
    }

    // -- keyboard senders (track -> output port+channel) -----------------

    pub fn connect_track_to_kbd_output(&self, track: u32, port: u32, channel: MidiChannel) -> ConnectionStatus {
        if let Some(status) = self.check_output(port, channel) {
            return status;
        }
        let mut rows = self.kbd_senders.entry(track).or_default();
        let sender = KbdSender { port, channel };
        if rows.contains(&sender) {
            return ConnectionStatus::AlreadyConnected;
        }
        rows.push(sender);
        ConnectionStatus::Ok
    }

    pub fn disconnect_track_from_kbd_output(&self, track: u32, port: u32, channel: MidiChannel) -> ConnectionStatus {
        match self.kbd_senders.get_mut(&track) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|s| !(s.port == port && s.channel == channel));
                if rows.len() == before {
                    ConnectionStatus::NotConnected
                } else {
                    ConnectionStatus::Ok
                }
            }
            None => ConnectionStatus::NotConnected,
        }
    }

    pub fn kbd_senders_for_track(&self, track: u32) -> Vec<KbdSender> {
        self.kbd_senders.get(&track).map(|r| r.value().clone()).unwrap_or_default()
    }

    // -- CC bindings -------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn connect_cc_to_parameter(
        &self,
        port: u32,
        channel: MidiChannel,
        cc: u8,
        processor: u32,
        parameter: u32,
        min: f32,
        max: f32,
        relative: bool,
    ) -> ConnectionStatus {
        if let Some(status) = self.check_input(port, channel) {
            return status;
        }
        let key = (PortChannel { port, channel }, cc);
        let mut rows = self.cc_bindings.entry(key).or_default();
        let binding = CcBinding { processor, parameter, min, max, relative };
        if rows.iter().any(|b| b.processor == processor && b.parameter == parameter) {
            return ConnectionStatus::AlreadyConnected;
        }
        rows.push(binding);
        self.next_cc_learn_id.fetch_add(1, Ordering::Relaxed);
        ConnectionStatus::Ok
    }

    pub fn disconnect_cc_from_parameter(
        &self,
        port: u32,
        channel: MidiChannel,
        cc: u8,
        processor: u32,
        parameter: u32,
    ) -> ConnectionStatus {
        if let Some(status) = self.check_input(port, channel) {
            return status;
        }
        let key = (PortChannel { port, channel }, cc);
        match self.cc_bindings.get_mut(&key) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|b| !(b.processor == processor && b.parameter == parameter));
                if rows.len() == before {
                    ConnectionStatus::NotConnected
                } else {
                    ConnectionStatus::Ok
                }
            }
            None => ConnectionStatus::NotConnected,
        }
    }

    pub fn cc_bindings_for(&self, port: u32, channel: MidiChannel, cc: u8) -> Vec<CcBinding> {
        let mut out = Vec::new();
        if let Some(rows) = self.cc_bindings.get(&(PortChannel { port, channel: MidiChannel::Omni }, cc)) {
            out.extend(rows.iter().copied());
        }
        if channel != MidiChannel::Omni {
            if let Some(rows) = self.cc_bindings.get(&(PortChannel { port, channel }, cc)) {
                out.extend(rows.iter().copied());
            }
        }
        out
    }

    pub fn cc_bindings_for_processor(&self, processor: u32) -> Vec<CcBinding> {
        self.cc_bindings
            .iter()
            .flat_map(|entry| entry.value().iter().copied().collect::<Vec<_>>())
            .filter(|b| b.processor == processor)
            .collect()
    }

    // -- PC bindings ---------------------------------------------------------

    pub fn connect_pc_to_processor(&self, port: u32, channel: MidiChannel, processor: u32) -> ConnectionStatus {
        if let Some(status) = self.check_input(port, channel) {
            return status;
        }
        let key = PortChannel { port, channel };
        let mut rows = self.pc_bindings.entry(key).or_default();
        let binding = PcBinding { processor };
        if rows.contains(&binding) {
            return ConnectionStatus::AlreadyConnected;
        }
        rows.push(binding);
        ConnectionStatus::Ok
    }

    pub fn disconnect_pc_from_processor(&self, port: u32, channel: MidiChannel, processor: u32) -> ConnectionStatus {
        if let Some(status) = self.check_input(port, channel) {
            return status;
        }
        let key = PortChannel { port, channel };
        match self.pc_bindings.get_mut(&key) {
            Some(mut rows) => {
                let before = rows.len();
                rows.retain(|b| b.processor != processor);
                if rows.len() == before {
                    ConnectionStatus::NotConnected
                } else {
                    ConnectionStatus::Ok
                }
            }
            None => ConnectionStatus::NotConnected,
        }
    }

    pub fn pc_bindings_for(&self, port: u32, channel: MidiChannel) -> Vec<PcBinding> {
        let mut out = Vec::new();
        if let Some(rows) = self.pc_bindings.get(&PortChannel { port, channel: MidiChannel::Omni }) {
            out.extend(rows.iter().copied());
        }
        if channel != MidiChannel::Omni {
            if let Some(rows) = self.pc_bindings.get(&PortChannel { port, channel }) {
                out.extend(rows.iter().copied());
            }
        }
        out
    }

    // -- clock output flags ---------------------------------------------

    pub fn set_clock_output_enabled(&self, port: u32, enabled: bool) -> ConnectionStatus {
        match self.clock_enabled.get(&port) {
            Some(flag) => {
                flag.store(enabled, Ordering::Release);
                ConnectionStatus::Ok
            }
            None => ConnectionStatus::InvalidPort,
        }
    }

    pub fn is_clock_output_enabled(&self, port: u32) -> bool {
        self.clock_enabled.get(&port).map(|f| f.load(Ordering::Acquire)).unwrap_or(false)
    }

    pub fn clock_enabled_ports(&self) -> Vec<u32> {
        self.clock_enabled
            .iter()
            .filter(|entry| entry.value().load(Ordering::Acquire))
            .map(|entry| *entry.key())
            .collect()
    }

    // -- graph-update cascade --------------------------------------------

    /// Remove every routing row referencing `processor_or_track` (spec.md
    /// §4.E: "on processor/track deletion the dispatcher receives a
    /// graph-update notification and removes all rows referencing the
    /// deleted id").
    pub fn remove_all_routes_for(&self, id: u32) {
        for mut entry in self.kbd_receivers.iter_mut() {
            entry.value_mut().retain(|r| r.track != id);
        }
        self.kbd_senders.remove(&id);
        for mut entry in self.cc_bindings.iter_mut() {
            entry.value_mut().retain(|b| b.processor != id);
        }
        for mut entry in self.pc_bindings.iter_mut() {
            entry.value_mut().retain(|b| b.processor != id);
        }
    }

    pub fn disconnect_all_cc_from_processor(&self, processor: u32) -> usize {
        let mut removed = 0;
        for mut entry in self.cc_bindings.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|b| b.processor != processor);
            removed += before - entry.value().len();
        }
        removed
    }

    pub fn disconnect_all_pc_from_processor(&self, processor: u32) -> usize {
        let mut removed = 0;
        for mut entry in self.pc_bindings.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|b| b.processor != processor);
            removed += before - entry.value().len();
        }
        removed
    }

    // -- full enumeration (spec.md §4.G Midi: "enumeration of all four
    // connection kinds") --------------------------------------------------

    pub fn all_kbd_connections(&self) -> Vec<(u32, MidiChannel, KbdReceiver)> {
        self.kbd_receivers
            .iter()
            .flat_map(|entry| {
                let key = *entry.key();
                entry.value().iter().map(move |r| (key.port, key.channel, *r)).collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn all_kbd_output_connections(&self) -> Vec<(u32, KbdSender)> {
        self.kbd_senders
            .iter()
            .flat_map(|entry| {
                let track = *entry.key();
                entry.value().iter().map(move |s| (track, *s)).collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn all_cc_connections(&self) -> Vec<(u32, MidiChannel, u8, CcBinding)> {
        self.cc_bindings
            .iter()
            .flat_map(|entry| {
                let (key, cc) = *entry.key();
                entry.value().iter().map(move |b| (key.port, key.channel, cc, *b)).collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn all_pc_connections(&self) -> Vec<(u32, MidiChannel, PcBinding)> {
        self.pc_bindings
            .iter()
            .flat_map(|entry| {
                let key = *entry.key();
                entry.value().iter().map(move |b| (key.port, key.channel, *b)).collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_rejects_invalid_port_and_channel() {
        let t = RoutingTables::new(2, 2);
        assert_eq!(
            t.connect_kbd_to_track(5, MidiChannel::Channel(1), 0, false),
            ConnectionStatus::InvalidPort
        );
        assert_eq!(
            t.connect_kbd_to_track(0, MidiChannel::Channel(20), 0, false),
            ConnectionStatus::InvalidChannel
        );
    }

    #[test]
    fn duplicate_connect_reports_already_connected() {
        let t = RoutingTables::new(2, 2);
        assert_eq!(t.connect_kbd_to_track(0, MidiChannel::Channel(1), 1, false), ConnectionStatus::Ok);
        assert_eq!(
            t.connect_kbd_to_track(0, MidiChannel::Channel(1), 1, false),
            ConnectionStatus::AlreadyConnected
        );
    }

    #[test]
    fn disconnect_missing_reports_not_connected() {
        let t = RoutingTables::new(2, 2);
        assert_eq!(
            t.disconnect_kbd_from_track(0, MidiChannel::Channel(1), 1),
            ConnectionStatus::NotConnected
        );
    }

    #[test]
    fn omni_registration_widens_matching_across_channels() {
        let t = RoutingTables::new(1, 1);
        t.connect_cc_to_parameter(0, MidiChannel::Omni, 67, 1, 2, 0.0, 100.0, false);
        let hits = t.cc_bindings_for(0, MidiChannel::Channel(4), 67);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn deletion_cascade_removes_all_routing_rows() {
        let t = RoutingTables::new(1, 1);
        t.connect_kbd_to_track(0, MidiChannel::Channel(1), 7, false);
        t.connect_cc_to_parameter(0, MidiChannel::Channel(1), 1, 7, 0, 0.0, 1.0, false);
        t.connect_pc_to_processor(0, MidiChannel::Channel(1), 7);
        t.connect_track_to_kbd_output(7, 0, MidiChannel::Channel(1));

        t.remove_all_routes_for(7);

        assert!(t.kbd_receivers_for(0, MidiChannel::Channel(1)).is_empty());
        assert!(t.cc_bindings_for_processor(7).is_empty());
        assert!(t.pc_bindings_for(0, MidiChannel::Channel(1)).is_empty());
        assert!(t.kbd_senders_for_track(7).is_empty());
    }

    #[test]
    fn enumeration_lists_every_connected_row() {
        let t = RoutingTables::new(1, 1);
        t.connect_kbd_to_track(0, MidiChannel::Channel(1), 3, false);
        t.connect_track_to_kbd_output(3, 0, MidiChannel::Channel(2));
        t.connect_cc_to_parameter(0, MidiChannel::Channel(1), 67, 3, 0, 0.0, 1.0, false);
        t.connect_pc_to_processor(0, MidiChannel::Channel(1), 3);

        assert_eq!(t.all_kbd_connections().len(), 1);
        assert_eq!(t.all_kbd_output_connections().len(), 1);
        assert_eq!(t.all_cc_connections().len(), 1);
        assert_eq!(t.all_pc_connections().len(), 1);
    }

    #[test]
    fn clock_flags_default_disabled_and_toggle() {
        let t = RoutingTables::new(1, 2);
        assert!(!t.is_clock_output_enabled(0));
        assert_eq!(t.set_clock_output_enabled(0, true), ConnectionStatus::Ok);
        assert!(t.is_clock_output_enabled(0));
        assert_eq!(t.clock_enabled_ports(), vec![0]);
        assert_eq!(t.set_clock_output_enabled(9, true), ConnectionStatus::InvalidPort);
    }
}
