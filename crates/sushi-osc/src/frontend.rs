//! UDP OSC control frontend (spec.md §4.K): the concrete adapter the core
//! calls through [`sushi_control::controllers::osc::OscBackend`].
//!
//! Grounded on the real `OSCFrontend` (`control_frontends/osc_frontend.cpp`):
//! `connect_from_parameter` only ever records an outgoing address, it never
//! registers a receiving method — the receiving side (`connect_to_parameter`
//! there, folded into [`Self::register_processor_addresses`] here) is wired
//! automatically for every processor/parameter/track as they appear, driven
//! off the façade's graph notifications rather than a one-shot `connect_all`.

use std::collections::HashSet;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use rosc::{OscMessage, OscPacket, OscType};

use sushi_control::controllers::osc::OscBackend;
use sushi_control::wire;
use sushi_control::SushiController;
use sushi_dispatch::NotificationKind;
use sushi_session::OscState;

use crate::error::{Error, Result};
use crate::registry::{MethodBinding, MethodRegistry};

/// Replace spaces with underscores when building an OSC address (spec.md
/// §4.I "Spaces in names are replaced by underscores on registration").
fn spaces_to_underscore(s: &str) -> String {
    s.replace(' ', "_")
}

fn parameter_address(processor: &str, parameter: &str) -> String {
    format!("/parameter/{}/{}", spaces_to_underscore(processor), spaces_to_underscore(parameter))
}

fn property_address(processor: &str, property: &str) -> String {
    format!("/property/{}/{}", spaces_to_underscore(processor), spaces_to_underscore(property))
}

fn program_address(processor: &str) -> String {
    format!("/program/{}", spaces_to_underscore(processor))
}

fn bypass_address(processor: &str) -> String {
    format!("/bypass/{}", spaces_to_underscore(processor))
}

fn keyboard_address(track: &str) -> String {
    format!("/keyboard_event/{}", spaces_to_underscore(track))
}

/// The dynamic, per-entity part of the registry plus the UDP transport.
/// One instance is attached to a running engine through
/// [`sushi_control::controllers::osc::OscBackendSlot`].
pub struct OscFrontend {
    facade: Weak<SushiController>,
    socket: UdpSocket,
    send_addr: Mutex<SocketAddr>,
    receive_port: u16,
    registry: Mutex<MethodRegistry>,
    enabled_outputs: Mutex<HashSet<(u32, u32)>>,
    auto_enable: AtomicBool,
    running: AtomicBool,
}

impl OscFrontend {
    /// Bind the receive socket and register the fixed `/engine/...`
    /// addresses (spec.md §4.I), then auto-register every processor, track
    /// and property/parameter already present in the graph.
    pub fn new(facade: &Arc<SushiController>, receive_port: u16, send_ip: &str, send_port: u16) -> Result<Arc<Self>> {
        let socket = UdpSocket::bind(("0.0.0.0", receive_port)).map_err(|_| Error::BindFailed(receive_port))?;
        socket.set_read_timeout(Some(Duration::from_millis(100))).ok();
        let send_addr_string = format!("{send_ip}:{send_port}");
        let send_addr: SocketAddr =
            send_addr_string.parse().map_err(|_| Error::InvalidSendAddress(send_addr_string.clone()))?;

        let frontend = Arc::new(Self {
            facade: Arc::downgrade(facade),
            socket,
            send_addr: Mutex::new(send_addr),
            receive_port,
            registry: Mutex::new(Self::fixed_registry()),
            enabled_outputs: Mutex::new(HashSet::new()),
            auto_enable: AtomicBool::new(false),
            running: AtomicBool::new(false),
        });
        frontend.subscribe_to_graph_notifications(facade);
        frontend.connect_all(facade);
        Ok(frontend)
    }

    fn fixed_registry() -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        registry.add_method("/engine/set_tempo", "f", MethodBinding::EngineSetTempo);
        registry.add_method("/engine/set_time_signature", "ii", MethodBinding::EngineSetTimeSignature);
        registry.add_method("/engine/set_playing_mode", "s", MethodBinding::EngineSetPlayingMode);
        registry.add_method("/engine/set_sync_mode", "s", MethodBinding::EngineSetSyncMode);
        registry.add_method(
            "/engine/set_timing_statistics_enabled",
            "i",
            MethodBinding::EngineSetTimingStatisticsEnabled,
        );
        registry.add_method("/engine/reset_timing_statistics", "s", MethodBinding::EngineResetTimingStatistics);
        registry.add_method("/engine/reset_timing_statistics", "ss", MethodBinding::EngineResetTimingStatistics);
        registry
    }

    /// Register every address tied to `processor_id`: its float parameters,
    /// its properties, its program address and its bypass address.
    fn register_processor_addresses(&self, facade: &Arc<SushiController>, processor_id: u32) {
        let Some(info) = facade.audio_graph.get_processor_info(processor_id).1 else { return };
        let mut registry = self.registry.lock();
        registry.add_method(
            &program_address(&info.name),
            "i",
            MethodBinding::Program { processor: processor_id },
        );
        registry.add_method(
            &bypass_address(&info.name),
            "i",
            MethodBinding::Bypass { processor: processor_id },
        );
        let (_, parameters) = facade.parameter.get_processor_parameters(processor_id);
        for parameter in parameters.iter().filter(|p| p.parameter_type == wire::ParameterType::Float) {
            registry.add_method(
                &parameter_address(&info.name, &parameter.name),
                "f",
                MethodBinding::Parameter { processor: processor_id, parameter: parameter.id },
            );
        }
        let (_, properties) = facade.parameter.get_processor_properties(processor_id);
        for property in &properties {
            registry.add_method(
                &property_address(&info.name, &property.name),
                "s",
                MethodBinding::Property { processor: processor_id, property: property.id },
            );
        }
    }

    fn register_track_addresses(&self, facade: &Arc<SushiController>, track_id: u32) {
        let Some(info) = facade.audio_graph.get_track_info(track_id).1 else { return };
        let mut registry = self.registry.lock();
        registry.add_method(&keyboard_address(&info.name), "siif", MethodBinding::KeyboardEvent { track: track_id });
        registry.add_method(&keyboard_address(&info.name), "sif", MethodBinding::KeyboardEvent { track: track_id });
    }

    /// Register addresses for every processor/track already in the graph
    /// at construction time (spec.md §4.I's registry is otherwise only
    /// kept current by the notifications subscribed in
    /// [`Self::subscribe_to_graph_notifications`]).
    fn connect_all(&self, facade: &Arc<SushiController>) {
        for processor in facade.audio_graph.get_all_processors() {
            self.register_processor_addresses(facade, processor.id);
        }
        for track in facade.audio_graph.get_all_tracks() {
            self.register_track_addresses(facade, track.id);
        }
    }

    fn subscribe_to_graph_notifications(self: &Arc<Self>, facade: &Arc<SushiController>) {
        let weak = Arc::downgrade(self);
        let facade_weak = Arc::downgrade(facade);
        facade.subscribe_to_notifications(
            NotificationKind::ProcessorUpdate,
            Box::new(move |n| {
                let (Some(this), Some(facade)) = (weak.upgrade(), facade_weak.upgrade()) else { return };
                if let wire::Notification::ProcessorUpdate { processor, action } = n {
                    match action {
                        wire::ProcessorAction::Added => this.register_processor_addresses(&facade, *processor),
                        wire::ProcessorAction::Deleted => {
                            this.registry.lock().purge_processor(*processor);
                            this.enabled_outputs.lock().retain(|(p, _)| p != processor);
                        }
                    }
                }
            }),
        );

        let weak = Arc::downgrade(self);
        let facade_weak = Arc::downgrade(facade);
        facade.subscribe_to_notifications(
            NotificationKind::TrackUpdate,
            Box::new(move |n| {
                let (Some(this), Some(facade)) = (weak.upgrade(), facade_weak.upgrade()) else { return };
                if let wire::Notification::TrackUpdate { track, action } = n {
                    match action {
                        wire::TrackAction::Added => this.register_track_addresses(&facade, *track),
                        wire::TrackAction::Deleted => this.registry.lock().purge_track(*track),
                    }
                }
            }),
        );

        let weak = Arc::downgrade(self);
        facade.subscribe_to_notifications(
            NotificationKind::ParameterChange,
            Box::new(move |n| {
                let Some(this) = weak.upgrade() else { return };
                if let wire::Notification::ParameterChange { processor, parameter, value } = n {
                    this.send_parameter_change_if_enabled(*processor, *parameter, *value);
                }
            }),
        );
    }

    fn send_parameter_change_if_enabled(&self, processor: u32, parameter: u32, value: f32) {
        if !self.enabled_outputs.lock().contains(&(processor, parameter)) {
            return;
        }
        let Some(facade) = self.facade.upgrade() else { return };
        let Some(processor_info) = facade.audio_graph.get_processor_info(processor).1 else { return };
        let Some(parameter_info) = facade.parameter.get_parameter_info(processor, parameter).1 else { return };
        let address = parameter_address(&processor_info.name, &parameter_info.name);
        self.send_message(&address, vec![OscType::Float(value)]);
    }

    /// Send `/engine/input_clip_notification` (spec.md §4.I outgoing
    /// addresses). Clip detection itself happens in the RT audio callback,
    /// out of this crate's scope; an external adapter calls this directly.
    pub fn notify_input_clip(&self, channel: i32) {
        self.send_message("/engine/input_clip_notification", vec![OscType::Int(channel)]);
    }

    pub fn notify_output_clip(&self, channel: i32) {
        self.send_message("/engine/output_clip_notification", vec![OscType::Int(channel)]);
    }

    fn send_message(&self, address: &str, args: Vec<OscType>) {
        let packet = OscPacket::Message(OscMessage { addr: address.to_string(), args });
        let Ok(bytes) = rosc::encoder::encode(&packet) else {
            tracing::warn!(address, "failed to encode outgoing OSC message");
            return;
        };
        let addr = *self.send_addr.lock();
        if let Err(err) = self.socket.send_to(&bytes, addr) {
            tracing::warn!(address, %err, "failed to send OSC message");
        }
    }

    /// Start the receive loop on a background thread. Mirrors the
    /// original's `lo_server_thread_start`/`_stop` pair.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        self.running.store(true, Ordering::Release);
        let this = self.clone();
        std::thread::spawn(move || this.run())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn run(&self) {
        let mut buf = [0u8; 4096];
        while self.running.load(Ordering::Acquire) {
            let Ok((size, _from)) = self.socket.recv_from(&mut buf) else { continue };
            let Some(facade) = self.facade.upgrade() else { break };
            match rosc::decoder::decode_udp(&buf[..size]) {
                Ok((_, packet)) => self.dispatch_packet(&facade, &packet),
                Err(_) => tracing::debug!("dropped malformed OSC packet"),
            }
        }
    }

    fn dispatch_packet(&self, facade: &Arc<SushiController>, packet: &OscPacket) {
        match packet {
            OscPacket::Message(message) => self.dispatch_message(facade, message),
            OscPacket::Bundle(bundle) => {
                for nested in &bundle.content {
                    self.dispatch_packet(facade, nested);
                }
            }
        }
    }

    fn dispatch_message(&self, facade: &Arc<SushiController>, message: &OscMessage) {
        let tag = type_tag(&message.args);
        let binding = self.registry.lock().lookup(&message.addr, &tag).cloned();
        let Some(binding) = binding else {
            tracing::debug!(address = %message.addr, %tag, "no OSC handler registered");
            return;
        };
        apply_binding(facade, &binding, &message.args);
    }
}

fn type_tag(args: &[OscType]) -> String {
    args.iter()
        .map(|arg| match arg {
            OscType::Float(_) => 'f',
            OscType::Int(_) => 'i',
            OscType::String(_) => 's',
            _ => '?',
        })
        .collect()
}

fn as_f32(args: &[OscType], index: usize) -> Option<f32> {
    args.get(index).and_then(|a| a.clone().float())
}

fn as_i32(args: &[OscType], index: usize) -> Option<i32> {
    args.get(index).and_then(|a| a.clone().int())
}

fn as_str(args: &[OscType], index: usize) -> Option<String> {
    args.get(index).and_then(|a| a.clone().string())
}

/// Apply one dispatched OSC message against the sub-controllers (spec.md
/// §4.I's address table), converting wire-side tokens ("playing",
/// "ableton_link", ...) the way the façade converts everything else.
fn apply_binding(facade: &Arc<SushiController>, binding: &MethodBinding, args: &[OscType]) {
    match binding {
        MethodBinding::Parameter { processor, parameter } => {
            if let Some(value) = as_f32(args, 0) {
                facade.parameter.set_parameter_value(*processor, *parameter, value);
            }
        }
        MethodBinding::Property { processor, property } => {
            if let Some(value) = as_str(args, 0) {
                facade.parameter.set_property_value(*processor, *property, &value);
            }
        }
        MethodBinding::Program { processor } => {
            if let Some(value) = as_i32(args, 0) {
                facade.program.set_processor_program(*processor, value as u32);
            }
        }
        MethodBinding::Bypass { processor } => {
            if let Some(value) = as_i32(args, 0) {
                facade.audio_graph.set_processor_bypass_state(*processor, value != 0);
            }
        }
        MethodBinding::KeyboardEvent { track } => apply_keyboard_event(facade, *track, args),
        MethodBinding::EngineSetTempo => {
            if let Some(value) = as_f32(args, 0) {
                facade.transport.set_tempo(value);
            }
        }
        MethodBinding::EngineSetTimeSignature => {
            if let (Some(numerator), Some(denominator)) = (as_i32(args, 0), as_i32(args, 1)) {
                facade.transport.set_time_signature(wire::TimeSignature {
                    numerator: numerator as u32,
                    denominator: denominator as u32,
                });
            }
        }
        MethodBinding::EngineSetPlayingMode => {
            if let Some(mode) = as_str(args, 0).and_then(|s| playing_mode_from_token(&s)) {
                facade.transport.set_playing_mode(mode);
            }
        }
        MethodBinding::EngineSetSyncMode => {
            if let Some(mode) = as_str(args, 0).and_then(|s| sync_mode_from_token(&s)) {
                facade.transport.set_sync_mode(mode);
            }
        }
        MethodBinding::EngineSetTimingStatisticsEnabled => {
            if let Some(value) = as_i32(args, 0) {
                facade.timing.set_timing_statistics_enabled(value != 0);
            }
        }
        MethodBinding::EngineResetTimingStatistics => apply_reset_timing_statistics(facade, args),
    }
}

fn apply_keyboard_event(facade: &Arc<SushiController>, track: u32, args: &[OscType]) {
    let Some(event) = as_str(args, 0) else { return };
    let channel = wire::MidiChannel::Channel(as_i32(args, 1).unwrap_or(0) as u8);
    match args.len() {
        4 => {
            let Some(note) = as_i32(args, 2) else { return };
            let Some(value) = as_f32(args, 3) else { return };
            match event.as_str() {
                "note_on" => {
                    facade.keyboard.send_note_on(track, channel, note as u8, value);
                }
                "note_off" => {
                    facade.keyboard.send_note_off(track, channel, note as u8, value);
                }
                "note_aftertouch" => {
                    facade.keyboard.send_note_aftertouch(track, channel, note as u8, value);
                }
                "program_change" => {
                    facade.program.set_processor_program(track, note as u32);
                }
                other => tracing::debug!(event = other, "unrecognized keyboard event"),
            }
        }
        3 => {
            let Some(value) = as_f32(args, 2) else { return };
            match event.as_str() {
                "modulation" => {
                    facade.keyboard.send_modulation(track, channel, value);
                }
                "pitch_bend" => {
                    facade.keyboard.send_pitch_bend(track, channel, value);
                }
                "aftertouch" => {
                    facade.keyboard.send_aftertouch(track, channel, value);
                }
                other => tracing::debug!(event = other, "unrecognized keyboard event"),
            }
        }
        _ => {}
    }
}

fn apply_reset_timing_statistics(facade: &Arc<SushiController>, args: &[OscType]) {
    let Some(scope) = as_str(args, 0) else { return };
    match scope.as_str() {
        "all" => {
            facade.timing.reset_all_timings();
        }
        "track" => {
            if let Some(id) = as_str(args, 1).and_then(|s| s.parse().ok()) {
                facade.timing.reset_track_timings(id);
            }
        }
        "processor" => {
            if let Some(id) = as_str(args, 1).and_then(|s| s.parse().ok()) {
                facade.timing.reset_processor_timings(id);
            }
        }
        other => tracing::debug!(scope = other, "unrecognized reset_timing_statistics scope"),
    }
}

fn playing_mode_from_token(token: &str) -> Option<wire::PlayingMode> {
    match token {
        "playing" => Some(wire::PlayingMode::Playing),
        "stopped" => Some(wire::PlayingMode::Stopped),
        "recording" => Some(wire::PlayingMode::Recording),
        _ => None,
    }
}

fn sync_mode_from_token(token: &str) -> Option<wire::SyncMode> {
    match token {
        "internal" => Some(wire::SyncMode::Internal),
        "midi" => Some(wire::SyncMode::Midi),
        "gate" => Some(wire::SyncMode::Gate),
        "ableton_link" => Some(wire::SyncMode::Link),
        _ => None,
    }
}

impl OscBackend for OscFrontend {
    fn send_ip(&self) -> String {
        self.send_addr.lock().ip().to_string()
    }

    fn send_port(&self) -> u16 {
        self.send_addr.lock().port()
    }

    fn receive_port(&self) -> u16 {
        self.receive_port
    }

    fn get_enabled_parameter_outputs(&self) -> Vec<(u32, u32)> {
        self.enabled_outputs.lock().iter().copied().collect()
    }

    fn connect_from_parameter(&self, processor: &str, parameter: &str) -> bool {
        let Some(facade) = self.facade.upgrade() else { return false };
        let Some(processor_id) = facade.audio_graph.get_processor_id(processor).1 else { return false };
        let Some(parameter_id) = facade.parameter.get_parameter_id(processor_id, parameter).1 else { return false };
        self.enabled_outputs.lock().insert((processor_id, parameter_id));
        true
    }

    fn disconnect_from_parameter(&self, processor: &str, parameter: &str) -> bool {
        let Some(facade) = self.facade.upgrade() else { return false };
        let Some(processor_id) = facade.audio_graph.get_processor_id(processor).1 else { return false };
        let Some(parameter_id) = facade.parameter.get_parameter_id(processor_id, parameter).1 else { return false };
        self.enabled_outputs.lock().remove(&(processor_id, parameter_id))
    }

    fn connect_from_all_parameters(&self) {
        let Some(facade) = self.facade.upgrade() else { return };
        self.auto_enable.store(true, Ordering::Relaxed);
        let mut outputs = self.enabled_outputs.lock();
        for processor in facade.audio_graph.get_all_processors() {
            let (_, parameters) = facade.parameter.get_processor_parameters(processor.id);
            for parameter in parameters.into_iter().filter(|p| p.parameter_type == wire::ParameterType::Float) {
                outputs.insert((processor.id, parameter.id));
            }
        }
    }

    fn disconnect_from_all_parameters(&self) {
        self.auto_enable.store(false, Ordering::Relaxed);
        self.enabled_outputs.lock().clear();
    }

    fn save_state(&self) -> OscState {
        let Some(facade) = self.facade.upgrade() else { return OscState::default() };
        let enabled_outputs = self
            .enabled_outputs
            .lock()
            .iter()
            .filter_map(|&(processor_id, parameter_id)| {
                let processor_name = facade.audio_graph.get_processor_info(processor_id).1?.name;
                let parameter_name = facade.parameter.get_parameter_info(processor_id, parameter_id).1?.name;
                Some((processor_name, parameter_name))
            })
            .collect();
        OscState { enabled_outputs, auto_enable: self.auto_enable.load(Ordering::Relaxed) }
    }

    fn set_state(&self, state: &OscState) {
        self.disconnect_from_all_parameters();
        for (processor, parameter) in &state.enabled_outputs {
            self.connect_from_parameter(processor, parameter);
        }
        if state.auto_enable {
            self.connect_from_all_parameters();
        }
        self.auto_enable.store(state.auto_enable, Ordering::Relaxed);
    }
}
