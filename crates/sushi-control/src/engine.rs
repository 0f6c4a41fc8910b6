//! Shared engine context: the state every sub-controller reads or posts
//! mutations against.
//!
//! Grounded on `tutti-core`'s manager structs (e.g.
//! `transport/manager.rs`'s `TransportManager`), which hold their shared
//! state as `Arc<Atomic*>`/`Arc<ArcSwap<_>>` fields directly rather than
//! behind one god-object lock. `Engine` follows the same shape: each piece
//! of state gets its own `Arc`, so a sub-controller clones only the handles
//! it needs and the RT thread never contends with the worker thread on
//! anything but the event queue itself.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use sushi_core::{BypassManager, HostConfig, IdGenerator, PerformanceTimer, ProcessorContainer, Transport};
use sushi_dispatch::{CompletionStatus, EventDispatcher, EventIdGenerator, EventPayload, Notification, NotificationRegistry, PosterId};
use sushi_midi::MidiDispatcher;

use crate::audio_routing::AudioRoutingTable;
use crate::controllers::osc::OscBackendSlot;
use sushi_session::BuildInfo;

/// Shared, cheaply-clonable handle to every piece of live engine state.
/// Sub-controllers hold an `Arc<Engine>` and never own state directly.
///
/// Structural mutations (spec.md §4.G AudioGraph/Midi/AudioRouting) are
/// pre-validated synchronously against the container under a brief read
/// lock, then applied by a `Lambda` event run later on the worker thread —
/// the container itself is mutated only there (spec.md §5). This keeps
/// every public method non-blocking while still letting it return a
/// meaningful `ControlStatus` (and, for creation calls, the allocated id)
/// immediately, the resolution this workspace takes for spec.md §9's
/// "no method may block" constraint.
pub struct Engine {
    pub container: Arc<RwLock<ProcessorContainer>>,
    pub transport: Arc<Transport>,
    pub timer: Arc<PerformanceTimer>,
    pub bypass: Arc<DashMap<u32, BypassManager>>,
    pub processor_state: Arc<DashMap<u32, Vec<u8>>>,
    /// Live normalized `[0,1]` parameter values, keyed by (processor, parameter).
    pub parameter_values: Arc<DashMap<(u32, u32), f32>>,
    /// Live string/data property values, keyed by (processor, property).
    pub property_values: Arc<DashMap<(u32, u32), String>>,
    /// Last MIDI Program Change received per processor, keyed by processor
    /// id (spec.md §4.E). Kept separate from `property_values` so program 0
    /// never collides with property id 0.
    pub program_values: Arc<DashMap<u32, u32>>,
    pub midi: Arc<MidiDispatcher>,
    pub audio_routing: Arc<AudioRoutingTable>,
    dispatcher: Arc<Mutex<EventDispatcher>>,
    pub ids: Arc<IdGenerator>,
    pub event_ids: Arc<EventIdGenerator>,
    pub notifications: Arc<RwLock<NotificationRegistry>>,
    pub osc: Arc<OscBackendSlot>,
    pub build_info: BuildInfo,
    pub config: HostConfig,
    pub input_audio_channels: usize,
    pub output_audio_channels: usize,
    pub rt_running: std::sync::atomic::AtomicBool,
    /// Engine-wide safety flags restored verbatim by session load (spec.md
    /// §4.J `EngineState`); grounded on the original's
    /// `enable_input_clip_detection`/`enable_output_clip_detection`/
    /// `enable_master_limiter` (`session_controller.cpp`).
    pub input_clip_detection: std::sync::atomic::AtomicBool,
    pub output_clip_detection: std::sync::atomic::AtomicBool,
    pub master_limiter: std::sync::atomic::AtomicBool,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: HostConfig,
        build_info: BuildInfo,
        num_midi_input_ports: u32,
        num_midi_output_ports: u32,
        input_audio_channels: usize,
        output_audio_channels: usize,
    ) -> Self {
        Self {
            container: Arc::new(RwLock::new(ProcessorContainer::new())),
            transport: Arc::new(Transport::new(config.sample_rate, config.initial_tempo)),
            timer: Arc::new(PerformanceTimer::new()),
            bypass: Arc::new(DashMap::new()),
            processor_state: Arc::new(DashMap::new()),
            parameter_values: Arc::new(DashMap::new()),
            property_values: Arc::new(DashMap::new()),
            program_values: Arc::new(DashMap::new()),
            midi: Arc::new(MidiDispatcher::new(num_midi_input_ports, num_midi_output_ports)),
            audio_routing: Arc::new(AudioRoutingTable::new()),
            dispatcher: Arc::new(Mutex::new(EventDispatcher::default())),
            ids: Arc::new(IdGenerator::new()),
            event_ids: Arc::new(EventIdGenerator::new()),
            notifications: Arc::new(RwLock::new(NotificationRegistry::new())),
            osc: Arc::new(OscBackendSlot::new()),
            build_info,
            config,
            input_audio_channels,
            output_audio_channels,
            rt_running: std::sync::atomic::AtomicBool::new(true),
            input_clip_detection: std::sync::atomic::AtomicBool::new(false),
            output_clip_detection: std::sync::atomic::AtomicBool::new(false),
            master_limiter: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Post `payload` through the dispatcher on behalf of the controller
    /// façade. Every sub-controller mutation funnels through here.
    pub fn post(&self, payload: EventPayload) -> sushi_dispatch::Result<()> {
        self.dispatcher.lock().post_event(sushi_dispatch::Event {
            id: self.event_ids.next_id(),
            poster: PosterId::Controller,
            timestamp: sushi_dispatch::Timestamp::Immediate,
            payload,
            completion: None,
        })
    }

    /// Post a structural mutation as a worker-thread lambda (spec.md §4.G:
    /// "all enqueue a lambda event").
    pub fn post_lambda(&self, lambda: impl FnOnce() + Send + 'static) -> sushi_dispatch::Result<()> {
        self.post(EventPayload::Lambda(Box::new(lambda)))
    }

    /// Publish a notification to every subscribed listener (spec.md §4.H).
    pub fn notify(&self, notification: Notification) {
        self.notifications.read().dispatch(&notification);
    }

    /// Route one raw MIDI message arriving on `port` into the dispatcher
    /// (spec.md §4.K: the MIDI input adapter's half of the external
    /// interface contract, alongside the OSC/RPC adapters named there).
    /// Returns the number of control-plane events posted.
    pub fn route_midi_input(&self, port: u32, bytes: &[u8]) -> sushi_dispatch::Result<usize> {
        self.midi.send_midi(&self.dispatcher.lock(), port, bytes)
    }

    /// Drain posted events: lambdas run inline, RT-class events stage onto
    /// the RT heap. Owned by the control worker thread in the running
    /// system; exposed here so tests can make a posted mutation observable.
    pub fn drain_worker(&self) -> usize {
        self.dispatcher.lock().drain_to_worker()
    }

    /// Apply RT-staged events ready at `current_sample` (owned by the RT
    /// thread in the running system).
    pub fn drain_rt(&self, current_sample: u64, apply: impl FnMut(&EventPayload) -> CompletionStatus) -> usize {
        self.dispatcher.lock().drain_rt(current_sample, apply)
    }

    /// Drain every RT-staged event ready at `current_sample`, applying it
    /// through [`Engine::apply_rt_payload`]. The real-time process callback
    /// calls this at the top of every audio block; DSP inner loops
    /// themselves remain out of scope (spec.md §1 Non-goals).
    pub fn drain_rt_default(&self, current_sample: u64) -> usize {
        let this = self;
        self.dispatcher.lock().drain_rt(current_sample, |payload| this.apply_rt_payload(payload))
    }

    /// The RT thread's single entry point for applying a staged event
    /// (spec.md §4.D/§4.B: transport and bypass state are written only
    /// here). Keyboard events carry no control-plane state of their own —
    /// they exist to be forwarded to DSP, which is out of scope.
    pub fn apply_rt_payload(&self, payload: &EventPayload) -> CompletionStatus {
        match payload {
            EventPayload::ParameterChange { processor, parameter, value } => {
                self.parameter_values.insert((*processor, *parameter), *value);
                self.notify(Notification::ParameterChange { processor: *processor, parameter: *parameter, value: *value });
                CompletionStatus::HandledOk
            }
            EventPayload::PropertyChange { processor, property, value } => {
                self.property_values.insert((*processor, *property), value.clone());
                self.notify(Notification::PropertyChange { processor: *processor, property: *property, value: value.clone() });
                CompletionStatus::HandledOk
            }
            EventPayload::ParameterDelta { processor, parameter, delta, min, max } => {
                let current = self.parameter_values.get(&(*processor, *parameter)).map(|v| *v).unwrap_or(*min);
                let value = (current + delta).clamp(*min, *max);
                self.parameter_values.insert((*processor, *parameter), value);
                self.notify(Notification::ParameterChange { processor: *processor, parameter: *parameter, value });
                CompletionStatus::HandledOk
            }
            EventPayload::SetBypass { processor, bypassed } => {
                self.bypass
                    .entry(*processor)
                    .or_insert_with(BypassManager::new)
                    .set_bypass(*bypassed, self.transport.sample_rate());
                CompletionStatus::HandledOk
            }
            EventPayload::ProgramChange { processor, program } => {
                self.program_values.insert(*processor, *program);
                self.notify(Notification::ProgramChange { processor: *processor, program: *program });
                CompletionStatus::HandledOk
            }
            EventPayload::TransportChange(change) => {
                self.apply_transport_change(*change);
                CompletionStatus::HandledOk
            }
            EventPayload::NoteOn { .. }
            | EventPayload::NoteOff { .. }
            | EventPayload::NoteAftertouch { .. }
            | EventPayload::Aftertouch { .. }
            | EventPayload::PitchBend { .. }
            | EventPayload::Modulation { .. } => CompletionStatus::HandledOk,
            EventPayload::Lambda(_) => CompletionStatus::UnrecognizedEvent,
        }
    }

    fn apply_transport_change(&self, change: sushi_dispatch::event::TransportChange) {
        use sushi_dispatch::event::TransportChange;
        match change {
            TransportChange::SetTempo(bpm) => self.transport.set_tempo(bpm),
            TransportChange::SetTimeSignature(sig) => self.transport.set_time_signature(sig),
            TransportChange::SetPlayingMode(mode) => self.transport.set_playing_mode(mode),
            TransportChange::SetSyncMode(mode) => self.transport.set_sync_mode(mode),
            TransportChange::SetOutputLatency(latency) => self.transport.set_output_latency(latency),
        }
        // Setting output latency is a local adapter concern, not part of the
        // transport state the façade exposes to listeners (spec.md §4.H).
        if !matches!(change, TransportChange::SetOutputLatency(_)) {
            self.notify(Notification::TransportUpdate);
        }
    }
}
