//! MIDI dispatcher: ties the routing tables, codec and clock generator
//! together into the input/output paths of spec.md §4.E.

use sushi_dispatch::event::{Event, EventIdGenerator, EventPayload, MidiChannel as EvChannel, PosterId, Timestamp};
use sushi_dispatch::{EventDispatcher, Result as DispatchResult};

use crate::clock::ClockGenerator;
use crate::codec::{self, DecodedMessage, MIDI_CLOCK_BYTE};
use crate::routing::RoutingTables;
use crate::status::ConnectionStatus;

/// Convert a relative-mode 7-bit CC value into a signed delta using the
/// standard two's-complement-around-64 convention (spec.md §4.E).
pub fn relative_cc_delta(value: u8) -> i8 {
    value as i8 - 64
}

/// Map an absolute 7-bit CC value linearly onto `[min, max]`.
pub fn absolute_cc_value(value: u8, min: f32, max: f32) -> f32 {
    min + (value as f32 / 127.0) * (max - min)
}

fn to_ev_channel(channel_1_based: u8) -> EvChannel {
    EvChannel::Channel(channel_1_based)
}

/// Owns the routing tables and clock generator; wraps the event dispatcher
/// to post decoded MIDI as control-plane events and emit outgoing MIDI for
/// parameter/keyboard notifications.
pub struct MidiDispatcher {
    pub routing: RoutingTables,
    clock: ClockGenerator,
    event_ids: EventIdGenerator,
}

impl MidiDispatcher {
    pub fn new(num_input_ports: u32, num_output_ports: u32) -> Self {
        Self {
            routing: RoutingTables::new(num_input_ports, num_output_ports),
            clock: ClockGenerator::new(),
            event_ids: EventIdGenerator::new(),
        }
    }

    /// Decode `bytes` arriving on `port` and post the resulting control-plane
    /// event(s). Returns the number of events posted (0 for unrouted input).
    pub fn send_midi(&self, dispatcher: &EventDispatcher, port: u32, bytes: &[u8]) -> DispatchResult<usize> {
        let decoded = match codec::decode(bytes) {
            Ok(d) => d,
            Err(_) => return Ok(0),
        };
        let mut posted = 0;
        match decoded {
            DecodedMessage::ControlChange { channel, controller, value } => {
                for binding in self.routing.cc_bindings_for(port, to_ev_channel(channel), controller) {
                    if binding.relative {
                        let delta = relative_cc_delta(value) as f32 / 64.0 * (binding.max - binding.min);
                        dispatcher.post_event(Event {
                            id: self.event_ids.next_id(),
                            poster: PosterId::MidiDispatcher,
                            timestamp: Timestamp::Immediate,
                            payload: EventPayload::ParameterDelta {
                                processor: binding.processor,
                                parameter: binding.parameter,
                                delta,
                                min: binding.min,
                                max: binding.max,
                            },
                            completion: None,
                        })?;
                    } else {
                        let new_value = absolute_cc_value(value, binding.min, binding.max);
                        self.post_parameter_change(dispatcher, binding.processor, binding.parameter, new_value)?;
                    }
                    posted += 1;
                }
            }
            DecodedMessage::ProgramChange { channel, program } => {
                for binding in self.routing.pc_bindings_for(port, to_ev_channel(channel)) {
                    dispatcher.post_event(Event {
                        id: self.event_ids.next_id(),
                        poster: PosterId::MidiDispatcher,
                        timestamp: Timestamp::Immediate,
                        payload: EventPayload::ProgramChange {
                            processor: binding.processor,
                            program: program as u32,
                        },
                        completion: None,
                    })?;
                    posted += 1;
                }
            }
            DecodedMessage::NoteOn { channel, note, velocity } => {
                posted += self.route_kbd(dispatcher, port, channel, |track, ev_channel| EventPayload::NoteOn {
                    track,
                    channel: ev_channel,
                    note,
                    velocity: velocity as f32 / 127.0,
                })?;
            }
            DecodedMessage::NoteOff { channel, note, velocity } => {
                posted += self.route_kbd(dispatcher, port, channel, |track, ev_channel| EventPayload::NoteOff {
                    track,
                    channel: ev_channel,
                    note,
                    velocity: velocity as f32 / 127.0,
                })?;
            }
            DecodedMessage::PolyAftertouch { channel, note, value } => {
                posted += self.route_kbd(dispatcher, port, channel, |track, ev_channel| EventPayload::NoteAftertouch {
                    track,
                    channel: ev_channel,
                    note,
                    value: value as f32 / 127.0,
                })?;
            }
            DecodedMessage::ChannelAftertouch { channel, value } => {
                posted += self.route_kbd(dispatcher, port, channel, |track, ev_channel| EventPayload::Aftertouch {
                    track,
                    channel: ev_channel,
                    value: value as f32 / 127.0,
                })?;
            }
            DecodedMessage::PitchBend { channel, value } => {
                posted += self.route_kbd(dispatcher, port, channel, |track, ev_channel| EventPayload::PitchBend {
                    track,
                    channel: ev_channel,
                    value: (value as f32 - 8192.0) / 8192.0,
                })?;
            }
        }
        Ok(posted)
    }

    fn route_kbd(
        &self,
        dispatcher: &EventDispatcher,
        port: u32,
        channel: u8,
        make_payload: impl Fn(u32, EvChannel) -> EventPayload,
    ) -> DispatchResult<usize> {
        let mut posted = 0;
        for receiver in self.routing.kbd_receivers_for(port, to_ev_channel(channel)) {
            let payload = make_payload(receiver.track, to_ev_channel(channel));
            dispatcher.post_event(Event {
                id: self.event_ids.next_id(),
                poster: PosterId::MidiDispatcher,
                timestamp: Timestamp::Immediate,
                payload,
                completion: None,
            })?;
            posted += 1;
        }
        Ok(posted)
    }

    fn post_parameter_change(
        &self,
        dispatcher: &EventDispatcher,
        processor: u32,
        parameter: u32,
        value: f32,
    ) -> DispatchResult<()> {
        dispatcher.post_event(Event {
            id: self.event_ids.next_id(),
            poster: PosterId::MidiDispatcher,
            timestamp: Timestamp::Immediate,
            payload: EventPayload::ParameterChange { processor, parameter, value },
            completion: None,
        })
    }

    /// Output path: given parameter-change/keyboard notifications already
    /// demultiplexed by the caller (the controller façade), find matching
    /// sender rows for `track` and return the encoded MIDI bytes to send.
    pub fn encode_kbd_note_on(&self, track: u32, note: u8, velocity: u8) -> Vec<(u32, Vec<u8>)> {
        self.routing
            .kbd_senders_for_track(track)
            .into_iter()
            .filter_map(|sender| match sender.channel {
                EvChannel::Channel(ch) => Some((sender.port, codec::encode_note_on(ch, note, velocity).to_vec())),
                EvChannel::Omni => None,
            })
            .collect()
    }

    /// Advance the MIDI clock for a block ending at `block_end_sample`,
    /// returning `(port, bytes)` pairs to emit for every port with clock
    /// output enabled (spec.md §4.E clock gating).
    pub fn tick_clock(&self, transport: &sushi_core::Transport, block_end_sample: u64) -> Vec<(u32, Vec<u8>)> {
        let pulses = self.clock.pulses_due(transport, block_end_sample);
        if pulses == 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        for port in self.routing.clock_enabled_ports() {
            for _ in 0..pulses {
                out.push((port, vec![MIDI_CLOCK_BYTE]));
            }
        }
        out
    }

    pub fn connection_status_ok(status: ConnectionStatus) -> bool {
        status == ConnectionStatus::Ok
    }
}
