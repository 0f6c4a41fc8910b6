//! Event payloads, ids and posters.

use std::sync::atomic::{AtomicU64, Ordering};

use sushi_core::{PlayingMode, SyncMode, TimeSignature};

/// Closed set of components allowed to post events (spec.md §4.D: "posters
/// register themselves by a unique poster_id (enumerated)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosterId {
    Controller,
    MidiDispatcher,
    OscFrontend,
    RpcFrontend,
    Test,
}

/// Monotonic event identifier, used to break timestamp ties.
pub type EventId = u64;

#[derive(Debug, Default)]
pub struct EventIdGenerator {
    next: AtomicU64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> EventId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// When an event should be applied on the RT timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Taken at the very next RT tick, regardless of the sample clock.
    Immediate,
    /// Held until the sample clock reaches this absolute sample position.
    At(u64),
}

/// Which worker drains and executes this event (spec.md §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Delivered to the RT thread via the lock-free SPSC queue, drained at
    /// the top of every audio block (parameter/program changes, keyboard
    /// events, set-bypass).
    RtInline,
    /// Executed on the control worker thread (structural graph mutations,
    /// session restore).
    Worker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiChannel {
    Channel(u8),
    Omni,
}

/// The payload of an event. `Lambda` carries an opaque closure rather than a
/// data variant, matching how structural graph mutations are posted by the
/// AudioGraph/Midi/AudioRouting sub-controllers (spec.md §4.G: "all enqueue
/// a lambda event").
pub enum EventPayload {
    ParameterChange {
        processor: u32,
        parameter: u32,
        value: f32,
    },
    PropertyChange {
        processor: u32,
        property: u32,
        value: String,
    },
    /// A relative-mode CC nudge (spec.md §4.E): `delta` is added to the
    /// parameter's live value and the result clamped to `[min, max]`,
    /// rather than replacing it outright as `ParameterChange` does. Kept
    /// distinct from `ParameterChange` because applying it requires
    /// reading the current value at execution time, which only the RT
    /// thread's parameter store can do.
    ParameterDelta {
        processor: u32,
        parameter: u32,
        delta: f32,
        min: f32,
        max: f32,
    },
    NoteOn {
        track: u32,
        channel: MidiChannel,
        note: u8,
        velocity: f32,
    },
    NoteOff {
        track: u32,
        channel: MidiChannel,
        note: u8,
        velocity: f32,
    },
    NoteAftertouch {
        track: u32,
        channel: MidiChannel,
        note: u8,
        value: f32,
    },
    Aftertouch {
        track: u32,
        channel: MidiChannel,
        value: f32,
    },
    PitchBend {
        track: u32,
        channel: MidiChannel,
        value: f32,
    },
    Modulation {
        track: u32,
        channel: MidiChannel,
        value: f32,
    },
    SetBypass {
        processor: u32,
        bypassed: bool,
    },
    /// A bound MIDI Program Change (spec.md §4.E), kept distinct from
    /// `PropertyChange` so program 0 cannot be confused with property id 0.
    ProgramChange {
        processor: u32,
        program: u32,
    },
    /// A transport state change, applied by the RT thread at the top of the
    /// next block (spec.md §4.B: transport is written only from the RT
    /// thread in response to dispatcher events).
    TransportChange(TransportChange),
    /// A structural mutation or any other worker-thread-only operation.
    Lambda(Box<dyn FnOnce() + Send>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportChange {
    SetTempo(f32),
    SetTimeSignature(TimeSignature),
    SetPlayingMode(PlayingMode),
    SetSyncMode(SyncMode),
    SetOutputLatency(f32),
}

impl std::fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventPayload::ParameterChange { processor, parameter, value } => f
                .debug_struct("ParameterChange")
                .field("processor", processor)
                .field("parameter", parameter)
                .field("value", value)
                .finish(),
            EventPayload::PropertyChange { processor, property, value } => f
                .debug_struct("PropertyChange")
                .field("processor", processor)
                .field("property", property)
                .field("value", value)
                .finish(),
            EventPayload::ParameterDelta { processor, parameter, delta, .. } => f
                .debug_struct("ParameterDelta")
                .field("processor", processor)
                .field("parameter", parameter)
                .field("delta", delta)
                .finish(),
            EventPayload::NoteOn { track, .. } => f.debug_struct("NoteOn").field("track", track).finish(),
            EventPayload::NoteOff { track, .. } => f.debug_struct("NoteOff").field("track", track).finish(),
            EventPayload::NoteAftertouch { track, .. } => {
                f.debug_struct("NoteAftertouch").field("track", track).finish()
            }
            EventPayload::Aftertouch { track, .. } => f.debug_struct("Aftertouch").field("track", track).finish(),
            EventPayload::PitchBend { track, .. } => f.debug_struct("PitchBend").field("track", track).finish(),
            EventPayload::Modulation { track, .. } => f.debug_struct("Modulation").field("track", track).finish(),
            EventPayload::SetBypass { processor, bypassed } => f
                .debug_struct("SetBypass")
                .field("processor", processor)
                .field("bypassed", bypassed)
                .finish(),
            EventPayload::ProgramChange { processor, program } => f
                .debug_struct("ProgramChange")
                .field("processor", processor)
                .field("program", program)
                .finish(),
            EventPayload::TransportChange(change) => {
                f.debug_tuple("TransportChange").field(change).finish()
            }
            EventPayload::Lambda(_) => f.debug_struct("Lambda").finish_non_exhaustive(),
        }
    }
}

impl EventPayload {
    /// The class this payload is always dispatched as (spec.md §4.D).
    pub fn class(&self) -> EventClass {
        match self {
            EventPayload::Lambda(_) => EventClass::Worker,
            _ => EventClass::RtInline,
        }
    }
}

/// Status delivered to a completion callback exactly once (spec.md §4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    HandledOk,
    NotHandled,
    Error,
    UnrecognizedEvent,
}

pub type CompletionCallback = Box<dyn FnOnce(CompletionStatus) + Send>;

/// A fully-addressed event in flight: id, poster, timestamp, payload and an
/// optional completion callback.
pub struct Event {
    pub id: EventId,
    pub poster: PosterId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
    pub completion: Option<CompletionCallback>,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("poster", &self.poster)
            .field("timestamp", &self.timestamp)
            .field("payload", &self.payload)
            .finish()
    }
}

impl Event {
    pub fn class(&self) -> EventClass {
        self.payload.class()
    }
}
