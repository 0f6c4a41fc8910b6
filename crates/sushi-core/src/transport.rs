//! Transport: tempo, time signature, playing/sync mode, sample clock.
//!
//! Single writer (the RT thread, applying events drained from the event
//! dispatcher), many readers (sub-controllers, the MIDI dispatcher's clock
//! generator). All fields are cache-line aligned atomics written with
//! `Release` and read with `Acquire` ordering, following
//! `tutti-core/src/transport/manager.rs`'s atomic snapshot discipline.

use std::sync::atomic::{AtomicU64, Ordering};

/// Transport playing state (spec.md §6 `PlayingMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayingMode {
    Stopped,
    Playing,
    Recording,
}

impl PlayingMode {
    fn to_u8(self) -> u8 {
        match self {
            PlayingMode::Stopped => 0,
            PlayingMode::Playing => 1,
            PlayingMode::Recording => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => PlayingMode::Playing,
            2 => PlayingMode::Recording,
            _ => PlayingMode::Stopped,
        }
    }
}

/// Transport synchronization source (spec.md §6 `SyncMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Internal,
    Midi,
    Gate,
    Link,
}

impl SyncMode {
    fn to_u8(self) -> u8 {
        match self {
            SyncMode::Internal => 0,
            SyncMode::Midi => 1,
            SyncMode::Gate => 2,
            SyncMode::Link => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => SyncMode::Midi,
            2 => SyncMode::Gate,
            3 => SyncMode::Link,
            _ => SyncMode::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Transport state, lock-free for readers.
pub struct Transport {
    sample_rate: f64,
    tempo_bits: AtomicU64,
    time_sig: AtomicU64,
    playing_mode: AtomicMode,
    sync_mode: AtomicMode,
    output_latency_bits: AtomicU64,
    sample_clock: AtomicU64,
}

/// A tiny u8 atomic with the same Acquire/Release discipline as the other
/// transport fields, used to store the `PlayingMode`/`SyncMode` tags.
struct AtomicMode {
    value: std::sync::atomic::AtomicU8,
}

impl AtomicMode {
    fn new(v: u8) -> Self {
        Self {
            value: std::sync::atomic::AtomicU8::new(v),
        }
    }
    fn get(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }
    fn set(&self, v: u8) {
        self.value.store(v, Ordering::Release)
    }
}

impl Transport {
    pub fn new(sample_rate: f64, initial_tempo: f32) -> Self {
        Self {
            sample_rate,
            tempo_bits: AtomicU64::new(initial_tempo.to_bits() as u64),
            time_sig: AtomicU64::new(pack_time_sig(TimeSignature::default())),
            playing_mode: AtomicMode::new(PlayingMode::Stopped.to_u8()),
            sync_mode: AtomicMode::new(SyncMode::Internal.to_u8()),
            output_latency_bits: AtomicU64::new(0.0f32.to_bits() as u64),
            sample_clock: AtomicU64::new(0),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn tempo(&self) -> f32 {
        f32::from_bits(self.tempo_bits.load(Ordering::Acquire) as u32)
    }

    /// Written only from the RT thread while applying a transport event.
    pub fn set_tempo(&self, bpm: f32) {
        self.tempo_bits.store(bpm.to_bits() as u64, Ordering::Release);
    }

    pub fn time_signature(&self) -> TimeSignature {
        unpack_time_sig(self.time_sig.load(Ordering::Acquire))
    }

    pub fn set_time_signature(&self, sig: TimeSignature) {
        self.time_sig.store(pack_time_sig(sig), Ordering::Release);
    }

    pub fn playing_mode(&self) -> PlayingMode {
        PlayingMode::from_u8(self.playing_mode.get())
    }

    pub fn set_playing_mode(&self, mode: PlayingMode) {
        self.playing_mode.set(mode.to_u8());
    }

    pub fn sync_mode(&self) -> SyncMode {
        SyncMode::from_u8(self.sync_mode.get())
    }

    pub fn set_sync_mode(&self, mode: SyncMode) {
        self.sync_mode.set(mode.to_u8());
    }

    pub fn output_latency(&self) -> f32 {
        f32::from_bits(self.output_latency_bits.load(Ordering::Acquire) as u32)
    }

    pub fn set_output_latency(&self, seconds: f32) {
        self.output_latency_bits.store(seconds.to_bits() as u64, Ordering::Release);
    }

    /// Advance the RT sample clock by one block. Called once per audio callback.
    pub fn advance_samples(&self, count: u64) -> u64 {
        self.sample_clock.fetch_add(count, Ordering::AcqRel) + count
    }

    pub fn sample_position(&self) -> u64 {
        self.sample_clock.load(Ordering::Acquire)
    }

    /// Beats-per-24-PPQN-pulse period, for MIDI clock generation: at `tempo`
    /// BPM a quarter note lasts `60/tempo` seconds, 24 pulses per quarter.
    pub fn midi_clock_period_seconds(&self) -> f64 {
        60.0 / (self.tempo() as f64 * 24.0)
    }
}

fn pack_time_sig(sig: TimeSignature) -> u64 {
    ((sig.numerator as u64) << 32) | (sig.denominator as u64)
}

fn unpack_time_sig(bits: u64) -> TimeSignature {
    TimeSignature {
        numerator: (bits >> 32) as u32,
        denominator: bits as u32,
    }
}
