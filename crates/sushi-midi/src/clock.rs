//! MIDI beat clock generation at 24 PPQN (spec.md §4.E output path).

use sushi_core::{AtomicDouble, Transport};

/// Tracks how many clock pulses have been emitted so far, so the generator
/// can be driven once per audio block without drifting. Schedule state
/// lives in an [`AtomicDouble`] rather than a plain `f64`, the same
/// single-writer/many-reader discipline `sushi-core::Transport` uses, so
/// `MidiDispatcher` (held as `Arc<MidiDispatcher>` by every sub-controller)
/// can drive this from the RT thread through a shared reference.
pub struct ClockGenerator {
    next_pulse_sample: AtomicDouble,
}

impl Default for ClockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockGenerator {
    pub fn new() -> Self {
        Self { next_pulse_sample: AtomicDouble::new(0.0) }
    }

    /// Given the transport's current tempo and sample rate, return how many
    /// clock pulses are due between the last call and `block_end_sample`,
    /// advancing the internal schedule. 24 pulses per quarter note.
    pub fn pulses_due(&self, transport: &Transport, block_end_sample: u64) -> u32 {
        let samples_per_pulse = transport.sample_rate() / (transport.tempo() as f64 / 60.0 * 24.0);
        if samples_per_pulse <= 0.0 || !samples_per_pulse.is_finite() {
            return 0;
        }
        let mut next = self.next_pulse_sample.get();
        let mut count = 0;
        // Half-open interval: a pulse due exactly at `block_end_sample`
        // belongs to the next block, so a pulse scheduled every
        // `samples_per_pulse` samples yields exactly one quarter note's worth
        // of pulses (24) over a quarter note's worth of samples, not 25.
        while next < block_end_sample as f64 {
            count += 1;
            next += samples_per_pulse;
        }
        self.next_pulse_sample.set(next);
        count
    }

    pub fn reset(&self) {
        self.next_pulse_sample.set(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sushi_core::Transport;

    #[test]
    fn emits_24_pulses_per_quarter_note_at_120_bpm() {
        let transport = Transport::new(48000.0, 120.0);
        let clock = ClockGenerator::new();
        // One quarter note at 120 BPM = 0.5s = 24000 samples at 48kHz.
        let pulses = clock.pulses_due(&transport, 24000);
        assert_eq!(pulses, 24);
    }

    #[test]
    fn no_pulses_for_zero_length_block() {
        let transport = Transport::new(48000.0, 120.0);
        let clock = ClockGenerator::new();
        let first = clock.pulses_due(&transport, 0);
        // Half-open interval: the pulse scheduled at sample 0 belongs to the
        // first non-empty block, not to a block that ends at sample 0.
        assert_eq!(first, 0);
    }
}
