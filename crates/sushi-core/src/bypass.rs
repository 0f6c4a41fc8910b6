//! Bypass manager: click-free bypass/un-bypass via a linear crossfade ramp.
//!
//! Grounded on `tutti-core/src/lockfree.rs`'s atomic style applied to the
//! ramp state machine spec.md §4.F describes: a bypass toggle takes effect
//! over a `RAMP_SECONDS`-long window of audio rather than instantaneously,
//! to avoid a discontinuity in the output signal.

use crate::lockfree::{AtomicFlag, AtomicFloat};

/// Length of the bypass crossfade ramp, in seconds. Spec.md §4.F mandates a
/// "component-chosen duration (30-100 ms)"; 50 ms sits in the middle of that
/// window.
pub const RAMP_SECONDS: f64 = 0.05;

/// Default ramp length in samples, used only until the first `set_bypass`
/// call supplies a real sample rate to derive it from.
const DEFAULT_RAMP_SAMPLES: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RampDirection {
    ToBypassed,
    ToActive,
}

/// Tracks one processor's bypass state and any in-flight crossfade.
pub struct BypassManager {
    bypassed: AtomicFlag,
    ramping: AtomicFlag,
    /// Ramp position in `[0, ramp_len_samples]`, stored as a float for
    /// simplicity.
    ramp_position: AtomicFloat,
    /// Length of the ramp currently armed, in samples; derived from the
    /// sample rate passed to the most recent `set_bypass` call that started
    /// a new ramp (spec.md §4.F: `set_bypass(target, sample_rate)`).
    ramp_len_samples: AtomicFloat,
    direction: AtomicFlag,
}

impl Default for BypassManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BypassManager {
    pub fn new() -> Self {
        Self {
            bypassed: AtomicFlag::new(false),
            ramping: AtomicFlag::new(false),
            ramp_position: AtomicFloat::new(0.0),
            ramp_len_samples: AtomicFloat::new(DEFAULT_RAMP_SAMPLES),
            // false == ToBypassed, true == ToActive; arbitrary encoding, never read before `ramping`.
            direction: AtomicFlag::new(false),
        }
    }

    fn direction(&self) -> RampDirection {
        if self.direction.get() {
            RampDirection::ToActive
        } else {
            RampDirection::ToBypassed
        }
    }

    /// Request the target bypass state at `sample_rate`, starting a
    /// crossfade of `RAMP_SECONDS` (spec.md §4.F: 30-100 ms) if it differs
    /// from the current settled state and no ramp is already moving that way.
    pub fn set_bypass(&self, bypass: bool, sample_rate: f64) {
        if self.bypassed.get() == bypass && !self.ramping.get() {
            return;
        }
        let target_direction = if bypass {
            RampDirection::ToBypassed
        } else {
            RampDirection::ToActive
        };
        if self.ramping.get() && self.direction() == target_direction {
            return;
        }
        self.ramp_len_samples.set(((sample_rate * RAMP_SECONDS) as f32).max(1.0));
        self.direction.set(matches!(target_direction, RampDirection::ToActive));
        self.ramping.set(true);
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed.get()
    }

    /// The bypass state as last requested via `set_bypass`, regardless of
    /// whether a crossfade to that state has settled yet. This is what gets
    /// reported externally (spec.md §4.F): "the bypass state visible
    /// externally reflects the target, not the in-progress ramp."
    pub fn target_bypassed(&self) -> bool {
        if self.ramping.get() {
            self.direction() == RampDirection::ToBypassed
        } else {
            self.bypassed.get()
        }
    }

    pub fn should_ramp(&self) -> bool {
        self.ramping.get()
    }

    /// Whether the track's own processing should run this block. A track
    /// that is fully bypassed and settled skips processing entirely; one
    /// that is mid-ramp must still process so its output can be crossfaded.
    pub fn should_process(&self) -> bool {
        !self.bypassed.get() || self.ramping.get()
    }

    /// Advance the ramp by one sample and return the crossfade gain to apply
    /// to the processed (wet) signal for that sample; `1.0 - gain` is applied
    /// to the dry passthrough. Settles and flips `bypassed` when complete.
    pub fn crossfade_gain(&self) -> f32 {
        if !self.ramping.get() {
            return if self.bypassed.get() { 0.0 } else { 1.0 };
        }
        let pos = self.ramp_position.get();
        let step = 1.0 / self.ramp_len_samples.get();
        let next = pos + step;
        if next >= 1.0 {
            self.ramping.set(false);
            self.ramp_position.set(0.0);
            let became_active = self.direction() == RampDirection::ToActive;
            self.bypassed.set(!became_active);
            return if became_active { 1.0 } else { 0.0 };
        }
        self.ramp_position.set(next);
        match self.direction() {
            RampDirection::ToActive => next,
            RampDirection::ToBypassed => 1.0 - next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Chosen so `RAMP_SECONDS * TEST_SAMPLE_RATE` (0.05 * 1000) is exactly
    // 50 samples, keeping the loop counts below exact.
    const TEST_SAMPLE_RATE: f64 = 1000.0;
    const TEST_RAMP_SAMPLES: usize = 50;

    #[test]
    fn starts_active_and_unbypassed() {
        let b = BypassManager::new();
        assert!(!b.is_bypassed());
        assert!(b.should_process());
        assert_eq!(b.crossfade_gain(), 1.0);
    }

    #[test]
    fn set_bypass_arms_a_ramp_within_the_spec_mandated_window() {
        let b = BypassManager::new();
        b.set_bypass(true, 48000.0);
        // 30-100ms at 48kHz is 1440-4800 samples.
        assert_eq!(b.ramp_len_samples.get(), (48000.0 * RAMP_SECONDS) as f32);
        assert!((1440.0..=4800.0).contains(&b.ramp_len_samples.get()));
    }

    #[test]
    fn bypass_ramps_gain_down_to_zero() {
        let b = BypassManager::new();
        b.set_bypass(true, TEST_SAMPLE_RATE);
        assert!(b.should_ramp());
        assert!(b.should_process());

        let mut last_gain = 1.0;
        for _ in 0..TEST_RAMP_SAMPLES {
            let g = b.crossfade_gain();
            assert!(g <= last_gain + 1e-6);
            last_gain = g;
        }
        assert!(b.is_bypassed());
        assert!(!b.should_ramp());
        assert!(!b.should_process());
    }

    #[test]
    fn unbypass_ramps_gain_up_to_one() {
        let b = BypassManager::new();
        b.set_bypass(true, TEST_SAMPLE_RATE);
        for _ in 0..TEST_RAMP_SAMPLES {
            b.crossfade_gain();
        }
        assert!(b.is_bypassed());

        b.set_bypass(false, TEST_SAMPLE_RATE);
        assert!(b.should_ramp());
        for _ in 0..TEST_RAMP_SAMPLES {
            b.crossfade_gain();
        }
        assert!(!b.is_bypassed());
        assert_eq!(b.crossfade_gain(), 1.0);
    }

    #[test]
    fn redundant_set_bypass_is_a_no_op() {
        let b = BypassManager::new();
        b.set_bypass(false, TEST_SAMPLE_RATE);
        assert!(!b.should_ramp());
    }

    #[test]
    fn reversing_direction_mid_ramp_is_honored() {
        let b = BypassManager::new();
        b.set_bypass(true, TEST_SAMPLE_RATE);
        b.crossfade_gain();
        b.crossfade_gain();
        // Change our mind before the ramp settles.
        b.set_bypass(false, TEST_SAMPLE_RATE);
        for _ in 0..TEST_RAMP_SAMPLES {
            b.crossfade_gain();
        }
        assert!(!b.is_bypassed());
    }
}
