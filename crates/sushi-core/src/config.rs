//! Host configuration.

use crate::{Error, Result};

/// Configuration for the audio host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub sample_rate: f64,
    pub audio_block_size: usize,
    pub initial_tempo: f32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            audio_block_size: 64,
            initial_tempo: 120.0,
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000.0 || self.sample_rate > 384000.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.audio_block_size == 0 || self.audio_block_size > 8192 {
            return Err(Error::InvalidConfig(format!(
                "audio_block_size {} out of range (1-8192)",
                self.audio_block_size
            )));
        }
        if !(20.0..=999.0).contains(&self.initial_tempo) {
            return Err(Error::InvalidTempo(self.initial_tempo));
        }
        Ok(())
    }
}
