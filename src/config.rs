//! Frontend-supplied startup options (spec.md §1 Non-goals: "no file-format
//! or CLI parsing work"). Plain data only — parsing a config file or
//! argv into this struct is left to the embedding application.

use sushi_core::HostConfig;

/// Everything a caller supplies when standing up a [`crate::Sushi`]
/// instance, beyond the [`HostConfig`] the core already owns.
#[derive(Debug, Clone)]
pub struct EngineArgs {
    pub host_config: HostConfig,
    pub input_audio_channels: usize,
    pub output_audio_channels: usize,
    pub num_midi_input_ports: u32,
    pub num_midi_output_ports: u32,
    pub osc: Option<OscArgs>,
}

/// OSC frontend startup options (spec.md §4.K). Omit to build a [`Sushi`]
/// with no OSC frontend attached — `engine.osc` then reports
/// `ControlStatus::UnsupportedOperation` for every query, per
/// [`sushi_control::controllers::osc::OscBackendSlot`]'s documented
/// behavior when nothing is attached.
///
/// [`Sushi`]: crate::Sushi
#[derive(Debug, Clone)]
pub struct OscArgs {
    pub receive_port: u16,
    pub send_ip: String,
    pub send_port: u16,
}

impl Default for EngineArgs {
    fn default() -> Self {
        Self {
            host_config: HostConfig::default(),
            input_audio_channels: 8,
            output_audio_channels: 8,
            num_midi_input_ports: 1,
            num_midi_output_ports: 1,
            osc: None,
        }
    }
}
