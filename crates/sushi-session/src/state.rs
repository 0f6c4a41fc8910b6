//! The session state tree (spec.md §4.J, wire shapes in §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildInfo {
    pub version: String,
    pub build_options: Vec<String>,
    pub build_date: String,
    pub commit_hash: String,
    pub audio_block_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OscState {
    /// `(processor_name, parameter_name)` pairs with output enabled.
    pub enabled_outputs: Vec<(String, String)>,
    pub auto_enable: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WireMidiChannel {
    Channel(u8),
    Omni,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KbdConnection {
    pub port: u32,
    pub channel: WireMidiChannel,
    pub track: u32,
    pub raw: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KbdOutputConnection {
    pub track: u32,
    pub port: u32,
    pub channel: WireMidiChannel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CcConnection {
    pub port: u32,
    pub channel: WireMidiChannel,
    pub cc: u8,
    pub processor: u32,
    pub parameter: u32,
    pub min: f32,
    pub max: f32,
    pub relative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PcConnection {
    pub port: u32,
    pub channel: WireMidiChannel,
    pub processor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MidiState {
    pub input_port_count: u32,
    pub output_port_count: u32,
    pub kbd_connections: Vec<KbdConnection>,
    pub kbd_output_connections: Vec<KbdOutputConnection>,
    pub cc_connections: Vec<CcConnection>,
    pub pc_connections: Vec<PcConnection>,
    pub clock_enabled_ports: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConnection {
    pub engine_channel: usize,
    pub track: u32,
    pub track_channel: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WirePlayingMode {
    Stopped,
    Playing,
    Recording,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WireSyncMode {
    Internal,
    Midi,
    Gate,
    Link,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireTimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineState {
    pub sample_rate: f64,
    pub tempo: f32,
    pub playing_mode: WirePlayingMode,
    pub sync_mode: WireSyncMode,
    pub time_signature: WireTimeSignature,
    pub input_clip_detection: bool,
    pub output_clip_detection: bool,
    pub master_limiter: bool,
    pub min_input_channels: usize,
    pub min_output_channels: usize,
    pub audio_input_connections: Vec<AudioConnection>,
    pub audio_output_connections: Vec<AudioConnection>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WirePluginType {
    Internal,
    Vst2x,
    Vst3x,
    Lv2,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginClass {
    /// The processor id at save time. Restore uses this to translate saved
    /// routing rows (which reference the old id) onto the fresh id the
    /// processor is recreated with; it has no meaning once restored.
    pub id: u32,
    pub name: String,
    pub label: String,
    pub uid: String,
    pub path: String,
    pub plugin_type: WirePluginType,
    /// Opaque per-processor state, as returned by `get_processor_state`.
    pub state: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WireTrackType {
    Regular,
    Pre,
    Post,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackState {
    /// The track id at save time, for the same reason as [`PluginClass::id`].
    pub id: u32,
    pub name: String,
    pub label: String,
    pub channels: usize,
    pub buses: usize,
    pub track_type: WireTrackType,
    pub state: Vec<u8>,
    pub plugins: Vec<PluginClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub save_date: String,
    pub sushi_info: BuildInfo,
    pub osc_state: OscState,
    pub midi_state: MidiState,
    pub engine_state: EngineState,
    pub tracks: Vec<TrackState>,
}

impl SessionState {
    /// Total channel count required by the engine state's live connections,
    /// used for pre-flight validation against the running engine.
    pub fn required_channels(&self) -> (usize, usize) {
        (self.engine_state.min_input_channels, self.engine_state.min_output_channels)
    }

    pub fn required_midi_ports(&self) -> (u32, u32) {
        (self.midi_state.input_port_count, self.midi_state.output_port_count)
    }
}
