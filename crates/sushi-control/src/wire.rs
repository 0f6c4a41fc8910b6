//! Wire-stable external shapes (spec.md §6). The façade is the only
//! component allowed to convert between these and `sushi-core`'s internal
//! enums.

pub use sushi_dispatch::notification::GraphAction as ProcessorAction;
pub use sushi_dispatch::notification::GraphAction as TrackAction;
pub use sushi_dispatch::notification::NotificationKind as NotificationType;
pub use sushi_session::{WirePlayingMode as PlayingMode, WirePluginType as PluginType};
pub use sushi_session::{WireSyncMode as SyncMode, WireTimeSignature as TimeSignature};
pub use sushi_session::{WireTrackType as TrackType, WireMidiChannel as MidiChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Bool,
    Int,
    Float,
    StringProperty,
    DataProperty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub id: u32,
    pub parameter_type: ParameterType,
    pub label: String,
    pub name: String,
    pub unit: String,
    pub automatable: bool,
    pub min_domain: f32,
    pub max_domain: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub id: u32,
    pub label: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInfo {
    pub id: u32,
    pub name: String,
}

impl From<&sushi_core::ParameterDescriptor> for ParameterInfo {
    fn from(d: &sushi_core::ParameterDescriptor) -> Self {
        Self {
            id: d.id,
            parameter_type: d.parameter_type.into(),
            label: d.label.clone(),
            name: d.name.clone(),
            unit: d.unit.clone(),
            automatable: d.automatable,
            min_domain: d.min_domain,
            max_domain: d.max_domain,
        }
    }
}

impl From<&sushi_core::ParameterDescriptor> for PropertyInfo {
    fn from(d: &sushi_core::ParameterDescriptor) -> Self {
        Self { id: d.id, label: d.label.clone(), name: d.name.clone() }
    }
}

impl From<&sushi_core::Program> for ProgramInfo {
    fn from(p: &sushi_core::Program) -> Self {
        Self { id: p.id, name: p.name.clone() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorInfo {
    pub id: u32,
    pub label: String,
    pub name: String,
    pub parameter_count: usize,
    pub program_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub id: u32,
    pub label: String,
    pub name: String,
    pub channels: usize,
    pub buses: usize,
    pub track_type: TrackType,
    pub processors: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuTimings {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl From<&sushi_core::Processor> for ProcessorInfo {
    fn from(processor: &sushi_core::Processor) -> Self {
        Self {
            id: processor.id,
            label: processor.label.clone(),
            name: processor.name.clone(),
            parameter_count: processor.parameter_count(),
            program_count: processor.program_count(),
        }
    }
}

impl TrackInfo {
    pub fn from_track(track: &sushi_core::Track) -> Self {
        Self {
            id: track.id(),
            label: track.processor.label.clone(),
            name: track.processor.name.clone(),
            channels: track.kind.channels(),
            buses: track.kind.buses(),
            track_type: track_kind_to_wire(&track.kind),
            processors: track.chain.clone(),
        }
    }
}

impl From<sushi_core::TimingStats> for CpuTimings {
    fn from(stats: sushi_core::TimingStats) -> Self {
        Self { avg: stats.avg_ns, min: stats.min_ns, max: stats.max_ns }
    }
}

impl From<sushi_core::ParameterType> for ParameterType {
    fn from(t: sushi_core::ParameterType) -> Self {
        match t {
            sushi_core::ParameterType::Bool => ParameterType::Bool,
            sushi_core::ParameterType::Int => ParameterType::Int,
            sushi_core::ParameterType::Float => ParameterType::Float,
            sushi_core::ParameterType::StringProperty => ParameterType::StringProperty,
            sushi_core::ParameterType::DataProperty => ParameterType::DataProperty,
        }
    }
}

pub fn playing_mode_to_wire(mode: sushi_core::PlayingMode) -> PlayingMode {
    match mode {
        sushi_core::PlayingMode::Stopped => PlayingMode::Stopped,
        sushi_core::PlayingMode::Playing => PlayingMode::Playing,
        sushi_core::PlayingMode::Recording => PlayingMode::Recording,
    }
}

pub fn playing_mode_from_wire(mode: PlayingMode) -> sushi_core::PlayingMode {
    match mode {
        PlayingMode::Stopped => sushi_core::PlayingMode::Stopped,
        PlayingMode::Playing => sushi_core::PlayingMode::Playing,
        PlayingMode::Recording => sushi_core::PlayingMode::Recording,
    }
}

pub fn sync_mode_to_wire(mode: sushi_core::SyncMode) -> SyncMode {
    match mode {
        sushi_core::SyncMode::Internal => SyncMode::Internal,
        sushi_core::SyncMode::Midi => SyncMode::Midi,
        sushi_core::SyncMode::Gate => SyncMode::Gate,
        sushi_core::SyncMode::Link => SyncMode::Link,
    }
}

pub fn sync_mode_from_wire(mode: SyncMode) -> sushi_core::SyncMode {
    match mode {
        SyncMode::Internal => sushi_core::SyncMode::Internal,
        SyncMode::Midi => sushi_core::SyncMode::Midi,
        SyncMode::Gate => sushi_core::SyncMode::Gate,
        SyncMode::Link => sushi_core::SyncMode::Link,
    }
}

pub fn time_signature_to_wire(sig: sushi_core::TimeSignature) -> TimeSignature {
    TimeSignature { numerator: sig.numerator, denominator: sig.denominator }
}

pub fn time_signature_from_wire(sig: TimeSignature) -> sushi_core::TimeSignature {
    sushi_core::TimeSignature { numerator: sig.numerator, denominator: sig.denominator }
}

pub fn track_kind_to_wire(kind: &sushi_core::TrackKind) -> TrackType {
    match kind {
        sushi_core::TrackKind::Regular { .. } | sushi_core::TrackKind::Multibus { .. } => TrackType::Regular,
        sushi_core::TrackKind::Pre => TrackType::Pre,
        sushi_core::TrackKind::Post => TrackType::Post,
    }
}

pub fn plugin_format_to_wire(format: sushi_core::PluginFormat) -> PluginType {
    match format {
        sushi_core::PluginFormat::Internal => PluginType::Internal,
        sushi_core::PluginFormat::Vst2x => PluginType::Vst2x,
        sushi_core::PluginFormat::Vst3x => PluginType::Vst3x,
        sushi_core::PluginFormat::Lv2 => PluginType::Lv2,
    }
}

pub fn plugin_format_from_wire(plugin_type: PluginType) -> sushi_core::PluginFormat {
    match plugin_type {
        PluginType::Internal => sushi_core::PluginFormat::Internal,
        PluginType::Vst2x => sushi_core::PluginFormat::Vst2x,
        PluginType::Vst3x => sushi_core::PluginFormat::Vst3x,
        PluginType::Lv2 => sushi_core::PluginFormat::Lv2,
    }
}

pub fn midi_channel_to_wire(channel: sushi_dispatch::event::MidiChannel) -> MidiChannel {
    match channel {
        sushi_dispatch::event::MidiChannel::Channel(c) => MidiChannel::Channel(c),
        sushi_dispatch::event::MidiChannel::Omni => MidiChannel::Omni,
    }
}

pub fn midi_channel_from_wire(channel: MidiChannel) -> sushi_dispatch::event::MidiChannel {
    match channel {
        MidiChannel::Channel(c) => sushi_dispatch::event::MidiChannel::Channel(c),
        MidiChannel::Omni => sushi_dispatch::event::MidiChannel::Omni,
    }
}

/// The current transport snapshot, read back by the façade when it
/// demultiplexes a `TransportUpdate` (spec.md §4.H "tagged value").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportValue {
    pub tempo: f32,
    pub time_signature: TimeSignature,
    pub playing_mode: PlayingMode,
    pub sync_mode: SyncMode,
}

/// The public shape a `subscribe_to_notifications` listener receives.
/// Produced only by [`crate::facade::SushiController`], which is the sole
/// place internal notifications are converted to wire types.
#[derive(Debug, Clone)]
pub enum Notification {
    ParameterChange { processor: u32, parameter: u32, value: f32 },
    PropertyChange { processor: u32, property: u32, value: String },
    ProgramChange { processor: u32, program: u32 },
    ProcessorUpdate { processor: u32, action: ProcessorAction },
    TrackUpdate { track: u32, action: TrackAction },
    TransportUpdate(TransportValue),
    CpuTimingUpdate { node: i64 },
}
