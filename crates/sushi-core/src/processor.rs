//! Processor entities: the nodes hosted in the processor container.

use crate::parameter::ParameterDescriptor;

/// Identifies what a processor's DSP implementation is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorType {
    /// A plugin built into the host, identified by its internal uid
    /// (e.g. `"sushi.testing.gain"`).
    Internal { uid: String },
    /// An externally loaded plugin descriptor.
    External {
        uid: String,
        path: String,
        format: PluginFormat,
    },
}

/// Wire-stable plugin format tag (spec.md §6 `PluginType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginFormat {
    Internal,
    Vst2x,
    Vst3x,
    Lv2,
}

/// One entry in a processor's program list.
#[derive(Debug, Clone)]
pub struct Program {
    pub id: u32,
    pub name: String,
}

/// A processing node: a plugin or a track (tracks are processors too).
#[derive(Debug, Clone)]
pub struct Processor {
    pub id: u32,
    pub name: String,
    pub label: String,
    pub processor_type: ProcessorType,
    pub bypassed: bool,
    pub max_input_channels: usize,
    pub current_input_channels: usize,
    pub max_output_channels: usize,
    pub current_output_channels: usize,
    pub parameters: Vec<ParameterDescriptor>,
    pub programs: Vec<Program>,
    pub current_program: u32,
}

impl Processor {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        label: impl Into<String>,
        processor_type: ProcessorType,
        max_input_channels: usize,
        max_output_channels: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            label: label.into(),
            processor_type,
            bypassed: false,
            max_input_channels,
            current_input_channels: max_input_channels,
            max_output_channels,
            current_output_channels: max_output_channels,
            parameters: Vec::new(),
            programs: Vec::new(),
            current_program: 0,
        }
    }

    pub fn supports_programs(&self) -> bool {
        !self.programs.is_empty()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn parameter(&self, parameter_id: u32) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.id == parameter_id)
    }

    pub fn parameter_named(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn program(&self, program_id: u32) -> Option<&Program> {
        self.programs.iter().find(|p| p.id == program_id)
    }
}
