//! Core control-plane state for the sushi host: the processor container,
//! transport, performance timer, bypass manager and parameter pipeline.
//!
//! This crate owns no audio I/O and hosts no DSP itself; it is the shared
//! state that the event dispatcher (`sushi-dispatch`), MIDI dispatcher
//! (`sushi-midi`) and sub-controllers (`sushi-control`) read and mutate.

pub mod bypass;
pub mod config;
pub mod container;
pub mod error;
pub mod ids;
pub mod lockfree;
pub mod parameter;
pub mod processor;
pub mod timer;
pub mod track;
pub mod transport;

pub use bypass::BypassManager;
pub use config::HostConfig;
pub use container::ProcessorContainer;
pub use error::{Error, Result};
pub use ids::{IdGenerator, ObjectId};
pub use lockfree::{AtomicDouble, AtomicFlag, AtomicFloat};
pub use parameter::{ParameterDescriptor, ParameterPreprocessor, ParameterType, ParameterValue};
pub use processor::{PluginFormat, Processor, ProcessorType, Program};
pub use timer::{PerformanceTimer, TimingStats, ENGINE_TIMING_ID};
pub use track::{Track, TrackKind};
pub use transport::{PlayingMode, SyncMode, TimeSignature, Transport};
