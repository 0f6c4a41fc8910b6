//! # sushi
//!
//! Control-plane of a real-time audio processing host: an event
//! dispatcher, a façade over twelve sub-controllers, a MIDI dispatcher, an
//! OSC method registry and frontend, and session save/restore. DSP inner
//! loops, the audio driver, and RPC transport bytes are external
//! collaborators contracted at the boundary, not implemented here.
//!
//! This crate is the umbrella that wires the workspace's member crates
//! together, mirroring `tutti`'s umbrella-crate role:
//!
//! - [`sushi_core`] — processor container, transport, performance timer,
//!   bypass manager, lock-free primitives, config, errors
//! - [`sushi_dispatch`] — the event dispatcher (in/out queues, poster ids)
//! - [`sushi_midi`] — MIDI routing, CC/PC bindings, clock, wire codec
//! - [`sushi_control`] — the twelve sub-controllers and their façade
//! - [`sushi_osc`] — the OSC method registry and UDP frontend
//! - [`sushi_session`] — session state and the save/restore state machine
//!
//! ## Quick start
//!
//! ```ignore
//! use sushi_host::{init_logging, Sushi};
//!
//! init_logging();
//! let sushi = Sushi::builder().build()?;
//! let controller = sushi.controller();
//! controller.transport.set_tempo(128.0);
//! ```

pub mod config;
pub mod error;
pub mod logging;
mod osc_adapter;
mod sushi;

pub use error::{Error, Result};
pub use logging::init_logging;
pub use sushi::{Sushi, SushiBuilder};

/// Re-exports of every member crate, for callers that need lower-level
/// access than [`Sushi`] exposes.
pub mod prelude {
    pub use sushi_control::{self as control, ControlStatus, Engine, SushiController};
    pub use sushi_core as core;
    pub use sushi_dispatch as dispatch;
    pub use sushi_midi as midi;
    pub use sushi_osc as osc;
    pub use sushi_session as session;

    pub use crate::config::{EngineArgs, OscArgs};
    pub use crate::{init_logging, Sushi, SushiBuilder};
}
