//! OSC method registry and UDP control frontend (spec.md §4.I, §4.K).
//!
//! [`registry`] is the pure address-table data structure; [`frontend`]
//! wraps it with a real `UdpSocket` and implements
//! [`sushi_control::controllers::osc::OscBackend`], the contract the core
//! calls through a late-bound
//! [`sushi_control::controllers::osc::OscBackendSlot`].

pub mod error;
pub mod frontend;
pub mod registry;

pub use error::{Error, Result};
pub use frontend::OscFrontend;
pub use registry::{MethodBinding, MethodRegistry, INVALID_HANDLE};
