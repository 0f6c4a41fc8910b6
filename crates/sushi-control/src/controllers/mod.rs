//! The twelve sub-controllers of spec.md §4.G, one module each.

pub mod audio_graph;
pub mod audio_routing;
pub mod cv_gate;
pub mod keyboard;
pub mod midi;
pub mod osc;
pub mod parameter;
pub mod program;
pub mod session;
pub mod system;
pub mod timing;
pub mod transport;

pub use audio_graph::AudioGraphController;
pub use audio_routing::AudioRoutingController;
pub use cv_gate::CvGateController;
pub use keyboard::KeyboardController;
pub use midi::MidiController;
pub use osc::{OscBackend, OscBackendSlot, OscController};
pub use parameter::ParameterController;
pub use program::ProgramController;
pub use session::SessionController;
pub use system::SystemController;
pub use timing::TimingController;
pub use transport::TransportController;
