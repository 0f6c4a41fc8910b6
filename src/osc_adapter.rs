//! Bridges `sushi_osc::OscFrontend` (an `Arc<Self>`, since it hands out
//! `Weak` self-references internally) into the `Arc<Box<dyn OscBackend>>`
//! shape [`OscBackendSlot::attach`] expects.
//!
//! `OscBackend` is implemented directly on `OscFrontend`, not on
//! `Arc<OscFrontend>` — Rust's coherence rules forbid a downstream crate
//! implementing a foreign trait for `Arc<LocalType>` (`Arc` isn't
//! `#[fundamental]`). This newtype is the local type the impl needs.
//!
//! [`OscBackendSlot::attach`]: sushi_control::controllers::osc::OscBackendSlot::attach

use std::sync::Arc;

use sushi_control::controllers::osc::OscBackend;
use sushi_osc::OscFrontend;
use sushi_session::OscState;

pub(crate) struct OscBackendHandle(pub Arc<OscFrontend>);

impl OscBackend for OscBackendHandle {
    fn send_ip(&self) -> String {
        self.0.send_ip()
    }

    fn send_port(&self) -> u16 {
        self.0.send_port()
    }

    fn receive_port(&self) -> u16 {
        self.0.receive_port()
    }

    fn get_enabled_parameter_outputs(&self) -> Vec<(u32, u32)> {
        self.0.get_enabled_parameter_outputs()
    }

    fn connect_from_parameter(&self, processor: &str, parameter: &str) -> bool {
        self.0.connect_from_parameter(processor, parameter)
    }

    fn disconnect_from_parameter(&self, processor: &str, parameter: &str) -> bool {
        self.0.disconnect_from_parameter(processor, parameter)
    }

    fn connect_from_all_parameters(&self) {
        self.0.connect_from_all_parameters()
    }

    fn disconnect_from_all_parameters(&self) {
        self.0.disconnect_from_all_parameters()
    }

    fn save_state(&self) -> OscState {
        self.0.save_state()
    }

    fn set_state(&self, state: &OscState) {
        self.0.set_state(state)
    }
}
