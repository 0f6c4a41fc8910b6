//! Osc sub-controller (spec.md §4.G) and the late-bound backend contract
//! (spec.md §4.K).
//!
//! The façade is built before an OSC frontend necessarily exists — `sushi`
//! (the root crate) wires a concrete `sushi-osc` frontend in after engine
//! construction. `OscBackendSlot` is the "cyclic references... become a
//! late-binding setter" resolution spec.md §9 calls for: a non-owning,
//! swappable reference the façade can attach to after the fact.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::status::ControlStatus;

/// The contract the core calls against an attached OSC frontend (spec.md
/// §4.K). Implemented by `sushi-osc`'s frontend adapter.
pub trait OscBackend: Send + Sync {
    fn send_ip(&self) -> String;
    fn send_port(&self) -> u16;
    fn receive_port(&self) -> u16;
    fn get_enabled_parameter_outputs(&self) -> Vec<(u32, u32)>;
    fn connect_from_parameter(&self, processor: &str, parameter: &str) -> bool;
    fn disconnect_from_parameter(&self, processor: &str, parameter: &str) -> bool;
    fn connect_from_all_parameters(&self);
    fn disconnect_from_all_parameters(&self);
    fn save_state(&self) -> sushi_session::OscState;
    fn set_state(&self, state: &sushi_session::OscState);
}

/// Holds a non-owning, hot-swappable reference to an attached OSC frontend.
#[derive(Default)]
pub struct OscBackendSlot {
    backend: ArcSwapOption<Box<dyn OscBackend>>,
}

impl OscBackendSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, backend: Arc<Box<dyn OscBackend>>) {
        self.backend.store(Some(backend));
    }

    pub fn detach(&self) {
        self.backend.store(None);
    }

    pub fn is_attached(&self) -> bool {
        self.backend.load().is_some()
    }

    fn with<R>(&self, f: impl FnOnce(&dyn OscBackend) -> R) -> Option<R> {
        self.backend.load_full().map(|b| f(b.as_ref().as_ref()))
    }

    /// Save the attached backend's state for session persistence (spec.md
    /// §4.J). Reports the default, disabled state when no backend is
    /// attached, since an unattached slot has nothing saved to restore.
    pub fn save_state(&self) -> sushi_session::OscState {
        self.with(|b| b.save_state()).unwrap_or_default()
    }

    /// Restore previously-saved state onto the attached backend, a no-op
    /// if none is attached yet.
    pub fn restore_state(&self, state: &sushi_session::OscState) {
        self.with(|b| b.set_state(state));
    }
}

pub struct OscController {
    engine: Arc<crate::engine::Engine>,
}

impl OscController {
    pub fn new(engine: Arc<crate::engine::Engine>) -> Self {
        Self { engine }
    }

    pub fn get_send_ip(&self) -> (ControlStatus, String) {
        match self.engine.osc.with(|b| b.send_ip()) {
            Some(ip) => (ControlStatus::Ok, ip),
            None => (ControlStatus::UnsupportedOperation, String::new()),
        }
    }

    pub fn get_send_port(&self) -> (ControlStatus, u16) {
        match self.engine.osc.with(|b| b.send_port()) {
            Some(port) => (ControlStatus::Ok, port),
            None => (ControlStatus::UnsupportedOperation, 0),
        }
    }

    pub fn get_receive_port(&self) -> (ControlStatus, u16) {
        match self.engine.osc.with(|b| b.receive_port()) {
            Some(port) => (ControlStatus::Ok, port),
            None => (ControlStatus::UnsupportedOperation, 0),
        }
    }

    pub fn get_enabled_parameter_outputs(&self) -> (ControlStatus, Vec<(u32, u32)>) {
        match self.engine.osc.with(|b| b.get_enabled_parameter_outputs()) {
            Some(outputs) => (ControlStatus::Ok, outputs),
            None => (ControlStatus::UnsupportedOperation, Vec::new()),
        }
    }

    pub fn enable_output_for_parameter(&self, processor: &str, parameter: &str) -> ControlStatus {
        match self.engine.osc.with(|b| b.connect_from_parameter(processor, parameter)) {
            Some(true) => ControlStatus::Ok,
            Some(false) => ControlStatus::NotFound,
            None => ControlStatus::UnsupportedOperation,
        }
    }

    pub fn disable_output_for_parameter(&self, processor: &str, parameter: &str) -> ControlStatus {
        match self.engine.osc.with(|b| b.disconnect_from_parameter(processor, parameter)) {
            Some(true) => ControlStatus::Ok,
            Some(false) => ControlStatus::NotFound,
            None => ControlStatus::UnsupportedOperation,
        }
    }

    pub fn enable_all_output(&self) -> ControlStatus {
        match self.engine.osc.with(|b| b.connect_from_all_parameters()) {
            Some(()) => ControlStatus::Ok,
            None => ControlStatus::UnsupportedOperation,
        }
    }

    pub fn disable_all_output(&self) -> ControlStatus {
        match self.engine.osc.with(|b| b.disconnect_from_all_parameters()) {
            Some(()) => ControlStatus::Ok,
            None => ControlStatus::UnsupportedOperation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingBackend {
        enabled: Mutex<Vec<(String, String)>>,
    }

    impl OscBackend for RecordingBackend {
        fn send_ip(&self) -> String {
            "127.0.0.1".into()
        }
        fn send_port(&self) -> u16 {
            24024
        }
        fn receive_port(&self) -> u16 {
            24023
        }
        fn get_enabled_parameter_outputs(&self) -> Vec<(u32, u32)> {
            Vec::new()
        }
        fn connect_from_parameter(&self, processor: &str, parameter: &str) -> bool {
            self.enabled.lock().push((processor.into(), parameter.into()));
            true
        }
        fn disconnect_from_parameter(&self, _processor: &str, _parameter: &str) -> bool {
            true
        }
        fn connect_from_all_parameters(&self) {}
        fn disconnect_from_all_parameters(&self) {}
        fn save_state(&self) -> sushi_session::OscState {
            sushi_session::OscState::default()
        }
        fn set_state(&self, _state: &sushi_session::OscState) {}
    }

    #[test]
    fn unattached_backend_reports_unsupported() {
        let slot = OscBackendSlot::new();
        assert!(!slot.is_attached());
        assert_eq!(slot.with(|b| b.send_port()), None);
    }

    #[test]
    fn attached_backend_answers_queries() {
        let slot = OscBackendSlot::new();
        let backend: Arc<Box<dyn OscBackend>> = Arc::new(Box::new(RecordingBackend { enabled: Mutex::new(Vec::new()) }));
        slot.attach(backend);
        assert!(slot.is_attached());
        assert_eq!(slot.with(|b| b.send_port()), Some(24024));
    }
}
