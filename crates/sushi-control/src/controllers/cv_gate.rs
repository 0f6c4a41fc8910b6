//! CvGate sub-controller (spec.md §4.G CvGate): stubbed pending hardware
//! CV/gate support. Every mutation reports `unsupported_operation`; every
//! query reports empty/zero, kept in the API surface for RPC wire
//! compatibility (spec.md §9 Non-goals: "CV/gate hardware integration").
//!
//! Method set grounded on the original `CvGateController` interface
//! (`cv_gate_controller.h`): port counts, per-kind connection listings,
//! per-processor listings, and connect/disconnect for both CV and gate,
//! input and output.

use std::sync::Arc;

use crate::engine::Engine;
use crate::status::ControlStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvConnection {
    pub processor: u32,
    pub parameter: u32,
    pub cv_port: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConnection {
    pub processor: u32,
    pub gate_port: u32,
    pub channel: u8,
    pub note_no: u8,
}

pub struct CvGateController {
    #[allow(dead_code)]
    engine: Arc<Engine>,
}

impl CvGateController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn get_cv_input_ports(&self) -> u32 {
        0
    }

    pub fn get_cv_output_ports(&self) -> u32 {
        0
    }

    pub fn get_all_cv_input_connections(&self) -> Vec<CvConnection> {
        Vec::new()
    }

    pub fn get_all_cv_output_connections(&self) -> Vec<CvConnection> {
        Vec::new()
    }

    pub fn get_all_gate_input_connections(&self) -> Vec<GateConnection> {
        Vec::new()
    }

    pub fn get_all_gate_output_connections(&self) -> Vec<GateConnection> {
        Vec::new()
    }

    pub fn get_cv_input_connections_for_processor(&self, _processor_id: u32) -> (ControlStatus, Vec<CvConnection>) {
        (ControlStatus::UnsupportedOperation, Vec::new())
    }

    pub fn get_cv_output_connections_for_processor(&self, _processor_id: u32) -> (ControlStatus, Vec<CvConnection>) {
        (ControlStatus::UnsupportedOperation, Vec::new())
    }

    pub fn get_gate_input_connections_for_processor(&self, _processor_id: u32) -> (ControlStatus, Vec<GateConnection>) {
        (ControlStatus::UnsupportedOperation, Vec::new())
    }

    pub fn get_gate_output_connections_for_processor(&self, _processor_id: u32) -> (ControlStatus, Vec<GateConnection>) {
        (ControlStatus::UnsupportedOperation, Vec::new())
    }

    pub fn connect_cv_input_to_parameter(&self, _processor_id: u32, _parameter_id: u32, _cv_input_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn connect_cv_output_from_parameter(&self, _processor_id: u32, _parameter_id: u32, _cv_output_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn connect_gate_input_to_processor(&self, _processor_id: u32, _gate_input_id: u32, _channel: u8, _note_no: u8) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn connect_gate_output_from_processor(&self, _processor_id: u32, _gate_output_id: u32, _channel: u8, _note_no: u8) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_cv_input(&self, _processor_id: u32, _parameter_id: u32, _cv_input_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_cv_output(&self, _processor_id: u32, _parameter_id: u32, _cv_output_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_gate_input(&self, _processor_id: u32, _gate_input_id: u32, _channel: u8, _note_no: u8) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_gate_output(&self, _processor_id: u32, _gate_output_id: u32, _channel: u8, _note_no: u8) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_all_cv_inputs_from_processor(&self, _processor_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_all_cv_outputs_from_processor(&self, _processor_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_all_gate_inputs_from_processor(&self, _processor_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }

    pub fn disconnect_all_gate_outputs_from_processor(&self, _processor_id: u32) -> ControlStatus {
        ControlStatus::UnsupportedOperation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;

    #[test]
    fn every_port_count_is_zero() {
        let cv_gate = CvGateController::new(test_engine());
        assert_eq!(cv_gate.get_cv_input_ports(), 0);
        assert_eq!(cv_gate.get_cv_output_ports(), 0);
    }

    #[test]
    fn every_mutation_is_unsupported() {
        let cv_gate = CvGateController::new(test_engine());
        assert_eq!(cv_gate.connect_cv_input_to_parameter(0, 0, 0), ControlStatus::UnsupportedOperation);
        assert_eq!(cv_gate.connect_gate_output_from_processor(0, 0, 1, 60), ControlStatus::UnsupportedOperation);
        assert_eq!(cv_gate.disconnect_all_gate_inputs_from_processor(0), ControlStatus::UnsupportedOperation);
    }

    #[test]
    fn every_query_reports_unsupported_with_empty_list() {
        let cv_gate = CvGateController::new(test_engine());
        let (status, rows) = cv_gate.get_cv_input_connections_for_processor(0);
        assert_eq!(status, ControlStatus::UnsupportedOperation);
        assert!(rows.is_empty());
    }
}
