//! Parameter sub-controller (spec.md §4.G Parameter): descriptor queries
//! and the normalized/domain/string value pipeline.
//!
//! Resolution of spec.md §9's open question on `set_parameter_value_normalised`:
//! `set_parameter_value` is the sole normalized-`[0,1]` setter (clamping,
//! per spec.md), and [`ParameterController::set_parameter_value_in_domain`]
//! is added as the distinct domain-scaled write the spec suggests.

use std::sync::Arc;

use sushi_core::{ParameterDescriptor, Processor};
use sushi_dispatch::event::EventPayload;

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::{ParameterInfo, PropertyInfo};

pub struct ParameterController {
    engine: Arc<Engine>,
}

impl ParameterController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    fn processor_ref(&self, id: u32) -> Option<Processor> {
        let container = self.engine.container.read();
        container.processor(id).or_else(|| container.track(id).map(|t| &t.processor)).cloned()
    }

    fn descriptor(&self, id: u32, parameter_id: u32) -> Option<ParameterDescriptor> {
        self.processor_ref(id).and_then(|p| p.parameter(parameter_id).cloned())
    }

    // -- descriptor queries -----------------------------------------------

    pub fn get_processor_parameters(&self, processor_id: u32) -> (ControlStatus, Vec<ParameterInfo>) {
        self.descriptors(processor_id, |d| !d.parameter_type.is_property())
    }

    pub fn get_processor_properties(&self, processor_id: u32) -> (ControlStatus, Vec<PropertyInfo>) {
        let (status, descriptors) = self.descriptors_raw(processor_id, |d| d.parameter_type.is_property());
        (status, descriptors.iter().map(PropertyInfo::from).collect())
    }

    pub fn get_track_parameters(&self, track_id: u32) -> (ControlStatus, Vec<ParameterInfo>) {
        self.get_processor_parameters(track_id)
    }

    pub fn get_track_properties(&self, track_id: u32) -> (ControlStatus, Vec<PropertyInfo>) {
        self.get_processor_properties(track_id)
    }

    fn descriptors(&self, id: u32, keep: impl Fn(&ParameterDescriptor) -> bool) -> (ControlStatus, Vec<ParameterInfo>) {
        let (status, descriptors) = self.descriptors_raw(id, keep);
        (status, descriptors.iter().map(ParameterInfo::from).collect())
    }

    fn descriptors_raw(&self, id: u32, keep: impl Fn(&ParameterDescriptor) -> bool) -> (ControlStatus, Vec<ParameterDescriptor>) {
        match self.processor_ref(id) {
            Some(p) => (ControlStatus::Ok, p.parameters.into_iter().filter(keep).collect()),
            None => (ControlStatus::NotFound, Vec::new()),
        }
    }

    pub fn get_parameter_id(&self, processor_id: u32, name: &str) -> (ControlStatus, Option<u32>) {
        match self.processor_ref(processor_id) {
            Some(p) => match p.parameter_named(name) {
                Some(d) => (ControlStatus::Ok, Some(d.id)),
                None => (ControlStatus::NotFound, None),
            },
            None => (ControlStatus::NotFound, None),
        }
    }

    pub fn get_property_id(&self, processor_id: u32, name: &str) -> (ControlStatus, Option<u32>) {
        self.get_parameter_id(processor_id, name)
    }

    pub fn get_parameter_info(&self, processor_id: u32, parameter_id: u32) -> (ControlStatus, Option<ParameterInfo>) {
        match self.descriptor(processor_id, parameter_id) {
            Some(d) => (ControlStatus::Ok, Some(ParameterInfo::from(&d))),
            None => (ControlStatus::NotFound, None),
        }
    }

    pub fn get_property_info(&self, processor_id: u32, property_id: u32) -> (ControlStatus, Option<PropertyInfo>) {
        match self.descriptor(processor_id, property_id) {
            Some(d) => (ControlStatus::Ok, Some(PropertyInfo::from(&d))),
            None => (ControlStatus::NotFound, None),
        }
    }

    // -- value pipeline -----------------------------------------------------

    pub fn get_parameter_value(&self, processor_id: u32, parameter_id: u32) -> (ControlStatus, f32) {
        if self.descriptor(processor_id, parameter_id).is_none() {
            return (ControlStatus::NotFound, 0.0);
        }
        let value = self.engine.parameter_values.get(&(processor_id, parameter_id)).map(|v| *v).unwrap_or(0.0);
        (ControlStatus::Ok, value)
    }

    pub fn get_parameter_value_in_domain(&self, processor_id: u32, parameter_id: u32) -> (ControlStatus, f32) {
        let Some(descriptor) = self.descriptor(processor_id, parameter_id) else {
            return (ControlStatus::NotFound, 0.0);
        };
        let normalized = self.engine.parameter_values.get(&(processor_id, parameter_id)).map(|v| *v).unwrap_or(0.0);
        let domain = descriptor.preprocessor.to_domain(normalized, descriptor.min_domain, descriptor.max_domain);
        (ControlStatus::Ok, domain)
    }

    pub fn get_parameter_value_as_string(&self, processor_id: u32, parameter_id: u32) -> (ControlStatus, String) {
        let Some(descriptor) = self.descriptor(processor_id, parameter_id) else {
            return (ControlStatus::NotFound, String::new());
        };
        let (status, domain) = self.get_parameter_value_in_domain(processor_id, parameter_id);
        (status, descriptor.format_domain_value(domain))
    }

    pub fn get_property_value(&self, processor_id: u32, property_id: u32) -> (ControlStatus, String) {
        if self.descriptor(processor_id, property_id).is_none() {
            return (ControlStatus::NotFound, String::new());
        }
        let value = self.engine.property_values.get(&(processor_id, property_id)).map(|v| v.clone()).unwrap_or_default();
        (ControlStatus::Ok, value)
    }

    /// Set a parameter's normalized `[0,1]` value, clamping `v` first
    /// (spec.md §4.G: "clamps v to [0,1] before posting").
    pub fn set_parameter_value(&self, processor_id: u32, parameter_id: u32, value: f32) -> ControlStatus {
        let Some(descriptor) = self.descriptor(processor_id, parameter_id) else {
            return ControlStatus::NotFound;
        };
        if descriptor.parameter_type.is_property() {
            return ControlStatus::InvalidArguments;
        }
        let clamped = value.clamp(0.0, 1.0);
        self.post(EventPayload::ParameterChange { processor: processor_id, parameter: parameter_id, value: clamped })
    }

    /// Set a parameter by its domain-scaled value, converting to normalized
    /// form through the descriptor's preprocessor before posting. Added by
    /// this workspace's resolution of spec.md §9's open question.
    pub fn set_parameter_value_in_domain(&self, processor_id: u32, parameter_id: u32, domain_value: f32) -> ControlStatus {
        let Some(descriptor) = self.descriptor(processor_id, parameter_id) else {
            return ControlStatus::NotFound;
        };
        if descriptor.parameter_type.is_property() {
            return ControlStatus::InvalidArguments;
        }
        let normalized = descriptor.preprocessor.to_normalized(domain_value, descriptor.min_domain, descriptor.max_domain);
        self.post(EventPayload::ParameterChange { processor: processor_id, parameter: parameter_id, value: normalized })
    }

    pub fn set_property_value(&self, processor_id: u32, property_id: u32, value: &str) -> ControlStatus {
        let Some(descriptor) = self.descriptor(processor_id, property_id) else {
            return ControlStatus::NotFound;
        };
        if !descriptor.parameter_type.is_property() {
            return ControlStatus::InvalidArguments;
        }
        self.post(EventPayload::PropertyChange { processor: processor_id, property: property_id, value: value.to_string() })
    }

    fn post(&self, payload: EventPayload) -> ControlStatus {
        match self.engine.post(payload) {
            Ok(()) => ControlStatus::Ok,
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;
    use sushi_core::{ParameterPreprocessor, ParameterType, Processor as CoreProcessor, ProcessorType};

    fn engine_with_gain() -> (Arc<Engine>, u32) {
        let engine = test_engine();
        let id = engine.ids.next_id();
        let mut processor = CoreProcessor::new(id, "G1", "Gain", ProcessorType::Internal { uid: "sushi.testing.gain".into() }, 2, 2);
        processor.parameters.push(ParameterDescriptor::new(
            0, "gain", "Gain", "dB", ParameterType::Float, -24.0, 24.0, true, ParameterPreprocessor::Linear,
        ));
        processor.parameters.push(ParameterDescriptor::new(
            1, "name", "Name", "", ParameterType::StringProperty, 0.0, 0.0, false, ParameterPreprocessor::Linear,
        ));
        engine.container.write().add_processor(processor).unwrap();
        (engine, id)
    }

    #[test]
    fn set_then_get_value_round_trips_after_drain() {
        let (engine, proc_id) = engine_with_gain();
        let parameter = ParameterController::new(engine.clone());
        assert_eq!(parameter.set_parameter_value(proc_id, 0, 0.5), ControlStatus::Ok);
        engine.drain_worker();
        engine.drain_rt_default(0);
        let (status, value) = parameter.get_parameter_value(proc_id, 0);
        assert_eq!(status, ControlStatus::Ok);
        assert!((value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn set_parameter_value_clamps_out_of_range() {
        let (engine, proc_id) = engine_with_gain();
        let parameter = ParameterController::new(engine.clone());
        parameter.set_parameter_value(proc_id, 0, 5.0);
        engine.drain_worker();
        engine.drain_rt_default(0);
        let (_, value) = parameter.get_parameter_value(proc_id, 0);
        assert_eq!(value, 1.0);
    }

    #[test]
    fn set_value_in_domain_converts_through_preprocessor() {
        let (engine, proc_id) = engine_with_gain();
        let parameter = ParameterController::new(engine.clone());
        assert_eq!(parameter.set_parameter_value_in_domain(proc_id, 0, 0.0), ControlStatus::Ok);
        engine.drain_worker();
        engine.drain_rt_default(0);
        let (_, domain) = parameter.get_parameter_value_in_domain(proc_id, 0);
        assert!((domain - 0.0).abs() < 1e-3);
    }

    #[test]
    fn properties_are_excluded_from_parameter_listing() {
        let (engine, proc_id) = engine_with_gain();
        let parameter = ParameterController::new(engine);
        let (_, params) = parameter.get_processor_parameters(proc_id);
        let (_, props) = parameter.get_processor_properties(proc_id);
        assert_eq!(params.len(), 1);
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn cannot_set_parameter_value_on_a_property() {
        let (engine, proc_id) = engine_with_gain();
        let parameter = ParameterController::new(engine);
        assert_eq!(parameter.set_parameter_value(proc_id, 1, 0.5), ControlStatus::InvalidArguments);
    }

    #[test]
    fn unknown_processor_is_not_found() {
        let engine = test_engine();
        let parameter = ParameterController::new(engine);
        assert_eq!(parameter.get_parameter_value(99, 0).0, ControlStatus::NotFound);
    }
}
