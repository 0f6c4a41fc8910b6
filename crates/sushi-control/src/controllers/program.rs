//! Program sub-controller (spec.md §4.G Program): processor program-list
//! queries and program-change mutation.
//!
//! Mirrors `AudioGraphController`'s pattern of a synchronous existence
//! check followed by a worker-thread lambda for the one mutating call,
//! since a program change writes `Processor::current_program` in the
//! container (spec.md §5: the container is mutated only on the worker
//! thread).

use std::sync::Arc;

use tracing::warn;

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::ProgramInfo;

pub struct ProgramController {
    engine: Arc<Engine>,
}

impl ProgramController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn get_processor_current_program(&self, processor_id: u32) -> (ControlStatus, u32) {
        match self.engine.container.read().processor(processor_id) {
            Some(p) if p.supports_programs() => (ControlStatus::Ok, p.current_program),
            Some(_) => (ControlStatus::UnsupportedOperation, 0),
            None => (ControlStatus::NotFound, 0),
        }
    }

    pub fn get_processor_current_program_name(&self, processor_id: u32) -> (ControlStatus, String) {
        match self.engine.container.read().processor(processor_id) {
            Some(p) if p.supports_programs() => match p.program(p.current_program) {
                Some(program) => (ControlStatus::Ok, program.name.clone()),
                None => (ControlStatus::OutOfRange, String::new()),
            },
            Some(_) => (ControlStatus::UnsupportedOperation, String::new()),
            None => (ControlStatus::NotFound, String::new()),
        }
    }

    pub fn get_processor_program_name(&self, processor_id: u32, program_id: u32) -> (ControlStatus, String) {
        match self.engine.container.read().processor(processor_id) {
            Some(p) if p.supports_programs() => match p.program(program_id) {
                Some(program) => (ControlStatus::Ok, program.name.clone()),
                None => (ControlStatus::OutOfRange, String::new()),
            },
            Some(_) => (ControlStatus::UnsupportedOperation, String::new()),
            None => (ControlStatus::NotFound, String::new()),
        }
    }

    pub fn get_processor_programs(&self, processor_id: u32) -> (ControlStatus, Vec<ProgramInfo>) {
        match self.engine.container.read().processor(processor_id) {
            Some(p) if p.supports_programs() => {
                (ControlStatus::Ok, p.programs.iter().map(ProgramInfo::from).collect())
            }
            Some(_) => (ControlStatus::UnsupportedOperation, Vec::new()),
            None => (ControlStatus::NotFound, Vec::new()),
        }
    }

    pub fn set_processor_program(&self, processor_id: u32, program_id: u32) -> ControlStatus {
        let (supports, in_range) = match self.engine.container.read().processor(processor_id) {
            Some(p) if !p.supports_programs() => return ControlStatus::UnsupportedOperation,
            Some(p) => (true, p.program(program_id).is_some()),
            None => return ControlStatus::NotFound,
        };
        if !supports || !in_range {
            return ControlStatus::OutOfRange;
        }
        let engine = self.engine.clone();
        let posted = engine.post_lambda(move || {
            if let Some(p) = engine.container.write().processor_mut(processor_id) {
                p.current_program = program_id;
                engine.notify(sushi_dispatch::Notification::ProcessorUpdate {
                    processor: processor_id,
                    action: sushi_dispatch::GraphAction::Added,
                });
            } else {
                warn!("deferred set_processor_program: processor {processor_id} vanished before execution");
            }
        });
        posted.map(|()| ControlStatus::Ok).unwrap_or_else(|err| err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;
    use sushi_core::{Processor as CoreProcessor, ProcessorType, Program};

    fn engine_with_programs() -> (Arc<Engine>, u32) {
        let engine = test_engine();
        let id = engine.ids.next_id();
        let mut processor = CoreProcessor::new(id, "Synth", "Synth", ProcessorType::Internal { uid: "sushi.testing.synth".into() }, 2, 2);
        processor.programs.push(Program { id: 0, name: "Init".into() });
        processor.programs.push(Program { id: 1, name: "Lead".into() });
        engine.container.write().add_processor(processor).unwrap();
        (engine, id)
    }

    #[test]
    fn no_programs_reports_unsupported() {
        let engine = test_engine();
        let id = engine.ids.next_id();
        engine
            .container
            .write()
            .add_processor(sushi_core::Processor::new(id, "G1", "G1", ProcessorType::Internal { uid: "sushi.testing.gain".into() }, 2, 2))
            .unwrap();
        let program = ProgramController::new(engine);
        assert_eq!(program.get_processor_current_program(id).0, ControlStatus::UnsupportedOperation);
    }

    #[test]
    fn set_program_then_read_back_after_drain() {
        let (engine, id) = engine_with_programs();
        let program = ProgramController::new(engine.clone());
        assert_eq!(program.set_processor_program(id, 1), ControlStatus::Ok);
        engine.drain_worker();
        let (status, current) = program.get_processor_current_program(id);
        assert_eq!(status, ControlStatus::Ok);
        assert_eq!(current, 1);
        assert_eq!(program.get_processor_current_program_name(id).1, "Lead");
    }

    #[test]
    fn out_of_range_program_id_rejected() {
        let (engine, id) = engine_with_programs();
        let program = ProgramController::new(engine);
        assert_eq!(program.set_processor_program(id, 9), ControlStatus::OutOfRange);
    }
}
