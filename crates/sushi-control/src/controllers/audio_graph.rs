//! AudioGraph sub-controller (spec.md §4.G AudioGraph): processor/track
//! queries plus the structural mutations that shape the graph.
//!
//! Queries read the container directly under its reader lock. Mutations
//! validate what can be checked synchronously (existence, name uniqueness)
//! and then enqueue a `Lambda` event that performs the actual container
//! edit on the worker thread (spec.md §5: the container is mutated only
//! there) — see [`crate::engine::Engine`]'s doc comment for why this keeps
//! every method here non-blocking.

use std::sync::Arc;

use sushi_core::{Processor, ProcessorType, Track, TrackKind};
use tracing::warn;

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::{plugin_format_from_wire, PluginType, ProcessorInfo, TrackInfo};

pub struct AudioGraphController {
    engine: Arc<Engine>,
}

impl AudioGraphController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    // -- queries ----------------------------------------------------------

    pub fn get_all_processors(&self) -> Vec<ProcessorInfo> {
        self.engine.container.read().all_processors().iter().map(|p| ProcessorInfo::from(*p)).collect()
    }

    pub fn get_all_tracks(&self) -> Vec<TrackInfo> {
        self.engine.container.read().all_tracks().iter().map(|t| TrackInfo::from_track(t)).collect()
    }

    pub fn get_track_info(&self, track_id: u32) -> (ControlStatus, Option<TrackInfo>) {
        match self.engine.container.read().track(track_id) {
            Some(track) => (ControlStatus::Ok, Some(TrackInfo::from_track(track))),
            None => (ControlStatus::NotFound, None),
        }
    }

    pub fn get_processor_info(&self, processor_id: u32) -> (ControlStatus, Option<ProcessorInfo>) {
        match self.engine.container.read().processor(processor_id) {
            Some(processor) => (ControlStatus::Ok, Some(ProcessorInfo::from(processor))),
            None => (ControlStatus::NotFound, None),
        }
    }

    pub fn get_track_processors(&self, track_id: u32) -> (ControlStatus, Vec<ProcessorInfo>) {
        let container = self.engine.container.read();
        match container.track_processors(track_id) {
            Some(processors) => (ControlStatus::Ok, processors.into_iter().map(ProcessorInfo::from).collect()),
            None => (ControlStatus::NotFound, Vec::new()),
        }
    }

    pub fn get_track_id(&self, name: &str) -> (ControlStatus, Option<u32>) {
        match self.engine.container.read().id_by_name(name) {
            Some(id) => (ControlStatus::Ok, Some(id)),
            None => (ControlStatus::NotFound, None),
        }
    }

    pub fn get_processor_id(&self, name: &str) -> (ControlStatus, Option<u32>) {
        self.get_track_id(name)
    }

    pub fn get_processor_bypass_state(&self, processor_id: u32) -> (ControlStatus, bool) {
        if self.engine.container.read().processor(processor_id).is_none() {
            return (ControlStatus::NotFound, false);
        }
        let bypassed = self.engine.bypass.get(&processor_id).map(|b| b.target_bypassed()).unwrap_or(false);
        (ControlStatus::Ok, bypassed)
    }

    pub fn get_processor_state(&self, processor_id: u32) -> (ControlStatus, Vec<u8>) {
        if self.engine.container.read().processor(processor_id).is_none() {
            return (ControlStatus::NotFound, Vec::new());
        }
        let state = self.engine.processor_state.get(&processor_id).map(|s| s.clone()).unwrap_or_default();
        (ControlStatus::Ok, state)
    }

    // -- track mutations ----------------------------------------------------

    pub fn create_track(&self, name: &str, channels: usize) -> (ControlStatus, u32) {
        self.create_track_with_kind(name, TrackKind::Regular { channels })
    }

    pub fn create_multibus_track(&self, name: &str, buses: usize) -> (ControlStatus, u32) {
        self.create_track_with_kind(name, TrackKind::Multibus { buses })
    }

    pub fn create_pre_track(&self, name: &str) -> (ControlStatus, u32) {
        if self.engine.container.read().pre_track_id().is_some() {
            return (ControlStatus::InvalidArguments, 0);
        }
        self.create_track_with_kind(name, TrackKind::Pre)
    }

    pub fn create_post_track(&self, name: &str) -> (ControlStatus, u32) {
        if self.engine.container.read().post_track_id().is_some() {
            return (ControlStatus::InvalidArguments, 0);
        }
        self.create_track_with_kind(name, TrackKind::Post)
    }

    fn create_track_with_kind(&self, name: &str, kind: TrackKind) -> (ControlStatus, u32) {
        if self.engine.container.read().id_by_name(name).is_some() {
            return (ControlStatus::InvalidArguments, 0);
        }
        let id = self.engine.ids.next_id();
        let engine = self.engine.clone();
        let name = name.to_string();
        let posted = engine.post_lambda(move || {
            let channels = kind.channels();
            let track = Track::new(Processor::new(id, &name, &name, ProcessorType::Internal { uid: "track".into() }, channels, channels), kind);
            match engine.container.write().add_track(track) {
                Ok(()) => engine.notify(sushi_dispatch::Notification::TrackUpdate {
                    track: id,
                    action: sushi_dispatch::GraphAction::Added,
                }),
                Err(err) => warn!("deferred create_track failed: {err}"),
            }
        });
        match posted {
            Ok(()) => (ControlStatus::Ok, id),
            Err(err) => (err.into(), 0),
        }
    }

    pub fn delete_track(&self, track_id: u32) -> ControlStatus {
        if self.engine.container.read().track(track_id).is_none() {
            return ControlStatus::NotFound;
        }
        let engine = self.engine.clone();
        let posted = engine.post_lambda(move || {
            // Cascade: detach and delete every child processor bottom-up first.
            let child_ids: Vec<u32> = engine
                .container
                .read()
                .track_processors(track_id)
                .map(|ps| ps.iter().map(|p| p.id).collect())
                .unwrap_or_default();
            for processor_id in child_ids.into_iter().rev() {
                let mut container = engine.container.write();
                let _ = container.remove_from_track(processor_id, track_id);
                let _ = container.remove_processor(processor_id);
                drop(container);
                engine.midi.routing.remove_all_routes_for(processor_id);
                engine.bypass.remove(&processor_id);
                engine.processor_state.remove(&processor_id);
            }
            engine.audio_routing.remove_all_routes_for_track(track_id);
            match engine.container.write().remove_track(track_id) {
                Ok(()) => engine.notify(sushi_dispatch::Notification::TrackUpdate {
                    track: track_id,
                    action: sushi_dispatch::GraphAction::Deleted,
                }),
                Err(err) => warn!("deferred delete_track failed: {err}"),
            }
        });
        posted.map(|()| ControlStatus::Ok).unwrap_or_else(|err| err.into())
    }

    // -- processor mutations --------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn create_processor_on_track(
        &self,
        name: &str,
        uid: &str,
        file: &str,
        plugin_type: PluginType,
        track_id: u32,
        before: Option<u32>,
    ) -> (ControlStatus, u32) {
        if self.engine.container.read().id_by_name(name).is_some() {
            return (ControlStatus::InvalidArguments, 0);
        }
        let channels = match self.engine.container.read().track(track_id) {
            Some(track) => track.kind.channels(),
            None => return (ControlStatus::NotFound, 0),
        };
        let id = self.engine.ids.next_id();
        let engine = self.engine.clone();
        let name = name.to_string();
        let uid = uid.to_string();
        let file = file.to_string();
        let processor_type = if plugin_type == PluginType::Internal {
            ProcessorType::Internal { uid }
        } else {
            ProcessorType::External { uid, path: file, format: plugin_format_from_wire(plugin_type) }
        };
        let posted = engine.post_lambda(move || {
            let processor = Processor::new(id, &name, &name, processor_type, channels, channels);
            if let Err(err) = engine.container.write().add_processor(processor) {
                warn!("deferred create_processor_on_track failed: {err}");
                return;
            }
            match engine.container.write().add_to_track(id, track_id, before) {
                Ok(()) => engine.notify(sushi_dispatch::Notification::ProcessorUpdate {
                    processor: id,
                    action: sushi_dispatch::GraphAction::Added,
                }),
                Err(err) => warn!("deferred create_processor_on_track attach failed: {err}"),
            }
        });
        match posted {
            Ok(()) => (ControlStatus::Ok, id),
            Err(err) => (err.into(), 0),
        }
    }

    pub fn delete_processor_from_track(&self, processor_id: u32, track_id: u32) -> ControlStatus {
        if self.engine.container.read().track(track_id).is_none() {
            return ControlStatus::NotFound;
        }
        let engine = self.engine.clone();
        let posted = engine.post_lambda(move || {
            if engine.container.write().remove_from_track(processor_id, track_id).is_err() {
                warn!("deferred delete_processor_from_track: processor {processor_id} not on track {track_id}");
                return;
            }
            if engine.container.write().remove_processor(processor_id).is_ok() {
                engine.midi.routing.remove_all_routes_for(processor_id);
                engine.bypass.remove(&processor_id);
                engine.processor_state.remove(&processor_id);
                engine.notify(sushi_dispatch::Notification::ProcessorUpdate {
                    processor: processor_id,
                    action: sushi_dispatch::GraphAction::Deleted,
                });
            }
        });
        posted.map(|()| ControlStatus::Ok).unwrap_or_else(|err| err.into())
    }

    /// Move `processor` from `src_track` to `dst_track`. Must be restorable
    /// (spec.md §4.G): if attaching to the destination fails, the processor
    /// is re-inserted into the source at its original position; if that
    /// also fails, it is left free and a warning is logged.
    pub fn move_processor_on_track(&self, processor_id: u32, src_track: u32, dst_track: u32, before: Option<u32>) -> ControlStatus {
        {
            let container = self.engine.container.read();
            if container.track(src_track).is_none() || container.track(dst_track).is_none() {
                return ControlStatus::NotFound;
            }
        }
        let engine = self.engine.clone();
        let posted = engine.post_lambda(move || {
            let original_position = engine.container.read().track(src_track).and_then(|t| t.position_of(processor_id));
            if engine.container.write().remove_from_track(processor_id, src_track).is_err() {
                warn!("deferred move_processor_on_track: processor {processor_id} not on track {src_track}");
                return;
            }
            if engine.container.write().add_to_track(processor_id, dst_track, before).is_ok() {
                engine.notify(sushi_dispatch::Notification::ProcessorUpdate {
                    processor: processor_id,
                    action: sushi_dispatch::GraphAction::Added,
                });
                return;
            }
            // Compensate: restore at the original position in the source track.
            let restore_before = original_position.and_then(|pos| {
                engine.container.read().track(src_track).and_then(|t| t.chain.get(pos).copied())
            });
            if engine.container.write().add_to_track(processor_id, src_track, restore_before).is_err() {
                warn!(
                    "move_processor_on_track: processor {processor_id} could not be restored to track {src_track}; left unattached"
                );
            }
        });
        posted.map(|()| ControlStatus::Ok).unwrap_or_else(|err| err.into())
    }

    pub fn set_processor_bypass_state(&self, processor_id: u32, bypass_enabled: bool) -> ControlStatus {
        if self.engine.container.read().processor(processor_id).is_none() {
            return ControlStatus::NotFound;
        }
        match self.engine.post(sushi_dispatch::EventPayload::SetBypass { processor: processor_id, bypassed: bypass_enabled }) {
            Ok(()) => ControlStatus::Ok,
            Err(err) => err.into(),
        }
    }

    pub fn set_processor_state(&self, processor_id: u32, state: Vec<u8>) -> ControlStatus {
        if self.engine.container.read().processor(processor_id).is_none() {
            return ControlStatus::NotFound;
        }
        let engine = self.engine.clone();
        let posted = engine.post_lambda(move || {
            engine.processor_state.insert(processor_id, state);
        });
        posted.map(|()| ControlStatus::Ok).unwrap_or_else(|err| err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;

    #[test]
    fn create_and_query_track() {
        let engine = test_engine();
        let graph = AudioGraphController::new(engine.clone());
        let (status, id) = graph.create_track("T1", 2);
        assert_eq!(status, ControlStatus::Ok);
        engine.drain_worker();

        let (status, info) = graph.get_track_info(id);
        assert_eq!(status, ControlStatus::Ok);
        assert_eq!(info.unwrap().name, "T1");
    }

    #[test]
    fn duplicate_track_name_rejected_synchronously() {
        let engine = test_engine();
        let graph = AudioGraphController::new(engine.clone());
        graph.create_track("T1", 2);
        engine.drain_worker();
        let (status, _) = graph.create_track("T1", 2);
        assert_eq!(status, ControlStatus::InvalidArguments);
    }

    #[test]
    fn create_processor_then_delete_track_cascades() {
        let engine = test_engine();
        let graph = AudioGraphController::new(engine.clone());
        let (_, track_id) = graph.create_track("T1", 2);
        engine.drain_worker();
        let (status, proc_id) = graph.create_processor_on_track("G1", "sushi.testing.gain", "", PluginType::Internal, track_id, None);
        assert_eq!(status, ControlStatus::Ok);
        engine.drain_worker();

        assert_eq!(graph.get_processor_info(proc_id).0, ControlStatus::Ok);
        assert_eq!(graph.delete_track(track_id), ControlStatus::Ok);
        engine.drain_worker();

        assert_eq!(graph.get_track_info(track_id).0, ControlStatus::NotFound);
        assert_eq!(graph.get_processor_info(proc_id).0, ControlStatus::NotFound);
    }

    #[test]
    fn move_processor_between_tracks() {
        let engine = test_engine();
        let graph = AudioGraphController::new(engine.clone());
        let (_, src) = graph.create_track("Src", 2);
        let (_, dst) = graph.create_track("Dst", 2);
        engine.drain_worker();
        let (_, proc_id) = graph.create_processor_on_track("G1", "sushi.testing.gain", "", PluginType::Internal, src, None);
        engine.drain_worker();

        assert_eq!(graph.move_processor_on_track(proc_id, src, dst, None), ControlStatus::Ok);
        engine.drain_worker();

        let (_, src_processors) = graph.get_track_processors(src);
        let (_, dst_processors) = graph.get_track_processors(dst);
        assert!(src_processors.is_empty());
        assert_eq!(dst_processors.len(), 1);
    }

    #[test]
    fn bypass_request_starts_a_ramp_once_drained() {
        let engine = test_engine();
        let graph = AudioGraphController::new(engine.clone());
        let (_, track_id) = graph.create_track("T1", 2);
        engine.drain_worker();
        let (_, proc_id) = graph.create_processor_on_track("G1", "sushi.testing.gain", "", PluginType::Internal, track_id, None);
        engine.drain_worker();

        assert_eq!(graph.set_processor_bypass_state(proc_id, true), ControlStatus::Ok);
        engine.drain_worker();
        engine.drain_rt_default(0);

        // The target is visible immediately even though the crossfade ramp
        // itself only settles after RAMP_SAMPLES of crossfade_gain() calls.
        let (status, bypassed) = graph.get_processor_bypass_state(proc_id);
        assert_eq!(status, ControlStatus::Ok);
        assert!(bypassed);
        assert!(engine.bypass.get(&proc_id).unwrap().should_ramp());
    }
}
