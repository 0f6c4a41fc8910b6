//! The processor container: owning registry of processors and tracks.
//!
//! Mutated exclusively from the event dispatcher's worker thread (spec.md
//! §5). The RT thread must only ever see a post-drain snapshot, never an
//! in-flight mutation (spec.md §9 open question) — callers that need RT-safe
//! access should publish a [`ContainerSnapshot`] via `arc_swap::ArcSwap`
//! after each event drain rather than reaching into the container directly.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::processor::Processor;
use crate::track::{Track, TrackKind};

/// Owning registry of all processors and tracks.
///
/// All operations are synchronous, allocate only on the worker thread, and
/// never block. They return success/failure rather than panicking.
#[derive(Debug, Default)]
pub struct ProcessorContainer {
    processors: HashMap<u32, Processor>,
    tracks: HashMap<u32, Track>,
    name_to_id: HashMap<String, u32>,
    /// Deterministic creation order, independent of HashMap iteration order.
    track_order: Vec<u32>,
    pre_track: Option<u32>,
    post_track: Option<u32>,
}

impl ProcessorContainer {
    pub fn new() -> Self {
        Self::default()
    }

    // -- registration -------------------------------------------------

    /// Register a free-standing processor (not yet on any track).
    pub fn add_processor(&mut self, processor: Processor) -> Result<()> {
        if self.name_to_id.contains_key(&processor.name) {
            return Err(Error::DuplicateName(processor.name));
        }
        self.name_to_id.insert(processor.name.clone(), processor.id);
        self.processors.insert(processor.id, processor);
        Ok(())
    }

    /// Register a track. Enforces the at-most-one pre/post invariant.
    pub fn add_track(&mut self, track: Track) -> Result<()> {
        if self.name_to_id.contains_key(&track.processor.name) {
            return Err(Error::DuplicateName(track.processor.name.clone()));
        }
        match track.kind {
            TrackKind::Pre if self.pre_track.is_some() => return Err(Error::PreTrackExists),
            TrackKind::Post if self.post_track.is_some() => return Err(Error::PostTrackExists),
            _ => {}
        }
        let id = track.id();
        match track.kind {
            TrackKind::Pre => self.pre_track = Some(id),
            TrackKind::Post => self.post_track = Some(id),
            _ => {}
        }
        self.name_to_id.insert(track.processor.name.clone(), id);
        self.track_order.push(id);
        self.tracks.insert(id, track);
        Ok(())
    }

    /// Remove a free processor. Fails if it is still attached to a track.
    pub fn remove_processor(&mut self, processor_id: u32) -> Result<()> {
        if self.track_containing(processor_id).is_some() {
            return Err(Error::ProcessorStillAttached(processor_id));
        }
        let processor = self
            .processors
            .remove(&processor_id)
            .ok_or(Error::UnknownProcessor(processor_id))?;
        self.name_to_id.remove(&processor.name);
        Ok(())
    }

    /// Remove a track. Fails if its chain is non-empty.
    pub fn remove_track(&mut self, track_id: u32) -> Result<()> {
        let track = self.tracks.get(&track_id).ok_or(Error::UnknownTrack(track_id))?;
        if !track.is_empty() {
            return Err(Error::TrackNotEmpty(track_id));
        }
        let track = self.tracks.remove(&track_id).unwrap();
        self.name_to_id.remove(&track.processor.name);
        self.track_order.retain(|&id| id != track_id);
        if self.pre_track == Some(track_id) {
            self.pre_track = None;
        }
        if self.post_track == Some(track_id) {
            self.post_track = None;
        }
        Ok(())
    }

    /// Attach a free processor to a track's chain.
    pub fn add_to_track(&mut self, processor_id: u32, track_id: u32, before: Option<u32>) -> Result<()> {
        if !self.processors.contains_key(&processor_id) {
            return Err(Error::UnknownProcessor(processor_id));
        }
        if let Some(anchor) = before {
            let track = self.tracks.get(&track_id).ok_or(Error::UnknownTrack(track_id))?;
            if !track.contains(anchor) {
                return Err(Error::UnknownProcessor(anchor));
            }
        }
        let track = self.tracks.get_mut(&track_id).ok_or(Error::UnknownTrack(track_id))?;
        if track.insert(processor_id, before) {
            Ok(())
        } else {
            Err(Error::UnknownProcessor(before.unwrap_or(processor_id)))
        }
    }

    /// Detach a processor from a track's chain (the processor remains registered as free).
    pub fn remove_from_track(&mut self, processor_id: u32, track_id: u32) -> Result<()> {
        let track = self.tracks.get_mut(&track_id).ok_or(Error::UnknownTrack(track_id))?;
        if track.remove(processor_id) {
            Ok(())
        } else {
            Err(Error::UnknownProcessor(processor_id))
        }
    }

    // -- lookup ---------------------------------------------------------

    pub fn processor(&self, id: u32) -> Option<&Processor> {
        self.processors.get(&id)
    }

    pub fn processor_mut(&mut self, id: u32) -> Option<&mut Processor> {
        self.processors.get_mut(&id)
    }

    pub fn processor_by_name(&self, name: &str) -> Option<&Processor> {
        self.name_to_id.get(name).and_then(|id| self.processors.get(id))
    }

    pub fn track(&self, id: u32) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn track_mut(&mut self, id: u32) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn track_by_name(&self, name: &str) -> Option<&Track> {
        self.name_to_id.get(name).and_then(|id| self.tracks.get(id))
    }

    pub fn id_by_name(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    /// All tracks, in deterministic creation order.
    pub fn all_tracks(&self) -> Vec<&Track> {
        self.track_order.iter().filter_map(|id| self.tracks.get(id)).collect()
    }

    /// All processors (free or attached), in arbitrary-but-stable id order.
    pub fn all_processors(&self) -> Vec<&Processor> {
        let mut ids: Vec<u32> = self.processors.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.processors.get(&id)).collect()
    }

    /// Processors attached to `track_id`, in chain order.
    pub fn track_processors(&self, track_id: u32) -> Option<Vec<&Processor>> {
        let track = self.tracks.get(&track_id)?;
        Some(track.chain.iter().filter_map(|id| self.processors.get(id)).collect())
    }

    /// The track, if any, that currently owns `processor_id`.
    pub fn track_containing(&self, processor_id: u32) -> Option<u32> {
        self.track_order
            .iter()
            .find(|&&track_id| self.tracks.get(&track_id).is_some_and(|t| t.contains(processor_id)))
            .copied()
    }

    pub fn pre_track_id(&self) -> Option<u32> {
        self.pre_track
    }

    pub fn post_track_id(&self) -> Option<u32> {
        self.post_track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ProcessorType;

    fn make_processor(id: u32, name: &str) -> Processor {
        Processor::new(id, name, name, ProcessorType::Internal { uid: "sushi.testing.gain".into() }, 2, 2)
    }

    fn make_track(id: u32, name: &str, kind: TrackKind) -> Track {
        Track::new(make_processor(id, name), kind)
    }

    #[test]
    fn add_and_lookup_roundtrip() {
        let mut c = ProcessorContainer::new();
        c.add_track(make_track(0, "T1", TrackKind::Regular { channels: 2 })).unwrap();
        c.add_processor(make_processor(1, "G1")).unwrap();
        c.add_to_track(1, 0, None).unwrap();

        assert_eq!(c.track_processors(0).unwrap().len(), 1);
        assert_eq!(c.track_containing(1), Some(0));
        assert_eq!(c.id_by_name("G1"), Some(1));
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut c = ProcessorContainer::new();
        c.add_processor(make_processor(1, "G1")).unwrap();
        assert!(c.add_processor(make_processor(2, "G1")).is_err());
    }

    #[test]
    fn remove_processor_fails_while_attached() {
        let mut c = ProcessorContainer::new();
        c.add_track(make_track(0, "T1", TrackKind::Regular { channels: 2 })).unwrap();
        c.add_processor(make_processor(1, "G1")).unwrap();
        c.add_to_track(1, 0, None).unwrap();

        assert!(c.remove_processor(1).is_err());
        c.remove_from_track(1, 0).unwrap();
        assert!(c.remove_processor(1).is_ok());
    }

    #[test]
    fn remove_track_fails_when_non_empty() {
        let mut c = ProcessorContainer::new();
        c.add_track(make_track(0, "T1", TrackKind::Regular { channels: 2 })).unwrap();
        c.add_processor(make_processor(1, "G1")).unwrap();
        c.add_to_track(1, 0, None).unwrap();

        assert!(c.remove_track(0).is_err());
        c.remove_from_track(1, 0).unwrap();
        assert!(c.remove_track(0).is_ok());
    }

    #[test]
    fn at_most_one_pre_and_post_track() {
        let mut c = ProcessorContainer::new();
        c.add_track(make_track(0, "pre1", TrackKind::Pre)).unwrap();
        assert!(c.add_track(make_track(1, "pre2", TrackKind::Pre)).is_err());
        c.add_track(make_track(2, "post1", TrackKind::Post)).unwrap();
        assert!(c.add_track(make_track(3, "post2", TrackKind::Post)).is_err());
    }

    #[test]
    fn insert_before_anchor_preserves_order() {
        let mut c = ProcessorContainer::new();
        c.add_track(make_track(0, "T1", TrackKind::Regular { channels: 2 })).unwrap();
        c.add_processor(make_processor(1, "A")).unwrap();
        c.add_processor(make_processor(2, "B")).unwrap();
        c.add_to_track(1, 0, None).unwrap();
        c.add_to_track(2, 0, Some(1)).unwrap();

        let chain: Vec<u32> = c.track(0).unwrap().chain.clone();
        assert_eq!(chain, vec![2, 1]);
    }

    #[test]
    fn chain_order_is_deterministic() {
        let mut c = ProcessorContainer::new();
        c.add_track(make_track(0, "T1", TrackKind::Regular { channels: 2 })).unwrap();
        for i in 1..=5u32 {
            c.add_processor(make_processor(i, &format!("P{i}"))).unwrap();
            c.add_to_track(i, 0, None).unwrap();
        }
        let chain: Vec<u32> = c.track(0).unwrap().chain.clone();
        assert_eq!(chain, vec![1, 2, 3, 4, 5]);
    }
}
