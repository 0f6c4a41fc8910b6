//! The event dispatcher: in-queue, RT staging area and poster registry.
//!
//! Grounded on `tutti-core`'s `crossbeam_channel`-based command-queue
//! pattern (seen throughout `tutti-midi-io`'s port/output managers), adapted
//! to the two-queue, two-class model spec.md §4.D describes.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashSet};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::error::{Error, Result};
use crate::event::{CompletionStatus, Event, EventClass, EventId, EventPayload, PosterId, Timestamp};

/// Bound on the in-queue; posting beyond this fails with `queue_full`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct PendingRt {
    timestamp_key: u64,
    id: EventId,
    poster: PosterId,
    payload: EventPayload,
    completion: Option<crate::event::CompletionCallback>,
}

impl PartialEq for PendingRt {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp_key == other.timestamp_key && self.id == other.id
    }
}
impl Eq for PendingRt {}

impl Ord for PendingRt {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed so `BinaryHeap` (a max-heap) pops the earliest timestamp
        // first, breaking ties by the lower (older) event id.
        other
            .timestamp_key
            .cmp(&self.timestamp_key)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for PendingRt {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

/// The control-plane event dispatcher.
///
/// `post_event` is callable from any thread. [`EventDispatcher::drain_to_worker`]
/// must be called from the single control worker thread; [`EventDispatcher::drain_rt`]
/// must be called from the single RT thread at the top of every audio block.
pub struct EventDispatcher {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
    rt_pending: BinaryHeap<PendingRt>,
    registered_posters: HashSet<PosterId>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl EventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self {
            sender,
            receiver,
            rt_pending: BinaryHeap::new(),
            registered_posters: HashSet::new(),
        }
    }

    pub fn register_poster(&mut self, poster: PosterId) {
        self.registered_posters.insert(poster);
    }

    pub fn unregister_poster(&mut self, poster: PosterId) {
        self.registered_posters.remove(&poster);
    }

    pub fn is_poster_registered(&self, poster: PosterId) -> bool {
        self.registered_posters.contains(&poster)
    }

    /// Post an event. Wait-free for the caller; fails if the in-queue is full.
    pub fn post_event(&self, event: Event) -> Result<()> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull,
            TrySendError::Disconnected(_) => Error::QueueFull,
        })
    }

    /// Drain every event currently sitting in the in-queue. `Worker`-class
    /// events (lambdas) execute immediately on the caller's thread.
    /// `RtInline`-class events move into the RT staging heap for
    /// [`drain_rt`] to pick up. Returns the number of events drained.
    pub fn drain_to_worker(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            count += 1;
            let poster_live = self.registered_posters.is_empty() || self.is_poster_registered(event.poster);
            match event.class() {
                EventClass::Worker => {
                    let Event { payload, completion, .. } = event;
                    let status = match payload {
                        EventPayload::Lambda(f) => {
                            f();
                            CompletionStatus::HandledOk
                        }
                        _ => CompletionStatus::UnrecognizedEvent,
                    };
                    if poster_live {
                        if let Some(cb) = completion {
                            cb(status);
                        }
                    }
                }
                EventClass::RtInline => {
                    let timestamp_key = match event.timestamp {
                        Timestamp::Immediate => 0,
                        Timestamp::At(t) => t,
                    };
                    self.rt_pending.push(PendingRt {
                        timestamp_key,
                        id: event.id,
                        poster: event.poster,
                        payload: event.payload,
                        completion: event.completion,
                    });
                }
            }
        }
        count
    }

    /// Drain RT-class events that are ready at `current_sample`, applying
    /// each through `apply`. `Timestamp::Immediate` events (staged with key
    /// 0) are always ready. Returns the number of events applied.
    pub fn drain_rt(&mut self, current_sample: u64, mut apply: impl FnMut(&EventPayload) -> CompletionStatus) -> usize {
        let mut count = 0;
        loop {
            let ready = match self.rt_pending.peek() {
                Some(pending) => pending.timestamp_key <= current_sample,
                None => false,
            };
            if !ready {
                break;
            }
            let pending = self.rt_pending.pop().unwrap();
            let status = apply(&pending.payload);
            count += 1;
            let poster_live = self.registered_posters.is_empty() || self.is_poster_registered(pending.poster);
            if poster_live {
                if let Some(cb) = pending.completion {
                    cb(status);
                }
            }
        }
        count
    }

    pub fn rt_pending_len(&self) -> usize {
        self.rt_pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MidiChannel;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    fn make_event(id: EventId, poster: PosterId, timestamp: Timestamp, payload: EventPayload) -> Event {
        Event { id, poster, timestamp, payload, completion: None }
    }

    #[test]
    fn lambda_executes_on_worker_drain() {
        let mut d = EventDispatcher::new(8);
        let ran = Arc::new(AtomicBool::new(false));
        let r = ran.clone();
        let ev = Event {
            id: 0,
            poster: PosterId::Test,
            timestamp: Timestamp::Immediate,
            payload: EventPayload::Lambda(Box::new(move || {
                r.store(true, Ordering::SeqCst);
            })),
            completion: None,
        };
        d.post_event(ev).unwrap();
        assert_eq!(d.drain_to_worker(), 1);
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn rt_inline_event_waits_for_drain_rt() {
        let mut d = EventDispatcher::new(8);
        let ev = make_event(
            0,
            PosterId::Controller,
            Timestamp::Immediate,
            EventPayload::SetBypass { processor: 1, bypassed: true },
        );
        d.post_event(ev).unwrap();
        d.drain_to_worker();
        assert_eq!(d.rt_pending_len(), 1);

        let applied = Arc::new(AtomicU32::new(0));
        let a = applied.clone();
        let n = d.drain_rt(0, move |_payload| {
            a.fetch_add(1, Ordering::SeqCst);
            CompletionStatus::HandledOk
        });
        assert_eq!(n, 1);
        assert_eq!(applied.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn future_dated_event_waits_for_sample_clock() {
        let mut d = EventDispatcher::new(8);
        let ev = make_event(
            0,
            PosterId::Controller,
            Timestamp::At(1000),
            EventPayload::SetBypass { processor: 1, bypassed: true },
        );
        d.post_event(ev).unwrap();
        d.drain_to_worker();

        assert_eq!(d.drain_rt(500, |_| CompletionStatus::HandledOk), 0);
        assert_eq!(d.drain_rt(1000, |_| CompletionStatus::HandledOk), 1);
    }

    #[test]
    fn ties_break_by_event_id() {
        let mut d = EventDispatcher::new(8);
        for id in [2u64, 0, 1] {
            let ev = make_event(id, PosterId::Controller, Timestamp::At(500), EventPayload::SetBypass {
                processor: id as u32,
                bypassed: true,
            });
            d.post_event(ev).unwrap();
        }
        d.drain_to_worker();
        let mut seen = Vec::new();
        d.drain_rt(500, |payload| {
            if let EventPayload::SetBypass { processor, .. } = payload {
                seen.push(*processor);
            }
            CompletionStatus::HandledOk
        });
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn full_queue_rejects_post() {
        let d = EventDispatcher::new(1);
        let ev1 = make_event(0, PosterId::Test, Timestamp::Immediate, EventPayload::SetBypass {
            processor: 0,
            bypassed: false,
        });
        let ev2 = make_event(1, PosterId::Test, Timestamp::Immediate, EventPayload::SetBypass {
            processor: 1,
            bypassed: false,
        });
        d.post_event(ev1).unwrap();
        assert!(matches!(d.post_event(ev2), Err(Error::QueueFull)));
    }

    #[test]
    fn deregistered_poster_still_executes_but_suppresses_completion() {
        let mut d = EventDispatcher::new(8);
        d.register_poster(PosterId::Controller);
        d.register_poster(PosterId::Test);

        let fired = Arc::new(AtomicBool::new(false));
        let f = fired.clone();
        let ev = Event {
            id: 0,
            poster: PosterId::Controller,
            timestamp: Timestamp::Immediate,
            payload: EventPayload::Lambda(Box::new(|| {})),
            completion: Some(Box::new(move |_status| {
                f.store(true, Ordering::SeqCst);
            })),
        };
        d.post_event(ev).unwrap();
        d.unregister_poster(PosterId::Controller);
        d.drain_to_worker();

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn channel_omni_is_distinct_from_numbered_channel() {
        assert_ne!(MidiChannel::Omni, MidiChannel::Channel(1));
    }
}
