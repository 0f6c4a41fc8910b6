//! Engine notifications and the subscriber registry (spec.md §4.D, §4.H).

/// The classes of notification a listener may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    ParameterChange,
    PropertyChange,
    ProgramChange,
    ProcessorUpdate,
    TrackUpdate,
    TransportUpdate,
    CpuTimingUpdate,
}

/// Added/deleted tag shared by processor and track update notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphAction {
    Added,
    Deleted,
}

/// The payload delivered to a subscriber. Internal types only; the façade
/// (spec.md §4.H) is solely responsible for converting these into wire
/// shapes for external clients.
#[derive(Debug, Clone)]
pub enum Notification {
    ParameterChange { processor: u32, parameter: u32, value: f32 },
    PropertyChange { processor: u32, property: u32, value: String },
    ProgramChange { processor: u32, program: u32 },
    ProcessorUpdate { processor: u32, action: GraphAction },
    TrackUpdate { track: u32, action: GraphAction },
    TransportUpdate,
    CpuTimingUpdate { node: i64 },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::ParameterChange { .. } => NotificationKind::ParameterChange,
            Notification::PropertyChange { .. } => NotificationKind::PropertyChange,
            Notification::ProgramChange { .. } => NotificationKind::ProgramChange,
            Notification::ProcessorUpdate { .. } => NotificationKind::ProcessorUpdate,
            Notification::TrackUpdate { .. } => NotificationKind::TrackUpdate,
            Notification::TransportUpdate => NotificationKind::TransportUpdate,
            Notification::CpuTimingUpdate { .. } => NotificationKind::CpuTimingUpdate,
        }
    }
}

pub type Listener = Box<dyn Fn(&Notification) + Send + Sync>;

/// Per-kind vectors of non-owning listeners (spec.md §4.H
/// `subscribe_to_notifications`). "Non-owning" here means the registry does
/// not keep the listener's subscriber alive; callers own that lifetime.
#[derive(Default)]
pub struct NotificationRegistry {
    listeners: std::collections::HashMap<NotificationKind, Vec<Listener>>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: NotificationKind, listener: Listener) {
        self.listeners.entry(kind).or_default().push(listener);
    }

    /// Dispatch `notification` to every listener registered for its kind.
    pub fn dispatch(&self, notification: &Notification) {
        if let Some(listeners) = self.listeners.get(&notification.kind()) {
            for listener in listeners {
                listener(notification);
            }
        }
    }

    pub fn listener_count(&self, kind: NotificationKind) -> usize {
        self.listeners.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dispatch_reaches_only_matching_kind() {
        let mut registry = NotificationRegistry::new();
        let param_hits = Arc::new(AtomicUsize::new(0));
        let track_hits = Arc::new(AtomicUsize::new(0));

        let p = param_hits.clone();
        registry.subscribe(NotificationKind::ParameterChange, Box::new(move |_| {
            p.fetch_add(1, Ordering::SeqCst);
        }));
        let t = track_hits.clone();
        registry.subscribe(NotificationKind::TrackUpdate, Box::new(move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        }));

        registry.dispatch(&Notification::ParameterChange { processor: 1, parameter: 2, value: 0.5 });

        assert_eq!(param_hits.load(Ordering::SeqCst), 1);
        assert_eq!(track_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn multiple_listeners_all_fire() {
        let mut registry = NotificationRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let h = hits.clone();
            registry.subscribe(NotificationKind::TransportUpdate, Box::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }));
        }
        registry.dispatch(&Notification::TransportUpdate);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
