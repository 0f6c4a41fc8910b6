//! Event dispatcher: the only sanctioned channel for control-plane
//! mutations that touch RT state (spec.md §4.D).

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod notification;

pub use dispatcher::{EventDispatcher, DEFAULT_QUEUE_CAPACITY};
pub use error::{Error, Result};
pub use event::{
    CompletionCallback, CompletionStatus, Event, EventClass, EventId, EventIdGenerator, EventPayload,
    MidiChannel, PosterId, Timestamp,
};
pub use notification::{GraphAction, Listener, Notification, NotificationKind, NotificationRegistry};
