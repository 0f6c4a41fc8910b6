//! The controller façade (spec.md §4.H): aggregates the twelve
//! sub-controllers by value and is the sole place internal notifications
//! and internal enums are converted to the public wire shapes (spec.md §6).

use std::sync::Arc;

use sushi_dispatch::notification::Listener as InternalListener;
use sushi_dispatch::{Notification as InternalNotification, NotificationKind};

use crate::controllers::{
    AudioGraphController, AudioRoutingController, CvGateController, KeyboardController, MidiController,
    OscController, ParameterController, ProgramController, SessionController, SystemController,
    TimingController, TransportController,
};
use crate::engine::Engine;
use crate::wire;

/// A listener over the public wire-shaped notifications.
pub type NotificationListener = Box<dyn Fn(&wire::Notification) + Send + Sync>;

/// Aggregates the twelve sub-controllers (spec.md §4.G) behind one handle.
/// Owns each sub-controller by value; all share the same underlying
/// [`Engine`] through their own `Arc` clones.
pub struct SushiController {
    engine: Arc<Engine>,
    pub system: SystemController,
    pub transport: TransportController,
    pub timing: TimingController,
    pub keyboard: KeyboardController,
    pub audio_graph: AudioGraphController,
    pub program: ProgramController,
    pub parameter: ParameterController,
    pub midi: MidiController,
    pub audio_routing: AudioRoutingController,
    pub cv_gate: CvGateController,
    pub osc: OscController,
    pub session: SessionController,
}

impl SushiController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            system: SystemController::new(engine.clone()),
            transport: TransportController::new(engine.clone()),
            timing: TimingController::new(engine.clone()),
            keyboard: KeyboardController::new(engine.clone()),
            audio_graph: AudioGraphController::new(engine.clone()),
            program: ProgramController::new(engine.clone()),
            parameter: ParameterController::new(engine.clone()),
            midi: MidiController::new(engine.clone()),
            audio_routing: AudioRoutingController::new(engine.clone()),
            cv_gate: CvGateController::new(engine.clone()),
            osc: OscController::new(engine.clone()),
            session: SessionController::new(engine.clone()),
            engine,
        }
    }

    /// The shared engine handle, for adapters that need to drive the
    /// dispatcher or attach an OSC frontend (`engine().osc`) directly.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Subscribe `listener` to every notification of `kind` (spec.md §4.H).
    /// The listener is non-owning: the façade does not keep it alive beyond
    /// what `Box` itself implies, matching [`sushi_dispatch::NotificationRegistry`].
    pub fn subscribe_to_notifications(&self, kind: NotificationKind, listener: NotificationListener) {
        let engine = self.engine.clone();
        let forwarding: InternalListener = Box::new(move |notification: &InternalNotification| {
            listener(&to_wire_notification(notification, &engine));
        });
        self.engine.notifications.write().subscribe(kind, forwarding);
    }
}

/// Demultiplex one internal notification into its public shape (spec.md
/// §4.H): audio-graph add/remove pass the action straight through, a
/// transport update is expanded into the current tagged snapshot, and
/// everything else is a field-for-field copy.
fn to_wire_notification(notification: &InternalNotification, engine: &Engine) -> wire::Notification {
    match notification {
        InternalNotification::ParameterChange { processor, parameter, value } => {
            wire::Notification::ParameterChange { processor: *processor, parameter: *parameter, value: *value }
        }
        InternalNotification::PropertyChange { processor, property, value } => {
            wire::Notification::PropertyChange { processor: *processor, property: *property, value: value.clone() }
        }
        InternalNotification::ProgramChange { processor, program } => {
            wire::Notification::ProgramChange { processor: *processor, program: *program }
        }
        InternalNotification::ProcessorUpdate { processor, action } => {
            wire::Notification::ProcessorUpdate { processor: *processor, action: *action }
        }
        InternalNotification::TrackUpdate { track, action } => {
            wire::Notification::TrackUpdate { track: *track, action: *action }
        }
        InternalNotification::TransportUpdate => wire::Notification::TransportUpdate(wire::TransportValue {
            tempo: engine.transport.tempo(),
            time_signature: wire::time_signature_to_wire(engine.transport.time_signature()),
            playing_mode: wire::playing_mode_to_wire(engine.transport.playing_mode()),
            sync_mode: wire::sync_mode_to_wire(engine.transport.sync_mode()),
        }),
        InternalNotification::CpuTimingUpdate { node } => wire::Notification::CpuTimingUpdate { node: *node },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::test_engine;
    use parking_lot::Mutex;
    use sushi_dispatch::EventPayload;

    #[test]
    fn aggregates_every_sub_controller() {
        let controller = SushiController::new(test_engine());
        assert_eq!(controller.system.get_input_audio_channel_count(), 8);
        assert_eq!(
            controller.cv_gate.connect_cv_input_to_parameter(0, 0, 0),
            crate::status::ControlStatus::UnsupportedOperation
        );
    }

    #[test]
    fn parameter_change_notification_reaches_subscriber_in_wire_shape() {
        let engine = test_engine();
        let controller = SushiController::new(engine.clone());
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        controller.subscribe_to_notifications(
            NotificationKind::ParameterChange,
            Box::new(move |n| {
                if let wire::Notification::ParameterChange { processor, parameter, value } = n {
                    *seen_clone.lock() = Some((*processor, *parameter, *value));
                }
            }),
        );

        engine
            .post(EventPayload::ParameterChange { processor: 1, parameter: 2, value: 0.75 })
            .unwrap();
        engine.drain_rt_default(0);

        assert_eq!(*seen.lock(), Some((1, 2, 0.75)));
    }

    #[test]
    fn transport_update_carries_the_current_snapshot() {
        let engine = test_engine();
        let controller = SushiController::new(engine.clone());
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        controller.subscribe_to_notifications(
            NotificationKind::TransportUpdate,
            Box::new(move |n| {
                if let wire::Notification::TransportUpdate(value) = n {
                    *seen_clone.lock() = Some(*value);
                }
            }),
        );

        assert_eq!(controller.transport.set_tempo(135.0), crate::status::ControlStatus::Ok);
        engine.drain_rt_default(0);

        let value = seen.lock().expect("transport update should have fired");
        assert_eq!(value.tempo, 135.0);
    }
}
