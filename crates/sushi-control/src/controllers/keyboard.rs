//! Keyboard sub-controller (spec.md §4.G Keyboard): injects note/CV events
//! as if they arrived over MIDI, timestamped for immediate RT delivery.

use std::sync::Arc;

use sushi_dispatch::event::EventPayload;

use crate::engine::Engine;
use crate::status::ControlStatus;
use crate::wire::{midi_channel_from_wire, MidiChannel};

pub struct KeyboardController {
    engine: Arc<Engine>,
}

impl KeyboardController {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn send_note_on(&self, track: u32, channel: MidiChannel, note: u8, velocity: f32) -> ControlStatus {
        self.post(EventPayload::NoteOn { track, channel: midi_channel_from_wire(channel), note, velocity })
    }

    pub fn send_note_off(&self, track: u32, channel: MidiChannel, note: u8, velocity: f32) -> ControlStatus {
        self.post(EventPayload::NoteOff { track, channel: midi_channel_from_wire(channel), note, velocity })
    }

    pub fn send_note_aftertouch(&self, track: u32, channel: MidiChannel, note: u8, value: f32) -> ControlStatus {
        self.post(EventPayload::NoteAftertouch { track, channel: midi_channel_from_wire(channel), note, value })
    }

    pub fn send_aftertouch(&self, track: u32, channel: MidiChannel, value: f32) -> ControlStatus {
        self.post(EventPayload::Aftertouch { track, channel: midi_channel_from_wire(channel), value })
    }

    pub fn send_pitch_bend(&self, track: u32, channel: MidiChannel, value: f32) -> ControlStatus {
        self.post(EventPayload::PitchBend { track, channel: midi_channel_from_wire(channel), value })
    }

    pub fn send_modulation(&self, track: u32, channel: MidiChannel, value: f32) -> ControlStatus {
        self.post(EventPayload::Modulation { track, channel: midi_channel_from_wire(channel), value })
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

    #[test]
    fn note_on_posts_successfully() {
        let keyboard = KeyboardController::new(test_engine());
        assert_eq!(keyboard.send_note_on(0, MidiChannel::Channel(1), 60, 1.0), ControlStatus::Ok);
    }
}
