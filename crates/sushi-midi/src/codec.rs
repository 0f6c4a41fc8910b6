//! Wire encode/decode for live (non-SMF) MIDI messages, via `midly`.

use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::error::{Error, Result};

/// A decoded channel-voice message, with the channel normalized to 1-based
/// to match [`sushi_dispatch::event::MidiChannel::Channel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    PolyAftertouch { channel: u8, note: u8, value: u8 },
    ChannelAftertouch { channel: u8, value: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    PitchBend { channel: u8, value: u16 },
}

/// Decode one raw MIDI message (status byte + data bytes, no running status).
pub fn decode(bytes: &[u8]) -> Result<DecodedMessage> {
    let event = LiveEvent::parse(bytes).map_err(|_| Error::MalformedMessage)?;
    match event {
        LiveEvent::Midi { channel, message } => {
            // midly channels are 0-based; the routing tables use 1-based.
            let channel = channel.as_int() + 1;
            Ok(match message {
                MidiMessage::NoteOn { key, vel } => {
                    if vel.as_int() == 0 {
                        DecodedMessage::NoteOff { channel, note: key.as_int(), velocity: 0 }
                    } else {
                        DecodedMessage::NoteOn { channel, note: key.as_int(), velocity: vel.as_int() }
                    }
                }
                MidiMessage::NoteOff { key, vel } => {
                    DecodedMessage::NoteOff { channel, note: key.as_int(), velocity: vel.as_int() }
                }
                MidiMessage::Aftertouch { key, vel } => {
                    DecodedMessage::PolyAftertouch { channel, note: key.as_int(), value: vel.as_int() }
                }
                MidiMessage::ChannelAftertouch { vel } => {
                    DecodedMessage::ChannelAftertouch { channel, value: vel.as_int() }
                }
                MidiMessage::Controller { controller, value } => {
                    DecodedMessage::ControlChange { channel, controller: controller.as_int(), value: value.as_int() }
                }
                MidiMessage::ProgramChange { program } => {
                    DecodedMessage::ProgramChange { channel, program: program.as_int() }
                }
                MidiMessage::PitchBend { bend } => {
                    DecodedMessage::PitchBend { channel, value: bend.0.as_int() }
                }
            })
        }
        _ => Err(Error::MalformedMessage),
    }
}

/// The MIDI beat clock realtime byte (0xF8), sent at 24 PPQN.
pub const MIDI_CLOCK_BYTE: u8 = 0xF8;

fn status_byte(kind: u8, channel_1_based: u8) -> u8 {
    kind | ((channel_1_based - 1) & 0x0F)
}

pub fn encode_note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [status_byte(0x90, channel), note & 0x7F, velocity & 0x7F]
}

pub fn encode_note_off(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [status_byte(0x80, channel), note & 0x7F, velocity & 0x7F]
}

pub fn encode_control_change(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [status_byte(0xB0, channel), controller & 0x7F, value & 0x7F]
}

pub fn encode_program_change(channel: u8, program: u8) -> [u8; 2] {
    [status_byte(0xC0, channel), program & 0x7F]
}

pub fn encode_pitch_bend(channel: u8, value: u16) -> [u8; 3] {
    let value = value & 0x3FFF;
    [status_byte(0xE0, channel), (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_note_on() {
        let bytes = encode_note_on(4, 60, 100);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, DecodedMessage::NoteOn { channel: 4, note: 60, velocity: 100 });
    }

    #[test]
    fn note_on_with_zero_velocity_decodes_as_note_off() {
        let bytes = encode_note_on(1, 60, 0);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, DecodedMessage::NoteOff { channel: 1, note: 60, velocity: 0 });
    }

    #[test]
    fn decode_control_change() {
        // Matches spec.md §8 scenario 4: B3 43 4B -> channel 4, cc 67, value 75.
        let bytes = [0xB3u8, 0x43, 0x4B];
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, DecodedMessage::ControlChange { channel: 4, controller: 0x43, value: 0x4B });
    }

    #[test]
    fn decode_pitch_bend() {
        let bytes = encode_pitch_bend(2, 8192);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, DecodedMessage::PitchBend { channel: 2, value: 8192 });
    }

    #[test]
    fn malformed_message_is_rejected() {
        assert!(decode(&[]).is_err());
    }
}
