//! Raw MIDI decode and the outbound sink seam.

use beltane_types::{Button, Encoder, Event};

use crate::pads;

/// Outbound MIDI seam. Production wraps a midir output connection;
/// tests record the bytes.
pub trait MidiSink: Send {
    fn send(&mut self, data: &[u8]);
}

/// Decode a raw surface MIDI message into a bus event.
///
/// Pads arrive as notes 36-99 on channel 1 (note-on velocity 0 counts
/// as a release), buttons and encoders as control changes, the
/// touchstrip as pitch bend. Anything else — encoder touch notes,
/// clock, active sensing — is ignored.
pub fn decode_message(data: &[u8]) -> Option<Event> {
    if data.is_empty() {
        return None;
    }

    let status = data[0] & 0xF0;
    match status {
        0x90 => {
            // Note On (velocity 0 = release)
            let (note, velocity) = (*data.get(1)?, *data.get(2)?);
            let (row, col) = pads::pad_from_note(note)?;
            if velocity == 0 {
                Some(Event::PadReleased { row, col })
            } else {
                Some(Event::PadPressed { row, col, velocity })
            }
        }
        0x80 => {
            let note = *data.get(1)?;
            let (row, col) = pads::pad_from_note(note)?;
            Some(Event::PadReleased { row, col })
        }
        0xA0 => {
            // Polyphonic aftertouch on a pad
            let (note, pressure) = (*data.get(1)?, *data.get(2)?);
            let (row, col) = pads::pad_from_note(note)?;
            Some(Event::Aftertouch { row, col, pressure })
        }
        0xB0 => {
            let (cc, value) = (*data.get(1)?, *data.get(2)?);
            if let Some(encoder) = Encoder::from_cc(cc) {
                return Some(Event::EncoderRotated {
                    encoder,
                    delta: encoder_delta(value),
                });
            }
            let button = Button::from_cc(cc)?;
            if value > 0 {
                Some(Event::ButtonPressed { button })
            } else {
                Some(Event::ButtonReleased { button })
            }
        }
        0xD0 => {
            let pressure = *data.get(1)?;
            Some(Event::ChannelPressure { pressure })
        }
        0xE0 => {
            // Touchstrip pitch bend, 14-bit
            let (lsb, msb) = (*data.get(1)? as u16, *data.get(2)? as u16);
            Some(Event::Touchstrip {
                value: (msb << 7) | lsb,
            })
        }
        _ => None,
    }
}

/// Encoders send relative 7-bit two's complement: 1..=63 clockwise,
/// 127 down to 65 counter-clockwise.
fn encoder_delta(value: u8) -> i32 {
    if value < 64 {
        value as i32
    } else {
        value as i32 - 128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_press_maps_note_to_grid() {
        // Note 92 is the top-left pad
        let event = decode_message(&[0x90, 92, 100]).unwrap();
        assert_eq!(
            event,
            Event::PadPressed {
                row: 0,
                col: 0,
                velocity: 100
            }
        );
        // Note 36 is the bottom-left pad
        let event = decode_message(&[0x90, 36, 1]).unwrap();
        assert_eq!(
            event,
            Event::PadPressed {
                row: 7,
                col: 0,
                velocity: 1
            }
        );
    }

    #[test]
    fn velocity_zero_is_a_release() {
        let event = decode_message(&[0x90, 50, 0]).unwrap();
        assert!(matches!(event, Event::PadReleased { .. }));
    }

    #[test]
    fn note_off_is_a_release() {
        let event = decode_message(&[0x80, 50, 64]).unwrap();
        assert!(matches!(event, Event::PadReleased { .. }));
    }

    #[test]
    fn non_pad_note_is_ignored() {
        assert!(decode_message(&[0x90, 10, 100]).is_none());
        assert!(decode_message(&[0x90, 110, 100]).is_none());
    }

    #[test]
    fn button_press_and_release() {
        let event = decode_message(&[0xB0, 85, 127]).unwrap();
        assert_eq!(
            event,
            Event::ButtonPressed {
                button: Button::Play
            }
        );
        let event = decode_message(&[0xB0, 85, 0]).unwrap();
        assert_eq!(
            event,
            Event::ButtonReleased {
                button: Button::Play
            }
        );
    }

    #[test]
    fn encoder_deltas_are_twos_complement() {
        let event = decode_message(&[0xB0, 71, 1]).unwrap();
        assert_eq!(
            event,
            Event::EncoderRotated {
                encoder: Encoder::Track(0),
                delta: 1
            }
        );
        let event = decode_message(&[0xB0, 71, 127]).unwrap();
        assert_eq!(
            event,
            Event::EncoderRotated {
                encoder: Encoder::Track(0),
                delta: -1
            }
        );
        let event = decode_message(&[0xB0, 14, 125]).unwrap();
        assert_eq!(
            event,
            Event::EncoderRotated {
                encoder: Encoder::Tempo,
                delta: -3
            }
        );
    }

    #[test]
    fn channel_pressure_decodes() {
        let event = decode_message(&[0xD0, 77]).unwrap();
        assert_eq!(event, Event::ChannelPressure { pressure: 77 });
    }

    #[test]
    fn touchstrip_assembles_fourteen_bits() {
        let event = decode_message(&[0xE0, 0x7F, 0x7F]).unwrap();
        assert_eq!(event, Event::Touchstrip { value: 16383 });
        let event = decode_message(&[0xE0, 0x00, 0x40]).unwrap();
        assert_eq!(event, Event::Touchstrip { value: 8192 });
    }

    #[test]
    fn unknown_and_short_messages_are_ignored() {
        assert!(decode_message(&[]).is_none());
        assert!(decode_message(&[0x90, 36]).is_none());
        assert!(decode_message(&[0xF8]).is_none());
        assert!(decode_message(&[0xB0, 2, 127]).is_none());
    }
}
