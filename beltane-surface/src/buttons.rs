//! Button LED output with write dedup.

use std::collections::HashMap;

use beltane_types::{Button, LedColor};

use crate::midi::MidiSink;

pub struct ButtonLeds {
    sink: Box<dyn MidiSink>,
    written: HashMap<Button, u8>,
}

impl ButtonLeds {
    pub fn new(sink: Box<dyn MidiSink>) -> Self {
        Self {
            sink,
            written: HashMap::new(),
        }
    }

    /// Write a button LED, suppressed when it matches the cached value.
    pub fn set_color(&mut self, button: Button, color: LedColor) {
        let index = color.index();
        if self.written.get(&button) == Some(&index) {
            return;
        }
        self.sink.send(&[0xB0, button.cc(), index]);
        self.written.insert(button, index);
    }

    /// Drop the dedup cache so the next writes reach the hardware.
    pub fn invalidate(&mut self) {
        self.written.clear();
    }

    /// Black out every LED and drop the cache.
    pub fn clear_all(&mut self) {
        self.invalidate();
        for button in Button::all() {
            self.set_color(button, LedColor::Black);
        }
        self.invalidate();
    }

    /// Initial dim state after connect.
    pub fn init_defaults(&mut self) {
        for button in Button::all() {
            self.set_color(button, LedColor::DarkGray);
        }
        log::debug!(target: "buttons", "button defaults initialized");
    }

    /// Transport LEDs follow playback state in every mode.
    pub fn set_transport_state(&mut self, playing: bool, recording: bool) {
        self.set_color(
            Button::Play,
            if playing {
                LedColor::Green
            } else {
                LedColor::DarkGray
            },
        );
        self.set_color(
            Button::Record,
            if recording {
                LedColor::Red
            } else {
                LedColor::DarkGray
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<Vec<u8>>>>);

    impl MidiSink for RecordingSink {
        fn send(&mut self, data: &[u8]) {
            self.0.lock().unwrap().push(data.to_vec());
        }
    }

    fn leds() -> (RecordingSink, ButtonLeds) {
        let sink = RecordingSink::default();
        let leds = ButtonLeds::new(Box::new(sink.clone()));
        (sink, leds)
    }

    #[test]
    fn repeated_color_is_suppressed() {
        let (sink, mut leds) = leds();
        leds.set_color(Button::Play, LedColor::Green);
        leds.set_color(Button::Play, LedColor::Green);
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalidate_forces_rewrite() {
        let (sink, mut leds) = leds();
        leds.set_color(Button::Play, LedColor::Green);
        leds.invalidate();
        leds.set_color(Button::Play, LedColor::Green);
        assert_eq!(sink.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn transport_state_drives_play_and_record() {
        let (sink, mut leds) = leds();
        leds.set_transport_state(true, false);
        let messages = sink.0.lock().unwrap().clone();
        assert_eq!(
            messages[0],
            vec![0xB0, Button::Play.cc(), LedColor::Green.index()]
        );
        assert_eq!(
            messages[1],
            vec![0xB0, Button::Record.cc(), LedColor::DarkGray.index()]
        );
    }

    #[test]
    fn clear_all_blacks_every_button() {
        let (sink, mut leds) = leds();
        leds.init_defaults();
        leds.clear_all();
        let messages = sink.0.lock().unwrap();
        let blacks = messages
            .iter()
            .filter(|m| m[2] == LedColor::Black.index())
            .count();
        assert_eq!(blacks, Button::all().len());
    }
}
