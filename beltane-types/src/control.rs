//! Surface control identifiers: buttons, encoders, LED colors.
//!
//! CC numbers follow the Push 2 MIDI mapping. Pads are not listed here;
//! they arrive as notes and are addressed by (row, col).

use serde::{Deserialize, Serialize};

/// A physical button on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    TapTempo,
    Metronome,
    Delete,
    Undo,
    Mute,
    Solo,
    Stop,
    Convert,
    DoubleLoop,
    Quantize,
    Duplicate,
    New,
    FixedLength,
    Automate,
    Record,
    Play,
    Master,
    Setup,
    User,
    AddDevice,
    AddTrack,
    Device,
    Browse,
    Mix,
    Clip,
    Note,
    Session,
    Scale,
    Layout,
    Repeat,
    Accent,
    OctaveDown,
    OctaveUp,
    PageLeft,
    PageRight,
    Shift,
    Select,
    Up,
    Down,
    Left,
    Right,
    /// Buttons directly above the display, 0-7 left to right.
    UpperRow(u8),
    /// Buttons directly below the display, 0-7 left to right.
    LowerRow(u8),
    /// Right-hand column next to the pad grid, 0-7 top to bottom.
    Scene(u8),
}

impl Button {
    pub fn from_cc(cc: u8) -> Option<Self> {
        Some(match cc {
            3 => Self::TapTempo,
            9 => Self::Metronome,
            118 => Self::Delete,
            119 => Self::Undo,
            60 => Self::Mute,
            61 => Self::Solo,
            29 => Self::Stop,
            35 => Self::Convert,
            117 => Self::DoubleLoop,
            116 => Self::Quantize,
            88 => Self::Duplicate,
            87 => Self::New,
            90 => Self::FixedLength,
            89 => Self::Automate,
            86 => Self::Record,
            85 => Self::Play,
            28 => Self::Master,
            30 => Self::Setup,
            59 => Self::User,
            52 => Self::AddDevice,
            53 => Self::AddTrack,
            110 => Self::Device,
            111 => Self::Browse,
            112 => Self::Mix,
            113 => Self::Clip,
            50 => Self::Note,
            51 => Self::Session,
            58 => Self::Scale,
            31 => Self::Layout,
            56 => Self::Repeat,
            57 => Self::Accent,
            54 => Self::OctaveDown,
            55 => Self::OctaveUp,
            62 => Self::PageLeft,
            63 => Self::PageRight,
            49 => Self::Shift,
            48 => Self::Select,
            46 => Self::Up,
            47 => Self::Down,
            44 => Self::Left,
            45 => Self::Right,
            102..=109 => Self::UpperRow(cc - 102),
            20..=27 => Self::LowerRow(cc - 20),
            36..=43 => Self::Scene(43 - cc),
            _ => return None,
        })
    }

    pub fn cc(self) -> u8 {
        match self {
            Self::TapTempo => 3,
            Self::Metronome => 9,
            Self::Delete => 118,
            Self::Undo => 119,
            Self::Mute => 60,
            Self::Solo => 61,
            Self::Stop => 29,
            Self::Convert => 35,
            Self::DoubleLoop => 117,
            Self::Quantize => 116,
            Self::Duplicate => 88,
            Self::New => 87,
            Self::FixedLength => 90,
            Self::Automate => 89,
            Self::Record => 86,
            Self::Play => 85,
            Self::Master => 28,
            Self::Setup => 30,
            Self::User => 59,
            Self::AddDevice => 52,
            Self::AddTrack => 53,
            Self::Device => 110,
            Self::Browse => 111,
            Self::Mix => 112,
            Self::Clip => 113,
            Self::Note => 50,
            Self::Session => 51,
            Self::Scale => 58,
            Self::Layout => 31,
            Self::Repeat => 56,
            Self::Accent => 57,
            Self::OctaveDown => 54,
            Self::OctaveUp => 55,
            Self::PageLeft => 62,
            Self::PageRight => 63,
            Self::Shift => 49,
            Self::Select => 48,
            Self::Up => 46,
            Self::Down => 47,
            Self::Left => 44,
            Self::Right => 45,
            Self::UpperRow(i) => 102 + i,
            Self::LowerRow(i) => 20 + i,
            Self::Scene(i) => 43 - i,
        }
    }

    /// Every button on the surface, row buttons included.
    pub fn all() -> Vec<Self> {
        let mut buttons = vec![
            Self::TapTempo,
            Self::Metronome,
            Self::Delete,
            Self::Undo,
            Self::Mute,
            Self::Solo,
            Self::Stop,
            Self::Convert,
            Self::DoubleLoop,
            Self::Quantize,
            Self::Duplicate,
            Self::New,
            Self::FixedLength,
            Self::Automate,
            Self::Record,
            Self::Play,
            Self::Master,
            Self::Setup,
            Self::User,
            Self::AddDevice,
            Self::AddTrack,
            Self::Device,
            Self::Browse,
            Self::Mix,
            Self::Clip,
            Self::Note,
            Self::Session,
            Self::Scale,
            Self::Layout,
            Self::Repeat,
            Self::Accent,
            Self::OctaveDown,
            Self::OctaveUp,
            Self::PageLeft,
            Self::PageRight,
            Self::Shift,
            Self::Select,
            Self::Up,
            Self::Down,
            Self::Left,
            Self::Right,
        ];
        for i in 0..8 {
            buttons.push(Self::UpperRow(i));
            buttons.push(Self::LowerRow(i));
            buttons.push(Self::Scene(i));
        }
        buttons
    }
}

/// A rotary encoder on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoder {
    Tempo,
    Swing,
    /// The eight encoders above the display, 0-7 left to right.
    Track(u8),
    Master,
}

impl Encoder {
    pub fn from_cc(cc: u8) -> Option<Self> {
        Some(match cc {
            14 => Self::Tempo,
            15 => Self::Swing,
            71..=78 => Self::Track(cc - 71),
            79 => Self::Master,
            _ => return None,
        })
    }

    pub fn cc(self) -> u8 {
        match self {
            Self::Tempo => 14,
            Self::Swing => 15,
            Self::Track(i) => 71 + i,
            Self::Master => 79,
        }
    }

    /// Strip index (0-7) for a track encoder, None otherwise.
    pub fn strip_index(self) -> Option<usize> {
        match self {
            Self::Track(i) => Some(i as usize),
            _ => None,
        }
    }
}

/// Named LED colors. Indices point into the palette the surface uploads
/// at connect time, so the same value works for pads and button LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedColor {
    Black,
    DarkGray,
    LightGray,
    White,
    Red,
    Green,
    Blue,
    Orange,
    Yellow,
    Turquoise,
    Purple,
}

impl LedColor {
    pub fn index(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::DarkGray => 1,
            Self::LightGray => 2,
            Self::White => 3,
            Self::Red => 4,
            Self::Green => 5,
            Self::Blue => 6,
            Self::Orange => 7,
            Self::Yellow => 8,
            Self::Turquoise => 9,
            Self::Purple => 10,
        }
    }

    /// RGB used for the palette upload and for on-display swatches.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Black => (0, 0, 0),
            Self::DarkGray => (16, 16, 16),
            Self::LightGray => (80, 80, 80),
            Self::White => (255, 255, 255),
            Self::Red => (255, 0, 0),
            Self::Green => (0, 255, 0),
            Self::Blue => (0, 60, 255),
            Self::Orange => (255, 90, 0),
            Self::Yellow => (255, 220, 0),
            Self::Turquoise => (0, 200, 180),
            Self::Purple => (140, 0, 255),
        }
    }

    /// Every palette entry, in index order.
    pub fn all() -> [Self; 11] {
        [
            Self::Black,
            Self::DarkGray,
            Self::LightGray,
            Self::White,
            Self::Red,
            Self::Green,
            Self::Blue,
            Self::Orange,
            Self::Yellow,
            Self::Turquoise,
            Self::Purple,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_cc_roundtrip() {
        for cc in 0..128u8 {
            if let Some(button) = Button::from_cc(cc) {
                assert_eq!(button.cc(), cc, "cc {} did not roundtrip", cc);
            }
        }
    }

    #[test]
    fn row_buttons_map_to_indices() {
        assert_eq!(Button::from_cc(102), Some(Button::UpperRow(0)));
        assert_eq!(Button::from_cc(109), Some(Button::UpperRow(7)));
        assert_eq!(Button::from_cc(20), Some(Button::LowerRow(0)));
        assert_eq!(Button::from_cc(27), Some(Button::LowerRow(7)));
    }

    #[test]
    fn encoder_cc_roundtrip() {
        for cc in 0..128u8 {
            if let Some(encoder) = Encoder::from_cc(cc) {
                assert_eq!(encoder.cc(), cc);
            }
        }
        assert_eq!(Encoder::from_cc(71), Some(Encoder::Track(0)));
        assert_eq!(Encoder::from_cc(78), Some(Encoder::Track(7)));
    }

    #[test]
    fn palette_indices_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for color in LedColor::all() {
            assert!(seen.insert(color.index()));
        }
    }
}
