//! Track-level state mirrored from the DAW.

use serde::{Deserialize, Serialize};

/// RGB color as sent by the DAW (packed 0xRRGGBB on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Unpack a 0xRRGGBB integer.
    pub fn from_packed(packed: u32) -> Self {
        Self(
            ((packed >> 16) & 0xFF) as u8,
            ((packed >> 8) & 0xFF) as u8,
            (packed & 0xFF) as u8,
        )
    }
}

/// Track automation mode, in the DAW's wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutomationMode {
    #[default]
    Trim,
    Read,
    Touch,
    Write,
    Latch,
}

impl AutomationMode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Trim),
            1 => Some(Self::Read),
            2 => Some(Self::Touch),
            3 => Some(Self::Write),
            4 => Some(Self::Latch),
            _ => None,
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            Self::Trim => 0,
            Self::Read => 1,
            Self::Touch => 2,
            Self::Write => 3,
            Self::Latch => 4,
        }
    }

    /// Next mode in the cycle order used by the Automate button.
    pub fn next(self) -> Self {
        match self {
            Self::Trim => Self::Read,
            Self::Read => Self::Touch,
            Self::Touch => Self::Write,
            Self::Write => Self::Latch,
            Self::Latch => Self::Trim,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Trim => "Trim",
            Self::Read => "Read",
            Self::Touch => "Touch",
            Self::Write => "Write",
            Self::Latch => "Latch",
        }
    }
}

/// One send slot on a track. Send indices are 0-based internally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSend {
    pub name: String,
    /// Normalized level, 0.0..=1.0.
    pub level: f32,
    pub level_str: String,
    /// Normalized pan, 0.5 = center.
    pub pan: f32,
}

impl TrackSend {
    pub fn placeholder(index: usize) -> Self {
        Self {
            name: format!("Send {}", index + 1),
            level: 0.0,
            level_str: "-inf dB".to_string(),
            pan: 0.5,
        }
    }
}

/// State for a single DAW track. Track numbers are 1-based, matching
/// the wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub number: u32,
    pub name: String,
    pub volume: f32,
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub rec_arm: bool,
    pub selected: bool,
    pub vu: f32,
    pub vu_l: f32,
    pub vu_r: f32,
    pub volume_str: String,
    pub pan_str: String,
    pub color: Option<Rgb>,
    pub automation: AutomationMode,
    pub sends: Vec<TrackSend>,
}

impl Track {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            name: format!("Track {}", number),
            // ~0 dB with the DAW's default volume taper
            volume: 0.716,
            pan: 0.5,
            mute: false,
            solo: false,
            rec_arm: false,
            selected: false,
            vu: 0.0,
            vu_l: 0.0,
            vu_r: 0.0,
            volume_str: "0.0 dB".to_string(),
            pan_str: "<C>".to_string(),
            color: None,
            automation: AutomationMode::Trim,
            sends: Vec::new(),
        }
    }

    /// Get a send, growing the list with placeholders if needed.
    pub fn send_mut(&mut self, index: usize) -> &mut TrackSend {
        while self.sends.len() <= index {
            let next = self.sends.len();
            self.sends.push(TrackSend::placeholder(next));
        }
        &mut self.sends[index]
    }
}
