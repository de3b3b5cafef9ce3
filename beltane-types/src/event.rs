//! Typed bus events.
//!
//! Every topic carries a concrete payload so subscribers pattern-match
//! instead of poking at untyped maps.

use crate::clip::SlotAddr;
use crate::control::{Button, Encoder};

/// Which field of a track changed, for selective repaints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackField {
    Volume,
    Pan,
    Mute,
    Solo,
    RecArm,
    Selected,
    Name,
    Meter,
    Color,
    Automation,
    VolumeStr,
    PanStr,
}

/// Context published with every successful DAW-state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Track { track: u32, field: TrackField },
    Send { track: u32, send: usize },
    Device { track: u32, device: usize },
    DeviceParam { track: u32, device: usize, param: usize },
    Transport,
    Master,
    Bank,
}

/// Context published with every applied clip-engine update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipChange {
    Slot(SlotAddr),
    Matrix,
    Tempo,
    FullRefresh,
    Connection { connected: bool },
}

/// Bus topics. Derived from the event variant; used as the subscribe
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ButtonPressed,
    ButtonReleased,
    PadPressed,
    PadReleased,
    Aftertouch,
    EncoderRotated,
    Touchstrip,
    StateChanged,
    ClipStateChanged,
}

/// An event on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ButtonPressed { button: Button },
    ButtonReleased { button: Button },
    PadPressed { row: u8, col: u8, velocity: u8 },
    PadReleased { row: u8, col: u8 },
    Aftertouch { row: u8, col: u8, pressure: u8 },
    /// Whole-surface pressure, when the pads run in channel-pressure
    /// mode.
    ChannelPressure { pressure: u8 },
    EncoderRotated { encoder: Encoder, delta: i32 },
    Touchstrip { value: u16 },
    StateChanged(StateChange),
    ClipStateChanged(ClipChange),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Self::ButtonPressed { .. } => Topic::ButtonPressed,
            Self::ButtonReleased { .. } => Topic::ButtonReleased,
            Self::PadPressed { .. } => Topic::PadPressed,
            Self::PadReleased { .. } => Topic::PadReleased,
            Self::Aftertouch { .. } => Topic::Aftertouch,
            Self::ChannelPressure { .. } => Topic::Aftertouch,
            Self::EncoderRotated { .. } => Topic::EncoderRotated,
            Self::Touchstrip { .. } => Topic::Touchstrip,
            Self::StateChanged(_) => Topic::StateChanged,
            Self::ClipStateChanged(_) => Topic::ClipStateChanged,
        }
    }
}
