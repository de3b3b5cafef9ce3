//! # beltane-types
//!
//! Shared type definitions for the Beltane control-surface runtime.
//! This crate contains the data model mirrored from the DAW and clip
//! engine, the surface control identifiers, and the typed event
//! payloads carried on the bus — used across beltane-core, beltane-net,
//! beltane-surface, and the beltane binary.

pub mod clip;
pub mod control;
pub mod device;
pub mod event;
pub mod param;
pub mod track;
pub mod transport;

pub use clip::{ClipSlot, SlotAddr, SlotPlayState};
pub use control::{Button, Encoder, LedColor};
pub use device::{Device, DeviceParam};
pub use event::{ClipChange, Event, StateChange, Topic, TrackField};
pub use param::{clamp_unit, nudge};
pub use track::{AutomationMode, Rgb, Track, TrackSend};
pub use transport::Transport;

/// Number of channel strips visible on the surface at once.
pub const BANK_SIZE: u32 = 8;

/// Pad grid dimensions.
pub const GRID_ROWS: u8 = 8;
pub const GRID_COLS: u8 = 8;
