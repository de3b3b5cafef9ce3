//! Clip-engine slot state.

use serde::{Deserialize, Serialize};

/// Address of a slot in the clip matrix: (column = track, row = scene).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlotAddr {
    pub column: u32,
    pub row: u32,
}

impl SlotAddr {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

/// Simplified play state for a clip slot. A slot the engine has never
/// described is `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotPlayState {
    #[default]
    Empty,
    Stopped,
    Playing,
    Recording,
    Queued,
}

/// Cached state for one clip slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClipSlot {
    pub play_state: SlotPlayState,
    pub has_content: bool,
    pub name: Option<String>,
}

impl ClipSlot {
    /// State as shown on the pad grid: a "stopped" slot without content
    /// reads as empty.
    pub fn display_state(&self) -> SlotPlayState {
        if self.play_state == SlotPlayState::Stopped && !self.has_content {
            SlotPlayState::Empty
        } else {
            self.play_state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_without_content_displays_empty() {
        let slot = ClipSlot {
            play_state: SlotPlayState::Stopped,
            has_content: false,
            name: None,
        };
        assert_eq!(slot.display_state(), SlotPlayState::Empty);
    }

    #[test]
    fn stopped_with_content_displays_stopped() {
        let slot = ClipSlot {
            play_state: SlotPlayState::Stopped,
            has_content: true,
            name: None,
        };
        assert_eq!(slot.display_state(), SlotPlayState::Stopped);
    }

    #[test]
    fn playing_displays_playing_regardless_of_content() {
        let slot = ClipSlot {
            play_state: SlotPlayState::Playing,
            has_content: false,
            name: None,
        };
        assert_eq!(slot.display_state(), SlotPlayState::Playing);
    }
}
