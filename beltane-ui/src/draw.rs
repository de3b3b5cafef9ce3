//! Shared display-layout helpers for the channel-strip views.

use beltane_types::{Rgb, Track};

/// Eight strips across the 960-pixel display.
pub const STRIP_W: i32 = 120;
pub const HEADER_H: i32 = 24;

pub const BG: (u8, u8, u8) = (0, 0, 0);
pub const TEXT: (u8, u8, u8) = (255, 255, 255);
pub const TEXT_DIM: (u8, u8, u8) = (140, 140, 140);
pub const METER_GREEN: (u8, u8, u8) = (50, 200, 80);
pub const MUTE_RED: (u8, u8, u8) = (220, 40, 40);
pub const SOLO_YELLOW: (u8, u8, u8) = (230, 210, 40);

/// Default strip colors, cycled when the DAW has not assigned one.
const TRACK_CYCLE: [(u8, u8, u8); 8] = [
    (255, 60, 60),
    (255, 140, 30),
    (255, 220, 50),
    (50, 200, 80),
    (50, 200, 200),
    (60, 100, 255),
    (160, 80, 220),
    (240, 100, 180),
];

pub fn strip_x(index: usize) -> i32 {
    index as i32 * STRIP_W
}

pub fn track_color(track: &Track, index: usize) -> (u8, u8, u8) {
    match track.color {
        Some(Rgb(r, g, b)) => (r, g, b),
        None => TRACK_CYCLE[index % TRACK_CYCLE.len()],
    }
}

/// Dim a color for stale or inactive rendering.
pub fn dim(color: (u8, u8, u8)) -> (u8, u8, u8) {
    (color.0 / 3, color.1 / 3, color.2 / 3)
}
