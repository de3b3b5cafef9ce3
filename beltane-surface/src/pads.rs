//! Pad grid output with write dedup.
//!
//! The grid keeps the last value actually handed to the MIDI sink per
//! pad; a request equal to the cached value is suppressed, which bounds
//! hardware traffic no matter how often a mode recomputes its desired
//! state. `invalidate` clears the cache so the next writes go through —
//! the mode controller calls it on every transition, because two modes
//! may legitimately want the same coordinate in the same color for
//! different reasons and correctness requires a deliberate repaint.

use beltane_core::ScaleState;
use beltane_types::{LedColor, GRID_COLS, GRID_ROWS};

use crate::midi::MidiSink;

/// Raw MIDI note the hardware uses for a pad: (0,0) = top-left = 92,
/// (7,0) = bottom-left = 36.
pub fn pad_note(row: u8, col: u8) -> u8 {
    92 - row * 8 + col
}

/// Inverse of [`pad_note`]. None for notes outside the 8x8 grid.
pub fn pad_from_note(note: u8) -> Option<(u8, u8)> {
    if !(36..=99).contains(&note) {
        return None;
    }
    let offset = note - 36;
    Some((7 - offset / 8, offset % 8))
}

pub struct PadGrid {
    sink: Box<dyn MidiSink>,
    /// Last palette index accepted by the sink; None forces a write.
    written: [[Option<u8>; GRID_COLS as usize]; GRID_ROWS as usize],
    /// Colors of the musical note grid, for restore-after-highlight.
    grid_colors: [[LedColor; GRID_COLS as usize]; GRID_ROWS as usize],
}

impl PadGrid {
    pub fn new(sink: Box<dyn MidiSink>) -> Self {
        Self {
            sink,
            written: [[None; GRID_COLS as usize]; GRID_ROWS as usize],
            grid_colors: [[LedColor::Black; GRID_COLS as usize]; GRID_ROWS as usize],
        }
    }

    /// Write a pad color, suppressed when it matches the cached value.
    pub fn set_color(&mut self, row: u8, col: u8, color: LedColor) {
        let index = color.index();
        let cell = &mut self.written[row as usize][col as usize];
        if *cell == Some(index) {
            return;
        }
        self.sink.send(&[0x90, pad_note(row, col), index]);
        *cell = Some(index);
    }

    pub fn set_all(&mut self, color: LedColor) {
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                self.set_color(row, col, color);
            }
        }
    }

    pub fn clear(&mut self) {
        self.set_all(LedColor::Black);
    }

    /// Drop the dedup cache so the next writes reach the hardware even
    /// if the values repeat.
    pub fn invalidate(&mut self) {
        self.written = [[None; GRID_COLS as usize]; GRID_ROWS as usize];
    }

    /// Recompute and repaint the musical note grid from scale state.
    pub fn rebuild(&mut self, scale: &ScaleState) {
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let note = scale.pad_note(row, col);
                let color = scale.note_color(note);
                self.grid_colors[row as usize][col as usize] = color;
                self.set_color(row, col, color);
            }
        }
        log::debug!(
            target: "pads",
            "grid rebuilt: {} {} (oct {:+})",
            scale.root_name(),
            scale.scale_name(),
            scale.octave_offset
        );
    }

    /// Light a pad on press.
    pub fn highlight(&mut self, row: u8, col: u8) {
        self.set_color(row, col, LedColor::White);
    }

    /// Restore a pad to its note-grid color after release.
    pub fn restore(&mut self, row: u8, col: u8) {
        self.set_color(row, col, self.grid_colors[row as usize][col as usize]);
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

    fn grid() -> (RecordingSink, PadGrid) {
        let sink = RecordingSink::default();
        let grid = PadGrid::new(Box::new(sink.clone()));
        (sink, grid)
    }

    fn sent(sink: &RecordingSink) -> usize {
        sink.0.lock().unwrap().len()
    }

    #[test]
    fn note_mapping_roundtrip() {
        assert_eq!(pad_note(0, 0), 92);
        assert_eq!(pad_note(7, 0), 36);
        assert_eq!(pad_note(7, 7), 43);
        for row in 0..8 {
            for col in 0..8 {
                assert_eq!(pad_from_note(pad_note(row, col)), Some((row, col)));
            }
        }
        assert_eq!(pad_from_note(35), None);
        assert_eq!(pad_from_note(100), None);
    }

    #[test]
    fn same_color_twice_is_one_write() {
        let (sink, mut grid) = grid();
        grid.set_color(2, 3, LedColor::Green);
        grid.set_color(2, 3, LedColor::Green);
        assert_eq!(sent(&sink), 1);
    }

    #[test]
    fn different_colors_are_two_writes() {
        let (sink, mut grid) = grid();
        grid.set_color(2, 3, LedColor::Green);
        grid.set_color(2, 3, LedColor::Red);
        assert_eq!(sent(&sink), 2);
    }

    #[test]
    fn invalidate_forces_rewrite_of_same_color() {
        let (sink, mut grid) = grid();
        grid.set_color(2, 3, LedColor::Green);
        grid.invalidate();
        grid.set_color(2, 3, LedColor::Green);
        assert_eq!(sent(&sink), 2);
    }

    #[test]
    fn rebuild_paints_whole_grid_once() {
        let (sink, mut grid) = grid();
        let scale = ScaleState::default();
        grid.rebuild(&scale);
        assert_eq!(sent(&sink), 64);
        // A second rebuild with unchanged state writes nothing.
        grid.rebuild(&scale);
        assert_eq!(sent(&sink), 64);
    }

    #[test]
    fn restore_returns_grid_color_after_highlight() {
        let (sink, mut grid) = grid();
        grid.rebuild(&ScaleState::default());
        let before = sent(&sink);
        grid.highlight(7, 0);
        grid.restore(7, 0);
        // One write for the highlight, one to put the grid color back
        // (bottom-left is the root, not white).
        assert_eq!(sent(&sink), before + 2);
        let messages = sink.0.lock().unwrap();
        let last = messages.last().unwrap();
        assert_eq!(last[1], pad_note(7, 0));
        assert_eq!(last[2], LedColor::Blue.index());
    }
}
