//! Musical scales and the note-grid state.
//!
//! The hardware always sends 8 semitones between pad rows; the grid is
//! remapped to the chosen layout interval, so the note a pad represents
//! is derived here for both coloring and note translation.

use beltane_types::LedColor;

/// Scale name and semitone offsets from the root.
pub const SCALES: &[(&str, &[u8])] = &[
    ("Major", &[0, 2, 4, 5, 7, 9, 11]),
    ("Minor", &[0, 2, 3, 5, 7, 8, 10]),
    ("Dorian", &[0, 2, 3, 5, 7, 9, 10]),
    ("Mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
    ("Lydian", &[0, 2, 4, 6, 7, 9, 11]),
    ("Phrygian", &[0, 1, 3, 5, 7, 8, 10]),
    ("Locrian", &[0, 1, 3, 5, 6, 8, 10]),
    ("Harm. Minor", &[0, 2, 3, 5, 7, 8, 11]),
    ("Mel. Minor", &[0, 2, 3, 5, 7, 9, 11]),
    ("Penta. Maj", &[0, 2, 4, 7, 9]),
    ("Penta. Min", &[0, 3, 5, 7, 10]),
    ("Blues", &[0, 3, 5, 6, 7, 10]),
    ("Whole Tone", &[0, 2, 4, 6, 8, 10]),
    ("Diminished", &[0, 2, 3, 5, 6, 8, 9, 11]),
    ("Hungarian Min", &[0, 2, 3, 6, 7, 8, 11]),
    ("Spanish", &[0, 1, 4, 5, 7, 9, 10]),
];

pub const ROOT_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Layout name and semitones between rows.
pub const LAYOUTS: &[(&str, i32)] = &[("4th", 5), ("3rd", 4), ("Sequent", 1)];

/// Scale pages shown in the overlay, 8 scales per page, plus one
/// settings page at the end.
pub const SCALE_PAGES: usize = (SCALES.len() + 7) / 8;
pub const TOTAL_PAGES: usize = SCALE_PAGES + 1;

/// Current musical configuration of the note grid.
#[derive(Debug, Clone)]
pub struct ScaleState {
    /// 0 = C .. 11 = B.
    pub root: u8,
    pub scale: usize,
    pub layout: usize,
    pub octave_offset: i32,
    /// Current page in the scale overlay.
    pub page: usize,
    /// Hide out-of-scale notes (black pads) instead of dimming them.
    pub in_key: bool,
}

impl Default for ScaleState {
    fn default() -> Self {
        Self {
            root: 0,
            scale: 0,
            layout: 0,
            octave_offset: 0,
            page: 0,
            in_key: false,
        }
    }
}

impl ScaleState {
    pub fn scale_name(&self) -> &'static str {
        SCALES[self.scale].0
    }

    pub fn root_name(&self) -> &'static str {
        ROOT_NAMES[self.root as usize]
    }

    pub fn layout_name(&self) -> &'static str {
        LAYOUTS[self.layout].0
    }

    /// Semitones (0-11) in the current scale.
    pub fn scale_notes(&self) -> Vec<u8> {
        SCALES[self.scale]
            .1
            .iter()
            .map(|iv| (self.root + iv) % 12)
            .collect()
    }

    /// Bottom-left pad note, shifted by root and octave. Changing the
    /// root shifts the entire grid so the bottom-left pad starts on the
    /// selected root.
    pub fn base_note(&self) -> i32 {
        36 + self.root as i32 + self.octave_offset * 12
    }

    pub fn row_interval(&self) -> i32 {
        LAYOUTS[self.layout].1
    }

    pub fn is_settings_page(&self) -> bool {
        self.page >= SCALE_PAGES
    }

    /// Note a pad represents under the current layout. Row 0 is the top
    /// row. May fall outside 0..=127; callers check before sending.
    pub fn pad_note(&self, row: u8, col: u8) -> i32 {
        self.base_note() + (7 - row as i32) * self.row_interval() + col as i32
    }

    /// Pad color from scale membership: root, in-scale, or chromatic.
    pub fn note_color(&self, note: i32) -> LedColor {
        let semitone = (note.rem_euclid(12)) as u8;
        if semitone == self.root {
            LedColor::Blue
        } else if self.scale_notes().contains(&semitone) {
            LedColor::Turquoise
        } else if self.in_key {
            LedColor::Black
        } else {
            LedColor::DarkGray
        }
    }

    pub fn set_root(&mut self, root: u8) {
        self.root = root % 12;
    }

    pub fn set_scale(&mut self, index: usize) {
        if index < SCALES.len() {
            self.scale = index;
        }
    }

    pub fn set_layout(&mut self, index: usize) {
        if index < LAYOUTS.len() {
            self.layout = index;
        }
    }

    pub fn octave_up(&mut self) {
        if self.base_note() + 12 <= 108 {
            self.octave_offset += 1;
        }
    }

    pub fn octave_down(&mut self) {
        if self.base_note() - 12 >= 0 {
            self.octave_offset -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_left_pad_is_base_note() {
        let scale = ScaleState::default();
        assert_eq!(scale.pad_note(7, 0), 36);
    }

    #[test]
    fn fourths_layout_steps_five_per_row() {
        let scale = ScaleState::default();
        assert_eq!(scale.pad_note(6, 0) - scale.pad_note(7, 0), 5);
        assert_eq!(scale.pad_note(7, 3) - scale.pad_note(7, 0), 3);
    }

    #[test]
    fn root_note_is_blue() {
        let scale = ScaleState::default();
        assert_eq!(scale.note_color(36), LedColor::Blue);
        assert_eq!(scale.note_color(48), LedColor::Blue);
    }

    #[test]
    fn chromatic_note_depends_on_in_key() {
        let mut scale = ScaleState::default();
        // C# is not in C major
        assert_eq!(scale.note_color(37), LedColor::DarkGray);
        scale.in_key = true;
        assert_eq!(scale.note_color(37), LedColor::Black);
    }

    #[test]
    fn octave_shift_is_bounded() {
        let mut scale = ScaleState::default();
        for _ in 0..20 {
            scale.octave_up();
        }
        assert!(scale.base_note() + 12 > 108);
        for _ in 0..40 {
            scale.octave_down();
        }
        assert!(scale.base_note() >= 0);
    }

    #[test]
    fn root_shift_moves_grid() {
        let mut scale = ScaleState::default();
        scale.set_root(2); // D
        assert_eq!(scale.base_note(), 38);
        assert_eq!(scale.note_color(38), LedColor::Blue);
    }
}
