//! Drum mode.
//!
//! The bottom-left 4x4 quadrant plays sixteen drum notes on channel 10;
//! the top two pad rows are a 16-step grid for the selected drum pad.
//! Lower row selects tracks, upper row moves the drum note bank.

use std::collections::HashMap;

use log::info;

use beltane_surface::DisplayFrame;
use beltane_types::{Button, Encoder, LedColor, BANK_SIZE, GRID_COLS, GRID_ROWS};

use crate::draw;
use crate::modes::{Ctx, Mode, RenderCtx};

/// MIDI channel 10, where drum maps live.
const DRUM_CHANNEL: u8 = 9;

const PAD_COLOR: LedColor = LedColor::Yellow;
const PAD_SELECTED: LedColor = LedColor::Orange;
const STEP_ON: LedColor = LedColor::Green;
const STEP_OFF: LedColor = LedColor::DarkGray;

pub struct DrumMode {
    /// First MIDI note of the 4x4 bank (GM drums start at 36).
    bank_offset: u8,
    /// Selected pad, 0-15 within the bank.
    selected_pad: usize,
    /// 16 steps for each of the 16 pads.
    steps: [[bool; 16]; 16],
    /// Held pads and the notes they fired.
    held: HashMap<(u8, u8), u8>,
}

impl DrumMode {
    pub fn new() -> Self {
        Self {
            bank_offset: 36,
            selected_pad: 0,
            steps: [[false; 16]; 16],
            held: HashMap::new(),
        }
    }

    /// Bottom-left 4x4 quadrant.
    fn is_drum_pad(row: u8, col: u8) -> bool {
        (4..=7).contains(&row) && col <= 3
    }

    fn drum_pad_index(row: u8, col: u8) -> usize {
        ((7 - row) * 4 + col) as usize
    }

    /// Steps live on the top two rows, 8 per row.
    fn step_index(row: u8, col: u8) -> Option<usize> {
        if row <= 1 {
            Some(((1 - row) * 8 + col) as usize)
        } else {
            None
        }
    }

    fn paint_pads(&self, ctx: &mut Ctx) {
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let color = if Self::is_drum_pad(row, col) {
                    if Self::drum_pad_index(row, col) == self.selected_pad {
                        PAD_SELECTED
                    } else {
                        PAD_COLOR
                    }
                } else if let Some(step) = Self::step_index(row, col) {
                    if self.steps[self.selected_pad][step] {
                        STEP_ON
                    } else {
                        STEP_OFF
                    }
                } else {
                    LedColor::Black
                };
                ctx.pads.set_color(row, col, color);
            }
        }
    }

    fn paint_buttons(&self, ctx: &mut Ctx) {
        for i in 0..8u8 {
            let color = if i <= 1 {
                LedColor::Blue
            } else {
                LedColor::DarkGray
            };
            ctx.leds.set_color(Button::UpperRow(i), color);
            ctx.leds.set_color(Button::LowerRow(i), LedColor::DarkGray);
        }
    }
}

impl Mode for DrumMode {
    fn name(&self) -> &'static str {
        "drum"
    }

    fn enter(&mut self, ctx: &mut Ctx) {
        self.paint_pads(ctx);
        self.paint_buttons(ctx);
    }

    fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        match button {
            Button::LowerRow(i) => {
                let number = ctx.state.bank_track_number(i as usize);
                ctx.daw.select_and_arm_track(number, BANK_SIZE);
                true
            }
            Button::UpperRow(0) => {
                self.bank_offset = self.bank_offset.saturating_sub(16);
                self.paint_pads(ctx);
                info!(
                    "drum bank: {}-{}",
                    self.bank_offset,
                    self.bank_offset + 15
                );
                true
            }
            Button::UpperRow(1) => {
                self.bank_offset = (self.bank_offset + 16).min(112);
                self.paint_pads(ctx);
                info!(
                    "drum bank: {}-{}",
                    self.bank_offset,
                    self.bank_offset + 15
                );
                true
            }
            Button::UpperRow(_) => true,
            _ => false,
        }
    }

    fn on_encoder(&mut self, ctx: &mut Ctx, encoder: Encoder, delta: i32) {
        match encoder {
            Encoder::Master => {
                let current = ctx.state.transport().master_volume;
                let value = ctx.daw.nudge_master_volume(current, delta);
                ctx.state.set_master_volume(value);
            }
            Encoder::Tempo => {
                let tempo = ctx.state.transport().tempo + delta as f64;
                ctx.daw.set_tempo(tempo);
            }
            Encoder::Track(i) => {
                let number = ctx.state.bank_track_number(i as usize);
                if let Some(track) = ctx.state.track(number) {
                    let value = ctx.daw.nudge_track_volume(number, track.volume, delta);
                    ctx.state.update_track_volume(number, value);
                }
            }
            Encoder::Swing => {}
        }
    }

    fn on_pad_pressed(&mut self, ctx: &mut Ctx, row: u8, col: u8, velocity: u8) {
        if Self::is_drum_pad(row, col) {
            let pad = Self::drum_pad_index(row, col);
            let note = self.bank_offset as i32 + pad as i32;
            self.selected_pad = pad;
            if (0..=127).contains(&note) {
                let note = note as u8;
                self.held.insert((row, col), note);
                ctx.daw.note_on(DRUM_CHANNEL, note, velocity);
            }
            self.paint_pads(ctx);
        } else if let Some(step) = Self::step_index(row, col) {
            self.steps[self.selected_pad][step] = !self.steps[self.selected_pad][step];
            self.paint_pads(ctx);
        }
    }

    fn on_pad_released(&mut self, ctx: &mut Ctx, row: u8, col: u8) {
        if let Some(note) = self.held.remove(&(row, col)) {
            ctx.daw.note_off(DRUM_CHANNEL, note);
        }
    }

    fn on_aftertouch(&mut self, ctx: &mut Ctx, row: u8, col: u8, pressure: u8) {
        if let Some(note) = self.held.get(&(row, col)) {
            ctx.daw.poly_aftertouch(DRUM_CHANNEL, *note, pressure);
        }
    }

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        ctx.glyphs.draw_text(
            frame,
            8,
            4,
            &format!(
                "DRUM  pad {}  notes {}-{}",
                self.selected_pad + 1,
                self.bank_offset,
                self.bank_offset + 15
            ),
            draw::TEXT,
        );

        // Step row for the selected pad
        let steps = &self.steps[self.selected_pad];
        for (i, on) in steps.iter().enumerate() {
            let x = 8 + i as i32 * 58;
            let color = if *on {
                draw::METER_GREEN
            } else {
                (40, 40, 40)
            };
            frame.fill_rect(x, 60, 50, 40, color);
            if i % 4 == 0 {
                frame.fill_rect(x, 104, 50, 2, draw::TEXT_DIM);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::testing::Fixture;

    #[test]
    fn drum_pad_press_fires_channel_ten_note() {
        let mut fixture = Fixture::new();
        let mut mode = DrumMode::new();

        let mut ctx = fixture.ctx();
        mode.enter(&mut ctx);
        mode.on_pad_pressed(&mut ctx, 7, 0, 110);
        drop(ctx);

        let msg = fixture.recv_osc();
        assert_eq!(msg.addr, "/vkb_midi/9/note/36");
        assert_eq!(msg.args[0], rosc::OscType::Int(110));
    }

    #[test]
    fn release_sends_note_off_for_held_note() {
        let mut fixture = Fixture::new();
        let mut mode = DrumMode::new();

        let mut ctx = fixture.ctx();
        mode.enter(&mut ctx);
        mode.on_pad_pressed(&mut ctx, 6, 1, 110);
        // Note for (6,1): (7-6)*4 + 1 = 5 → 41
        mode.on_pad_released(&mut ctx, 6, 1);
        drop(ctx);

        let _on = fixture.recv_osc();
        let off = fixture.recv_osc();
        assert_eq!(off.addr, "/vkb_midi/9/note/41");
        assert_eq!(off.args[0], rosc::OscType::Int(0));
    }

    #[test]
    fn step_toggle_flips_state_without_notes() {
        let mut fixture = Fixture::new();
        let mut mode = DrumMode::new();

        let mut ctx = fixture.ctx();
        mode.enter(&mut ctx);
        mode.on_pad_pressed(&mut ctx, 1, 0, 64);
        assert!(mode.steps[0][8]);
        mode.on_pad_pressed(&mut ctx, 1, 0, 64);
        assert!(!mode.steps[0][8]);
        drop(ctx);

        // No note traffic for step pads
        let mut buf = [0u8; 16];
        assert!(fixture.daw_receiver.recv(&mut buf).is_err());
    }

    #[test]
    fn bank_shift_is_clamped() {
        let mut fixture = Fixture::new();
        let mut mode = DrumMode::new();
        let mut ctx = fixture.ctx();
        mode.enter(&mut ctx);
        for _ in 0..10 {
            mode.on_button(&mut ctx, Button::UpperRow(1));
        }
        assert_eq!(mode.bank_offset, 112);
        for _ in 0..10 {
            mode.on_button(&mut ctx, Button::UpperRow(0));
        }
        assert_eq!(mode.bank_offset, 0);
    }
}
