//! Browser mode.
//!
//! The DAW's wire protocol has no rich browser navigation, so this mode
//! drives the FX browser and related windows through action ids.

use beltane_surface::DisplayFrame;
use beltane_types::{Button, Encoder, LedColor, BANK_SIZE};

use crate::draw;
use crate::modes::{Ctx, Mode, RenderCtx};

/// Show the FX browser window.
const ACTION_FX_BROWSER: i32 = 40271;
/// View the FX chain for the current track.
const ACTION_FX_CHAIN: i32 = 40291;
/// Insert a virtual instrument on a new track.
const ACTION_INSERT_INSTRUMENT: i32 = 40346;

pub struct BrowserMode;

impl BrowserMode {
    pub fn new() -> Self {
        Self
    }

    fn paint_buttons(&self, ctx: &mut Ctx) {
        for i in 0..8u8 {
            let upper = if i < 3 {
                LedColor::Orange
            } else {
                LedColor::DarkGray
            };
            ctx.leds.set_color(Button::UpperRow(i), upper);
            ctx.leds.set_color(Button::LowerRow(i), LedColor::DarkGray);
        }
    }
}

impl Mode for BrowserMode {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn enter(&mut self, ctx: &mut Ctx) {
        // Opening the mode opens the browser window itself.
        ctx.daw.trigger_action(ACTION_FX_BROWSER);
        ctx.pads.rebuild(ctx.scale);
        self.paint_buttons(ctx);
    }

    fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        match button {
            Button::UpperRow(0) => {
                ctx.daw.trigger_action(ACTION_FX_BROWSER);
                true
            }
            Button::UpperRow(1) => {
                ctx.daw.trigger_action(ACTION_FX_CHAIN);
                true
            }
            Button::UpperRow(2) => {
                ctx.daw.trigger_action(ACTION_INSERT_INSTRUMENT);
                true
            }
            Button::UpperRow(_) => true,
            Button::LowerRow(i) => {
                let number = ctx.state.bank_track_number(i as usize);
                ctx.daw.select_and_arm_track(number, BANK_SIZE);
                true
            }
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
            _ => {}
        }
    }

    fn on_pad_pressed(&mut self, ctx: &mut Ctx, row: u8, col: u8, velocity: u8) {
        ctx.pads.highlight(row, col);
        let note = ctx.scale.pad_note(row, col);
        if (0..=127).contains(&note) {
            ctx.daw.note_on(0, note as u8, velocity);
        }
    }

    fn on_pad_released(&mut self, ctx: &mut Ctx, row: u8, col: u8) {
        ctx.pads.restore(row, col);
        let note = ctx.scale.pad_note(row, col);
        if (0..=127).contains(&note) {
            ctx.daw.note_off(0, note as u8);
        }
    }

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        let track = ctx.state.track(ctx.state.selected_track());
        let name = track.map(|t| t.name).unwrap_or_else(|| "?".to_string());
        ctx.glyphs
            .draw_text(frame, 8, 4, &format!("BROWSE  ·  {}", name), draw::TEXT);
        for (i, label) in ["FX Browser", "FX Chain", "Instrument"]
            .iter()
            .enumerate()
        {
            let x = draw::strip_x(i);
            frame.fill_rect(x + 4, 40, draw::STRIP_W - 8, 30, (255, 90, 0));
            ctx.glyphs.draw_text(frame, x + 10, 50, label, draw::BG);
        }
    }
}
