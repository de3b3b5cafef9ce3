//! Device mode — FX parameter control.
//!
//! Encoders 1-8 map to a bank of eight parameters on the selected
//! track's current device. The upper row pages parameter banks and
//! walks the FX chain; the lower row selects tracks. Pads keep playing
//! the note grid.

use log::info;

use beltane_surface::DisplayFrame;
use beltane_types::{Button, Device, Encoder, LedColor, BANK_SIZE};

use crate::draw;
use crate::modes::{Ctx, Mode, RenderCtx};

/// Parameters shown (and addressed) per bank: one per encoder.
const PARAMS_PER_BANK: usize = 8;

pub struct DeviceMode {
    device_index: usize,
    param_bank: usize,
}

impl DeviceMode {
    pub fn new() -> Self {
        Self {
            device_index: 0,
            param_bank: 0,
        }
    }

    fn paint_buttons(&self, ctx: &mut Ctx) {
        for i in 0..8u8 {
            let upper = match i {
                0 | 1 => LedColor::Blue,
                6 | 7 => LedColor::Orange,
                _ => LedColor::DarkGray,
            };
            ctx.leds.set_color(Button::UpperRow(i), upper);
        }
        let tracks = ctx.state.bank_tracks();
        for (i, track) in tracks.iter().enumerate() {
            let color = if track.selected {
                LedColor::White
            } else {
                LedColor::DarkGray
            };
            ctx.leds.set_color(Button::LowerRow(i as u8), color);
        }
    }
}

impl Mode for DeviceMode {
    fn name(&self) -> &'static str {
        "device"
    }

    fn enter(&mut self, ctx: &mut Ctx) {
        ctx.pads.rebuild(ctx.scale);
        self.paint_buttons(ctx);
    }

    fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        match button {
            Button::UpperRow(0) => {
                self.param_bank = self.param_bank.saturating_sub(1);
                info!("param bank: {}", self.param_bank);
                true
            }
            Button::UpperRow(1) => {
                self.param_bank += 1;
                info!("param bank: {}", self.param_bank);
                true
            }
            Button::UpperRow(6) => {
                self.device_index = self.device_index.saturating_sub(1);
                self.param_bank = 0;
                info!("device: {}", self.device_index);
                true
            }
            Button::UpperRow(7) => {
                let chain_len = ctx.state.device_count(ctx.state.selected_track());
                let last = chain_len.saturating_sub(1);
                self.device_index = (self.device_index + 1).min(last);
                self.param_bank = 0;
                info!("device: {}", self.device_index);
                true
            }
            Button::UpperRow(_) => true,
            Button::LowerRow(i) => {
                let number = ctx.state.bank_track_number(i as usize);
                ctx.daw.select_and_arm_track(number, BANK_SIZE);
                self.device_index = 0;
                self.param_bank = 0;
                true
            }
            _ => false,
        }
    }

    fn on_encoder(&mut self, ctx: &mut Ctx, encoder: Encoder, delta: i32) {
        match encoder {
            Encoder::Track(i) => {
                let track = ctx.state.selected_track();
                let param = self.param_bank * PARAMS_PER_BANK + i as usize;
                let current = ctx
                    .state
                    .device(track, self.device_index)
                    .and_then(|d| d.params.get(param).map(|p| p.value))
                    .unwrap_or(0.0);
                let value =
                    ctx.daw
                        .nudge_device_param(track, self.device_index, param, current, delta);
                ctx.state
                    .update_device_param_value(track, self.device_index, param, value);
            }
            Encoder::Master => {
                let current = ctx.state.transport().master_volume;
                let value = ctx.daw.nudge_master_volume(current, delta);
                ctx.state.set_master_volume(value);
            }
            Encoder::Tempo => {
                let tempo = ctx.state.transport().tempo + delta as f64;
                ctx.daw.set_tempo(tempo);
            }
            Encoder::Swing => {}
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

    fn on_aftertouch(&mut self, ctx: &mut Ctx, row: u8, col: u8, pressure: u8) {
        let note = ctx.scale.pad_note(row, col);
        if (0..=127).contains(&note) {
            ctx.daw.poly_aftertouch(0, note as u8, pressure);
        }
    }

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        let track_number = ctx.state.selected_track();
        let device = ctx
            .state
            .device(track_number, self.device_index)
            .unwrap_or_else(|| Device::new(self.device_index));

        ctx.glyphs.draw_text(
            frame,
            8,
            4,
            &format!(
                "DEVICE  track {}  ·  {}  ·  bank {}",
                track_number,
                device.name,
                self.param_bank + 1
            ),
            draw::TEXT,
        );

        let first = self.param_bank * PARAMS_PER_BANK;
        for i in 0..PARAMS_PER_BANK {
            let x = draw::strip_x(i);
            match device.params.get(first + i) {
                Some(param) => {
                    ctx.glyphs
                        .draw_text(frame, x + 6, 30, &param.name, draw::TEXT);
                    frame.meter(x + 50, 48, 20, 84, param.value, draw::METER_GREEN);
                }
                None => {
                    ctx.glyphs.draw_text(frame, x + 6, 30, "—", draw::TEXT_DIM);
                }
            }
        }
    }
}
