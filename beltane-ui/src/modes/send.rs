//! Send mode.
//!
//! Encoders 1-8 control the selected track's send levels, one send per
//! encoder. Reached with Shift+Mix; the Mixer's send encoder sub-mode
//! shows the same state for quick tweaks.

use beltane_surface::DisplayFrame;
use beltane_types::{Button, Encoder, LedColor, StateChange, Track, TrackField, BANK_SIZE};

use crate::draw;
use crate::modes::{Ctx, Mode, RenderCtx};

pub struct SendMode;

impl SendMode {
    pub fn new() -> Self {
        Self
    }

    fn paint_buttons(&self, ctx: &mut Ctx) {
        for i in 0..8u8 {
            ctx.leds.set_color(Button::UpperRow(i), LedColor::DarkGray);
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

impl Mode for SendMode {
    fn name(&self) -> &'static str {
        "send"
    }

    fn enter(&mut self, ctx: &mut Ctx) {
        ctx.pads.rebuild(ctx.scale);
        self.paint_buttons(ctx);
    }

    fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        match button {
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
            Encoder::Track(i) => {
                let send = i as usize;
                let number = ctx.state.selected_track();
                let current = ctx
                    .state
                    .track(number)
                    .and_then(|t| t.sends.get(send).map(|s| s.level))
                    .unwrap_or(0.0);
                let value = ctx.daw.nudge_send_level(number, send, current, delta);
                ctx.state.update_send_level(number, send, value);
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

    fn on_state_changed(&mut self, ctx: &mut Ctx, change: &StateChange) {
        if matches!(
            change,
            StateChange::Track {
                field: TrackField::Selected,
                ..
            } | StateChange::Bank
        ) {
            self.paint_buttons(ctx);
        }
    }

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        let number = ctx.state.selected_track();
        let track = ctx
            .state
            .track(number)
            .unwrap_or_else(|| Track::new(number));

        ctx.glyphs.draw_text(
            frame,
            8,
            4,
            &format!("SENDS  ·  {}", track.name),
            draw::TEXT,
        );
        for i in 0..BANK_SIZE as usize {
            let x = draw::strip_x(i);
            match track.sends.get(i) {
                Some(send) => {
                    ctx.glyphs.draw_text(frame, x + 6, 30, &send.name, draw::TEXT);
                    frame.meter(x + 50, 48, 20, 84, send.level, draw::METER_GREEN);
                    ctx.glyphs
                        .draw_text(frame, x + 6, 140, &send.level_str, draw::TEXT_DIM);

                    // Pan lane under the meter
                    let lane_w = draw::STRIP_W - 20;
                    frame.fill_rect(x + 8, 152, lane_w, 2, (50, 50, 50));
                    let marker = x + 8 + ((lane_w - 4) as f32 * send.pan) as i32;
                    frame.fill_rect(marker, 150, 4, 6, draw::TEXT);
                }
                None => {
                    ctx.glyphs.draw_text(frame, x + 6, 30, "—", draw::TEXT_DIM);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::testing::Fixture;

    #[test]
    fn encoder_nudges_selected_tracks_send() {
        let mut fixture = Fixture::new();
        fixture.state.update_track_selected(4, true);
        let mut mode = SendMode::new();

        let mut ctx = fixture.ctx();
        mode.on_encoder(&mut ctx, Encoder::Track(0), 1);
        drop(ctx);

        let msg = fixture.recv_osc();
        assert_eq!(msg.addr, "/track/4/send/1/volume");
        let cached = fixture.state.track(4).unwrap().sends[0].level;
        assert!(cached > 0.0);
    }
}
