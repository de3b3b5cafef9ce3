//! Mixer mode — the default operating mode.
//!
//! The eight encoders control volume, pan, or sends (cycled with the
//! upper row); the lower row selects, mutes, or solos tracks; pads play
//! the note grid.

use log::info;

use beltane_surface::DisplayFrame;
use beltane_types::{Button, Encoder, LedColor, StateChange, Track, TrackField, BANK_SIZE};

use crate::draw;
use crate::modes::{Ctx, Mode, RenderCtx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderMode {
    Volume,
    Pan,
    Send,
}

impl EncoderMode {
    fn next(self) -> Self {
        match self {
            Self::Volume => Self::Pan,
            Self::Pan => Self::Send,
            Self::Send => Self::Volume,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Volume => "VOLUME",
            Self::Pan => "PAN",
            Self::Send => "SENDS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LowerRowMode {
    Select,
    Mute,
    Solo,
}

pub struct MixerMode {
    encoder_mode: EncoderMode,
    lower_row_mode: LowerRowMode,
}

impl MixerMode {
    pub fn new() -> Self {
        Self {
            encoder_mode: EncoderMode::Volume,
            lower_row_mode: LowerRowMode::Select,
        }
    }

    fn update_buttons(&self, ctx: &mut Ctx) {
        ctx.leds.set_color(
            Button::Mute,
            if self.lower_row_mode == LowerRowMode::Mute {
                LedColor::Red
            } else {
                LedColor::DarkGray
            },
        );
        ctx.leds.set_color(
            Button::Solo,
            if self.lower_row_mode == LowerRowMode::Solo {
                LedColor::Yellow
            } else {
                LedColor::DarkGray
            },
        );

        let tracks = ctx.state.bank_tracks();
        for (i, track) in tracks.iter().enumerate() {
            let color = match self.lower_row_mode {
                LowerRowMode::Mute if track.mute => LedColor::Red,
                LowerRowMode::Solo if track.solo => LedColor::Yellow,
                LowerRowMode::Select if track.selected => LedColor::White,
                _ => LedColor::DarkGray,
            };
            ctx.leds.set_color(Button::LowerRow(i as u8), color);
        }
        for i in 0..8 {
            ctx.leds.set_color(Button::UpperRow(i), LedColor::DarkGray);
        }
    }

    fn nudge_strip(&self, ctx: &mut Ctx, strip: usize, delta: i32) {
        let number = ctx.state.bank_track_number(strip);
        let track = ctx
            .state
            .track(number)
            .unwrap_or_else(|| Track::new(number));
        match self.encoder_mode {
            EncoderMode::Volume => {
                let value = ctx.daw.nudge_track_volume(number, track.volume, delta);
                ctx.state.update_track_volume(number, value);
            }
            EncoderMode::Pan => {
                let value = ctx.daw.nudge_track_pan(number, track.pan, delta);
                ctx.state.update_track_pan(number, value);
            }
            EncoderMode::Send => {
                // In send mode the encoders address the selected
                // track's sends, one per encoder.
                let selected = ctx.state.selected_track();
                let current = ctx
                    .state
                    .track(selected)
                    .and_then(|t| t.sends.get(strip).map(|s| s.level))
                    .unwrap_or(0.0);
                let value = ctx.daw.nudge_send_level(selected, strip, current, delta);
                ctx.state.update_send_level(selected, strip, value);
            }
        }
    }

    fn render_sends(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        let selected = ctx.state.selected_track();
        let track = ctx
            .state
            .track(selected)
            .unwrap_or_else(|| Track::new(selected));
        ctx.glyphs.draw_text(
            frame,
            8,
            4,
            &format!("SENDS — {}", track.name),
            draw::TEXT,
        );
        for i in 0..BANK_SIZE as usize {
            let x = draw::strip_x(i);
            match track.sends.get(i) {
                Some(send) => {
                    ctx.glyphs.draw_text(frame, x + 6, 30, &send.name, draw::TEXT);
                    ctx.glyphs
                        .draw_text(frame, x + 6, 140, &send.level_str, draw::TEXT_DIM);
                    frame.meter(x + 50, 48, 20, 84, send.level, draw::METER_GREEN);
                }
                None => {
                    ctx.glyphs.draw_text(frame, x + 6, 30, "—", draw::TEXT_DIM);
                }
            }
        }
    }
}

impl Mode for MixerMode {
    fn name(&self) -> &'static str {
        "mixer"
    }

    fn enter(&mut self, ctx: &mut Ctx) {
        ctx.pads.rebuild(ctx.scale);
        self.update_buttons(ctx);
        let transport = ctx.state.transport();
        ctx.leds
            .set_transport_state(transport.playing, transport.recording);
    }

    fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        match button {
            Button::Mute => {
                self.lower_row_mode = if self.lower_row_mode == LowerRowMode::Mute {
                    LowerRowMode::Select
                } else {
                    LowerRowMode::Mute
                };
                self.update_buttons(ctx);
                true
            }
            Button::Solo => {
                self.lower_row_mode = if self.lower_row_mode == LowerRowMode::Solo {
                    LowerRowMode::Select
                } else {
                    LowerRowMode::Solo
                };
                self.update_buttons(ctx);
                true
            }
            Button::LowerRow(i) => {
                let number = ctx.state.bank_track_number(i as usize);
                match self.lower_row_mode {
                    LowerRowMode::Mute => ctx.daw.toggle_track_mute(number),
                    LowerRowMode::Solo => ctx.daw.toggle_track_solo(number),
                    LowerRowMode::Select => {
                        ctx.daw.select_and_arm_track(number, BANK_SIZE)
                    }
                }
                true
            }
            Button::UpperRow(_) => {
                self.encoder_mode = self.encoder_mode.next();
                self.update_buttons(ctx);
                info!("encoder mode: {}", self.encoder_mode.label());
                true
            }
            _ => false,
        }
    }

    fn on_encoder(&mut self, ctx: &mut Ctx, encoder: Encoder, delta: i32) {
        match encoder {
            Encoder::Track(i) => self.nudge_strip(ctx, i as usize, delta),
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
        match change {
            StateChange::Track {
                field:
                    TrackField::Mute
                    | TrackField::Solo
                    | TrackField::Selected
                    | TrackField::RecArm,
                ..
            }
            | StateChange::Bank => self.update_buttons(ctx),
            _ => {}
        }
    }

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        if self.encoder_mode == EncoderMode::Send {
            self.render_sends(ctx, frame);
            return;
        }

        let tracks = ctx.state.bank_tracks();
        for (i, track) in tracks.iter().enumerate() {
            let x = draw::strip_x(i);
            let color = draw::track_color(track, i);

            frame.fill_rect(x, 0, draw::STRIP_W - 2, draw::HEADER_H, color);
            ctx.glyphs.draw_text(frame, x + 4, 6, &track.name, draw::BG);

            // VU meters, one per channel side
            frame.meter(x + 10, 32, 10, 100, track.vu_l.max(track.vu), draw::METER_GREEN);
            frame.meter(x + 24, 32, 10, 100, track.vu_r.max(track.vu), draw::METER_GREEN);

            // Fader position
            frame.meter(x + 50, 32, 20, 100, track.volume, color);

            // Pan marker along a horizontal lane
            let lane_w = draw::STRIP_W - 20;
            frame.fill_rect(x + 8, 140, lane_w, 3, (50, 50, 50));
            let marker = x + 8 + ((lane_w - 4) as f32 * track.pan) as i32;
            frame.fill_rect(marker, 137, 4, 9, draw::TEXT);

            if track.mute {
                frame.fill_rect(x + 80, 36, 28, 14, draw::MUTE_RED);
            }
            if track.solo {
                frame.fill_rect(x + 80, 54, 28, 14, draw::SOLO_YELLOW);
            }
            if track.selected {
                frame.fill_rect(x, draw::HEADER_H, draw::STRIP_W - 2, 2, draw::TEXT);
            }

            ctx.glyphs
                .draw_text(frame, x + 4, 148, &track.volume_str, draw::TEXT_DIM);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::testing::Fixture;

    #[test]
    fn encoder_nudge_sends_and_mirrors_locally() {
        let mut fixture = Fixture::new();
        let mut mode = MixerMode::new();

        let mut ctx = fixture.ctx();
        mode.on_encoder(&mut ctx, Encoder::Track(0), 1);
        drop(ctx);

        let msg = fixture.recv_osc();
        assert_eq!(msg.addr, "/track/1/volume");
        let sent = match msg.args[0] {
            rosc::OscType::Float(v) => v,
            _ => panic!("expected float"),
        };
        // Default volume 0.716 nudged by one step of 0.015
        assert!((sent - 0.731).abs() < 1e-4);
        let cached = fixture.state.track(1).unwrap().volume;
        assert!((cached - sent).abs() < f32::EPSILON);
    }

    #[test]
    fn lower_row_mode_changes_action() {
        let mut fixture = Fixture::new();
        let mut mode = MixerMode::new();

        let mut ctx = fixture.ctx();
        assert!(mode.on_button(&mut ctx, Button::Mute));
        assert!(mode.on_button(&mut ctx, Button::LowerRow(2)));
        drop(ctx);

        let msg = fixture.recv_osc();
        assert_eq!(msg.addr, "/track/3/mute/toggle");
    }

    #[test]
    fn pad_press_plays_scale_note() {
        let mut fixture = Fixture::new();
        let mut mode = MixerMode::new();

        let mut ctx = fixture.ctx();
        mode.on_pad_pressed(&mut ctx, 7, 0, 90);
        drop(ctx);

        let msg = fixture.recv_osc();
        // Bottom-left pad is the base note of C major: 36
        assert_eq!(msg.addr, "/vkb_midi/0/note/36");
        assert_eq!(msg.args[0], rosc::OscType::Int(90));
    }

    #[test]
    fn send_encoder_mode_targets_selected_track() {
        let mut fixture = Fixture::new();
        fixture.state.update_track_selected(3, true);
        let mut mode = MixerMode::new();
        mode.encoder_mode = EncoderMode::Send;

        let mut ctx = fixture.ctx();
        mode.on_encoder(&mut ctx, Encoder::Track(1), 2);
        drop(ctx);

        let msg = fixture.recv_osc();
        assert_eq!(msg.addr, "/track/3/send/2/volume");
    }
}
