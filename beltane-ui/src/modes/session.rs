//! Session mode — the clip launcher.
//!
//! Pads map to clip slots (column = strip, row = scene). Triggers go
//! straight to the clip engine; the resulting play states come back on
//! the slot stream and drive the pad colors. While the stream is down
//! the last-known grid is rendered dimmed, not cleared.

use log::info;

use beltane_surface::DisplayFrame;
use beltane_types::{
    Button, ClipChange, Encoder, LedColor, SlotPlayState, GRID_COLS, GRID_ROWS,
};

use crate::draw;
use crate::modes::{Ctx, Mode, RenderCtx};

fn slot_color(state: SlotPlayState, stale: bool) -> LedColor {
    if stale {
        return match state {
            SlotPlayState::Empty => LedColor::Black,
            _ => LedColor::DarkGray,
        };
    }
    match state {
        SlotPlayState::Empty => LedColor::DarkGray,
        SlotPlayState::Stopped => LedColor::White,
        SlotPlayState::Playing => LedColor::Green,
        SlotPlayState::Recording => LedColor::Red,
        SlotPlayState::Queued => LedColor::Yellow,
    }
}

fn slot_display_color(state: SlotPlayState, stale: bool) -> (u8, u8, u8) {
    let color = match state {
        SlotPlayState::Empty => (30, 30, 30),
        SlotPlayState::Stopped => (200, 200, 200),
        SlotPlayState::Playing => draw::METER_GREEN,
        SlotPlayState::Recording => draw::MUTE_RED,
        SlotPlayState::Queued => draw::SOLO_YELLOW,
    };
    if stale {
        draw::dim(color)
    } else {
        color
    }
}

pub struct SessionMode {
    /// First visible scene row.
    scene_offset: u32,
}

impl SessionMode {
    pub fn new() -> Self {
        Self { scene_offset: 0 }
    }

    fn paint_pads(&self, ctx: &mut Ctx) {
        let stale = ctx.grid.is_stale();
        let window = ctx
            .grid
            .grid_state(GRID_COLS as u32, GRID_ROWS as u32, 0, self.scene_offset);
        for (row, states) in window.iter().enumerate() {
            for (col, state) in states.iter().enumerate() {
                ctx.pads
                    .set_color(row as u8, col as u8, slot_color(*state, stale));
            }
        }
    }

    fn paint_buttons(&self, ctx: &mut Ctx) {
        for i in 0..8u8 {
            let upper = if i <= 1 {
                LedColor::Blue
            } else {
                LedColor::DarkGray
            };
            ctx.leds.set_color(Button::UpperRow(i), upper);
            // Lower row stops the clips on that column.
            ctx.leds.set_color(Button::LowerRow(i), LedColor::Red);
            ctx.leds.set_color(Button::Scene(i), LedColor::Orange);
        }
    }
}

impl Mode for SessionMode {
    fn name(&self) -> &'static str {
        "session"
    }

    fn enter(&mut self, ctx: &mut Ctx) {
        info!(
            "session: scenes {}-{}",
            self.scene_offset + 1,
            self.scene_offset + 8
        );
        self.paint_pads(ctx);
        self.paint_buttons(ctx);
    }

    fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        match button {
            Button::UpperRow(0) => {
                self.scene_offset = self.scene_offset.saturating_sub(8);
                self.paint_pads(ctx);
                true
            }
            Button::UpperRow(1) => {
                self.scene_offset += 8;
                self.paint_pads(ctx);
                true
            }
            Button::UpperRow(_) => true,
            Button::LowerRow(i) => {
                ctx.clips.stop_column(i as u32);
                true
            }
            Button::Scene(i) => {
                ctx.clips.trigger_scene(self.scene_offset + i as u32);
                true
            }
            Button::Delete => {
                ctx.clips.stop_all();
                true
            }
            _ => false,
        }
    }

    fn on_encoder(&mut self, ctx: &mut Ctx, encoder: Encoder, delta: i32) {
        match encoder {
            Encoder::Track(i) => {
                let number = ctx.state.bank_track_number(i as usize);
                if let Some(track) = ctx.state.track(number) {
                    let value = ctx.daw.nudge_track_volume(number, track.volume, delta);
                    ctx.state.update_track_volume(number, value);
                }
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

    /// One trigger per physical press. Holding the pad sends nothing
    /// further; the engine's feedback decides what the pad shows.
    fn on_pad_pressed(&mut self, ctx: &mut Ctx, row: u8, col: u8, _velocity: u8) {
        ctx.clips
            .trigger_slot(col as u32, self.scene_offset + row as u32);
    }

    fn on_clip_changed(&mut self, ctx: &mut Ctx, change: &ClipChange) {
        match change {
            ClipChange::Slot(addr) => {
                if addr.row >= self.scene_offset
                    && addr.row < self.scene_offset + GRID_ROWS as u32
                    && addr.column < GRID_COLS as u32
                {
                    let slot = ctx.grid.slot(*addr);
                    ctx.pads.set_color(
                        (addr.row - self.scene_offset) as u8,
                        addr.column as u8,
                        slot_color(slot.display_state(), ctx.grid.is_stale()),
                    );
                }
            }
            ClipChange::Matrix | ClipChange::FullRefresh | ClipChange::Connection { .. } => {
                self.paint_pads(ctx);
            }
            ClipChange::Tempo => {}
        }
    }

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        let stale = ctx.grid.is_stale();
        ctx.glyphs.draw_text(
            frame,
            8,
            4,
            &format!(
                "SESSION  scenes {}-{}  ·  {:.1} bpm{}",
                self.scene_offset + 1,
                self.scene_offset + 8,
                ctx.grid.tempo(),
                if stale { "  ·  offline" } else { "" }
            ),
            draw::TEXT,
        );

        let window = ctx
            .grid
            .grid_state(GRID_COLS as u32, GRID_ROWS as u32, 0, self.scene_offset);
        for col in 0..GRID_COLS as usize {
            let x = draw::strip_x(col);
            let name = ctx.grid.column_name(col as u32);
            ctx.glyphs.draw_text(
                frame,
                x + 4,
                22,
                &name,
                if stale { draw::TEXT_DIM } else { draw::TEXT },
            );
            for (row, states) in window.iter().enumerate() {
                let y = 40 + row as i32 * 15;
                frame.fill_rect(
                    x + 4,
                    y,
                    draw::STRIP_W - 8,
                    12,
                    slot_display_color(states[col], stale),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::testing::Fixture;
    use beltane_net::framing::read_message;
    use beltane_net::protocol::EngineRequest;
    use beltane_net::ClipClient;
    use std::io::BufReader;
    use std::net::TcpListener;
    use std::time::Duration;

    /// Fixture variant with a live command connection to a fake engine.
    fn fixture_with_engine() -> (Fixture, BufReader<std::net::TcpStream>) {
        let mut fixture = Fixture::new();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        fixture.clips = ClipClient::new(&addr, fixture.grid.clone());
        fixture.clips.connect_command().unwrap();
        let (server, _) = listener.accept().unwrap();
        server
            .set_read_timeout(Some(Duration::from_millis(100)))
            .unwrap();
        (fixture, BufReader::new(server))
    }

    #[test]
    fn pad_press_triggers_exactly_one_slot() {
        let (mut fixture, mut server) = fixture_with_engine();
        let mut mode = SessionMode::new();

        let mut ctx = fixture.ctx();
        mode.on_pad_pressed(&mut ctx, 2, 5, 100);
        drop(ctx);

        let request: EngineRequest = read_message(&mut server).unwrap();
        assert_eq!(request, EngineRequest::TriggerSlot { column: 5, row: 2 });

        // Holding the pad (no release+press cycle) sends nothing more,
        // and the release itself is not a trigger.
        let mut ctx = fixture.ctx();
        mode.on_pad_released(&mut ctx, 2, 5);
        drop(ctx);
        let next: std::io::Result<EngineRequest> = read_message(&mut server);
        assert!(next.is_err());
    }

    #[test]
    fn scene_offset_shifts_triggered_row() {
        let (mut fixture, mut server) = fixture_with_engine();
        let mut mode = SessionMode::new();

        let mut ctx = fixture.ctx();
        mode.on_button(&mut ctx, Button::UpperRow(1));
        mode.on_pad_pressed(&mut ctx, 0, 0, 100);
        drop(ctx);

        let request: EngineRequest = read_message(&mut server).unwrap();
        assert_eq!(request, EngineRequest::TriggerSlot { column: 0, row: 8 });
    }

    #[test]
    fn scene_button_triggers_row() {
        let (mut fixture, mut server) = fixture_with_engine();
        let mut mode = SessionMode::new();

        let mut ctx = fixture.ctx();
        mode.on_button(&mut ctx, Button::Scene(3));
        drop(ctx);

        let request: EngineRequest = read_message(&mut server).unwrap();
        assert_eq!(request, EngineRequest::TriggerRow { row: 3 });
    }

    #[test]
    fn stop_buttons_stop_columns() {
        let (mut fixture, mut server) = fixture_with_engine();
        let mut mode = SessionMode::new();

        let mut ctx = fixture.ctx();
        mode.on_button(&mut ctx, Button::LowerRow(4));
        drop(ctx);

        let request: EngineRequest = read_message(&mut server).unwrap();
        assert_eq!(request, EngineRequest::StopColumn { column: 4 });
    }

    #[test]
    fn slot_update_repaints_single_pad() {
        let (mut fixture, _server) = fixture_with_engine();
        let mut mode = SessionMode::new();

        let mut ctx = fixture.ctx();
        mode.enter(&mut ctx);
        drop(ctx);
        let before = fixture.pad_sink.pad_writes();

        let addr = beltane_types::SlotAddr::new(2, 1);
        fixture.grid.set_slot_play_state(addr, SlotPlayState::Playing);
        let mut ctx = fixture.ctx();
        mode.on_clip_changed(&mut ctx, &ClipChange::Slot(addr));
        drop(ctx);

        assert_eq!(fixture.pad_sink.pad_writes() - before, 1);
    }
}
