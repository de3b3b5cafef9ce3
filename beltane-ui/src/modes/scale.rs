//! Scale overlay.
//!
//! Selects root, scale, layout, and in-key filtering. Layered above the
//! active base mode; any button it does not understand closes the
//! overlay and goes to the restored base mode.

use log::info;

use beltane_core::scales::{LAYOUTS, ROOT_NAMES, SCALES, TOTAL_PAGES};
use beltane_surface::DisplayFrame;
use beltane_types::{Button, LedColor};

use crate::draw;
use crate::modes::{Ctx, Mode, RenderCtx};

pub struct ScaleMode;

impl ScaleMode {
    pub fn new() -> Self {
        Self
    }

    fn update_buttons(&self, ctx: &mut Ctx) {
        // Upper row: root selection (the first eight roots).
        for i in 0..8u8 {
            let color = if i == ctx.scale.root {
                LedColor::Blue
            } else {
                LedColor::White
            };
            ctx.leds.set_color(Button::UpperRow(i), color);
        }

        // Lower row depends on the page: scales, or layout + in-key on
        // the settings page.
        if ctx.scale.is_settings_page() {
            for i in 0..8usize {
                let color = if i < LAYOUTS.len() {
                    if i == ctx.scale.layout {
                        LedColor::Orange
                    } else {
                        LedColor::White
                    }
                } else if i == 7 {
                    if ctx.scale.in_key {
                        LedColor::Green
                    } else {
                        LedColor::DarkGray
                    }
                } else {
                    LedColor::Black
                };
                ctx.leds.set_color(Button::LowerRow(i as u8), color);
            }
        } else {
            let page_offset = ctx.scale.page * 8;
            for i in 0..8usize {
                let index = page_offset + i;
                let color = if index >= SCALES.len() {
                    LedColor::Black
                } else if index == ctx.scale.scale {
                    LedColor::Turquoise
                } else {
                    LedColor::White
                };
                ctx.leds.set_color(Button::LowerRow(i as u8), color);
            }
        }
    }
}

impl Mode for ScaleMode {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn enter(&mut self, ctx: &mut Ctx) {
        ctx.leds.set_color(Button::Scale, LedColor::White);
        // Preview the note grid while choosing; the base mode may have
        // claimed the pads for something else.
        ctx.pads.invalidate();
        ctx.pads.rebuild(ctx.scale);
        self.update_buttons(ctx);
    }

    fn exit(&mut self, ctx: &mut Ctx) {
        info!(
            "scale: {} {}",
            ctx.scale.root_name(),
            ctx.scale.scale_name()
        );
        ctx.leds.set_color(Button::Scale, LedColor::DarkGray);
    }

    fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        match button {
            Button::UpperRow(i) => {
                ctx.scale.set_root(i);
                ctx.pads.rebuild(ctx.scale);
                self.update_buttons(ctx);
                true
            }
            Button::LowerRow(i) => {
                let i = i as usize;
                if ctx.scale.is_settings_page() {
                    if i < LAYOUTS.len() {
                        ctx.scale.set_layout(i);
                        ctx.pads.rebuild(ctx.scale);
                    } else if i == 7 {
                        ctx.scale.in_key = !ctx.scale.in_key;
                        ctx.pads.rebuild(ctx.scale);
                    }
                } else {
                    let index = ctx.scale.page * 8 + i;
                    if index < SCALES.len() {
                        ctx.scale.set_scale(index);
                        ctx.pads.rebuild(ctx.scale);
                    }
                }
                self.update_buttons(ctx);
                true
            }
            Button::PageLeft => {
                ctx.scale.page = ctx.scale.page.saturating_sub(1);
                self.update_buttons(ctx);
                true
            }
            Button::PageRight => {
                ctx.scale.page = (ctx.scale.page + 1).min(TOTAL_PAGES - 1);
                self.update_buttons(ctx);
                true
            }
            _ => false,
        }
    }

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        ctx.glyphs.draw_text(
            frame,
            8,
            4,
            &format!(
                "{} {}  ·  {} layout{}",
                ctx.scale.root_name(),
                ctx.scale.scale_name(),
                ctx.scale.layout_name(),
                if ctx.scale.in_key { "  ·  in key" } else { "" }
            ),
            draw::TEXT,
        );

        if ctx.scale.is_settings_page() {
            for (i, (name, _)) in LAYOUTS.iter().enumerate() {
                let x = draw::strip_x(i);
                let selected = i == ctx.scale.layout;
                frame.fill_rect(
                    x + 4,
                    120,
                    draw::STRIP_W - 8,
                    30,
                    if selected { (255, 90, 0) } else { (40, 40, 40) },
                );
                ctx.glyphs.draw_text(frame, x + 10, 130, name, draw::TEXT);
            }
            ctx.glyphs.draw_text(
                frame,
                draw::strip_x(7) + 10,
                130,
                if ctx.scale.in_key { "In Key" } else { "Chromatic" },
                draw::TEXT,
            );
        } else {
            let page_offset = ctx.scale.page * 8;
            for i in 0..8usize {
                let Some((name, _)) = SCALES.get(page_offset + i) else {
                    continue;
                };
                let x = draw::strip_x(i);
                let selected = page_offset + i == ctx.scale.scale;
                frame.fill_rect(
                    x + 4,
                    120,
                    draw::STRIP_W - 8,
                    30,
                    if selected { (0, 200, 180) } else { (40, 40, 40) },
                );
                ctx.glyphs.draw_text(frame, x + 10, 130, name, draw::TEXT);
            }
        }

        // Root row along the top
        for (i, name) in ROOT_NAMES.iter().enumerate().take(8) {
            let x = draw::strip_x(i);
            let selected = i as u8 == ctx.scale.root;
            frame.fill_rect(
                x + 4,
                40,
                draw::STRIP_W - 8,
                30,
                if selected { (60, 100, 255) } else { (40, 40, 40) },
            );
            ctx.glyphs.draw_text(frame, x + 10, 50, name, draw::TEXT);
        }
    }
}
