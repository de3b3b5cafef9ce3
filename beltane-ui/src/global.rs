//! Global input interceptor.
//!
//! Cross-cutting controls — transport, undo/redo, navigation, octave
//! shift, automation cycling, mode switches — are handled here, ahead
//! of any mode, so no mode reimplements them. Returns true when the
//! event was consumed.

use log::{debug, info};

use beltane_types::{AutomationMode, Button, LedColor, Track, BANK_SIZE};

use crate::modes::{Ctx, ModeController, ModeKind};

/// Cross-cutting input state owned by the control loop.
#[derive(Default)]
pub struct GlobalState {
    pub shift_held: bool,
}

fn automation_led(mode: AutomationMode) -> LedColor {
    match mode {
        AutomationMode::Trim => LedColor::DarkGray,
        AutomationMode::Read => LedColor::Green,
        AutomationMode::Touch => LedColor::Yellow,
        AutomationMode::Write => LedColor::Red,
        AutomationMode::Latch => LedColor::Orange,
    }
}

/// Cycle the selected track's automation mode and mirror it locally.
fn cycle_automation(ctx: &mut Ctx) {
    let number = ctx.state.selected_track();
    let track = ctx
        .state
        .track(number)
        .unwrap_or_else(|| Track::new(number));
    let next = track.automation.next();
    ctx.daw.set_track_automation(number, next);
    ctx.state.update_track_automation(number, next);
    ctx.leds.set_color(Button::Automate, automation_led(next));
    info!("automation: {} (track {})", next.label(), number);
}

pub fn handle_button_released(globals: &mut GlobalState, button: Button) {
    if button == Button::Shift {
        globals.shift_held = false;
    }
}

pub fn handle_button(
    globals: &mut GlobalState,
    controller: &mut ModeController,
    ctx: &mut Ctx,
    button: Button,
) -> bool {
    match button {
        Button::Shift => {
            globals.shift_held = true;
            true
        }

        Button::Undo => {
            if globals.shift_held {
                ctx.daw.redo();
                info!("redo");
            } else {
                ctx.daw.undo();
                info!("undo");
            }
            true
        }

        Button::Scale => {
            controller.toggle_overlay(ctx);
            true
        }

        Button::OctaveUp | Button::OctaveDown => {
            if button == Button::OctaveUp {
                ctx.scale.octave_up();
            } else {
                ctx.scale.octave_down();
            }
            if controller.uses_note_grid() {
                ctx.pads.rebuild(ctx.scale);
            }
            info!("octave: base note {}", ctx.scale.base_note());
            true
        }

        // Transport works in every mode.
        Button::Play => {
            ctx.daw.play();
            true
        }
        Button::Stop => {
            ctx.daw.stop();
            true
        }
        Button::Record => {
            ctx.daw.record();
            true
        }
        Button::Metronome => {
            ctx.daw.click();
            true
        }
        Button::Repeat => {
            ctx.daw.repeat();
            true
        }

        // Bank paging — except while the scale overlay uses these for
        // its own pages.
        Button::PageLeft | Button::PageRight if controller.overlay_active() => false,
        Button::PageLeft => {
            ctx.daw.prev_track_bank();
            ctx.state.prev_bank();
            let offset = ctx.state.bank_offset();
            info!("bank: tracks {}-{}", offset + 1, offset + BANK_SIZE);
            true
        }
        Button::PageRight => {
            ctx.daw.next_track_bank();
            ctx.state.next_bank();
            let offset = ctx.state.bank_offset();
            info!("bank: tracks {}-{}", offset + 1, offset + BANK_SIZE);
            true
        }

        Button::Left => {
            ctx.daw.prev_track();
            true
        }
        Button::Right => {
            ctx.daw.next_track();
            true
        }

        Button::AddDevice => {
            // FX browser for the selected track
            ctx.daw.trigger_action(40271);
            true
        }
        Button::AddTrack => {
            ctx.daw.trigger_action(40702);
            true
        }

        Button::Automate => {
            cycle_automation(ctx);
            true
        }

        // Mode switches. Shift+Mix reaches the Send mode.
        Button::Mix => {
            if globals.shift_held {
                controller.toggle_base(ctx, ModeKind::Send);
            } else {
                controller.switch_base(ctx, ModeKind::Mixer);
            }
            true
        }
        Button::Note => {
            controller.toggle_base(ctx, ModeKind::Drum);
            true
        }
        Button::Device => {
            controller.toggle_base(ctx, ModeKind::Device);
            true
        }
        Button::Session => {
            controller.toggle_base(ctx, ModeKind::Session);
            true
        }
        Button::Browse => {
            controller.toggle_base(ctx, ModeKind::Browser);
            true
        }

        Button::Master => {
            debug!("master button");
            true
        }

        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::testing::Fixture;

    #[test]
    fn play_button_sends_transport() {
        let mut fixture = Fixture::new();
        let mut controller = ModeController::new();
        let mut globals = GlobalState::default();

        let mut ctx = fixture.ctx();
        assert!(handle_button(
            &mut globals,
            &mut controller,
            &mut ctx,
            Button::Play
        ));
        drop(ctx);
        assert_eq!(fixture.recv_osc().addr, "/play");
    }

    #[test]
    fn shift_undo_is_redo() {
        let mut fixture = Fixture::new();
        let mut controller = ModeController::new();
        let mut globals = GlobalState::default();

        let mut ctx = fixture.ctx();
        handle_button(&mut globals, &mut controller, &mut ctx, Button::Shift);
        handle_button(&mut globals, &mut controller, &mut ctx, Button::Undo);
        drop(ctx);
        let msg = fixture.recv_osc();
        assert_eq!(msg.addr, "/action");
        assert_eq!(msg.args[0], rosc::OscType::Int(40030));

        handle_button_released(&mut globals, Button::Shift);
        let mut ctx = fixture.ctx();
        handle_button(&mut globals, &mut controller, &mut ctx, Button::Undo);
        drop(ctx);
        let msg = fixture.recv_osc();
        assert_eq!(msg.args[0], rosc::OscType::Int(40029));
    }

    #[test]
    fn bank_paging_keeps_cache_in_step() {
        let mut fixture = Fixture::new();
        let mut controller = ModeController::new();
        let mut globals = GlobalState::default();

        let mut ctx = fixture.ctx();
        handle_button(&mut globals, &mut controller, &mut ctx, Button::PageRight);
        drop(ctx);
        assert_eq!(fixture.recv_osc().addr, "/device/track/bank/+");
        assert_eq!(fixture.state.bank_offset(), 8);
        // Invariant after navigation
        for slot in 0..BANK_SIZE as usize {
            assert_eq!(
                fixture.state.bank_track_number(slot),
                8 + 1 + slot as u32
            );
        }
    }

    #[test]
    fn paging_defers_to_scale_overlay() {
        let mut fixture = Fixture::new();
        let mut controller = ModeController::new();
        let mut globals = GlobalState::default();

        let mut ctx = fixture.ctx();
        controller.enter_initial(&mut ctx);
        controller.toggle_overlay(&mut ctx);
        assert!(!handle_button(
            &mut globals,
            &mut controller,
            &mut ctx,
            Button::PageRight
        ));
        drop(ctx);
        assert_eq!(fixture.state.bank_offset(), 0);
    }

    #[test]
    fn shift_mix_toggles_send_mode() {
        let mut fixture = Fixture::new();
        let mut controller = ModeController::new();
        let mut globals = GlobalState::default();

        let mut ctx = fixture.ctx();
        controller.enter_initial(&mut ctx);
        handle_button(&mut globals, &mut controller, &mut ctx, Button::Shift);
        handle_button(&mut globals, &mut controller, &mut ctx, Button::Mix);
        assert_eq!(controller.base(), ModeKind::Send);
        handle_button(&mut globals, &mut controller, &mut ctx, Button::Mix);
        assert_eq!(controller.base(), ModeKind::Mixer);
    }

    #[test]
    fn automation_button_cycles_and_mirrors() {
        let mut fixture = Fixture::new();
        let mut controller = ModeController::new();
        let mut globals = GlobalState::default();

        let mut ctx = fixture.ctx();
        handle_button(&mut globals, &mut controller, &mut ctx, Button::Automate);
        drop(ctx);
        let msg = fixture.recv_osc();
        // Trim cycles to Read (wire value 1) on the selected track
        assert_eq!(msg.addr, "/track/1/automode/1");
        assert_eq!(
            fixture.state.track(1).unwrap().automation,
            AutomationMode::Read
        );
    }
}
