//! The mode system: one polymorphic capability interface, a closed set
//! of base modes, and a single-level Scale overlay.
//!
//! Dispatch flows global interceptor → overlay (if active) → base
//! mode, with one virtual-call site here in the controller. The
//! controller's load-bearing invariant: every transition invalidates
//! the pad and LED dedup caches between `exit(old)` and `enter(new)`,
//! so a mode always starts from a known-clean hardware output cache and
//! cross-mode LED/pad bleed cannot happen.

mod browser;
mod device;
mod drum;
mod mixer;
mod scale;
mod send;
mod session;

pub use browser::BrowserMode;
pub use device::DeviceMode;
pub use drum::DrumMode;
pub use mixer::MixerMode;
pub use scale::ScaleMode;
pub use send::SendMode;
pub use session::SessionMode;

use log::info;

use beltane_core::{ClipGrid, DawState, ScaleState};
use beltane_net::{ClipClient, OscClient};
use beltane_surface::{ButtonLeds, DisplayFrame, GlyphRenderer, PadGrid};
use beltane_types::{Button, ClipChange, Encoder, StateChange};

/// Everything a mode may touch while handling input. Built by the
/// control loop for each dispatch batch; modes never own these.
pub struct Ctx<'a> {
    pub state: &'a DawState,
    pub grid: &'a ClipGrid,
    pub daw: &'a OscClient,
    pub clips: &'a ClipClient,
    pub pads: &'a mut PadGrid,
    pub leds: &'a mut ButtonLeds,
    pub scale: &'a mut ScaleState,
}

/// Read-only view for rendering.
pub struct RenderCtx<'a> {
    pub state: &'a DawState,
    pub grid: &'a ClipGrid,
    pub scale: &'a ScaleState,
    pub glyphs: &'a dyn GlyphRenderer,
}

/// Capability interface every mode implements. Handlers return whether
/// they consumed the event; unhandled buttons bubble (out of the
/// overlay, or to a log line).
pub trait Mode {
    fn name(&self) -> &'static str;

    /// Repaint everything this mode claims. Called with clean dedup
    /// caches.
    fn enter(&mut self, ctx: &mut Ctx);

    /// Release exclusively-claimed state. The controller invalidates
    /// the output caches right after, so most modes need nothing here.
    fn exit(&mut self, _ctx: &mut Ctx) {}

    fn on_button(&mut self, _ctx: &mut Ctx, _button: Button) -> bool {
        false
    }

    fn on_encoder(&mut self, _ctx: &mut Ctx, _encoder: Encoder, _delta: i32) {}

    fn on_pad_pressed(&mut self, _ctx: &mut Ctx, _row: u8, _col: u8, _velocity: u8) {}

    fn on_pad_released(&mut self, _ctx: &mut Ctx, _row: u8, _col: u8) {}

    fn on_aftertouch(&mut self, _ctx: &mut Ctx, _row: u8, _col: u8, _pressure: u8) {}

    fn on_state_changed(&mut self, _ctx: &mut Ctx, _change: &StateChange) {}

    fn on_clip_changed(&mut self, _ctx: &mut Ctx, _change: &ClipChange) {}

    fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame);
}

/// The closed set of base modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Mixer,
    Drum,
    Device,
    Session,
    Browser,
    Send,
}

pub struct ModeController {
    base: ModeKind,
    mixer: MixerMode,
    drum: DrumMode,
    device: DeviceMode,
    session: SessionMode,
    browser: BrowserMode,
    send: SendMode,
    scale: ScaleMode,
    overlay_active: bool,
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            base: ModeKind::Mixer,
            mixer: MixerMode::new(),
            drum: DrumMode::new(),
            device: DeviceMode::new(),
            session: SessionMode::new(),
            browser: BrowserMode::new(),
            send: SendMode::new(),
            scale: ScaleMode::new(),
            overlay_active: false,
        }
    }

    pub fn base(&self) -> ModeKind {
        self.base
    }

    pub fn overlay_active(&self) -> bool {
        self.overlay_active
    }

    /// The single dynamic-dispatch site over the base variants.
    fn base_mode_mut(&mut self) -> &mut dyn Mode {
        match self.base {
            ModeKind::Mixer => &mut self.mixer,
            ModeKind::Drum => &mut self.drum,
            ModeKind::Device => &mut self.device,
            ModeKind::Session => &mut self.session,
            ModeKind::Browser => &mut self.browser,
            ModeKind::Send => &mut self.send,
        }
    }

    fn base_mode(&self) -> &dyn Mode {
        match self.base {
            ModeKind::Mixer => &self.mixer,
            ModeKind::Drum => &self.drum,
            ModeKind::Device => &self.device,
            ModeKind::Session => &self.session,
            ModeKind::Browser => &self.browser,
            ModeKind::Send => &self.send,
        }
    }

    /// The mode input currently routes to.
    fn active_mode_mut(&mut self) -> &mut dyn Mode {
        if self.overlay_active {
            &mut self.scale
        } else {
            self.base_mode_mut()
        }
    }

    fn active_mode(&self) -> &dyn Mode {
        if self.overlay_active {
            &self.scale
        } else {
            self.base_mode()
        }
    }

    /// Enter the initial (Mixer) mode at startup.
    pub fn enter_initial(&mut self, ctx: &mut Ctx) {
        self.base_mode_mut().enter(ctx);
        info!("mode: {}", self.base_mode().name());
    }

    /// Mode-button semantics: pressing the active mode's button returns
    /// to Mixer.
    pub fn toggle_base(&mut self, ctx: &mut Ctx, kind: ModeKind) {
        let target = if self.base == kind && kind != ModeKind::Mixer {
            ModeKind::Mixer
        } else {
            kind
        };
        self.switch_base(ctx, target);
    }

    pub fn switch_base(&mut self, ctx: &mut Ctx, kind: ModeKind) {
        if self.overlay_active {
            // A mode switch dismisses the overlay without restoring the
            // old base.
            self.scale.exit(ctx);
            self.overlay_active = false;
        } else if self.base == kind {
            return;
        }
        self.base_mode_mut().exit(ctx);
        self.base = kind;
        ctx.pads.invalidate();
        ctx.leds.invalidate();
        self.base_mode_mut().enter(ctx);
        info!("mode: {}", self.base_mode().name());
    }

    /// Toggle the Scale overlay. Deactivation re-enters the base mode
    /// (exactly once) after invalidating the output caches, forcing a
    /// clean repaint.
    pub fn toggle_overlay(&mut self, ctx: &mut Ctx) {
        if self.overlay_active {
            self.scale.exit(ctx);
            self.overlay_active = false;
            ctx.pads.invalidate();
            ctx.leds.invalidate();
            self.base_mode_mut().enter(ctx);
            info!("mode: {} (overlay closed)", self.base_mode().name());
        } else {
            self.base_mode_mut().exit(ctx);
            self.overlay_active = true;
            self.scale.enter(ctx);
            info!("mode: {} (overlay)", self.scale.name());
        }
    }

    /// True when the note grid owns the pads, so cross-cutting actions
    /// (octave shift) may rebuild it.
    pub fn uses_note_grid(&self) -> bool {
        if self.overlay_active {
            return true;
        }
        !matches!(self.base, ModeKind::Drum | ModeKind::Session)
    }

    /// Route a button: overlay first; an unhandled button closes the
    /// overlay and is re-dispatched once to the restored base mode.
    pub fn on_button(&mut self, ctx: &mut Ctx, button: Button) -> bool {
        if self.overlay_active {
            if self.scale.on_button(ctx, button) {
                return true;
            }
            self.toggle_overlay(ctx);
            return self.base_mode_mut().on_button(ctx, button);
        }
        self.base_mode_mut().on_button(ctx, button)
    }

    pub fn on_encoder(&mut self, ctx: &mut Ctx, encoder: Encoder, delta: i32) {
        self.active_mode_mut().on_encoder(ctx, encoder, delta);
    }

    pub fn on_pad_pressed(&mut self, ctx: &mut Ctx, row: u8, col: u8, velocity: u8) {
        self.active_mode_mut().on_pad_pressed(ctx, row, col, velocity);
    }

    pub fn on_pad_released(&mut self, ctx: &mut Ctx, row: u8, col: u8) {
        self.active_mode_mut().on_pad_released(ctx, row, col);
    }

    pub fn on_aftertouch(&mut self, ctx: &mut Ctx, row: u8, col: u8, pressure: u8) {
        self.active_mode_mut().on_aftertouch(ctx, row, col, pressure);
    }

    pub fn on_state_changed(&mut self, ctx: &mut Ctx, change: &StateChange) {
        self.active_mode_mut().on_state_changed(ctx, change);
    }

    pub fn on_clip_changed(&mut self, ctx: &mut Ctx, change: &ClipChange) {
        self.active_mode_mut().on_clip_changed(ctx, change);
    }

    /// Render the active view (the overlay substitutes its own render).
    pub fn render(&self, ctx: &RenderCtx, frame: &mut DisplayFrame) {
        self.active_mode().render(ctx, frame);
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for mode tests: a full `Ctx` over loopback
    //! sockets and recording sinks.

    use super::*;
    use beltane_core::{EventBus, ScaleState};
    use beltane_net::osc::Steps;
    use beltane_surface::MidiSink;
    use std::net::UdpSocket;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct RecordingSink(pub Arc<Mutex<Vec<Vec<u8>>>>);

    impl MidiSink for RecordingSink {
        fn send(&mut self, data: &[u8]) {
            self.0.lock().unwrap().push(data.to_vec());
        }
    }

    impl RecordingSink {
        pub fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }

        /// Pad messages (note-on status byte) sent so far.
        pub fn pad_writes(&self) -> usize {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m[0] == 0x90)
                .count()
        }
    }

    pub struct Fixture {
        pub bus: EventBus,
        pub state: Arc<DawState>,
        pub grid: Arc<ClipGrid>,
        pub daw: OscClient,
        pub daw_receiver: UdpSocket,
        pub clips: ClipClient,
        pub pad_sink: RecordingSink,
        pub led_sink: RecordingSink,
        pub pads: PadGrid,
        pub leds: ButtonLeds,
        pub scale: ScaleState,
    }

    impl Fixture {
        pub fn new() -> Self {
            let bus = EventBus::new();
            let state = Arc::new(DawState::new(bus.handle()));
            let grid = Arc::new(ClipGrid::new(bus.handle()));

            let daw_receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
            daw_receiver
                .set_read_timeout(Some(std::time::Duration::from_millis(200)))
                .unwrap();
            let daw = OscClient::new(
                &daw_receiver.local_addr().unwrap().to_string(),
                Steps::default(),
            )
            .unwrap();

            let clips = ClipClient::new("127.0.0.1:1", grid.clone());

            let pad_sink = RecordingSink::default();
            let led_sink = RecordingSink::default();
            let pads = PadGrid::new(Box::new(pad_sink.clone()));
            let leds = ButtonLeds::new(Box::new(led_sink.clone()));

            Self {
                bus,
                state,
                grid,
                daw,
                daw_receiver,
                clips,
                pad_sink,
                led_sink,
                pads,
                leds,
                scale: ScaleState::default(),
            }
        }

        pub fn ctx(&mut self) -> Ctx<'_> {
            Ctx {
                state: &self.state,
                grid: &self.grid,
                daw: &self.daw,
                clips: &self.clips,
                pads: &mut self.pads,
                leds: &mut self.leds,
                scale: &mut self.scale,
            }
        }

        /// Next OSC message the DAW would have received.
        pub fn recv_osc(&self) -> rosc::OscMessage {
            let mut buf = [0u8; 1024];
            let n = self.daw_receiver.recv(&mut buf).unwrap();
            match rosc::decoder::decode_udp(&buf[..n]).unwrap().1 {
                rosc::OscPacket::Message(msg) => msg,
                rosc::OscPacket::Bundle(_) => panic!("unexpected bundle"),
            }
        }
    }
}
