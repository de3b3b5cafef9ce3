//! Outbound OSC command client.
//!
//! One method per controllable parameter class. Every numeric payload
//! is clamped to its valid range before encoding, and this client is
//! the single place where internal 0-based device/param/send indices
//! become the wire's 1-based ones.

use std::net::UdpSocket;

use log::{debug, warn};
use rosc::{OscMessage, OscPacket, OscType};

use beltane_types::{clamp_unit, nudge, AutomationMode, Transport};

/// Encoder step sizes, from configuration.
#[derive(Debug, Clone, Copy)]
pub struct Steps {
    pub volume: f32,
    pub pan: f32,
    pub param: f32,
}

impl Default for Steps {
    fn default() -> Self {
        Self {
            volume: 0.015,
            pan: 0.02,
            param: 0.01,
        }
    }
}

pub struct OscClient {
    socket: UdpSocket,
    daw_addr: String,
    steps: Steps,
}

impl OscClient {
    pub fn new(daw_addr: &str, steps: Steps) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            daw_addr: daw_addr.to_string(),
            steps,
        })
    }

    pub fn daw_addr(&self) -> &str {
        &self.daw_addr
    }

    fn send(&self, addr: &str, args: Vec<OscType>) {
        let msg = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        });
        match rosc::encoder::encode(&msg) {
            Ok(buf) => {
                debug!(target: "osc", "send {}", addr);
                if let Err(e) = self.socket.send_to(&buf, &self.daw_addr) {
                    warn!(target: "osc", "send to {} failed: {}", self.daw_addr, e);
                }
            }
            Err(e) => warn!(target: "osc", "encode {} failed: {}", addr, e),
        }
    }

    fn send_float(&self, addr: &str, value: f32) {
        self.send(addr, vec![OscType::Float(value)]);
    }

    // --- Transport ---

    pub fn play(&self) {
        self.send("/play", vec![]);
    }

    pub fn stop(&self) {
        self.send("/stop", vec![]);
    }

    pub fn pause(&self) {
        self.send("/pause", vec![]);
    }

    pub fn record(&self) {
        self.send("/record", vec![]);
    }

    /// Toggle the metronome.
    pub fn click(&self) {
        self.send("/click", vec![]);
    }

    pub fn repeat(&self) {
        self.send("/repeat", vec![]);
    }

    pub fn set_tempo(&self, bpm: f64) {
        self.send(
            "/tempo/raw",
            vec![OscType::Float(Transport::clamp_tempo(bpm) as f32)],
        );
    }

    // --- Track volume/pan ---

    pub fn set_track_volume(&self, track: u32, value: f32) {
        self.send_float(&format!("/track/{}/volume", track), clamp_unit(value));
    }

    pub fn set_track_pan(&self, track: u32, value: f32) {
        self.send_float(&format!("/track/{}/pan", track), clamp_unit(value));
    }

    /// Nudge track volume by an encoder increment. Returns the value
    /// that was sent so local state stays in step.
    pub fn nudge_track_volume(&self, track: u32, current: f32, increment: i32) -> f32 {
        let value = nudge(current, increment, self.steps.volume);
        self.set_track_volume(track, value);
        value
    }

    pub fn nudge_track_pan(&self, track: u32, current: f32, increment: i32) -> f32 {
        let value = nudge(current, increment, self.steps.pan);
        self.set_track_pan(track, value);
        value
    }

    // --- Track flags ---

    pub fn toggle_track_mute(&self, track: u32) {
        self.send(&format!("/track/{}/mute/toggle", track), vec![]);
    }

    pub fn toggle_track_solo(&self, track: u32) {
        self.send(&format!("/track/{}/solo/toggle", track), vec![]);
    }

    pub fn toggle_track_rec_arm(&self, track: u32) {
        self.send(&format!("/track/{}/recarm/toggle", track), vec![]);
    }

    /// Exclusively select a track, deselecting the rest of the bank.
    pub fn select_track(&self, track: u32, bank_size: u32) {
        for i in 1..=bank_size {
            if i != track {
                self.send(&format!("/track/{}/select", i), vec![OscType::Int(0)]);
            }
        }
        self.send(&format!("/track/{}/select", track), vec![OscType::Int(1)]);
    }

    /// Exclusively select and record-arm a track, disarming the rest.
    pub fn select_and_arm_track(&self, track: u32, bank_size: u32) {
        for i in 1..=bank_size {
            if i != track {
                self.send(&format!("/track/{}/select", i), vec![OscType::Int(0)]);
                self.send(&format!("/track/{}/recarm", i), vec![OscType::Int(0)]);
            }
        }
        self.send(&format!("/track/{}/select", track), vec![OscType::Int(1)]);
        self.send(&format!("/track/{}/recarm", track), vec![OscType::Int(1)]);
    }

    /// Clear all solos.
    pub fn solo_reset(&self) {
        self.send("/soloreset", vec![]);
    }

    // --- Master ---

    pub fn set_master_volume(&self, value: f32) {
        self.send_float("/master/volume", clamp_unit(value));
    }

    pub fn nudge_master_volume(&self, current: f32, increment: i32) -> f32 {
        let value = nudge(current, increment, self.steps.volume);
        self.set_master_volume(value);
        value
    }

    // --- Bank / track navigation ---

    pub fn next_track_bank(&self) {
        self.send("/device/track/bank/+", vec![]);
    }

    pub fn prev_track_bank(&self) {
        self.send("/device/track/bank/-", vec![]);
    }

    pub fn next_track(&self) {
        self.send("/device/track/+", vec![]);
    }

    pub fn prev_track(&self) {
        self.send("/device/track/-", vec![]);
    }

    // --- Sends (0-based internally, 1-based on the wire) ---

    pub fn set_send_level(&self, track: u32, send: usize, value: f32) {
        self.send_float(
            &format!("/track/{}/send/{}/volume", track, send + 1),
            clamp_unit(value),
        );
    }

    pub fn nudge_send_level(&self, track: u32, send: usize, current: f32, increment: i32) -> f32 {
        let value = nudge(current, increment, self.steps.volume);
        self.set_send_level(track, send, value);
        value
    }

    pub fn set_send_pan(&self, track: u32, send: usize, value: f32) {
        self.send_float(
            &format!("/track/{}/send/{}/pan", track, send + 1),
            clamp_unit(value),
        );
    }

    // --- Automation ---

    pub fn set_track_automation(&self, track: u32, mode: AutomationMode) {
        self.send(
            &format!("/track/{}/automode/{}", track, mode.raw()),
            vec![],
        );
    }

    // --- Device params (0-based internally, 1-based on the wire) ---

    pub fn set_device_param(&self, track: u32, device: usize, param: usize, value: f32) {
        self.send_float(
            &format!(
                "/track/{}/fx/{}/fxparam/{}/value",
                track,
                device + 1,
                param + 1
            ),
            clamp_unit(value),
        );
    }

    pub fn nudge_device_param(
        &self,
        track: u32,
        device: usize,
        param: usize,
        current: f32,
        increment: i32,
    ) -> f32 {
        let value = nudge(current, increment, self.steps.param);
        self.set_device_param(track, device, param, value);
        value
    }

    // --- Virtual keyboard ---

    pub fn note_on(&self, channel: u8, note: u8, velocity: u8) {
        self.send(
            &format!("/vkb_midi/{}/note/{}", channel, note),
            vec![OscType::Int(velocity.min(127) as i32)],
        );
    }

    /// Note-off is note-on with velocity 0.
    pub fn note_off(&self, channel: u8, note: u8) {
        self.send(
            &format!("/vkb_midi/{}/note/{}", channel, note),
            vec![OscType::Int(0)],
        );
    }

    pub fn pitch_bend(&self, channel: u8, value: f32) {
        self.send_float(&format!("/vkb_midi/{}/pitch", channel), clamp_unit(value));
    }

    pub fn channel_pressure(&self, channel: u8, value: u8) {
        self.send(
            &format!("/vkb_midi/{}/channelpressure", channel),
            vec![OscType::Int(value.min(127) as i32)],
        );
    }

    pub fn poly_aftertouch(&self, channel: u8, note: u8, value: u8) {
        self.send(
            &format!("/vkb_midi/{}/polyaftertouch/{}", channel, note),
            vec![OscType::Int(value.min(127) as i32)],
        );
    }

    // --- Actions ---

    pub fn undo(&self) {
        self.trigger_action(40029);
    }

    pub fn redo(&self) {
        self.trigger_action(40030);
    }

    /// Trigger a DAW action by command id.
    pub fn trigger_action(&self, action_id: i32) {
        self.send("/action", vec![OscType::Int(action_id)]);
    }
}
