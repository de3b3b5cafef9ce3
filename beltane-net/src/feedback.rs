//! OSC feedback listener.
//!
//! The DAW pushes asynchronous state feedback over UDP. A background
//! thread blocks on the socket with a short read timeout (so shutdown
//! is honored), decodes each packet, and routes it into the state
//! cache. Feedback is high-volume and partially adversarial — version
//! mismatches are expected — so unknown or malformed messages are
//! dropped with a diagnostic, never raised.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use regex::Regex;
use rosc::{OscPacket, OscType};

use beltane_core::DawState;
use beltane_types::{AutomationMode, Rgb};

static TRACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/track/(\d+)/(.+)$").expect("track regex"));
static SEND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/track/(\d+)/send/(\d+)/(.+)$").expect("send regex"));
static FX_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/track/(\d+)/fx/(\d+)/fxparam/(\d+)/(.+)$").expect("fx param regex")
});
static FX_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/track/(\d+)/fx/(\d+)/name$").expect("fx name regex"));

pub struct FeedbackListener {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    port: u16,
}

impl FeedbackListener {
    /// Bind the feedback port and start the listener thread. A port
    /// that cannot be bound is a startup failure and is returned as an
    /// error.
    pub fn start(port: u16, state: Arc<DawState>) -> io::Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))?;
        socket.set_read_timeout(Some(Duration::from_millis(50)))?;

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let thread = thread::Builder::new()
            .name("osc-feedback".into())
            .spawn(move || listener_loop(socket, state, thread_running))
            .expect("failed to spawn osc-feedback thread");

        info!(target: "feedback", "OSC feedback listening on :{}", port);
        Ok(Self {
            running,
            thread: Some(thread),
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        info!(target: "feedback", "OSC feedback stopped");
    }
}

impl Drop for FeedbackListener {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

fn listener_loop(socket: UdpSocket, state: Arc<DawState>, running: Arc<AtomicBool>) {
    let mut buf = [0u8; 4096];
    let mut unmatched: u32 = 0;
    while running.load(Ordering::Relaxed) {
        match socket.recv(&mut buf) {
            Ok(n) => match rosc::decoder::decode_udp(&buf[..n]) {
                Ok((_, packet)) => apply_packet(&state, &packet, &mut unmatched),
                Err(e) => debug!(target: "feedback", "undecodable packet: {}", e),
            },
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                warn!(target: "feedback", "socket error: {}", e);
                break;
            }
        }
    }
    debug!(target: "feedback", "listener thread exiting");
}

fn apply_packet(state: &DawState, packet: &OscPacket, unmatched: &mut u32) {
    match packet {
        OscPacket::Message(msg) => {
            if !apply_message(state, &msg.addr, &msg.args) {
                *unmatched += 1;
                match *unmatched {
                    1..=5 => info!(target: "feedback", "unmatched OSC: {} {:?}", msg.addr, msg.args),
                    6 => info!(target: "feedback", "(suppressing further unmatched OSC logs)"),
                    _ => debug!(target: "feedback", "unmatched OSC: {}", msg.addr),
                }
            }
        }
        OscPacket::Bundle(bundle) => {
            for inner in &bundle.content {
                apply_packet(state, inner, unmatched);
            }
        }
    }
}

/// Decode one feedback message into a cache update. Returns false for
/// addresses this runtime does not consume.
pub fn apply_message(state: &DawState, addr: &str, args: &[OscType]) -> bool {
    // Fixed addresses first: transport, tempo, master.
    match addr {
        "/play" => {
            if let Some(v) = arg_bool(args) {
                state.set_playing(v);
            }
            return true;
        }
        "/record" => {
            if let Some(v) = arg_bool(args) {
                state.set_recording(v);
            }
            return true;
        }
        "/pause" => {
            if let Some(v) = arg_bool(args) {
                state.set_paused(v);
            }
            return true;
        }
        "/repeat" => {
            if let Some(v) = arg_bool(args) {
                state.set_repeat(v);
            }
            return true;
        }
        "/stop" => {
            if arg_bool(args) == Some(true) {
                state.set_stopped();
            }
            return true;
        }
        "/tempo/raw" => {
            if let Some(v) = arg_float(args) {
                state.set_tempo(v as f64);
            }
            return true;
        }
        "/tempo/str" => {
            if let Some(v) = arg_string(args) {
                state.set_tempo_str(v);
            }
            return true;
        }
        "/beat/str" => {
            if let Some(v) = arg_string(args) {
                state.set_beat_str(v);
            }
            return true;
        }
        "/time/str" => {
            if let Some(v) = arg_string(args) {
                state.set_time_str(v);
            }
            return true;
        }
        "/master/volume" => {
            if let Some(v) = arg_unit(args) {
                state.set_master_volume(v);
            }
            return true;
        }
        "/master/pan" => {
            if let Some(v) = arg_unit(args) {
                state.set_master_pan(v);
            }
            return true;
        }
        "/master/vu" => {
            if let Some(v) = arg_unit(args) {
                state.set_master_vu(v);
            }
            return true;
        }
        "/master/volume/str" => {
            if let Some(v) = arg_string(args) {
                state.set_master_volume_str(v);
            }
            return true;
        }
        _ => {}
    }

    // Send paths nest under /track/, so try them before plain track
    // fields.
    if let Some(caps) = SEND_RE.captures(addr) {
        let (Some(track), Some(send)) = (parse_u32(&caps[1]), parse_u32(&caps[2])) else {
            return false;
        };
        if send == 0 {
            return false;
        }
        let send = (send - 1) as usize; // 1-based wire → 0-based internal
        match &caps[3] {
            "volume" => {
                if let Some(v) = arg_unit(args) {
                    state.update_send_level(track, send, v);
                }
            }
            "pan" => {
                if let Some(v) = arg_unit(args) {
                    state.update_send_pan(track, send, v);
                }
            }
            "name" => {
                if let Some(v) = arg_string(args) {
                    state.update_send_name(track, send, v);
                }
            }
            "volume/str" => {
                if let Some(v) = arg_string(args) {
                    state.update_send_level_str(track, send, v);
                }
            }
            _ => return false,
        }
        return true;
    }

    if let Some(caps) = FX_PARAM_RE.captures(addr) {
        let (Some(track), Some(fx), Some(param)) = (
            parse_u32(&caps[1]),
            parse_u32(&caps[2]),
            parse_u32(&caps[3]),
        ) else {
            return false;
        };
        if fx == 0 || param == 0 {
            return false;
        }
        let (fx, param) = ((fx - 1) as usize, (param - 1) as usize);
        match &caps[4] {
            "value" => {
                if let Some(v) = arg_unit(args) {
                    state.update_device_param_value(track, fx, param, v);
                }
            }
            "name" => {
                if let Some(v) = arg_string(args) {
                    state.update_device_param_name(track, fx, param, v);
                }
            }
            _ => return false,
        }
        return true;
    }

    if let Some(caps) = FX_NAME_RE.captures(addr) {
        let (Some(track), Some(fx)) = (parse_u32(&caps[1]), parse_u32(&caps[2])) else {
            return false;
        };
        if fx == 0 {
            return false;
        }
        if let Some(v) = arg_string(args) {
            state.update_device_name(track, (fx - 1) as usize, v);
        }
        return true;
    }

    if let Some(caps) = TRACK_RE.captures(addr) {
        let Some(track) = parse_u32(&caps[1]) else {
            return false;
        };
        match &caps[2] {
            // Normalized floats: out-of-range values are dB strings or
            // raw values leaking through wildcard feedback — drop them.
            "volume" => {
                if let Some(v) = arg_unit(args) {
                    state.update_track_volume(track, v);
                }
            }
            "pan" => {
                if let Some(v) = arg_unit(args) {
                    state.update_track_pan(track, v);
                }
            }
            "vu" => {
                if let Some(v) = arg_unit(args) {
                    state.update_track_vu(track, v);
                }
            }
            "vu/L" => {
                if let Some(v) = arg_unit(args) {
                    state.update_track_vu_left(track, v);
                }
            }
            "vu/R" => {
                if let Some(v) = arg_unit(args) {
                    state.update_track_vu_right(track, v);
                }
            }
            "mute" => {
                if let Some(v) = arg_bool(args) {
                    state.update_track_mute(track, v);
                }
            }
            "solo" => {
                if let Some(v) = arg_bool(args) {
                    state.update_track_solo(track, v);
                }
            }
            "recarm" => {
                if let Some(v) = arg_bool(args) {
                    state.update_track_rec_arm(track, v);
                }
            }
            "select" => {
                if let Some(v) = arg_bool(args) {
                    state.update_track_selected(track, v);
                }
            }
            "name" => {
                if let Some(v) = arg_string(args) {
                    state.update_track_name(track, v);
                }
            }
            "volume/str" => {
                if let Some(v) = arg_string(args) {
                    state.update_track_volume_str(track, v);
                }
            }
            "pan/str" => {
                if let Some(v) = arg_string(args) {
                    state.update_track_pan_str(track, v);
                }
            }
            "color" => {
                if let Some(v) = arg_int(args) {
                    state.update_track_color(track, Rgb::from_packed(v as u32));
                }
            }
            "automode" => {
                if let Some(mode) = arg_int(args).and_then(AutomationMode::from_raw) {
                    state.update_track_automation(track, mode);
                }
            }
            _ => return false,
        }
        return true;
    }

    false
}

fn parse_u32(text: &str) -> Option<u32> {
    text.parse().ok().filter(|n| *n > 0)
}

fn arg_float(args: &[OscType]) -> Option<f32> {
    match args.first()? {
        OscType::Float(v) => Some(*v),
        OscType::Double(v) => Some(*v as f32),
        OscType::Int(v) => Some(*v as f32),
        _ => None,
    }
}

/// Float argument constrained to the normalized range; anything else is
/// dropped.
fn arg_unit(args: &[OscType]) -> Option<f32> {
    arg_float(args).filter(|v| (0.0..=1.0).contains(v))
}

fn arg_bool(args: &[OscType]) -> Option<bool> {
    arg_float(args).map(|v| v != 0.0)
}

fn arg_int(args: &[OscType]) -> Option<i32> {
    match args.first()? {
        OscType::Int(v) => Some(*v),
        OscType::Float(v) => Some(*v as i32),
        _ => None,
    }
}

fn arg_string(args: &[OscType]) -> Option<String> {
    match args.first()? {
        OscType::String(v) => Some(v.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltane_core::EventBus;

    fn state() -> (EventBus, Arc<DawState>) {
        let bus = EventBus::new();
        let state = Arc::new(DawState::new(bus.handle()));
        (bus, state)
    }

    #[test]
    fn track_volume_feedback_lands_in_cache() {
        let (_bus, state) = state();
        assert!(apply_message(
            &state,
            "/track/3/volume",
            &[OscType::Float(0.42)]
        ));
        let track = state.track(3).unwrap();
        assert!((track.volume - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_range_volume_is_dropped() {
        let (_bus, state) = state();
        apply_message(&state, "/track/3/volume", &[OscType::Float(-12.5)]);
        assert!(state.track(3).is_none());
    }

    #[test]
    fn string_where_float_expected_is_dropped() {
        let (_bus, state) = state();
        apply_message(
            &state,
            "/track/3/volume",
            &[OscType::String("-52.7dB".to_string())],
        );
        assert!(state.track(3).is_none());
    }

    #[test]
    fn unknown_address_returns_false() {
        let (_bus, state) = state();
        assert!(!apply_message(
            &state,
            "/frobnicate/7",
            &[OscType::Int(1)]
        ));
        assert!(!apply_message(&state, "/track/3/mystery", &[]));
    }

    #[test]
    fn send_feedback_translates_to_zero_based() {
        let (_bus, state) = state();
        apply_message(
            &state,
            "/track/2/send/1/volume",
            &[OscType::Float(0.6)],
        );
        let track = state.track(2).unwrap();
        assert_eq!(track.sends.len(), 1);
        assert!((track.sends[0].level - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn fx_param_feedback_translates_indices() {
        let (_bus, state) = state();
        apply_message(
            &state,
            "/track/1/fx/2/fxparam/3/value",
            &[OscType::Float(0.25)],
        );
        let device = state.device(1, 1).unwrap();
        assert!((device.params[2].value - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn stop_feedback_clears_playing_and_paused() {
        let (_bus, state) = state();
        state.set_playing(true);
        state.set_paused(true);
        apply_message(&state, "/stop", &[OscType::Float(1.0)]);
        let transport = state.transport();
        assert!(!transport.playing);
        assert!(!transport.paused);
    }

    #[test]
    fn select_feedback_tracks_selection() {
        let (_bus, state) = state();
        apply_message(&state, "/track/5/select", &[OscType::Float(1.0)]);
        assert_eq!(state.selected_track(), 5);
    }

    #[test]
    fn color_feedback_unpacks_rgb() {
        let (_bus, state) = state();
        apply_message(&state, "/track/4/color", &[OscType::Int(0x00FF8020)]);
        assert_eq!(state.track(4).unwrap().color, Some(Rgb(0xFF, 0x80, 0x20)));
    }

    #[test]
    fn automode_feedback_maps_enum() {
        let (_bus, state) = state();
        apply_message(&state, "/track/2/automode", &[OscType::Int(3)]);
        assert_eq!(
            state.track(2).unwrap().automation,
            AutomationMode::Write
        );
        // Unknown mode value is dropped
        apply_message(&state, "/track/2/automode", &[OscType::Int(9)]);
        assert_eq!(
            state.track(2).unwrap().automation,
            AutomationMode::Write
        );
    }

    #[test]
    fn track_zero_is_rejected() {
        let (_bus, state) = state();
        assert!(!apply_message(
            &state,
            "/track/0/volume",
            &[OscType::Float(0.5)]
        ));
    }
}
