//! Cached mirror of DAW state.
//!
//! Written by the OSC feedback listener and by mode logic echoing its
//! own outbound nudges; read by modes and the render path at any time.
//! Tracks, devices, and transport sit behind separate locks so
//! unrelated updates never serialize against each other. Every update
//! method is narrow — it touches exactly one field group — so a partial
//! or out-of-order feedback feed cannot corrupt unrelated state.
//!
//! Each successful update publishes a `StateChanged` event carrying the
//! entity and field so modes can decide whether a repaint is needed.

use std::collections::HashMap;
use std::sync::RwLock;

use beltane_types::{
    AutomationMode, Device, Event, Rgb, StateChange, Track, TrackField, Transport, BANK_SIZE,
};

use crate::bus::BusHandle;

pub struct DawState {
    bus: BusHandle,
    tracks: RwLock<HashMap<u32, Track>>,
    devices: RwLock<HashMap<u32, Vec<Device>>>,
    transport: RwLock<Transport>,
}

impl DawState {
    pub fn new(bus: BusHandle) -> Self {
        Self {
            bus,
            tracks: RwLock::new(HashMap::new()),
            devices: RwLock::new(HashMap::new()),
            transport: RwLock::new(Transport::default()),
        }
    }

    // --- Track reads ---

    pub fn track(&self, number: u32) -> Option<Track> {
        self.tracks
            .read()
            .expect("track lock")
            .get(&number)
            .cloned()
    }

    /// The eight tracks mapped onto the visible strip. Always returns
    /// `BANK_SIZE` entries; unknown tracks come back as defaults so the
    /// strip index → track number relation holds unconditionally.
    pub fn bank_tracks(&self) -> Vec<Track> {
        let offset = self.bank_offset();
        let tracks = self.tracks.read().expect("track lock");
        (0..BANK_SIZE)
            .map(|slot| {
                let number = offset + 1 + slot;
                tracks
                    .get(&number)
                    .cloned()
                    .unwrap_or_else(|| Track::new(number))
            })
            .collect()
    }

    /// Track number for a strip slot under the current bank.
    pub fn bank_track_number(&self, slot: usize) -> u32 {
        self.bank_offset() + 1 + slot as u32
    }

    pub fn selected_track(&self) -> u32 {
        self.transport.read().expect("transport lock").selected_track
    }

    // --- Track updates ---

    fn edit_track(&self, number: u32, field: TrackField, edit: impl FnOnce(&mut Track)) {
        {
            let mut tracks = self.tracks.write().expect("track lock");
            let track = tracks.entry(number).or_insert_with(|| Track::new(number));
            edit(track);
        }
        self.bus.publish(Event::StateChanged(StateChange::Track {
            track: number,
            field,
        }));
    }

    pub fn update_track_volume(&self, number: u32, volume: f32) {
        self.edit_track(number, TrackField::Volume, |t| t.volume = volume);
    }

    pub fn update_track_pan(&self, number: u32, pan: f32) {
        self.edit_track(number, TrackField::Pan, |t| t.pan = pan);
    }

    pub fn update_track_mute(&self, number: u32, mute: bool) {
        self.edit_track(number, TrackField::Mute, |t| t.mute = mute);
    }

    pub fn update_track_solo(&self, number: u32, solo: bool) {
        self.edit_track(number, TrackField::Solo, |t| t.solo = solo);
    }

    pub fn update_track_rec_arm(&self, number: u32, armed: bool) {
        self.edit_track(number, TrackField::RecArm, |t| t.rec_arm = armed);
    }

    pub fn update_track_selected(&self, number: u32, selected: bool) {
        self.edit_track(number, TrackField::Selected, |t| t.selected = selected);
        if selected {
            let mut transport = self.transport.write().expect("transport lock");
            transport.selected_track = number;
        }
    }

    pub fn update_track_name(&self, number: u32, name: String) {
        self.edit_track(number, TrackField::Name, |t| t.name = name);
    }

    pub fn update_track_volume_str(&self, number: u32, text: String) {
        self.edit_track(number, TrackField::VolumeStr, |t| t.volume_str = text);
    }

    pub fn update_track_pan_str(&self, number: u32, text: String) {
        self.edit_track(number, TrackField::PanStr, |t| t.pan_str = text);
    }

    pub fn update_track_vu(&self, number: u32, vu: f32) {
        self.edit_track(number, TrackField::Meter, |t| t.vu = vu);
    }

    pub fn update_track_vu_left(&self, number: u32, vu: f32) {
        self.edit_track(number, TrackField::Meter, |t| t.vu_l = vu);
    }

    pub fn update_track_vu_right(&self, number: u32, vu: f32) {
        self.edit_track(number, TrackField::Meter, |t| t.vu_r = vu);
    }

    pub fn update_track_color(&self, number: u32, color: Rgb) {
        self.edit_track(number, TrackField::Color, |t| t.color = Some(color));
    }

    pub fn update_track_automation(&self, number: u32, mode: AutomationMode) {
        self.edit_track(number, TrackField::Automation, |t| t.automation = mode);
    }

    // --- Sends ---

    fn edit_send(&self, number: u32, send: usize, edit: impl FnOnce(&mut beltane_types::TrackSend)) {
        {
            let mut tracks = self.tracks.write().expect("track lock");
            let track = tracks.entry(number).or_insert_with(|| Track::new(number));
            edit(track.send_mut(send));
        }
        self.bus.publish(Event::StateChanged(StateChange::Send {
            track: number,
            send,
        }));
    }

    pub fn update_send_level(&self, number: u32, send: usize, level: f32) {
        self.edit_send(number, send, |s| s.level = level);
    }

    pub fn update_send_pan(&self, number: u32, send: usize, pan: f32) {
        self.edit_send(number, send, |s| s.pan = pan);
    }

    pub fn update_send_name(&self, number: u32, send: usize, name: String) {
        self.edit_send(number, send, |s| s.name = name);
    }

    pub fn update_send_level_str(&self, number: u32, send: usize, text: String) {
        self.edit_send(number, send, |s| s.level_str = text);
    }

    // --- Devices ---

    pub fn device(&self, track: u32, index: usize) -> Option<Device> {
        self.devices
            .read()
            .expect("device lock")
            .get(&track)
            .and_then(|chain| chain.get(index))
            .cloned()
    }

    pub fn device_count(&self, track: u32) -> usize {
        self.devices
            .read()
            .expect("device lock")
            .get(&track)
            .map(|chain| chain.len())
            .unwrap_or(0)
    }

    fn edit_device(&self, track: u32, index: usize, edit: impl FnOnce(&mut Device)) {
        let mut devices = self.devices.write().expect("device lock");
        let chain = devices.entry(track).or_default();
        while chain.len() <= index {
            let next = chain.len();
            chain.push(Device::new(next));
        }
        edit(&mut chain[index]);
    }

    pub fn update_device_name(&self, track: u32, index: usize, name: String) {
        self.edit_device(track, index, |d| d.name = name);
        self.bus.publish(Event::StateChanged(StateChange::Device {
            track,
            device: index,
        }));
    }

    pub fn update_device_param_value(&self, track: u32, device: usize, param: usize, value: f32) {
        self.edit_device(track, device, |d| d.param_mut(param).value = value);
        self.bus
            .publish(Event::StateChanged(StateChange::DeviceParam {
                track,
                device,
                param,
            }));
    }

    pub fn update_device_param_name(&self, track: u32, device: usize, param: usize, name: String) {
        self.edit_device(track, device, |d| d.param_mut(param).name = name);
        self.bus
            .publish(Event::StateChanged(StateChange::DeviceParam {
                track,
                device,
                param,
            }));
    }

    // --- Transport ---

    pub fn transport(&self) -> Transport {
        self.transport.read().expect("transport lock").clone()
    }

    fn edit_transport(&self, change: StateChange, edit: impl FnOnce(&mut Transport)) {
        {
            let mut transport = self.transport.write().expect("transport lock");
            edit(&mut transport);
        }
        self.bus.publish(Event::StateChanged(change));
    }

    pub fn set_playing(&self, playing: bool) {
        self.edit_transport(StateChange::Transport, |t| t.playing = playing);
    }

    pub fn set_recording(&self, recording: bool) {
        self.edit_transport(StateChange::Transport, |t| t.recording = recording);
    }

    pub fn set_paused(&self, paused: bool) {
        self.edit_transport(StateChange::Transport, |t| t.paused = paused);
    }

    pub fn set_stopped(&self) {
        self.edit_transport(StateChange::Transport, |t| {
            t.playing = false;
            t.paused = false;
        });
    }

    pub fn set_repeat(&self, repeat: bool) {
        self.edit_transport(StateChange::Transport, |t| t.repeat = repeat);
    }

    pub fn set_tempo(&self, bpm: f64) {
        self.edit_transport(StateChange::Transport, |t| {
            t.tempo = Transport::clamp_tempo(bpm);
        });
    }

    pub fn set_tempo_str(&self, text: String) {
        self.edit_transport(StateChange::Transport, |t| t.tempo_str = text);
    }

    pub fn set_beat_str(&self, text: String) {
        self.edit_transport(StateChange::Transport, |t| t.beat_str = text);
    }

    pub fn set_time_str(&self, text: String) {
        self.edit_transport(StateChange::Transport, |t| t.time_str = text);
    }

    // --- Master ---

    pub fn set_master_volume(&self, volume: f32) {
        self.edit_transport(StateChange::Master, |t| t.master_volume = volume);
    }

    pub fn set_master_pan(&self, pan: f32) {
        self.edit_transport(StateChange::Master, |t| t.master_pan = pan);
    }

    pub fn set_master_vu(&self, vu: f32) {
        self.edit_transport(StateChange::Master, |t| t.master_vu = vu);
    }

    pub fn set_master_volume_str(&self, text: String) {
        self.edit_transport(StateChange::Master, |t| t.master_volume_str = text);
    }

    // --- Bank navigation ---

    pub fn bank_offset(&self) -> u32 {
        self.transport.read().expect("transport lock").bank_offset
    }

    pub fn set_bank(&self, offset: u32) {
        self.edit_transport(StateChange::Bank, |t| t.bank_offset = offset);
    }

    pub fn next_bank(&self) {
        self.edit_transport(StateChange::Bank, |t| {
            t.bank_offset += BANK_SIZE;
        });
    }

    pub fn prev_bank(&self) {
        self.edit_transport(StateChange::Bank, |t| {
            t.bank_offset = t.bank_offset.saturating_sub(BANK_SIZE);
        });
    }
}
