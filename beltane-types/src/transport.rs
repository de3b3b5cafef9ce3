//! Transport and master-channel state.

use serde::{Deserialize, Serialize};

pub const TEMPO_MIN: f64 = 20.0;
pub const TEMPO_MAX: f64 = 300.0;

/// Transport, master channel, and bank position. Singleton within the
/// state cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub playing: bool,
    pub recording: bool,
    pub paused: bool,
    pub repeat: bool,
    pub tempo: f64,
    pub tempo_str: String,
    pub beat_str: String,
    pub time_str: String,
    pub master_volume: f32,
    pub master_pan: f32,
    pub master_vu: f32,
    pub master_volume_str: String,
    /// 0-based index of the first track mapped onto the visible strip.
    pub bank_offset: u32,
    /// 1-based number of the selected track.
    pub selected_track: u32,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            playing: false,
            recording: false,
            paused: false,
            repeat: false,
            tempo: 120.0,
            tempo_str: "120.00".to_string(),
            beat_str: "1.1.00".to_string(),
            time_str: "0:00.000".to_string(),
            master_volume: 0.716,
            master_pan: 0.5,
            master_vu: 0.0,
            master_volume_str: "0.0 dB".to_string(),
            bank_offset: 0,
            selected_track: 1,
        }
    }
}

impl Transport {
    /// Clamp a tempo to the supported BPM range.
    pub fn clamp_tempo(bpm: f64) -> f64 {
        bpm.clamp(TEMPO_MIN, TEMPO_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_clamped_to_range() {
        assert_eq!(Transport::clamp_tempo(10.0), TEMPO_MIN);
        assert_eq!(Transport::clamp_tempo(500.0), TEMPO_MAX);
        assert_eq!(Transport::clamp_tempo(128.0), 128.0);
    }
}
