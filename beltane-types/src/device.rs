//! FX device state mirrored from the DAW.

use serde::{Deserialize, Serialize};

/// One parameter on a device. Values are normalized 0.0..=1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceParam {
    pub name: String,
    pub value: f32,
}

impl DeviceParam {
    pub fn placeholder(index: usize) -> Self {
        Self {
            name: format!("Param {}", index + 1),
            value: 0.0,
        }
    }
}

/// A single FX device in a track's chain. Device indices are 0-based
/// internally; the wire uses 1-based indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub index: usize,
    pub name: String,
    pub params: Vec<DeviceParam>,
}

impl Device {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            name: format!("FX {}", index + 1),
            params: Vec::new(),
        }
    }

    /// Get a parameter, growing the list with placeholders if needed.
    pub fn param_mut(&mut self, index: usize) -> &mut DeviceParam {
        while self.params.len() <= index {
            let next = self.params.len();
            self.params.push(DeviceParam::placeholder(next));
        }
        &mut self.params[index]
    }
}
