//! Surface connection and event routing.
//!
//! Owns the MIDI ports. Input callbacks are decoded on the driver's
//! thread and published straight onto the bus; nothing here calls into
//! mode logic. Output goes through [`MidirSink`], which degrades to a
//! logged warning when the device disappears mid-run.

use std::sync::{Arc, Mutex};

use log::{info, warn};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use beltane_core::BusHandle;
use beltane_types::LedColor;

use crate::midi::{decode_message, MidiSink};

/// The device advertises its MIDI ports under this name.
const PORT_NAME: &str = "Ableton Push 2";

/// True for a port belonging to the surface. The user port is
/// preferred; the live port is claimed by a running Live instance.
fn is_surface_port(name: &str) -> bool {
    name.contains(PORT_NAME)
}

fn is_user_port(name: &str) -> bool {
    is_surface_port(name) && name.contains("User")
}

pub struct Surface {
    // Held for its Drop: closing the connection stops the callback.
    _input: MidiInputConnection<()>,
    output: Arc<Mutex<MidiOutputConnection>>,
    port_name: String,
}

impl Surface {
    /// Connect to the surface and start publishing input events on the
    /// bus. Missing hardware is a startup failure; the caller exits
    /// with a diagnostic.
    pub fn connect(bus: BusHandle) -> Result<Self, String> {
        let midi_in = MidiInput::new("beltane").map_err(|e| e.to_string())?;
        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok().map(|name| (p, name)))
            .filter(|(_, name)| is_surface_port(name))
            .max_by_key(|(_, name)| is_user_port(name))
            .map(|(p, name)| (p.clone(), name))
            .ok_or_else(|| {
                format!("{} not found — is it plugged in and powered?", PORT_NAME)
            })?;

        let (in_port, port_name) = in_port;
        let input = midi_in
            .connect(
                &in_port,
                "beltane-input",
                move |_timestamp, data, _| {
                    if let Some(event) = decode_message(data) {
                        bus.publish(event);
                    }
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        let midi_out = MidiOutput::new("beltane").map_err(|e| e.to_string())?;
        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok().map(|name| (p, name)))
            .filter(|(_, name)| is_surface_port(name))
            .max_by_key(|(_, name)| is_user_port(name))
            .map(|(p, _)| p.clone())
            .ok_or_else(|| format!("{} output port not found", PORT_NAME))?;

        let out_conn = midi_out
            .connect(&out_port, "beltane-output")
            .map_err(|e| e.to_string())?;
        let output = Arc::new(Mutex::new(out_conn));

        let surface = Self {
            _input: input,
            output,
            port_name,
        };
        surface.upload_palette();

        info!(target: "surface", "connected to {}", surface.port_name);
        Ok(surface)
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// A sink for the pad grid or button LEDs. Sinks share the single
    /// output connection.
    pub fn sink(&self) -> Box<dyn MidiSink> {
        Box::new(MidirSink {
            output: self.output.clone(),
        })
    }

    /// Upload the runtime's color palette so `LedColor` indices mean
    /// the same thing on pads and button LEDs.
    fn upload_palette(&self) {
        let mut sink = MidirSink {
            output: self.output.clone(),
        };
        for color in LedColor::all() {
            sink.send(&palette_entry_message(color.index(), color.rgb()));
        }
        sink.send(&PALETTE_REAPPLY);
    }
}

/// Outbound sink over the shared midir connection. Send failures are
/// logged and dropped: a surface lost mid-run leaves the process alive
/// and unusable-but-recoverable, not crashed.
struct MidirSink {
    output: Arc<Mutex<MidiOutputConnection>>,
}

impl MidiSink for MidirSink {
    fn send(&mut self, data: &[u8]) {
        let mut output = self.output.lock().expect("midi output lock");
        if let Err(e) = output.send(data) {
            warn!(target: "surface", "MIDI send failed: {}", e);
        }
    }
}

/// Reapply the active palette after entries change.
const PALETTE_REAPPLY: [u8; 8] = [0xF0, 0x00, 0x21, 0x1D, 0x01, 0x01, 0x05, 0xF7];

/// Sysex to set one palette entry. Components are split into 7-bit
/// pairs; the white channel follows the brightest component.
fn palette_entry_message(index: u8, (r, g, b): (u8, u8, u8)) -> Vec<u8> {
    let w = r.max(g).max(b);
    let mut msg = vec![0xF0, 0x00, 0x21, 0x1D, 0x01, 0x01, 0x03, index];
    for component in [r, g, b, w] {
        msg.push(component & 0x7F);
        msg.push(component >> 7);
    }
    msg.push(0xF7);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_matching_prefers_user_port() {
        assert!(is_surface_port("Ableton Push 2 User Port"));
        assert!(is_surface_port("Ableton Push 2 Live Port"));
        assert!(!is_surface_port("Some Other Controller"));
        assert!(is_user_port("Ableton Push 2 User Port"));
        assert!(!is_user_port("Ableton Push 2 Live Port"));
    }

    #[test]
    fn palette_entry_is_valid_sysex() {
        let msg = palette_entry_message(4, (255, 0, 0));
        assert_eq!(msg[0], 0xF0);
        assert_eq!(*msg.last().unwrap(), 0xF7);
        assert_eq!(msg[7], 4);
        // 255 splits into 0x7F + high bit
        assert_eq!(msg[8], 0x7F);
        assert_eq!(msg[9], 0x01);
        // Green component is zero
        assert_eq!(msg[10], 0x00);
        assert_eq!(msg[11], 0x00);
        // Every payload byte fits in 7 bits
        assert!(msg[1..msg.len() - 1].iter().all(|b| *b < 0x80));
    }
}
