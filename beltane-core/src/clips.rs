//! Cached mirror of the clip engine's matrix.
//!
//! Fed incrementally by the streaming client. Slots are keyed by
//! `SlotAddr`; an address the engine has never described reads as an
//! empty slot. Column names resolve lazily: the persistent matrix
//! document references tracks by id, and the id → name map comes from a
//! separate track-list update, so resolution happens at read time and
//! arrival order cannot corrupt state.
//!
//! While the streaming channel is down the grid is marked stale and its
//! contents are retained — modes dim the rendering instead of clearing
//! it, and a fresh snapshot replaces everything on reconnect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use beltane_types::{ClipChange, ClipSlot, Event, SlotAddr, SlotPlayState};

use crate::bus::BusHandle;

/// Per-column record from the persistent matrix document.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// Track id the column plays on, as given by the engine.
    pub track_id: Option<String>,
}

pub struct ClipGrid {
    bus: BusHandle,
    slots: RwLock<HashMap<SlotAddr, ClipSlot>>,
    columns: RwLock<Vec<ColumnInfo>>,
    /// Engine track id → display name.
    track_names: RwLock<HashMap<String, String>>,
    row_count: RwLock<usize>,
    tempo: RwLock<f64>,
    stale: AtomicBool,
}

impl ClipGrid {
    pub fn new(bus: BusHandle) -> Self {
        Self {
            bus,
            slots: RwLock::new(HashMap::new()),
            columns: RwLock::new(Vec::new()),
            track_names: RwLock::new(HashMap::new()),
            row_count: RwLock::new(0),
            tempo: RwLock::new(120.0),
            stale: AtomicBool::new(true),
        }
    }

    // --- Reads ---

    /// Slot state at an address; absent means empty.
    pub fn slot(&self, addr: SlotAddr) -> ClipSlot {
        self.slots
            .read()
            .expect("slot lock")
            .get(&addr)
            .cloned()
            .unwrap_or_default()
    }

    /// Display states for a window of the matrix, `grid[row][col]`.
    pub fn grid_state(
        &self,
        cols: u32,
        rows: u32,
        col_offset: u32,
        row_offset: u32,
    ) -> Vec<Vec<SlotPlayState>> {
        let slots = self.slots.read().expect("slot lock");
        (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        let addr = SlotAddr::new(col + col_offset, row + row_offset);
                        slots
                            .get(&addr)
                            .map(|slot| slot.display_state())
                            .unwrap_or(SlotPlayState::Empty)
                    })
                    .collect()
            })
            .collect()
    }

    /// Column display name, resolved lazily against the track list.
    /// Falls back to `Col N` until both the column record and the
    /// matching track-list entry have arrived.
    pub fn column_name(&self, col: u32) -> String {
        let columns = self.columns.read().expect("column lock");
        if let Some(ColumnInfo {
            track_id: Some(id), ..
        }) = columns.get(col as usize)
        {
            if let Some(name) = self.track_names.read().expect("name lock").get(id) {
                if !name.is_empty() {
                    return name.clone();
                }
            }
        }
        format!("Col {}", col + 1)
    }

    pub fn column_count(&self) -> usize {
        self.columns.read().expect("column lock").len()
    }

    pub fn row_count(&self) -> usize {
        *self.row_count.read().expect("row count lock")
    }

    pub fn tempo(&self) -> f64 {
        *self.tempo.read().expect("tempo lock")
    }

    /// True while the streaming channel is down and the cached matrix
    /// may no longer match the engine.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Relaxed)
    }

    // --- Updates (streaming client) ---

    /// Apply a play-state update. Publishes only on change so the
    /// per-slot stream's idle refreshes do not cause repaints.
    pub fn set_slot_play_state(&self, addr: SlotAddr, state: SlotPlayState) {
        let changed = {
            let mut slots = self.slots.write().expect("slot lock");
            let slot = slots.entry(addr).or_default();
            if slot.play_state == state {
                false
            } else {
                slot.play_state = state;
                true
            }
        };
        if changed {
            self.bus
                .publish(Event::ClipStateChanged(ClipChange::Slot(addr)));
        }
    }

    pub fn set_slot_content(&self, addr: SlotAddr, has_content: bool, name: Option<String>) {
        {
            let mut slots = self.slots.write().expect("slot lock");
            let slot = slots.entry(addr).or_default();
            slot.has_content = has_content;
            slot.name = name;
        }
        self.bus
            .publish(Event::ClipStateChanged(ClipChange::Slot(addr)));
    }

    /// Replace the engine track list (id → name map).
    pub fn apply_track_list(&self, tracks: Vec<(String, String)>) {
        {
            let mut names = self.track_names.write().expect("name lock");
            names.clear();
            for (id, name) in tracks {
                names.insert(id, name);
            }
        }
        self.bus
            .publish(Event::ClipStateChanged(ClipChange::Matrix));
    }

    /// Replace the column layout and content map from a persistent
    /// matrix document.
    pub fn apply_matrix_layout(
        &self,
        columns: Vec<ColumnInfo>,
        rows: usize,
        content: Vec<(SlotAddr, bool)>,
    ) {
        {
            let mut cols = self.columns.write().expect("column lock");
            *cols = columns;
        }
        {
            let mut row_count = self.row_count.write().expect("row count lock");
            *row_count = rows;
        }
        {
            let mut slots = self.slots.write().expect("slot lock");
            for slot in slots.values_mut() {
                slot.has_content = false;
            }
            for (addr, has_content) in content {
                slots.entry(addr).or_default().has_content = has_content;
            }
        }
        self.bus
            .publish(Event::ClipStateChanged(ClipChange::Matrix));
    }

    pub fn set_tempo(&self, bpm: f64) {
        {
            let mut tempo = self.tempo.write().expect("tempo lock");
            *tempo = bpm;
        }
        self.bus
            .publish(Event::ClipStateChanged(ClipChange::Tempo));
    }

    /// Everything-changed marker: the client refetches; modes repaint.
    pub fn mark_full_refresh(&self) {
        self.bus
            .publish(Event::ClipStateChanged(ClipChange::FullRefresh));
    }

    pub fn set_connected(&self, connected: bool) {
        let was_stale = self.stale.swap(!connected, Ordering::Relaxed);
        if was_stale == !connected {
            return;
        }
        self.bus
            .publish(Event::ClipStateChanged(ClipChange::Connection {
                connected,
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use std::time::Duration;

    fn grid_with_bus() -> (EventBus, ClipGrid) {
        let bus = EventBus::new();
        let grid = ClipGrid::new(bus.handle());
        (bus, grid)
    }

    #[test]
    fn absent_slot_reads_empty() {
        let (_bus, grid) = grid_with_bus();
        assert_eq!(grid.slot(SlotAddr::new(3, 7)).play_state, SlotPlayState::Empty);
        let window = grid.grid_state(8, 8, 0, 0);
        assert!(window
            .iter()
            .flatten()
            .all(|s| *s == SlotPlayState::Empty));
    }

    #[test]
    fn name_resolves_when_list_arrives_after_layout() {
        let (_bus, grid) = grid_with_bus();
        // Persistent data first: column references a track id the grid
        // has never heard of.
        grid.apply_matrix_layout(
            vec![ColumnInfo {
                track_id: Some("t-42".to_string()),
            }],
            4,
            vec![(SlotAddr::new(0, 0), true)],
        );
        assert_eq!(grid.column_name(0), "Col 1");

        // Track list second: the same read now resolves.
        grid.apply_track_list(vec![("t-42".to_string(), "Drums".to_string())]);
        assert_eq!(grid.column_name(0), "Drums");
    }

    #[test]
    fn name_resolves_when_list_arrives_first() {
        let (_bus, grid) = grid_with_bus();
        grid.apply_track_list(vec![("t-42".to_string(), "Drums".to_string())]);
        grid.apply_matrix_layout(
            vec![ColumnInfo {
                track_id: Some("t-42".to_string()),
            }],
            4,
            vec![],
        );
        assert_eq!(grid.column_name(0), "Drums");
    }

    #[test]
    fn play_state_publishes_only_on_change() {
        let (bus, grid) = grid_with_bus();
        let addr = SlotAddr::new(1, 2);
        grid.set_slot_play_state(addr, SlotPlayState::Playing);
        grid.set_slot_play_state(addr, SlotPlayState::Playing);
        let batch = bus.poll(Duration::from_millis(10));
        assert_eq!(
            batch,
            vec![Event::ClipStateChanged(ClipChange::Slot(addr))]
        );
    }

    #[test]
    fn disconnect_marks_stale_but_keeps_contents() {
        let (_bus, grid) = grid_with_bus();
        let addr = SlotAddr::new(0, 0);
        grid.set_connected(true);
        grid.set_slot_content(addr, true, Some("Loop".to_string()));
        grid.set_connected(false);
        assert!(grid.is_stale());
        let slot = grid.slot(addr);
        assert!(slot.has_content);
        assert_eq!(slot.name.as_deref(), Some("Loop"));
    }

    #[test]
    fn matrix_layout_resets_content_flags() {
        let (_bus, grid) = grid_with_bus();
        let kept = SlotAddr::new(0, 0);
        let dropped = SlotAddr::new(1, 0);
        grid.set_slot_content(kept, true, None);
        grid.set_slot_content(dropped, true, None);
        grid.apply_matrix_layout(vec![ColumnInfo::default(); 2], 2, vec![(kept, true)]);
        assert!(grid.slot(kept).has_content);
        assert!(!grid.slot(dropped).has_content);
    }
}
