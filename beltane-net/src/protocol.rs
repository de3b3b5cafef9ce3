//! Clip-engine message types and persistent-document parsing.
//!
//! The engine's streaming API carries strongly-typed updates plus an
//! embedded JSON document for persistent matrix data. The document is
//! treated as an opaque, versioned payload: decoding is tolerant,
//! unknown fields are ignored, and a document that fails to parse is
//! dropped rather than propagated.

use serde::{Deserialize, Serialize};

use beltane_core::clips::ColumnInfo;
use beltane_types::{SlotAddr, SlotPlayState};

/// Which subscription a stream connection carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// Fine-grained per-slot play-state and content updates.
    Slots,
    /// Coarse matrix updates: track list, tempo, persistent snapshot.
    Matrix,
}

/// Client → engine requests. Triggers are one-way fire requests; their
/// effect comes back later on the slot stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineRequest {
    /// Open a subscription. With `snapshot`, the engine sends complete
    /// current state before incremental updates.
    Subscribe { stream: StreamKind, snapshot: bool },
    TriggerSlot { column: u32, row: u32 },
    StopSlot { column: u32, row: u32 },
    /// Trigger every slot in a scene row.
    TriggerRow { row: u32 },
    /// Stop every clip in a column.
    StopColumn { column: u32 },
    /// Stop every clip in the matrix.
    StopMatrix,
    Ping,
}

/// Engine → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    SlotUpdates(Vec<SlotUpdate>),
    MatrixUpdates(Vec<MatrixUpdate>),
    Pong,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub column: u32,
    pub row: u32,
    pub update: SlotField,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotField {
    PlayState(WirePlayState),
    /// Embedded JSON document describing the slot's clips.
    PersistentData(String),
}

/// The engine's own play-state vocabulary, wider than what the grid
/// shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WirePlayState {
    Unknown,
    Stopped,
    Playing,
    Recording,
    Paused,
    ScheduledForPlayStart,
    ScheduledForPlayRestart,
    ScheduledForPlayStop,
    ScheduledForRecordStart,
    ScheduledForRecordStop,
    Ignited,
}

impl WirePlayState {
    /// Collapse to the grid's simplified state.
    pub fn to_slot_state(self) -> SlotPlayState {
        match self {
            Self::Unknown => SlotPlayState::Empty,
            Self::Stopped | Self::Paused => SlotPlayState::Stopped,
            Self::Playing => SlotPlayState::Playing,
            Self::Recording => SlotPlayState::Recording,
            Self::ScheduledForPlayStart
            | Self::ScheduledForPlayRestart
            | Self::ScheduledForRecordStart
            | Self::Ignited => SlotPlayState::Queued,
            Self::ScheduledForPlayStop | Self::ScheduledForRecordStop => SlotPlayState::Stopped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatrixUpdate {
    TrackList(Vec<TrackRef>),
    Tempo(f64),
    /// Embedded JSON document describing the whole matrix.
    CompletePersistentData(String),
    /// The engine invalidated everything; refetch a snapshot.
    EverythingHasChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

// --- Persistent document parsing ---

#[derive(Deserialize, Default)]
struct MatrixDoc {
    #[serde(default)]
    columns: Vec<ColumnDoc>,
    #[serde(default)]
    rows: Vec<serde_json::Value>,
}

#[derive(Deserialize, Default)]
struct ColumnDoc {
    #[serde(default)]
    clip_play_settings: ClipPlaySettings,
    #[serde(default)]
    slots: Vec<SlotDoc>,
}

#[derive(Deserialize, Default)]
struct ClipPlaySettings {
    #[serde(default)]
    track: String,
}

#[derive(Deserialize, Default)]
struct SlotDoc {
    #[serde(default)]
    row: u32,
    #[serde(default)]
    clips: Vec<serde_json::Value>,
}

/// Parsed matrix document: column records, row count, and per-slot
/// content flags.
pub struct MatrixLayout {
    pub columns: Vec<ColumnInfo>,
    pub rows: usize,
    pub content: Vec<(SlotAddr, bool)>,
}

/// Parse a complete matrix document. Returns `None` on undecodable
/// JSON; unknown fields inside are ignored.
pub fn parse_matrix_document(data: &str) -> Option<MatrixLayout> {
    let doc: MatrixDoc = serde_json::from_str(data).ok()?;

    let mut columns = Vec::with_capacity(doc.columns.len());
    let mut content = Vec::new();
    for (col_idx, col) in doc.columns.iter().enumerate() {
        let track_id = if col.clip_play_settings.track.is_empty() {
            None
        } else {
            Some(col.clip_play_settings.track.clone())
        };
        columns.push(ColumnInfo { track_id });

        for slot in &col.slots {
            content.push((
                SlotAddr::new(col_idx as u32, slot.row),
                !slot.clips.is_empty(),
            ));
        }
    }

    Some(MatrixLayout {
        columns,
        rows: doc.rows.len(),
        content,
    })
}

#[derive(Deserialize, Default)]
struct SlotPersistentDoc {
    #[serde(default)]
    clips: Vec<serde_json::Value>,
}

/// Parse a per-slot document into (has_content, clip name).
pub fn parse_slot_document(data: &str) -> Option<(bool, Option<String>)> {
    let doc: SlotPersistentDoc = serde_json::from_str(data).ok()?;
    let name = doc
        .clips
        .first()
        .and_then(|clip| clip.get("name"))
        .and_then(|name| name.as_str())
        .map(|name| name.to_string());
    Some((!doc.clips.is_empty(), name))
}
