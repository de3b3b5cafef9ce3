//! # beltane-core
//!
//! Runtime core for the Beltane control surface: the event bus that
//! decouples hardware callbacks and protocol listeners from the control
//! loop, the concurrently-readable mirror of DAW and clip-engine state,
//! configuration loading, and the musical scale state behind the pad
//! grid.
//!
//! ## Module Overview
//!
//! - [`bus`] — `EventBus` / `BusHandle`: non-blocking publish from any
//!   thread, batch dispatch on the control loop with per-subscriber
//!   panic isolation
//! - [`state`] — `DawState`: track/device/transport mirror with
//!   per-entity locks and narrow update methods
//! - [`clips`] — `ClipGrid`: clip-matrix mirror fed by the streaming
//!   client, lazy column-name resolution
//! - [`config`] — TOML configuration (embedded defaults, user override,
//!   environment overrides)
//! - [`scales`] — scale/layout tables and `ScaleState` for the note grid

pub mod bus;
pub mod clips;
pub mod config;
pub mod scales;
pub mod state;

pub use bus::{BusHandle, EventBus};
pub use clips::ClipGrid;
pub use config::Config;
pub use scales::ScaleState;
pub use state::DawState;
