//! # beltane-surface
//!
//! Hardware adapter for the Push 2-style surface. Translates raw MIDI
//! callbacks into typed bus events, and projects runtime state back
//! onto the hardware through dedup caches for pad colors and button
//! LEDs plus a raster display pipeline.
//!
//! The USB display transport and bitmap font rendering are external
//! collaborators, reached through the [`display::DisplayLink`] and
//! [`display::GlyphRenderer`] boundaries.

pub mod buttons;
pub mod display;
pub mod midi;
pub mod pads;
pub mod surface;

pub use buttons::ButtonLeds;
pub use display::{DisplayFrame, DisplayLink, GlyphRenderer, NoGlyphs, NullDisplayLink};
pub use midi::MidiSink;
pub use pads::PadGrid;
pub use surface::Surface;
