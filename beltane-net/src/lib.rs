//! # beltane-net
//!
//! Protocol clients for the Beltane runtime.
//!
//! - [`osc`] — outbound OSC command client for the DAW (UDP)
//! - [`feedback`] — the DAW's asynchronous OSC feedback listener,
//!   decoding addresses into state-cache updates
//! - [`framing`] / [`protocol`] / [`clip`] — the clip engine's
//!   streaming channel: length-prefixed JSON frames over TCP, two
//!   long-lived subscriptions plus one-way trigger commands

pub mod clip;
pub mod feedback;
pub mod framing;
pub mod osc;
pub mod protocol;

pub use clip::ClipClient;
pub use feedback::FeedbackListener;
pub use osc::OscClient;
