//! AWS Elemental MediaLive.
//!
//! Channels move through `CREATING`, `IDLE`, `STARTING`, `RUNNING`,
//! `STOPPING` and `DELETING` states. A channel must be idle before its
//! settings change or it is deleted, so those operations stop a running
//! channel first and wait for each transition to settle. Tags change in any
//! state.
pub mod channel;
pub mod codec;
pub mod encoder;
pub mod sweep;
#[cfg(test)]
mod test;

pub use channel::{Channel, ChannelOutput, UpdateStep};
pub use encoder::EncoderSettings;
