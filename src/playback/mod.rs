//! Player-state synchronization between the embedded widget and the UI.

pub mod adapter;
pub mod capability;
pub mod clock;
pub mod controller;
pub mod messages;
pub mod platform;
pub mod readiness;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use messages::{Intent, SessionMessage};
pub use state::{PlaybackState, SearchSession, SessionError};
