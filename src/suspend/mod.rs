//! Suspension: continuation tokens, the delay slot map, and timers' hand-off.
//!
//! Internal modules:
//! - [`token`]: the public [`PauseToken`] and [`DelayId`] types;
//! - [`slots`]: generational slot map backing delay storage;
//! - [`manager`]: reservation, timer attachment, first-wins redemption.

mod manager;
mod slots;
mod token;

pub use token::{DelayId, PauseToken};

pub(crate) use manager::SuspensionManager;
