//! # Synchronous dispatch: payloads, firing scopes, and the engine.
//!
//! Everything a firing touches while it runs lives here. [`Payload`] is the
//! shared value handed to every listener, [`FiringScope`] is the listener's
//! window into the firing (and the place interrupts are requested), and the
//! engine walks the listener snapshot on the publisher's thread.

mod engine;
mod payload;
mod scope;

pub use payload::Payload;
pub use scope::FiringScope;

pub(crate) use engine::fire;
