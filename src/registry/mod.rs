//! Module and event registry: declarations, listener tables, sealing.
//!
//! Everything the dispatch engine walks is built here during
//! [`Hub::initialize`](crate::Hub::initialize) and frozen before the first
//! firing.
//!
//! Internal modules:
//! - [`module`]: module specs, capability declarations, qualified names;
//! - [`event`]: event specs, records, shared handles, interrupt policies;
//! - [`listeners`]: listener bindings and the priority-ordered table;
//! - [`store`]: the registry itself and its lifecycle phase.

mod event;
mod listeners;
mod module;
mod store;

pub use event::{EventHandle, EventSpec, InterruptKind, InterruptPolicy};
pub use listeners::{Binding, ListenerFn};
pub use module::{ModuleSpec, Requirement};

pub(crate) use listeners::ListenerEntry;
pub(crate) use store::Registry;
