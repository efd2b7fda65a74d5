//! Hub core: registration, lifecycle, and the publish surface.
//!
//! This module contains the embedded implementation of the dispatch hub. The
//! public API is [`Hub`] (with [`HubBuilder`] and [`HubConfig`] for
//! construction) plus [`ModuleSetup`], the handle init closures receive.
//!
//! Internal modules:
//! - [`hub`]: the hub itself — registration, initialize/seal, publish and
//!   resume, the recorded-error surface;
//! - [`builder`]: construction with non-default config or timer driver;
//! - [`config`]: behavior knobs and their sentinels;
//! - [`setup`]: the per-module registration handle.

mod builder;
mod config;
mod hub;
mod setup;

pub use builder::HubBuilder;
pub use config::HubConfig;
pub use hub::Hub;
pub use setup::ModuleSetup;
