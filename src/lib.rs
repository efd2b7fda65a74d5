//! # modvisor
//!
//! **Modvisor** is a synchronous module/event dispatch core for Rust.
//!
//! It provides primitives to register modules, declare and publish
//! namespaced events, and walk priority-ordered listeners with
//! cancel/pause/delay interrupts. The crate is designed as the coordination
//! backbone for larger embedding frameworks (servers, plugin hosts, request
//! pipelines).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  ModuleSpec  │   │  ModuleSpec  │   │  ModuleSpec  │
//!     │  ("server")  │   │  ("metrics") │   │    ("lua")   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Hub (dispatch core)                                            │
//! │  - Registry (modules, events, Open → Initializing → Sealed)     │
//! │  - SuspensionManager (delayed firings, generational ids)        │
//! │  - TimerDriver (one-shot resume timers)                         │
//! │  - last_error (fault surface for the bool-returning calls)      │
//! └──────┬──────────────────────────────────────────────────────────┘
//!        │ publish(event, code, payload)
//!        ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Firing: walk the frozen listener snapshot on the publisher's   │
//! │  thread, highest priority first                                 │
//! │                                                                 │
//! │    listener #1 ──► listener #2 ──► listener #3 ──► done (true)  │
//! │         │                                                       │
//! │         │ FiringScope: request_cancel / request_pause /         │
//! │         │              request_delay                            │
//! │         ▼                                                       │
//! │    granted interrupt stops the walk (false)                     │
//! └──────┬──────────────────────────────────────────────────────────┘
//!        ▼
//!    Cancelled ─► walk ends, nothing retained
//!    Paused ───► PauseToken ─► Hub::resume_paused(token)
//!    Delayed ──► DelayId ───┬─► armed timer fires ──┬─► resume
//!                           └─► Hub::resume_delayed(id), first wins
//! ```
//!
//! ### Lifecycle
//! ```text
//! register_module(spec)...  ──►  initialize()  ──►  sealed hub
//!
//! initialize():
//!   ├─► for each module, in registration order:
//!   │     └─► run its init closure with a ModuleSetup
//!   │           ├─► register_event(EventSpec)   (declared names only)
//!   │           └─► listen / listen_with / listen_event
//!   └─► seal: freeze every listener table; publishing becomes legal
//!
//! publish(event, code, payload):
//!   ├─► walk listeners (priority descending, ties in subscribe order)
//!   ├─► no interrupt            ─► returns true
//!   ├─► request_cancel granted  ─► stop, returns false
//!   ├─► request_pause granted   ─► stop; the requester holds a PauseToken
//!   │                               resume_paused(token) runs the rest
//!   └─► request_delay granted   ─► stop; the hub holds the continuation
//!                                   ├─ timer fires ─► resume_delayed(id)
//!                                   └─ early resume_delayed(id) cancels
//!                                      the timer
//! ```
//!
//! ## Features
//! | Area              | Description                                          | Key types / traits                                             |
//! |-------------------|------------------------------------------------------|----------------------------------------------------------------|
//! | **Modules**       | Declare capabilities, context, and init closures.    | [`ModuleSpec`], [`ModuleSetup`], [`Requirement`]               |
//! | **Events**        | Register, look up, and publish namespaced events.    | [`EventSpec`], [`EventHandle`]                                 |
//! | **Listening**     | Priority-ordered callbacks with per-call bindings.   | [`Binding`], [`ListenerFn`], [`FiringScope`]                   |
//! | **Interrupts**    | Cancel, pause, and delay running firings.            | [`PauseToken`], [`DelayId`], [`InterruptKind`], [`InterruptPolicy`] |
//! | **Timers**        | Pluggable one-shot timer backend for delays.         | [`TimerDriver`], [`TokioTimer`]                                |
//! | **Errors**        | Typed errors plus the recorded-fault surface.        | [`HubError`]                                                   |
//! | **Configuration** | Centralize hub behavior knobs.                       | [`HubConfig`]                                                  |
//!
//! ## Example
//! ```rust
//! use modvisor::{Binding, EventSpec, Hub, ModuleSpec, Payload};
//!
//! fn main() -> Result<(), modvisor::HubError> {
//!     let hub = Hub::new();
//!
//!     // A server core that announces configuration reloads.
//!     hub.register_module(
//!         ModuleSpec::new("server")
//!             .publishes(["reload"])
//!             .with_init(|setup| {
//!                 setup.register_event(EventSpec::new("reload").interruptible(true))?;
//!                 Ok(())
//!             }),
//!     )?;
//!
//!     // A worker pool that reacts to reloads before anyone else.
//!     hub.register_module(
//!         ModuleSpec::new("workers")
//!             .subscribes(["server:reload"])
//!             .with_init(|setup| {
//!                 setup.listen_with(
//!                     "server:reload",
//!                     Binding::new().with_priority(10),
//!                     |_scope, code, _payload| {
//!                         println!("draining workers for config generation {code}");
//!                     },
//!                 )
//!             }),
//!     )?;
//!
//!     // Runs every init closure, then seals the registry.
//!     hub.initialize()?;
//!
//!     let reload = hub.lookup_event("server:reload").expect("registered above");
//!     assert!(hub.publish(&reload, 1, Payload::empty()));
//!     assert_eq!(reload.fired_count(), 1);
//!     Ok(())
//! }
//! ```
mod core;
mod dispatch;
mod error;
mod registry;
mod suspend;
mod timer;

// ---- Public re-exports ----

pub use crate::core::{Hub, HubBuilder, HubConfig, ModuleSetup};
pub use dispatch::{FiringScope, Payload};
pub use error::HubError;
pub use registry::{
    Binding, EventHandle, EventSpec, InterruptKind, InterruptPolicy, ListenerFn, ModuleSpec,
    Requirement,
};
pub use suspend::{DelayId, PauseToken};
pub use timer::{TimerCallback, TimerDriver, TimerHandle, TokioTimer};
