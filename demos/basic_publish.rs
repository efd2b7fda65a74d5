//! # Example: basic_publish
//!
//! Minimal example of module registration and synchronous firings, with a
//! listener cancelling one of them.
//!
//! Demonstrates how to:
//! - Declare modules with [`ModuleSpec`] capability lists.
//! - Register an event and listeners inside init closures.
//! - Publish and observe priority-ordered, cancellable dispatch.
//!
//! ## Flow
//! ```text
//! register_module("server")     (publishes "request")
//! register_module("auth")       (listens at priority 50)
//! register_module("router")     (listens at priority 0)
//! initialize()                  (runs inits, seals the registry)
//!
//! publish(request, 1, "/status")
//!     ├─► auth listener         (allows)
//!     └─► router listener       (handles)
//! publish(request, 2, "/admin")
//!     └─► auth listener         (cancels — the router never runs)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_publish
//! ```

use modvisor::{Binding, EventSpec, Hub, ModuleSpec, Payload};

fn main() -> Result<(), modvisor::HubError> {
    // 1. Build a hub with the default configuration
    let hub = Hub::new();

    // 2. The server module owns the "request" event
    hub.register_module(
        ModuleSpec::new("server")
            .publishes(["request"])
            .with_init(|setup| {
                setup.register_event(EventSpec::new("request").interruptible(true))?;
                Ok(())
            }),
    )?;

    // 3. Auth inspects every request first and rejects even codes
    hub.register_module(
        ModuleSpec::new("auth")
            .subscribes(["server:request"])
            .with_init(|setup| {
                setup.listen_with(
                    "server:request",
                    Binding::new().with_priority(50),
                    |scope, code, _payload| {
                        if code % 2 == 1 {
                            println!("[auth] request {code}: ok");
                        } else {
                            println!("[auth] request {code}: rejected");
                            scope.request_cancel().ok();
                        }
                    },
                )
            }),
    )?;

    // 4. The router only sees requests auth let through
    hub.register_module(
        ModuleSpec::new("router")
            .subscribes(["server:request"])
            .with_init(|setup| {
                setup.listen("server:request", |_scope, code, payload| {
                    let path = payload.downcast_ref::<String>().cloned().unwrap_or_default();
                    println!("[router] handling request {code} for {path}");
                })
            }),
    )?;

    // 5. Initialize: runs init closures in order, then seals the registry
    hub.initialize()?;

    // 6. Publish twice; the second firing is cancelled by auth
    let request = hub.lookup_event("server:request").expect("registered above");
    let done = hub.publish(&request, 1, Payload::new(String::from("/status")));
    println!("[server] request 1 completed: {done}");
    let done = hub.publish(&request, 2, Payload::new(String::from("/admin")));
    println!("[server] request 2 completed: {done}");
    Ok(())
}
