//! # Example: delayed_flush
//!
//! A listener delays a firing and the hub resumes it from a one-shot timer,
//! then the same flow again with an early manual resume.
//!
//! Demonstrates how to:
//! - Request a delay from inside a listener.
//! - Let the armed timer resume the firing.
//! - Redeem the [`DelayId`] early (the timer is cancelled).
//!
//! ## Flow
//! ```text
//! publish(flush, 1, _)        ─► false (delayed)
//!     ├─► throttle listener   requests an 800ms delay
//!     └─► (walk stops; timer armed)
//! ...timer fires...           ─► writer listener runs
//!
//! publish(flush, 2, _)        ─► false (delayed again)
//! resume_delayed(id)          ─► writer runs immediately, timer dies
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example delayed_flush
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use modvisor::{Binding, DelayId, EventSpec, Hub, ModuleSpec, Payload};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hub = Hub::new();
    let delayed: Arc<Mutex<Option<DelayId>>> = Arc::new(Mutex::new(None));

    // The store module owns the "flush" event
    hub.register_module(
        ModuleSpec::new("store")
            .publishes(["flush"])
            .with_init(|setup| {
                setup.register_event(EventSpec::new("flush").interruptible(true))?;
                Ok(())
            }),
    )?;

    // Throttle holds every flush back to coalesce writes
    let slot = delayed.clone();
    hub.register_module(
        ModuleSpec::new("throttle")
            .subscribes(["store:flush"])
            .with_init(move |setup| {
                setup.listen_with(
                    "store:flush",
                    Binding::new().with_priority(10),
                    move |scope, code, _payload| {
                        let id = scope
                            .request_delay("coalescing writes", Duration::from_millis(800))
                            .expect("flush is interruptible");
                        *slot.lock().unwrap() = Some(id);
                        println!("[throttle] flush {code} delayed as {id:?}");
                    },
                )
            }),
    )?;

    // The writer runs once the delay is redeemed
    hub.register_module(
        ModuleSpec::new("writer")
            .subscribes(["store:flush"])
            .with_init(|setup| {
                setup.listen("store:flush", |_scope, code, _payload| {
                    println!("[writer] flush {code} written");
                })
            }),
    )?;

    hub.initialize()?;
    let flush = hub.lookup_event("store:flush").expect("registered above");

    // 1. Timer-driven resume: wait out the delay
    hub.publish(&flush, 1, Payload::empty());
    println!("[store] flush 1 parked ({} suspended)", hub.suspended_count());
    tokio::time::sleep(Duration::from_millis(900)).await;

    // 2. Early resume: redeem the id before the timer fires
    hub.publish(&flush, 2, Payload::empty());
    let id = delayed.lock().unwrap().take().expect("delay granted");
    hub.resume_delayed(id);

    Ok(())
}
