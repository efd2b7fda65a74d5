//! # Hub: registration, lifecycle, and the publish surface.
//!
//! The [`Hub`] is the process-wide dispatch core. Its life has three phases:
//!
//! 1. **Open**: top-level modules and submodules are registered.
//! 2. **Initializing**: [`Hub::initialize`] runs every module's init closure
//!    in registration order; events and listeners are registered from inside
//!    those closures only.
//! 3. **Sealed**: listener tables are frozen and publishing becomes legal;
//!    registration of any kind is refused from here on.
//!
//! ## Rules
//! - `publish` and the resume calls return `bool`; failure detail is
//!   recorded and readable via [`Hub::last_error`].
//! - Registration and interrupt requests return `Result` and leave the
//!   decision to the caller.
//! - A strict hub escalates usage errors into panics at the offending call.

use std::any::Any;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, info, warn};

use crate::dispatch::{self, Payload};
use crate::error::HubError;
use crate::registry::{EventHandle, ModuleSpec, Registry};
use crate::suspend::{DelayId, PauseToken, SuspensionManager};
use crate::timer::TimerDriver;

use super::{builder::HubBuilder, config::HubConfig, setup::ModuleSetup};

/// The dispatch core: module registry, event tables, suspension manager.
///
/// Always handled through `Arc<Hub>`; see [`Hub::new`] and [`Hub::builder`].
/// Publishing is synchronous and runs on the caller's thread, so the hub
/// itself spawns nothing except the one-shot timers backing delayed firings.
pub struct Hub {
    config: HubConfig,
    registry: Registry,
    suspension: SuspensionManager,
    timer: Arc<dyn TimerDriver>,
    weak: Weak<Hub>,
    last_error: Mutex<Option<String>>,
}

impl Hub {
    /// Creates a hub with the default configuration and timer driver.
    pub fn new() -> Arc<Self> {
        HubBuilder::new().build()
    }

    /// Returns a builder for non-default configuration.
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    pub(crate) fn new_internal(
        config: HubConfig,
        timer: Arc<dyn TimerDriver>,
        weak: Weak<Hub>,
    ) -> Self {
        let suspension = SuspensionManager::new(config.max_suspended, timer.clone());
        Self {
            config,
            registry: Registry::new(),
            suspension,
            timer,
            weak,
            last_error: Mutex::new(None),
        }
    }

    // ---- registration -----------------------------------------------------

    /// Registers a top-level module. Legal only before [`Hub::initialize`].
    pub fn register_module(&self, spec: ModuleSpec) -> Result<(), HubError> {
        self.registry.add_module(spec, None)
    }

    /// Registers `spec` as a submodule of the already-registered `parent`.
    ///
    /// Submodules are ordinary modules with a recorded parent link; they
    /// initialize in their own registration order.
    pub fn register_submodule(&self, parent: &str, spec: ModuleSpec) -> Result<(), HubError> {
        self.registry.add_module(spec, Some(parent))
    }

    // ---- lifecycle --------------------------------------------------------

    /// Runs every registered module's init closure in registration order,
    /// then seals the registry.
    ///
    /// The first failing closure aborts initialization; the hub then stays
    /// unsealed for good and publishing keeps failing. Calling this a second
    /// time is an error.
    pub fn initialize(&self) -> Result<(), HubError> {
        let inits = self.registry.begin_initialize()?;
        for (module, version, init) in inits {
            debug!(module = %module, version = %version, "Initializing module");
            if let Some(init) = init {
                let mut setup = ModuleSetup::new(self, module.clone());
                init(&mut setup)?;
            }
            info!(module = %module, "Module initialized");
        }
        let (modules, events, listeners) = self.registry.seal()?;
        info!(modules, events, listeners, "Registry sealed, hub live");
        Ok(())
    }

    /// True once [`Hub::initialize`] has completed and publishing is legal.
    pub fn is_sealed(&self) -> bool {
        self.registry.is_sealed()
    }

    // ---- queries ----------------------------------------------------------

    /// Looks up an event handle by qualified name (`"module:event"`).
    pub fn lookup_event(&self, qualified: &str) -> Option<EventHandle> {
        self.registry.lookup(qualified)
    }

    /// Returns the context value module `name` attached at registration,
    /// downcast to `T`.
    ///
    /// `None` when the module is unknown, carries no context, or the type
    /// does not match.
    pub fn module_context<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.registry
            .module_context(name)
            .and_then(|context| context.downcast::<T>().ok())
    }

    /// Returns the parent module of submodule `name`, when it has one.
    pub fn module_parent(&self, name: &str) -> Option<String> {
        self.registry.module_parent(name).map(|p| p.to_string())
    }

    /// Returns the names of the submodules registered under `name`, in
    /// registration order.
    pub fn submodules(&self, name: &str) -> Vec<String> {
        self.registry
            .submodules(name)
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Number of delayed firings currently parked in the hub.
    pub fn suspended_count(&self) -> usize {
        self.suspension.pending()
    }

    // ---- publish and resume -----------------------------------------------

    /// Fires `event` synchronously through its listener table.
    ///
    /// Returns `true` when every listener ran to the end of the table,
    /// `false` when the firing was cancelled, paused, delayed, or refused;
    /// for refusals the detail is readable via [`Hub::last_error`].
    pub fn publish(&self, event: &EventHandle, code: i64, payload: Payload) -> bool {
        dispatch::fire(self, event, 0, code, payload)
    }

    /// Fires the event named `qualified`, looking it up first.
    pub fn publish_name(&self, qualified: &str, code: i64, payload: Payload) -> bool {
        match self.registry.lookup(qualified) {
            Some(event) => dispatch::fire(self, &event, 0, code, payload),
            None => {
                let err = HubError::NotFound {
                    target: qualified.to_string(),
                };
                self.record_error(&err);
                false
            }
        }
    }

    /// Resumes a paused firing from its stored index, consuming the token.
    ///
    /// The remaining listeners run on the calling thread; the return value
    /// is the completed firing's result, as if `publish` had kept going.
    pub fn resume_paused(&self, token: PauseToken) -> bool {
        dispatch::fire(
            self,
            &token.event,
            token.resume_index,
            token.code,
            token.payload,
        )
    }

    /// Redeems a delayed firing, either early (manual) or from the armed
    /// timer's callback.
    ///
    /// Exactly one redeemer wins: the loser gets `false` with a recorded
    /// `NotFound`, and ids from before a resume never alias a newer delay.
    pub fn resume_delayed(&self, id: DelayId) -> bool {
        let Some((token, timer)) = self.suspension.take(id) else {
            warn!(?id, "Delayed firing already redeemed or unknown");
            let err = HubError::NotFound {
                target: format!("{id:?}"),
            };
            self.record_error(&err);
            return false;
        };
        if let Some(handle) = timer {
            self.timer.cancel(&handle);
        }
        dispatch::fire(
            self,
            &token.event,
            token.resume_index,
            token.code,
            token.payload,
        )
    }

    // ---- error surface ----------------------------------------------------

    /// Returns the most recently recorded fault, if any.
    ///
    /// Serves the `bool`-returning calls: when `publish` or a resume comes
    /// back `false` for a reason other than an interrupt, the detail lands
    /// here. Reading does not clear it.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn record_error(&self, err: &HubError) {
        let mut slot = self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(err.to_string());
    }

    /// Builds a `UsageError` and records it; a strict hub panics instead.
    pub(crate) fn usage_error(&self, detail: String) -> HubError {
        let err = HubError::UsageError { detail };
        if self.config.strict {
            panic!("{err}");
        }
        self.record_error(&err);
        err
    }

    // ---- internal accessors -----------------------------------------------

    #[inline]
    pub(crate) fn config(&self) -> &HubConfig {
        &self.config
    }

    #[inline]
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub(crate) fn suspension(&self) -> &SuspensionManager {
        &self.suspension
    }

    #[inline]
    pub(crate) fn timer(&self) -> &dyn TimerDriver {
        self.timer.as_ref()
    }

    #[inline]
    pub(crate) fn downgrade(&self) -> Weak<Hub> {
        self.weak.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::dispatch::FiringScope;
    use crate::registry::{Binding, EventSpec, InterruptKind};

    type Log = Arc<Mutex<Vec<String>>>;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn push(log: &Log, value: impl Into<String>) {
        log.lock().unwrap().push(value.into());
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    /// Module `core` publishing the event `tick`.
    fn tick_publisher(interruptible: bool) -> ModuleSpec {
        ModuleSpec::new("core")
            .publishes(["tick"])
            .with_init(move |setup| {
                setup
                    .register_event(EventSpec::new("tick").interruptible(interruptible))
                    .map(|_| ())
            })
    }

    /// Module `name` listening on `core:tick` at `priority`.
    fn tick_listener<F>(name: &'static str, priority: i8, callback: F) -> ModuleSpec
    where
        F: Fn(&mut FiringScope<'_>, i64, &Payload) + Send + Sync + 'static,
    {
        ModuleSpec::new(name)
            .subscribes(["core:tick"])
            .with_init(move |setup| {
                setup.listen_with(
                    "core:tick",
                    Binding::new().with_priority(priority),
                    callback,
                )
            })
    }

    fn ready(hub: &Hub) -> EventHandle {
        hub.initialize().unwrap();
        hub.lookup_event("core:tick").unwrap()
    }

    #[test]
    fn test_listeners_run_in_priority_order() {
        let hub = Hub::new();
        let seen = log();

        hub.register_module(tick_publisher(false)).unwrap();
        // Registered lowest-priority first on purpose.
        for (name, priority) in [("slow", -5i8), ("fast", 10), ("mid", 0)] {
            let seen = seen.clone();
            hub.register_module(tick_listener(name, priority, move |scope, _, _| {
                push(&seen, scope.module());
            }))
            .unwrap();
        }
        let tick = ready(&hub);

        assert!(hub.publish(&tick, 0, Payload::empty()));
        assert_eq!(entries(&seen), ["fast", "mid", "slow"]);
        assert_eq!(tick.listener_count(), 3);
    }

    #[test]
    fn test_cancel_stops_remaining_listeners() {
        let hub = Hub::new();
        let seen = log();

        hub.register_module(tick_publisher(true)).unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("first", 10, move |_, _, _| {
            push(&s, "first");
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("canceller", 0, move |scope, _, _| {
            push(&s, "canceller");
            scope.request_cancel().unwrap();
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("last", -10, move |_, _, _| {
            push(&s, "last");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 0, Payload::empty()));
        assert_eq!(entries(&seen), ["first", "canceller"]);
        assert!(
            hub.last_error().is_none(),
            "an interrupt is an outcome, not a fault"
        );
    }

    #[test]
    fn test_pause_and_resume_runs_remainder_once() {
        let hub = Hub::new();
        let seen = log();
        let parked: Arc<Mutex<Option<PauseToken>>> = Arc::new(Mutex::new(None));

        hub.register_module(tick_publisher(true)).unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("one", 10, move |_, _, _| {
            push(&s, "one");
        }))
        .unwrap();
        let s = seen.clone();
        let slot = parked.clone();
        hub.register_module(tick_listener("pauser", 0, move |scope, _, _| {
            push(&s, "pauser");
            let token = scope.request_pause("awaiting approval").unwrap();
            *slot.lock().unwrap() = Some(token);
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("three", -10, move |_, _, _| {
            push(&s, "three");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 42, Payload::empty()));
        assert_eq!(entries(&seen), ["one", "pauser"]);

        let token = parked.lock().unwrap().take().unwrap();
        assert_eq!(token.event(), &tick);
        assert_eq!(token.resume_index(), 2, "resumes after the pausing listener");
        assert_eq!(token.code(), 42);
        assert_eq!(token.reason(), Some("awaiting approval"));

        assert!(hub.resume_paused(token));
        assert_eq!(entries(&seen), ["one", "pauser", "three"]);
    }

    #[test]
    fn test_interrupts_refused_on_plain_event() {
        let hub = Hub::new();
        let seen = log();
        let labels = log();

        hub.register_module(tick_publisher(false)).unwrap();
        let l = labels.clone();
        hub.register_module(tick_listener("wannabe", 10, move |scope, _, _| {
            push(&l, scope.request_cancel().unwrap_err().as_label());
            push(&l, scope.request_pause("x").unwrap_err().as_label());
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("tail", 0, move |_, _, _| {
            push(&s, "tail");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(hub.publish(&tick, 0, Payload::empty()), "firing is unaffected");
        assert_eq!(entries(&labels), ["usage_error", "usage_error"]);
        assert_eq!(entries(&seen), ["tail"]);
        let recorded = hub.last_error().unwrap();
        assert!(recorded.contains("not interruptible"), "got: {recorded}");
    }

    #[test]
    fn test_second_interrupt_of_one_firing_is_refused() {
        let hub = Hub::new();
        let labels = log();

        hub.register_module(tick_publisher(true)).unwrap();
        let l = labels.clone();
        hub.register_module(tick_listener("greedy", 0, move |scope, _, _| {
            scope.request_cancel().unwrap();
            push(&l, scope.request_pause("again").unwrap_err().as_label());
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 0, Payload::empty()), "the cancel stands");
        assert_eq!(entries(&labels), ["usage_error"]);
        let recorded = hub.last_error().unwrap();
        assert!(recorded.contains("already interrupted"), "got: {recorded}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_resumes_from_timer() {
        let hub = Hub::new();
        let seen = log();
        let delayed: Arc<Mutex<Option<DelayId>>> = Arc::new(Mutex::new(None));

        hub.register_module(tick_publisher(true)).unwrap();
        let s = seen.clone();
        let slot = delayed.clone();
        hub.register_module(tick_listener("delayer", 10, move |scope, _, _| {
            push(&s, "delayer");
            let id = scope
                .request_delay("waiting for io", Duration::from_secs(1))
                .unwrap();
            *slot.lock().unwrap() = Some(id);
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("tail", 0, move |_, _, _| {
            push(&s, "tail");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 0, Payload::empty()));
        assert_eq!(entries(&seen), ["delayer"]);
        assert_eq!(hub.suspended_count(), 1);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(entries(&seen), ["delayer", "tail"], "timer resumed the firing");
        assert_eq!(hub.suspended_count(), 0);

        // The timer already redeemed this id.
        let id = delayed.lock().unwrap().take().unwrap();
        assert!(!hub.resume_delayed(id));
        let recorded = hub.last_error().unwrap();
        assert!(recorded.contains("not found"), "got: {recorded}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_resume_beats_timer() {
        let hub = Hub::new();
        let seen = log();
        let delayed: Arc<Mutex<Option<DelayId>>> = Arc::new(Mutex::new(None));

        hub.register_module(tick_publisher(true)).unwrap();
        let slot = delayed.clone();
        hub.register_module(tick_listener("delayer", 10, move |scope, _, _| {
            let id = scope
                .request_delay("long wait", Duration::from_secs(5))
                .unwrap();
            *slot.lock().unwrap() = Some(id);
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("tail", 0, move |_, _, _| {
            push(&s, "tail");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 0, Payload::empty()));
        let id = delayed.lock().unwrap().take().unwrap();

        assert!(hub.resume_delayed(id), "manual resume wins");
        assert_eq!(entries(&seen), ["tail"]);
        assert_eq!(hub.suspended_count(), 0);

        // Past the original deadline: the cancelled timer must not re-run
        // anything.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(entries(&seen), ["tail"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_failure_keeps_firing_running() {
        let hub = Hub::builder()
            .with_config(HubConfig {
                max_suspended: 1,
                ..HubConfig::default()
            })
            .build();
        let seen = log();
        let labels = log();

        hub.register_module(tick_publisher(true)).unwrap();
        let l = labels.clone();
        hub.register_module(tick_listener("delayer", 10, move |scope, _, _| {
            match scope.request_delay("backoff", Duration::from_secs(60)) {
                Ok(_) => push(&l, "granted"),
                Err(err) => push(&l, err.as_label()),
            }
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("tail", 0, move |_, _, _| {
            push(&s, "tail");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 0, Payload::empty()), "first delay granted");
        assert_eq!(hub.suspended_count(), 1);

        // Capacity exhausted: the request fails and the walk keeps going.
        assert!(hub.publish(&tick, 0, Payload::empty()));
        assert_eq!(entries(&labels), ["granted", "allocation_failure"]);
        assert_eq!(entries(&seen), ["tail"]);
        let recorded = hub.last_error().unwrap();
        assert!(recorded.contains("core:tick"), "got: {recorded}");
        assert!(recorded.contains("already suspended"), "got: {recorded}");
    }

    #[test]
    fn test_delay_with_zero_duration_is_refused() {
        let hub = Hub::new();
        let labels = log();

        hub.register_module(tick_publisher(true)).unwrap();
        let l = labels.clone();
        hub.register_module(tick_listener("delayer", 0, move |scope, _, _| {
            push(
                &l,
                scope
                    .request_delay("noop", Duration::ZERO)
                    .unwrap_err()
                    .as_label(),
            );
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(hub.publish(&tick, 0, Payload::empty()));
        assert_eq!(entries(&labels), ["usage_error"]);
        assert!(hub.last_error().unwrap().contains("zero duration"));
    }

    #[test]
    fn test_policy_can_veto_interrupts() {
        let hub = Hub::new();
        let seen = log();
        let labels = log();

        hub.register_module(
            ModuleSpec::new("core").publishes(["tick"]).with_init(|setup| {
                setup
                    .register_event(
                        EventSpec::new("tick")
                            .interruptible(true)
                            .with_policy(|kind, _| kind != InterruptKind::Cancel),
                    )
                    .map(|_| ())
            }),
        )
        .unwrap();
        let l = labels.clone();
        hub.register_module(tick_listener("canceller", 10, move |scope, _, _| {
            push(&l, scope.request_cancel().unwrap_err().as_label());
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("tail", 0, move |_, _, _| {
            push(&s, "tail");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(hub.publish(&tick, 0, Payload::empty()), "veto keeps it running");
        assert_eq!(entries(&labels), ["usage_error"]);
        assert_eq!(entries(&seen), ["tail"]);
        assert!(hub.last_error().unwrap().contains("vetoed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_caps_delay_duration() {
        let hub = Hub::new();
        let seen = log();

        hub.register_module(
            ModuleSpec::new("core").publishes(["tick"]).with_init(|setup| {
                setup
                    .register_event(
                        EventSpec::new("tick").interruptible(true).with_policy(
                            |kind, max_delay| {
                                if kind == InterruptKind::Delay {
                                    *max_delay = (*max_delay).min(Duration::from_secs(1));
                                }
                                true
                            },
                        ),
                    )
                    .map(|_| ())
            }),
        )
        .unwrap();
        hub.register_module(tick_listener("delayer", 10, move |scope, _, _| {
            scope
                .request_delay("asked for ages", Duration::from_secs(30))
                .unwrap();
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("tail", 0, move |_, _, _| {
            push(&s, "tail");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 0, Payload::empty()));

        // Well before the requested 30s, just past the capped 1s.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(entries(&seen), ["tail"], "capped timer already fired");
        assert_eq!(hub.suspended_count(), 0);
    }

    #[test]
    fn test_panic_isolation_keeps_walk_alive() {
        let hub = Hub::new();
        let seen = log();

        hub.register_module(tick_publisher(false)).unwrap();
        hub.register_module(tick_listener("bomb", 10, |_, _, _| {
            panic!("boom");
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("survivor", 0, move |_, _, _| {
            push(&s, "survivor");
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(hub.publish(&tick, 0, Payload::empty()));
        assert_eq!(entries(&seen), ["survivor"]);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_panic_unwinds_when_isolation_is_off() {
        let hub = Hub::builder()
            .with_config(HubConfig {
                isolate_panics: false,
                ..HubConfig::default()
            })
            .build();

        hub.register_module(tick_publisher(false)).unwrap();
        hub.register_module(tick_listener("bomb", 0, |_, _, _| {
            panic!("boom");
        }))
        .unwrap();
        let tick = ready(&hub);

        hub.publish(&tick, 0, Payload::empty());
    }

    #[test]
    #[should_panic(expected = "not interruptible")]
    fn test_strict_mode_escalates_usage_errors() {
        let hub = Hub::builder()
            .with_config(HubConfig {
                strict: true,
                ..HubConfig::default()
            })
            .build();

        hub.register_module(tick_publisher(false)).unwrap();
        hub.register_module(tick_listener("wannabe", 0, |scope, _, _| {
            let _ = scope.request_cancel();
        }))
        .unwrap();
        let tick = ready(&hub);

        hub.publish(&tick, 0, Payload::empty());
    }

    #[test]
    fn test_payload_and_code_survive_suspension() {
        let hub = Hub::new();
        let seen = log();
        let parked: Arc<Mutex<Option<PauseToken>>> = Arc::new(Mutex::new(None));

        hub.register_module(tick_publisher(true)).unwrap();
        let slot = parked.clone();
        hub.register_module(tick_listener("pauser", 10, move |scope, _, _| {
            let token = scope.request_pause("hold").unwrap();
            *slot.lock().unwrap() = Some(token);
        }))
        .unwrap();
        let s = seen.clone();
        hub.register_module(tick_listener("reader", 0, move |_, code, payload| {
            let text = payload.downcast_ref::<String>().cloned().unwrap_or_default();
            push(&s, format!("{code}:{text}"));
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 9, Payload::new(String::from("hello"))));
        let token = parked.lock().unwrap().take().unwrap();
        assert!(hub.resume_paused(token));
        assert_eq!(entries(&seen), ["9:hello"]);
    }

    #[test]
    fn test_fired_count_ignores_resumptions() {
        let hub = Hub::new();
        let parked: Arc<Mutex<Option<PauseToken>>> = Arc::new(Mutex::new(None));

        hub.register_module(tick_publisher(true)).unwrap();
        let slot = parked.clone();
        hub.register_module(tick_listener("pauser", 0, move |scope, _, _| {
            let token = scope.request_pause("hold").unwrap();
            *slot.lock().unwrap() = Some(token);
        }))
        .unwrap();
        let tick = ready(&hub);

        assert!(!hub.publish(&tick, 0, Payload::empty()));
        let token = parked.lock().unwrap().take().unwrap();
        assert!(hub.resume_paused(token));
        assert!(!hub.publish(&tick, 0, Payload::empty()));

        assert_eq!(tick.fired_count(), 2, "two publishes, one resumption");
    }

    #[test]
    fn test_listeners_can_publish_reentrantly() {
        let hub = Hub::new();
        let seen = log();

        hub.register_module(
            ModuleSpec::new("core")
                .publishes(["first", "second"])
                .with_init(|setup| {
                    setup.register_event(EventSpec::new("first"))?;
                    setup.register_event(EventSpec::new("second"))?;
                    Ok(())
                }),
        )
        .unwrap();
        let s = seen.clone();
        hub.register_module(
            ModuleSpec::new("relay")
                .subscribes(["core:first"])
                .with_init(move |setup| {
                    let s = s.clone();
                    setup.listen_with(
                        "core:first",
                        Binding::new().with_priority(10),
                        move |scope, _, _| {
                            push(&s, "relay");
                            let ok = scope.hub().publish_name("core:second", 1, Payload::empty());
                            push(&s, format!("nested:{ok}"));
                        },
                    )
                }),
        )
        .unwrap();
        let s = seen.clone();
        hub.register_module(
            ModuleSpec::new("sink")
                .subscribes(["core:second"])
                .with_init(move |setup| {
                    let s = s.clone();
                    setup.listen("core:second", move |_, _, _| {
                        push(&s, "sink");
                    })
                }),
        )
        .unwrap();
        let s = seen.clone();
        hub.register_module(
            ModuleSpec::new("after")
                .subscribes(["core:first"])
                .with_init(move |setup| {
                    let s = s.clone();
                    setup.listen_with(
                        "core:first",
                        Binding::new().with_priority(-10),
                        move |_, _, _| {
                            push(&s, "after");
                        },
                    )
                }),
        )
        .unwrap();
        hub.initialize().unwrap();

        let first = hub.lookup_event("core:first").unwrap();
        assert!(hub.publish(&first, 0, Payload::empty()));
        assert_eq!(
            entries(&seen),
            ["relay", "sink", "nested:true", "after"],
            "the nested firing completed mid-walk"
        );
    }

    #[test]
    fn test_optional_subscription_tolerates_missing_target() {
        let hub = Hub::new();

        hub.register_module(tick_publisher(false)).unwrap();
        hub.register_module(
            ModuleSpec::new("flexible")
                .subscribes_optional(["ghost:appeared"])
                .with_init(|setup| {
                    setup.listen("ghost:appeared", |_, _, _| {})
                }),
        )
        .unwrap();

        hub.initialize().unwrap();
        assert!(hub.is_sealed());
    }

    #[test]
    fn test_required_subscription_missing_target_fails_initialize() {
        let hub = Hub::new();
        let stashed: Arc<Mutex<Option<EventHandle>>> = Arc::new(Mutex::new(None));

        let slot = stashed.clone();
        hub.register_module(
            ModuleSpec::new("core")
                .publishes(["tick"])
                .with_init(move |setup| {
                    let tick = setup.register_event(EventSpec::new("tick"))?;
                    *slot.lock().unwrap() = Some(tick);
                    Ok(())
                }),
        )
        .unwrap();
        hub.register_module(
            ModuleSpec::new("needy")
                .subscribes(["ghost:appeared"])
                .with_init(|setup| setup.listen("ghost:appeared", |_, _, _| {})),
        )
        .unwrap();

        let err = hub.initialize().unwrap_err();
        assert_eq!(err.as_label(), "not_found");
        assert!(!hub.is_sealed());

        // The registry never sealed, so publishing stays illegal.
        let tick = stashed.lock().unwrap().take().unwrap();
        assert!(!hub.publish(&tick, 0, Payload::empty()));
        let recorded = hub.last_error().unwrap();
        assert!(recorded.contains("before initialize"), "got: {recorded}");
    }

    #[test]
    fn test_registration_closes_after_seal() {
        let hub = Hub::new();
        hub.register_module(tick_publisher(false)).unwrap();
        hub.initialize().unwrap();

        let err = hub.register_module(ModuleSpec::new("late")).unwrap_err();
        assert_eq!(err.as_label(), "registration_after_seal");
        let err = hub
            .register_submodule("core", ModuleSpec::new("later"))
            .unwrap_err();
        assert_eq!(err.as_label(), "registration_after_seal");
        let err = hub.initialize().unwrap_err();
        assert_eq!(err.as_label(), "registration_after_seal");
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let hub = Hub::new();
        hub.register_module(tick_publisher(false)).unwrap();

        let err = hub.register_module(ModuleSpec::new("core")).unwrap_err();
        assert_eq!(err.as_label(), "duplicate_name");

        hub.register_module(
            ModuleSpec::new("twice")
                .publishes(["same"])
                .with_init(|setup| {
                    setup.register_event(EventSpec::new("same"))?;
                    setup.register_event(EventSpec::new("same"))?;
                    Ok(())
                }),
        )
        .unwrap();
        let err = hub.initialize().unwrap_err();
        assert_eq!(err.as_label(), "duplicate_name");
    }

    #[test]
    fn test_module_context_and_submodules() {
        let hub = Hub::new();

        hub.register_module(
            ModuleSpec::new("engine")
                .with_version("2.1.0")
                .with_context(String::from("shared state")),
        )
        .unwrap();
        hub.register_submodule("engine", ModuleSpec::new("cache"))
            .unwrap();
        let err = hub
            .register_submodule("ghost", ModuleSpec::new("orphan"))
            .unwrap_err();
        assert_eq!(err.as_label(), "not_found");

        hub.initialize().unwrap();

        let context = hub.module_context::<String>("engine").unwrap();
        assert_eq!(context.as_str(), "shared state");
        assert!(hub.module_context::<u32>("engine").is_none(), "wrong type");
        assert!(hub.module_context::<String>("cache").is_none(), "no context");
        assert!(hub.module_context::<String>("unknown").is_none());

        assert_eq!(hub.submodules("engine"), ["cache"]);
        assert_eq!(hub.module_parent("cache").as_deref(), Some("engine"));
        assert!(hub.module_parent("engine").is_none());
        assert!(hub.submodules("unknown").is_empty());
    }

    #[test]
    fn test_publish_name_unknown_event() {
        let hub = Hub::new();
        hub.register_module(tick_publisher(false)).unwrap();
        hub.initialize().unwrap();

        assert!(hub.lookup_event("core:nope").is_none());
        assert!(!hub.publish_name("core:nope", 0, Payload::empty()));
        let recorded = hub.last_error().unwrap();
        assert!(recorded.contains("not found: core:nope"), "got: {recorded}");

        assert!(hub.publish_name("core:tick", 0, Payload::empty()));
    }
}
