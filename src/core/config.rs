//! # Global hub configuration.
//!
//! Provides [`HubConfig`] centralized settings for the dispatch hub.
//!
//! Config is consumed once, at hub construction:
//! 1. **Defaults**: `Hub::new()`
//! 2. **Builder**: `Hub::builder().with_config(config).build()`
//!
//! ## Sentinel values
//! - `max_suspended = 0` → unlimited (no bound on concurrently delayed firings)

/// Global configuration for the dispatch hub.
///
/// Defines:
/// - **Error escalation**: whether usage errors panic or are recorded
/// - **Fault containment**: whether listener panics are isolated
/// - **Suspension bounds**: cap on concurrently delayed firings
///
/// ## Field semantics
/// - `strict`: usage errors panic instead of being recorded (`false` = record)
/// - `isolate_panics`: listener panics are caught and logged (`true` = isolate)
/// - `max_suspended`: concurrent delayed-firing limit (`0` = unlimited)
///
/// ## Notes
/// All fields are public for flexibility. Prefer
/// [`HubConfig::panic_isolation`] over reading `isolate_panics` directly;
/// strict mode overrides it.
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Escalate usage errors into panics.
    ///
    /// When set:
    /// - Misuse (publishing before `initialize` completed, interrupting a
    ///   non-interruptible event, double interrupts) panics at the call site
    /// - Listener panics are never swallowed, regardless of `isolate_panics`
    ///
    /// Meant for tests and development builds; production embedders keep
    /// this off and watch [`Hub::last_error`](crate::Hub::last_error).
    pub strict: bool,

    /// Catch panics escaping listeners and keep the firing going.
    ///
    /// A panicking listener is logged at `error` level and treated as if it
    /// returned without interrupting. Ignored under `strict`.
    pub isolate_panics: bool,

    /// Maximum number of concurrently suspended (delayed) firings.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = further delay requests fail with `AllocationFailure`
    pub max_suspended: usize,
}

impl HubConfig {
    /// Effective panic isolation.
    ///
    /// - `true` → listener panics are caught and the walk continues
    /// - `false` → panics unwind into the publisher
    ///
    /// Strict mode wins over `isolate_panics`: a strict hub surfaces every
    /// panic, including its own escalated usage errors.
    #[inline]
    pub fn panic_isolation(&self) -> bool {
        self.isolate_panics && !self.strict
    }
}

impl Default for HubConfig {
    /// Default configuration:
    ///
    /// - `strict = false` (record errors, never panic)
    /// - `isolate_panics = true` (contain faulty listeners)
    /// - `max_suspended = 1024` (good baseline)
    fn default() -> Self {
        Self {
            strict: false,
            isolate_panics: true,
            max_suspended: 1024,
        }
    }
}
