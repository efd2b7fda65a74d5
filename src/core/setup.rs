use std::sync::Arc;

use crate::dispatch::{FiringScope, Payload};
use crate::error::HubError;
use crate::registry::{Binding, EventHandle, EventSpec};

use super::hub::Hub;

/// Per-module handle passed to init closures by [`Hub::initialize`].
///
/// All registration during initialization goes through this handle, which
/// pins the acting module: events land under the module's namespace and
/// listeners are checked against the module's subscribe declarations. The
/// handle is only valid for the duration of the init closure; nothing can be
/// registered once `initialize` returns.
pub struct ModuleSetup<'a> {
    hub: &'a Hub,
    module: Arc<str>,
}

impl<'a> ModuleSetup<'a> {
    pub(crate) fn new(hub: &'a Hub, module: Arc<str>) -> Self {
        Self { hub, module }
    }

    /// Returns the initializing module's name.
    #[inline]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Registers one of the module's declared events and returns its handle.
    ///
    /// The handle is the cheap way to publish later; stash it in captured
    /// state or the module context to skip per-publish name lookups.
    pub fn register_event(&mut self, spec: EventSpec) -> Result<EventHandle, HubError> {
        self.hub.registry().add_event(&self.module, spec)
    }

    /// Attaches a listener to the qualified event `target` with the default
    /// binding (required, priority `0`).
    pub fn listen<F>(&mut self, target: &str, callback: F) -> Result<(), HubError>
    where
        F: Fn(&mut FiringScope<'_>, i64, &Payload) + Send + Sync + 'static,
    {
        self.listen_with(target, Binding::new(), callback)
    }

    /// Attaches a listener to the qualified event `target` with explicit
    /// binding options.
    pub fn listen_with<F>(
        &mut self,
        target: &str,
        binding: Binding,
        callback: F,
    ) -> Result<(), HubError>
    where
        F: Fn(&mut FiringScope<'_>, i64, &Payload) + Send + Sync + 'static,
    {
        self.hub
            .registry()
            .subscribe(&self.module, target, binding, Arc::new(callback))
    }

    /// Attaches a listener directly to a held event handle.
    pub fn listen_event<F>(
        &mut self,
        event: &EventHandle,
        binding: Binding,
        callback: F,
    ) -> Result<(), HubError>
    where
        F: Fn(&mut FiringScope<'_>, i64, &Payload) + Send + Sync + 'static,
    {
        self.hub
            .registry()
            .subscribe_handle(&self.module, event, binding, Arc::new(callback))
    }
}
