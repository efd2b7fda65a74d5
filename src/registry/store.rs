//! # The registry: modules, events, and lifecycle phase.
//!
//! One [`Registry`] owns every module record and every event record, plus the
//! lifecycle phase that makes registration append-only:
//!
//! ```text
//!   Open ──initialize()──▶ Initializing ──seal()──▶ Sealed
//!    │                          │                      │
//!    │ register_module          │ register_event       │ publish / resume
//!    │ register_submodule       │ listen               │ lookups only
//! ```
//!
//! Modules are added while `Open`; events and listeners may only be added by
//! an initializing module; after sealing, every table is frozen and anything
//! registration-shaped fails with `RegistrationAfterSeal`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::HubError;
use crate::registry::event::{EventHandle, EventRecord, EventSpec};
use crate::registry::listeners::{Binding, ListenerEntry, ListenerFn};
use crate::registry::module::{qualify, split_qualified, InitFn, ModuleRecord, ModuleSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Open,
    Initializing,
    Sealed,
}

pub(crate) struct Registry {
    phase: RwLock<Phase>,
    modules: RwLock<Vec<ModuleRecord>>,
    events: RwLock<HashMap<String, Arc<EventRecord>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            phase: RwLock::new(Phase::Open),
            modules: RwLock::new(Vec::new()),
            events: RwLock::new(HashMap::new()),
        }
    }

    fn phase(&self) -> Phase {
        *self
            .phase
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.phase() == Phase::Sealed
    }

    /// Adds a module (optionally under a parent). Legal only while `Open`.
    pub(crate) fn add_module(
        &self,
        spec: ModuleSpec,
        parent: Option<&str>,
    ) -> Result<(), HubError> {
        match self.phase() {
            Phase::Open => {}
            Phase::Initializing => {
                return Err(HubError::UsageError {
                    detail: format!(
                        "module {} registered during initialization",
                        spec.name()
                    ),
                })
            }
            Phase::Sealed => {
                return Err(HubError::RegistrationAfterSeal {
                    what: format!("module {}", spec.name()),
                })
            }
        }

        let mut modules = self
            .modules
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if modules.iter().any(|m| m.name.as_ref() == spec.name()) {
            return Err(HubError::DuplicateName {
                name: spec.name().to_string(),
            });
        }

        let parent_name = match parent {
            Some(parent) => {
                let Some(record) = modules.iter_mut().find(|m| m.name.as_ref() == parent) else {
                    return Err(HubError::NotFound {
                        target: parent.to_string(),
                    });
                };
                let name: Arc<str> = Arc::from(spec.name());
                record.submodules.push(name);
                Some(record.name.clone())
            }
            None => None,
        };

        modules.push(spec.into_record(parent_name));
        Ok(())
    }

    /// Moves to `Initializing` and hands back every module's init closure in
    /// registration order.
    pub(crate) fn begin_initialize(
        &self,
    ) -> Result<Vec<(Arc<str>, Arc<str>, Option<InitFn>)>, HubError> {
        {
            let mut phase = self
                .phase
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match *phase {
                Phase::Open => *phase = Phase::Initializing,
                Phase::Initializing => {
                    return Err(HubError::UsageError {
                        detail: "initialize is already running".to_string(),
                    })
                }
                Phase::Sealed => {
                    return Err(HubError::RegistrationAfterSeal {
                        what: "second initialize".to_string(),
                    })
                }
            }
        }

        let mut modules = self
            .modules
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(modules
            .iter_mut()
            .map(|m| (m.name.clone(), m.version.clone(), m.init.take()))
            .collect())
    }

    /// Registers an event for `module`. Legal only while that module
    /// initializes, and only for names the module declared it publishes.
    pub(crate) fn add_event(
        &self,
        module: &str,
        spec: EventSpec,
    ) -> Result<EventHandle, HubError> {
        let qualified = qualify(module, spec.name());
        match self.phase() {
            Phase::Initializing => {}
            Phase::Open => {
                return Err(HubError::UsageError {
                    detail: format!(
                        "event {qualified} registered outside module initialization"
                    ),
                })
            }
            Phase::Sealed => {
                return Err(HubError::RegistrationAfterSeal {
                    what: format!("event {qualified}"),
                })
            }
        }

        {
            let modules = self
                .modules
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let Some(record) = modules.iter().find(|m| m.name.as_ref() == module) else {
                return Err(HubError::NotFound {
                    target: module.to_string(),
                });
            };
            if !record.can_publish(spec.name()) {
                return Err(HubError::UsageError {
                    detail: format!(
                        "module {module} has not declared event {} in its publish list",
                        spec.name()
                    ),
                });
            }
        }

        let mut events = self
            .events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if events.contains_key(&qualified) {
            return Err(HubError::DuplicateName { name: qualified });
        }

        let record = Arc::new(spec.into_record(Arc::from(module)));
        events.insert(qualified, record.clone());
        Ok(EventHandle { record })
    }

    /// Attaches a listener from `module` to the event named `target`.
    ///
    /// The target must appear in the module's subscribe declarations. A miss
    /// is a no-op when either the declaration or the binding is optional.
    pub(crate) fn subscribe(
        &self,
        module: &str,
        target: &str,
        binding: Binding,
        callback: ListenerFn,
    ) -> Result<(), HubError> {
        let (listener, optional) = self.check_subscribe(module, target, binding)?;

        let record = {
            let events = self
                .events
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            events.get(target).cloned()
        };
        let Some(record) = record else {
            if optional {
                debug!(module, target, "optional subscription target absent, skipping");
                return Ok(());
            }
            return Err(HubError::NotFound {
                target: target.to_string(),
            });
        };

        let mut table = record
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table.insert(ListenerEntry {
            module: listener,
            priority: binding.priority(),
            callback,
        })
    }

    /// Attaches a listener from `module` directly to a held handle.
    pub(crate) fn subscribe_handle(
        &self,
        module: &str,
        handle: &EventHandle,
        binding: Binding,
        callback: ListenerFn,
    ) -> Result<(), HubError> {
        let target = handle.qualified_name();
        let (listener, _) = self.check_subscribe(module, &target, binding)?;

        let mut table = handle
            .record
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table.insert(ListenerEntry {
            module: listener,
            priority: binding.priority(),
            callback,
        })
    }

    /// Shared preconditions for both listen paths. Returns the listening
    /// module's name and whether the subscription tolerates a missing target.
    fn check_subscribe(
        &self,
        module: &str,
        target: &str,
        binding: Binding,
    ) -> Result<(Arc<str>, bool), HubError> {
        match self.phase() {
            Phase::Initializing => {}
            Phase::Open => {
                return Err(HubError::UsageError {
                    detail: format!(
                        "listener for {target} added outside module initialization"
                    ),
                })
            }
            Phase::Sealed => {
                return Err(HubError::RegistrationAfterSeal {
                    what: format!("listener for {target}"),
                })
            }
        }

        if binding.priority() == i8::MIN {
            return Err(HubError::UsageError {
                detail: format!("listener priority {} is out of range", i8::MIN),
            });
        }
        if split_qualified(target).is_none() {
            return Err(HubError::UsageError {
                detail: format!("subscribe target {target} is not of the form module:event"),
            });
        }

        let modules = self
            .modules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(record) = modules.iter().find(|m| m.name.as_ref() == module) else {
            return Err(HubError::NotFound {
                target: module.to_string(),
            });
        };
        let Some(decl) = record.subscribe_decl(target) else {
            return Err(HubError::UsageError {
                detail: format!(
                    "module {module} has not declared {target} in its subscribe list"
                ),
            });
        };

        let optional =
            decl.requirement.is_optional() || binding.requirement().is_optional();
        Ok((record.name.clone(), optional))
    }

    pub(crate) fn lookup(&self, qualified: &str) -> Option<EventHandle> {
        let events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events
            .get(qualified)
            .map(|record| EventHandle {
                record: record.clone(),
            })
    }

    /// Freezes every listener table and moves to `Sealed`. Returns
    /// (modules, events, listeners) counts for the lifecycle log line.
    pub(crate) fn seal(&self) -> Result<(usize, usize, usize), HubError> {
        {
            let mut phase = self
                .phase
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match *phase {
                Phase::Initializing => *phase = Phase::Sealed,
                Phase::Open => {
                    return Err(HubError::UsageError {
                        detail: "seal without initialize".to_string(),
                    })
                }
                Phase::Sealed => {
                    return Err(HubError::RegistrationAfterSeal {
                        what: "second seal".to_string(),
                    })
                }
            }
        }

        let events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut listeners = 0;
        for record in events.values() {
            let mut table = record
                .listeners
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            table.freeze();
            listeners += table.len();
        }

        let modules = self
            .modules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok((modules.len(), events.len(), listeners))
    }

    pub(crate) fn module_context(
        &self,
        name: &str,
    ) -> Option<Arc<dyn Any + Send + Sync>> {
        let modules = self
            .modules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        modules
            .iter()
            .find(|m| m.name.as_ref() == name)
            .and_then(|m| m.context.clone())
    }

    pub(crate) fn module_parent(&self, name: &str) -> Option<Arc<str>> {
        let modules = self
            .modules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        modules
            .iter()
            .find(|m| m.name.as_ref() == name)
            .and_then(|m| m.parent.clone())
    }

    pub(crate) fn submodules(&self, name: &str) -> Vec<Arc<str>> {
        let modules = self
            .modules
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        modules
            .iter()
            .find(|m| m.name.as_ref() == name)
            .map(|m| m.submodules.clone())
            .unwrap_or_default()
    }
}
