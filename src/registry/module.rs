//! # Module specs and records.
//!
//! Defines [`ModuleSpec`], the declaration bundle a module hands to
//! [`Hub::register_module`](crate::Hub::register_module): identity,
//! capability declarations (events it publishes, qualified events it may
//! subscribe to), an optional context value, and the init closure that runs
//! during [`Hub::initialize`](crate::Hub::initialize).
//!
//! ## Rules
//! - `publishes` entries are local names (`"tick"`); `subscribes` entries are
//!   qualified (`"core:tick"`).
//! - Event registration and listening are only legal for declared names; the
//!   registry rejects undeclared ones at add time.
//! - A subscription declared (or bound) as [`Requirement::Optional`] tolerates
//!   a missing target: the listen call becomes a silent no-op.

use std::any::Any;
use std::sync::Arc;

use crate::core::ModuleSetup;
use crate::error::HubError;

/// How a subscription treats a missing target event.
///
/// Optional subscriptions let a module integrate with features that may not
/// be present in every build without failing initialization over them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// The target must exist; a miss is a `NotFound` error.
    Required,
    /// The target may be absent; a miss turns the listen call into a no-op.
    Optional,
}

impl Requirement {
    #[inline]
    pub fn is_optional(self) -> bool {
        matches!(self, Requirement::Optional)
    }
}

impl Default for Requirement {
    /// Subscriptions are hard dependencies unless stated otherwise.
    fn default() -> Self {
        Requirement::Required
    }
}

/// One declared subscription target.
#[derive(Clone, Debug)]
pub(crate) struct SubscribeDecl {
    pub(crate) target: Arc<str>,
    pub(crate) requirement: Requirement,
}

/// Init closure invoked once while the module initializes.
///
/// `Sync` because registered modules live behind the hub's shared state; in
/// practice any closure whose captures are `Send + Sync` qualifies.
pub(crate) type InitFn =
    Box<dyn FnOnce(&mut ModuleSetup<'_>) -> Result<(), HubError> + Send + Sync + 'static>;

/// Declaration bundle for one module.
///
/// Built with `with_*` methods and consumed by
/// [`Hub::register_module`](crate::Hub::register_module). The init closure is
/// the only place the module may register events and attach listeners.
///
/// ## Example
/// ```
/// use modvisor::{EventSpec, ModuleSpec};
///
/// let spec = ModuleSpec::new("metrics")
///     .with_version("1.2.0")
///     .publishes(["flushed"])
///     .subscribes(["core:tick"])
///     .subscribes_optional(["lua:loaded"])
///     .with_init(|setup| {
///         setup.register_event(EventSpec::new("flushed"))?;
///         setup.listen("core:tick", |_scope, _code, _payload| {})?;
///         Ok(())
///     });
/// assert_eq!(spec.name(), "metrics");
/// assert_eq!(spec.version(), "1.2.0");
/// ```
pub struct ModuleSpec {
    name: Arc<str>,
    version: Arc<str>,
    publishes: Vec<Arc<str>>,
    subscribes: Vec<SubscribeDecl>,
    context: Option<Arc<dyn Any + Send + Sync>>,
    init: Option<InitFn>,
}

impl ModuleSpec {
    /// Creates a spec with no declarations and version `"0.0.0"`.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            version: Arc::from("0.0.0"),
            publishes: Vec::new(),
            subscribes: Vec::new(),
            context: None,
            init: None,
        }
    }

    /// Sets the module version string.
    pub fn with_version(mut self, version: impl Into<Arc<str>>) -> Self {
        self.version = version.into();
        self
    }

    /// Declares local event names this module may register and publish.
    pub fn publishes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.publishes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declares qualified event names this module may listen to (hard
    /// dependencies).
    pub fn subscribes<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.subscribes.extend(targets.into_iter().map(|t| SubscribeDecl {
            target: t.into(),
            requirement: Requirement::Required,
        }));
        self
    }

    /// Declares qualified event names this module may listen to, tolerating
    /// their absence (soft dependencies).
    pub fn subscribes_optional<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        self.subscribes.extend(targets.into_iter().map(|t| SubscribeDecl {
            target: t.into(),
            requirement: Requirement::Optional,
        }));
        self
    }

    /// Attaches the module's opaque context value, readable later via
    /// [`Hub::module_context`](crate::Hub::module_context).
    pub fn with_context<T: Any + Send + Sync>(mut self, context: T) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    /// Sets the init closure run during `Hub::initialize`.
    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: FnOnce(&mut ModuleSetup<'_>) -> Result<(), HubError> + Send + Sync + 'static,
    {
        self.init = Some(Box::new(init));
        self
    }

    /// Returns the module name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the module version.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn into_record(self, parent: Option<Arc<str>>) -> ModuleRecord {
        ModuleRecord {
            name: self.name,
            version: self.version,
            publishes: self.publishes,
            subscribes: self.subscribes,
            context: self.context,
            parent,
            submodules: Vec::new(),
            init: self.init,
        }
    }
}

/// Stored form of a registered module.
pub(crate) struct ModuleRecord {
    pub(crate) name: Arc<str>,
    pub(crate) version: Arc<str>,
    pub(crate) publishes: Vec<Arc<str>>,
    pub(crate) subscribes: Vec<SubscribeDecl>,
    pub(crate) context: Option<Arc<dyn Any + Send + Sync>>,
    pub(crate) parent: Option<Arc<str>>,
    pub(crate) submodules: Vec<Arc<str>>,
    pub(crate) init: Option<InitFn>,
}

impl ModuleRecord {
    pub(crate) fn can_publish(&self, event: &str) -> bool {
        self.publishes.iter().any(|n| n.as_ref() == event)
    }

    pub(crate) fn subscribe_decl(&self, target: &str) -> Option<&SubscribeDecl> {
        self.subscribes.iter().find(|d| d.target.as_ref() == target)
    }
}

/// Splits `"module:event"` into its parts.
pub(crate) fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let (module, event) = name.split_once(':')?;
    if module.is_empty() || event.is_empty() {
        return None;
    }
    Some((module, event))
}

/// Joins a module and a local event name into the qualified form.
pub(crate) fn qualify(module: &str, event: &str) -> String {
    format!("{module}:{event}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_defaults() {
        let spec = ModuleSpec::new("core");
        assert_eq!(spec.name(), "core");
        assert_eq!(spec.version(), "0.0.0");
        assert!(spec.publishes.is_empty());
        assert!(spec.subscribes.is_empty());
    }

    #[test]
    fn test_declarations_collect_in_order() {
        let spec = ModuleSpec::new("m")
            .publishes(["a", "b"])
            .subscribes(["x:a"])
            .subscribes_optional(["y:b"]);
        let record = spec.into_record(None);

        assert!(record.can_publish("a"));
        assert!(record.can_publish("b"));
        assert!(!record.can_publish("c"));

        let hard = record.subscribe_decl("x:a").unwrap();
        assert_eq!(hard.requirement, Requirement::Required);
        let soft = record.subscribe_decl("y:b").unwrap();
        assert_eq!(soft.requirement, Requirement::Optional);
        assert!(record.subscribe_decl("z:c").is_none());
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("core:tick"), Some(("core", "tick")));
        assert_eq!(split_qualified("a:b:c"), Some(("a", "b:c")));
        assert!(split_qualified("tick").is_none());
        assert!(split_qualified(":tick").is_none());
        assert!(split_qualified("core:").is_none());
    }

    #[test]
    fn test_qualify_roundtrip() {
        let q = qualify("core", "tick");
        assert_eq!(split_qualified(&q), Some(("core", "tick")));
    }
}
