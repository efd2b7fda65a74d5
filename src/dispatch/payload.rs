//! # Opaque event payload.
//!
//! [`Payload`] carries the publisher's data across a firing and, when the
//! firing is paused or delayed, inside the continuation token. It is a
//! cheaply-clonable handle (`Arc` inside), so suspending a firing never
//! copies the data itself.
//!
//! The payload is untyped by design: events advertise an optional
//! documentation-only tag (see `EventSpec::with_data_tag`), and listeners
//! recover the concrete type with [`Payload::downcast_ref`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Untyped, shareable payload attached to one firing.
///
/// ## Example
/// ```
/// use modvisor::Payload;
///
/// let p = Payload::new(String::from("reload"));
/// assert_eq!(p.downcast_ref::<String>().map(String::as_str), Some("reload"));
/// assert!(p.downcast_ref::<u32>().is_none());
/// assert!(Payload::empty().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct Payload {
    inner: Option<Arc<dyn Any + Send + Sync>>,
}

impl Payload {
    /// Wraps a value in a payload handle.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Some(Arc::new(value)),
        }
    }

    /// Wraps an already-shared value without another allocation.
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self { inner: Some(value) }
    }

    /// A payload carrying no data.
    #[inline]
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Returns `true` when no data is attached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// Borrows the payload as a concrete type, if it holds one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_some() {
            f.write_str("Payload(..)")
        } else {
            f.write_str("Payload(empty)")
        }
    }
}
