//! Error types used by the modvisor dispatch core.
//!
//! This module defines [`HubError`], the single failure taxonomy shared by
//! registration, subscription, interrupt requests, and resumption.
//!
//! The type provides helper methods (`as_label`, `as_message`) for
//! logging/metrics and [`HubError::is_usage`] for strict-mode decisions.

use thiserror::Error;

/// # Errors produced by the dispatch core.
///
/// Registration-time variants (`DuplicateName`, `RegistrationAfterSeal`,
/// `NotFound`) are startup bugs in the embedding program. `UsageError` covers
/// illegal interrupt requests made mid-firing. `AllocationFailure` is raised
/// when the suspension capacity bound is exhausted.
///
/// Boolean-returning operations (`publish`, `resume_*`) do not return this
/// type directly; their failure message is retrievable via
/// [`Hub::last_error`](crate::Hub::last_error).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HubError {
    /// A module or event was registered under a name that is already taken.
    #[error("duplicate name: {name}")]
    DuplicateName {
        /// The colliding module name or qualified event name.
        name: String,
    },

    /// A registration-shaped call arrived after the registry was sealed.
    #[error("registration after seal: {what}")]
    RegistrationAfterSeal {
        /// What was being registered (module, event, or listener).
        what: String,
    },

    /// A lookup target does not exist (hard subscription, resume id, or
    /// published name).
    #[error("not found: {target}")]
    NotFound {
        /// The qualified name or token id that failed to resolve.
        target: String,
    },

    /// An interrupt request (or other call) that is not permitted here:
    /// non-interruptible event, double interrupt, policy veto, or a call
    /// outside its legal lifecycle phase.
    #[error("usage error: {detail}")]
    UsageError {
        /// Description of the violated rule.
        detail: String,
    },

    /// Token allocation failed; the firing continues and prior side effects
    /// stay intact.
    #[error("allocation failure: {what}")]
    AllocationFailure {
        /// What could not be allocated.
        what: String,
    },
}

impl HubError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modvisor::HubError;
    ///
    /// let err = HubError::NotFound { target: "core:tick".into() };
    /// assert_eq!(err.as_label(), "not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HubError::DuplicateName { .. } => "duplicate_name",
            HubError::RegistrationAfterSeal { .. } => "registration_after_seal",
            HubError::NotFound { .. } => "not_found",
            HubError::UsageError { .. } => "usage_error",
            HubError::AllocationFailure { .. } => "allocation_failure",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HubError::DuplicateName { name } => format!("duplicate: {name}"),
            HubError::RegistrationAfterSeal { what } => format!("sealed: {what}"),
            HubError::NotFound { target } => format!("missing: {target}"),
            HubError::UsageError { detail } => format!("usage: {detail}"),
            HubError::AllocationFailure { what } => format!("allocation: {what}"),
        }
    }

    /// Indicates whether the error is a caller bug that strict mode escalates
    /// to a panic.
    ///
    /// # Example
    /// ```
    /// use modvisor::HubError;
    ///
    /// let err = HubError::UsageError { detail: "double interrupt".into() };
    /// assert!(err.is_usage());
    ///
    /// let err = HubError::NotFound { target: "core:tick".into() };
    /// assert!(!err.is_usage());
    /// ```
    pub fn is_usage(&self) -> bool {
        matches!(self, HubError::UsageError { .. })
    }
}
