//! Error types for the reconciliation engine.
//!
//! Structural errors (cycles, aliased nodes, ambiguous identities) are
//! detected before planning and are fatal: no hooks run and no store
//! mutation occurs. Hook and store failures during execution halt the
//! remaining plan and surface through the [`Report`](crate::plan::Report).

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error types.
#[derive(Debug, Error)]
pub enum Error {
    /// The subcomponent graph contains a cycle.
    #[error("cycle detected in component graph at '{at}'")]
    CycleDetected { at: String },

    /// The same component instance appears under more than one parent.
    #[error("component instance '{at}' is referenced by more than one parent")]
    AliasedComponent { at: String },

    /// Two distinct nodes resolved to the same identity.
    #[error("ambiguous resource: duplicate identity '{identity}'")]
    DuplicateIdentity { identity: String },

    /// A component was constructed with an empty label.
    #[error("component of type '{type_name}' has an empty label")]
    EmptyLabel { type_name: String },

    /// A lifecycle hook failed.
    #[error("{action} hook failed for '{identity}': {reason}")]
    Hook {
        identity: String,
        action: String,
        reason: String,
    },

    /// A state store operation failed.
    #[error("state store operation failed: {reason}")]
    StoreFailed { reason: String },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a cycle detection error.
    pub fn cycle_detected(at: impl Into<String>) -> Self {
        Self::CycleDetected { at: at.into() }
    }

    /// Create an aliased component error.
    pub fn aliased_component(at: impl Into<String>) -> Self {
        Self::AliasedComponent { at: at.into() }
    }

    /// Create a duplicate identity error.
    pub fn duplicate_identity(identity: impl Into<String>) -> Self {
        Self::DuplicateIdentity {
            identity: identity.into(),
        }
    }

    /// Create an empty label error.
    pub fn empty_label(type_name: impl Into<String>) -> Self {
        Self::EmptyLabel {
            type_name: type_name.into(),
        }
    }

    /// Create a hook failure error.
    pub fn hook(
        identity: impl Into<String>,
        action: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Hook {
            identity: identity.into(),
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// Create a store failure error.
    pub fn store_failed(reason: impl Into<String>) -> Self {
        Self::StoreFailed {
            reason: reason.into(),
        }
    }
}
