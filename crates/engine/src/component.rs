//! The component contract implemented by collaborator code.
//!
//! A component exposes its declared fields as an ordered descriptor list
//! (declaration order, with identity-affecting fields flagged) and four
//! lifecycle hooks. The engine decides *which* hooks run and in what
//! order; the hooks own all domain side effects.

use async_trait::async_trait;
use sha2::{Digest as _, Sha256};
use thiserror::Error;

use crate::types::Field;

/// Error returned by a lifecycle hook.
///
/// Deliberately a plain message carrier so collaborator crates do not
/// depend on engine internals.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Create a hook error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for HookError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Result type for lifecycle hooks.
pub type HookResult = std::result::Result<(), HookError>;

/// One declared, possibly-composite unit of managed state.
///
/// Hooks default to no-ops, matching types that only exist to group
/// subcomponents.
#[async_trait]
pub trait Component: Send + Sync + std::fmt::Debug {
    /// Name of the implementing type.
    fn type_name(&self) -> &str;

    /// Caller-supplied instance name.
    fn label(&self) -> &str;

    /// Declared fields in declaration order, subcomponent edges included.
    fn fields(&self) -> Vec<Field>;

    /// Provision the resource. Runs on first apply and after a breaking
    /// change recreated the identity.
    async fn create(&self) -> HookResult {
        Ok(())
    }

    /// Observe current external state. Runs for every live node before
    /// its decided action.
    async fn read(&self) -> HookResult {
        Ok(())
    }

    /// Reconcile a non-breaking change in place.
    async fn update(&self) -> HookResult {
        Ok(())
    }

    /// Tear the resource down.
    async fn delete(&self) -> HookResult {
        Ok(())
    }
}

/// Derive a deterministic default label for a component that was not
/// given one explicitly. The same `(type_name, seed)` pair always yields
/// the same label.
pub fn auto_label(type_name: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(type_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(seed.as_bytes());
    let bytes: [u8; 32] = hasher.finalize().into();
    let token: String = bytes.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{type_name}-{token}")
}
