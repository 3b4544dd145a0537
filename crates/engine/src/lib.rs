//! Declarative state reconciliation engine.
//!
//! Callers describe desired state as a graph of typed, composable
//! components; the engine decides which nodes are new, changed
//! (non-breaking), changed incompatibly (breaking), or unchanged, and
//! drives each through a create/read/update/delete lifecycle. No
//! user-written diff logic: change detection is purely structural.
//!
//! # Key Concepts
//!
//! ## Dual digests
//!
//! Every node gets two content-addressed SHA-256 digests, each folding
//! in its children's digests:
//!
//! - the **full digest** covers all declared fields and detects
//!   in-place (UPDATE) changes,
//! - the **breaking digest** covers only identity-affecting fields and,
//!   together with type name and label, forms the node's [`Identity`].
//!   A breaking change produces a *new* identity, so the node is
//!   recreated (DELETE of the old identity + CREATE of the new one).
//!
//! ## Plan / apply
//!
//! [`Engine::apply`] walks the graph bottom-up, diffs each node against
//! the [`StateStore`], and produces an ordered [`Plan`] (children before
//! parents; orphan deletions first). The executor runs the plan strictly
//! in order, committing a store mutation only after the corresponding
//! hook succeeded, and halts on the first failure leaving everything
//! already committed in place.
//!
//! ## Destroy
//!
//! [`Engine::destroy`] tears a graph down unconditionally, parent before
//! children by default (configurable via [`DestroyPolicy`]).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_engine::{Engine, InMemoryStateStore};
//!
//! #[tokio::main]
//! async fn main() -> strata_engine::Result<()> {
//!     let store = Arc::new(InMemoryStateStore::new());
//!     let engine = Engine::new(store);
//!
//!     let report = engine.apply(my_pipeline()).await?;
//!     assert!(report.succeeded());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod component;
pub mod destroyer;
pub mod digest;
pub mod engine;
pub mod error;
pub mod executor;
pub mod graph;
pub mod plan;
pub mod planner;
pub mod store;
pub mod types;

#[cfg(test)]
mod testutil;

// Re-export main types
pub use component::{auto_label, Component, HookError, HookResult};
pub use destroyer::DestroyPolicy;
pub use digest::{DigestMemo, NodeDigests};
pub use engine::{Engine, EngineConfig};
pub use error::{Error, Result};
pub use executor::Executor;
pub use graph::{Graph, GraphNode, NodeId};
pub use plan::{Action, ActionFailure, ActionKind, Plan, Report, ReportEvent};
pub use store::{InMemoryStateStore, JsonFileStateStore, StateStore};
pub use types::{Digest, Field, FieldValue, Identity, Scalar, StateRecord};
