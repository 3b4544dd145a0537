//! Destroyer: unconditional teardown of a live graph.
//!
//! Destroy never consults digests or store records; every node becomes a
//! DELETE. Ordering is a policy choice: by default the parent is torn
//! down before its children, since a parent's delete hook may depend on
//! the children still existing. The alternative child-first order is
//! available for domains where children must go first.

use std::sync::Arc;

use tracing::debug;

use crate::component::Component;
use crate::digest::DigestMemo;
use crate::error::Result;
use crate::graph::Graph;
use crate::plan::{Action, ActionKind, Plan};

/// Teardown ordering between a parent and its subcomponents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DestroyPolicy {
    /// Delete the parent before its children (default).
    #[default]
    ParentFirst,
    /// Delete children before their parent.
    ChildFirst,
}

/// Build an unconditional DELETE plan over the graph rooted at `root`.
pub fn build_destroy_plan(root: Arc<dyn Component>, policy: DestroyPolicy) -> Result<Plan> {
    let graph = Graph::build(root)?;
    let memo = DigestMemo::compute(&graph);

    let mut order: Vec<_> = graph.post_order().collect();
    if policy == DestroyPolicy::ParentFirst {
        // Post-order reversed puts every parent before its children.
        order.reverse();
    }

    let mut actions = Vec::with_capacity(order.len());
    for id in order {
        let Some(node) = graph.node(id) else { continue };
        let Some(identity) = memo.identity(node, id) else {
            continue;
        };
        debug!(identity = %identity, "planned teardown");
        actions.push(Action {
            kind: ActionKind::Delete,
            identity,
            node: Some(Arc::clone(&node.component)),
            deps: node.children.len(),
            child_keys: Vec::new(),
            full_digest: None,
        });
    }
    Ok(Plan { actions })
}
