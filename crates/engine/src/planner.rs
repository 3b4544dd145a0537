//! Planner: diff the desired graph against the persisted state.
//!
//! One post-order pass classifies every live node:
//!
//! - no record for the identity → CREATE (covers genuinely new nodes
//!   *and* breaking changes, which produce a new identity),
//! - record found with an equal full digest → NOOP,
//! - record found with a different full digest → UPDATE (identity, hence
//!   breaking digest, unchanged).
//!
//! Identities present in the store but not visited by the traversal are
//! orphans (removed nodes, or the old identity of a breaking change) and
//! become DELETE actions. All orphan deletions are sequenced before the
//! live actions, ordered children-before-parent among themselves using
//! the child identity keys recorded at the previous apply.
//!
//! Orphan detection is scoped to the type names present in the applied
//! graph, so unrelated pipelines sharing one store are never touched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::component::Component;
use crate::digest::DigestMemo;
use crate::error::Result;
use crate::graph::{self, Graph};
use crate::plan::{Action, ActionKind, Plan};
use crate::store::StateStore;
use crate::types::{Identity, StateRecord};

/// Build an ordered plan for applying `root` against `store`.
pub async fn build_plan(root: Arc<dyn Component>, store: &dyn StateStore) -> Result<Plan> {
    let graph = Graph::build(root)?;
    let memo = DigestMemo::compute(&graph);

    // Identities in arena (post-) order.
    let identities: Vec<Identity> = graph
        .post_order()
        .filter_map(|id| graph.node(id).and_then(|node| memo.identity(node, id)))
        .collect();
    graph::verify_unique_identities(&identities)?;

    // Classify live nodes, children before parents.
    let mut live: Vec<Action> = Vec::with_capacity(graph.len());
    let mut visited: HashSet<String> = HashSet::with_capacity(graph.len());
    let mut hooks_by_name: HashMap<(String, String), Arc<dyn Component>> = HashMap::new();
    for id in graph.post_order() {
        let Some(node) = graph.node(id) else { continue };
        let Some(identity) = identities.get(id.index()).cloned() else {
            continue;
        };
        let Some(digests) = memo.digests(id) else {
            continue;
        };

        let kind = match store.get(&identity).await? {
            None => ActionKind::Create,
            Some(record) if record.full_digest == digests.full => ActionKind::Noop,
            Some(_) => ActionKind::Update,
        };
        debug!(identity = %identity, kind = %kind, "classified node");

        let child_keys: Vec<String> = node
            .children
            .iter()
            .filter_map(|c| identities.get(c.index()).map(Identity::key))
            .collect();

        visited.insert(identity.key());
        hooks_by_name.insert(
            (identity.type_name.clone(), identity.label.clone()),
            Arc::clone(&node.component),
        );
        live.push(Action {
            kind,
            identity,
            node: Some(Arc::clone(&node.component)),
            deps: node.children.len(),
            child_keys,
            full_digest: Some(digests.full),
        });
    }

    // Orphans: stored identities of the touched type names that this
    // traversal did not visit.
    let type_names: Vec<&str> = live
        .iter()
        .map(|a| a.identity.type_name.as_str())
        .unique()
        .sorted()
        .collect();
    let mut orphans: HashMap<String, StateRecord> = HashMap::new();
    for type_name in type_names {
        for identity in store.list(Some(type_name)).await? {
            let key = identity.key();
            if visited.contains(&key) || orphans.contains_key(&key) {
                continue;
            }
            if let Some(record) = store.get(&identity).await? {
                orphans.insert(key, record);
            }
        }
    }

    let mut actions: Vec<Action> = Vec::with_capacity(orphans.len() + live.len());
    for record in order_orphans(&orphans) {
        // A breaking-change orphan shares type and label with a live
        // node and borrows its hooks; a fully removed orphan has none
        // left, so only its state record can be cleaned up.
        let node = hooks_by_name
            .get(&(
                record.identity.type_name.clone(),
                record.identity.label.clone(),
            ))
            .map(Arc::clone);
        if node.is_none() {
            warn!(
                identity = %record.identity,
                "orphan has no live hooks; its state record will be removed without a delete hook"
            );
        }
        actions.push(Action {
            kind: ActionKind::Delete,
            identity: record.identity.clone(),
            node,
            deps: record.deps.len(),
            child_keys: record.deps,
            full_digest: None,
        });
    }
    actions.extend(live);

    let plan = Plan { actions };
    info!(
        actions = plan.len(),
        changes = plan.has_changes(),
        "plan built"
    );
    Ok(plan)
}

/// Order orphan records children-before-parent (a parent's record lists
/// its child identity keys), deterministically by identity key.
fn order_orphans(orphans: &HashMap<String, StateRecord>) -> Vec<StateRecord> {
    let mut ordered = Vec::with_capacity(orphans.len());
    let mut emitted: HashSet<String> = HashSet::with_capacity(orphans.len());
    for key in orphans.keys().sorted() {
        emit_orphan(key, orphans, &mut emitted, &mut ordered);
    }
    ordered
}

fn emit_orphan(
    key: &str,
    orphans: &HashMap<String, StateRecord>,
    emitted: &mut HashSet<String>,
    ordered: &mut Vec<StateRecord>,
) {
    if !emitted.insert(key.to_string()) {
        return;
    }
    if let Some(record) = orphans.get(key) {
        for dep in record.deps.iter().sorted() {
            emit_orphan(dep, orphans, emitted, ordered);
        }
        ordered.push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::store::InMemoryStateStore;
    use crate::testutil::StubComponent;
    use crate::types::Digest;
    use sha2::{Digest as _, Sha256};

    fn digest_of(data: &str) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        Digest::from_bytes(hasher.finalize().into())
    }

    fn stored(label: &str, deps: Vec<String>) -> StateRecord {
        StateRecord::new(
            Identity::new("task", label, digest_of(label)),
            digest_of(label),
            deps,
        )
    }

    #[tokio::test]
    async fn test_first_apply_plans_children_before_parents() {
        let store = InMemoryStateStore::new();
        let root = StubComponent::new("task", "root")
            .child("sub", StubComponent::new("task", "sub").arc())
            .arc();

        let plan = build_plan(root, &store).await.unwrap();
        let kinds: Vec<(ActionKind, String)> = plan
            .actions
            .iter()
            .map(|a| (a.kind, a.identity.label.clone()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ActionKind::Create, "sub".to_string()),
                (ActionKind::Create, "root".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected() {
        let store = InMemoryStateStore::new();
        let root = StubComponent::new("task", "root")
            .child("a", StubComponent::new("task", "same").arc())
            .child("b", StubComponent::new("task", "same").arc())
            .arc();

        let err = build_plan(root, &store).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::DuplicateIdentity { .. }));
    }

    #[tokio::test]
    async fn test_orphans_scoped_to_touched_type_names() {
        let store = InMemoryStateStore::new();
        // A record from an unrelated pipeline sharing the store.
        let other = StateRecord::new(
            Identity::new("other", "thing", digest_of("thing")),
            digest_of("thing"),
            Vec::new(),
        );
        store.put(&other.identity.clone(), other).await.unwrap();

        let plan = build_plan(StubComponent::new("task", "root").arc(), &store)
            .await
            .unwrap();
        assert!(plan
            .actions
            .iter()
            .all(|a| a.kind != ActionKind::Delete));
    }

    #[test]
    fn test_order_orphans_children_first() {
        let child = stored("child", Vec::new());
        let parent = stored("parent", vec![child.identity.key()]);
        let mut orphans = HashMap::new();
        orphans.insert(parent.identity.key(), parent.clone());
        orphans.insert(child.identity.key(), child.clone());

        let ordered = order_orphans(&orphans);
        let labels: Vec<&str> = ordered.iter().map(|r| r.identity.label.as_str()).collect();
        assert_eq!(labels, vec!["child", "parent"]);
    }

    #[test]
    fn test_order_orphans_deterministic() {
        let mut orphans = HashMap::new();
        for label in ["b", "a", "c"] {
            let record = stored(label, Vec::new());
            orphans.insert(record.identity.key(), record);
        }
        let first: Vec<String> = order_orphans(&orphans)
            .into_iter()
            .map(|r| r.identity.label)
            .collect();
        let second: Vec<String> = order_orphans(&orphans)
            .into_iter()
            .map(|r| r.identity.label)
            .collect();
        assert_eq!(first, second);
    }
}
