//! Hashing engine: dual merkle digests per node.
//!
//! Each node gets two SHA-256 digests, computed in one post-order pass
//! and memoized per apply:
//!
//! - **full digest** — type name, label, every non-metadata field
//!   (name + value) in declaration order, where a subcomponent field
//!   contributes the child's full digest. Drives UPDATE detection.
//! - **breaking digest** — type name, label, breaking fields only, plus
//!   the breaking digest of *every* subcomponent in declared order.
//!   Drives identity, hence CREATE/DELETE detection.
//!
//! Field names are part of the hash input, so changing a type's declared
//! breaking set changes the breaking digest of all its instances.
//! Metadata fields are excluded from both digests; folding bookkeeping
//! values (timestamps etc.) in would break idempotence.

use sha2::{Digest as _, Sha256};

use crate::graph::{Graph, GraphNode, NodeId};
use crate::types::{Digest, FieldValue, Identity};

/// The two digests of one node.
#[derive(Debug, Clone, Copy)]
pub struct NodeDigests {
    pub full: Digest,
    pub breaking: Digest,
}

/// Per-apply memo table of node digests, indexed by arena handle.
/// Discarded once the plan is built.
pub struct DigestMemo {
    entries: Vec<NodeDigests>,
}

impl DigestMemo {
    /// Compute digests for every node in one post-order pass. Parents
    /// reuse the already-computed entries of their children.
    pub fn compute(graph: &Graph) -> Self {
        let mut entries: Vec<NodeDigests> = Vec::with_capacity(graph.len());
        // Arena order is post-order, so entry index == node index and
        // children are always present before their parent is folded.
        for id in graph.post_order() {
            if let Some(node) = graph.node(id) {
                let digests = node_digests(node, &entries);
                entries.push(digests);
            }
        }
        Self { entries }
    }

    /// Digests of a node.
    pub fn digests(&self, id: NodeId) -> Option<&NodeDigests> {
        self.entries.get(id.index())
    }

    /// Identity of a node: `(type_name, label, breaking_digest)`.
    pub fn identity(&self, node: &GraphNode, id: NodeId) -> Option<Identity> {
        self.digests(id).map(|d| {
            Identity::new(
                node.component.type_name(),
                node.component.label(),
                d.breaking,
            )
        })
    }
}

fn fold_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_be_bytes());
    hasher.update(s.as_bytes());
}

fn node_digests(node: &GraphNode, computed: &[NodeDigests]) -> NodeDigests {
    let mut full = Sha256::new();
    let mut breaking = Sha256::new();

    fold_str(&mut full, node.component.type_name());
    fold_str(&mut full, node.component.label());
    fold_str(&mut breaking, node.component.type_name());
    fold_str(&mut breaking, node.component.label());

    // Child handles were collected in the same declared-field order the
    // fields are walked in here, so one cursor keeps them aligned.
    let mut child_ids = node.children.iter();
    let mut fold_child = |full: &mut Sha256, breaking: &mut Sha256, name: &str| {
        if let Some(child) = child_ids.next().and_then(|id| computed.get(id.index())) {
            fold_str(full, name);
            full.update(child.full.as_bytes());
            // Every child folds into the breaking digest: identity must
            // change whenever any descendant's breaking digest changes.
            fold_str(breaking, name);
            breaking.update(child.breaking.as_bytes());
        }
    };

    for field in node.component.fields() {
        match &field.value {
            FieldValue::Scalar(scalar) => {
                fold_str(&mut full, &field.name);
                scalar.fold_into(&mut full);
                if field.breaking {
                    fold_str(&mut breaking, &field.name);
                    scalar.fold_into(&mut breaking);
                }
            }
            FieldValue::Metadata(_) => {}
            FieldValue::Component(_) => {
                fold_child(&mut full, &mut breaking, &field.name);
            }
            FieldValue::ComponentList(list) => {
                for _ in list {
                    fold_child(&mut full, &mut breaking, &field.name);
                }
            }
        }
    }

    NodeDigests {
        full: Digest::from_bytes(full.finalize().into()),
        breaking: Digest::from_bytes(breaking.finalize().into()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testutil::StubComponent;

    fn root_digests(root: crate::testutil::StubComponent) -> NodeDigests {
        let graph = Graph::build(root.arc()).unwrap();
        let memo = DigestMemo::compute(&graph);
        *memo.digests(graph.root()).unwrap()
    }

    fn sample() -> StubComponent {
        StubComponent::new("task", "main")
            .breaking_scalar("source", "s3://bucket")
            .scalar("batch_size", 100)
    }

    #[test]
    fn test_digests_deterministic() {
        let a = root_digests(sample());
        let b = root_digests(sample());
        assert_eq!(a.full, b.full);
        assert_eq!(a.breaking, b.breaking);
    }

    #[test]
    fn test_non_breaking_change_keeps_identity() {
        let a = root_digests(sample());
        let b = root_digests(
            StubComponent::new("task", "main")
                .breaking_scalar("source", "s3://bucket")
                .scalar("batch_size", 200),
        );
        assert_ne!(a.full, b.full);
        assert_eq!(a.breaking, b.breaking);
    }

    #[test]
    fn test_breaking_change_changes_both() {
        let a = root_digests(sample());
        let b = root_digests(
            StubComponent::new("task", "main")
                .breaking_scalar("source", "s3://other")
                .scalar("batch_size", 100),
        );
        assert_ne!(a.full, b.full);
        assert_ne!(a.breaking, b.breaking);
    }

    #[test]
    fn test_reflagging_field_as_breaking_is_breaking() {
        // Same values; only the declared breaking set differs.
        let a = root_digests(sample());
        let b = root_digests(
            StubComponent::new("task", "main")
                .breaking_scalar("source", "s3://bucket")
                .breaking_scalar("batch_size", 100),
        );
        assert_ne!(a.breaking, b.breaking);
    }

    #[test]
    fn test_metadata_excluded_from_digests() {
        let a = root_digests(sample());
        let b = root_digests(sample().metadata("applied_at", serde_json::json!("2026-01-01")));
        assert_eq!(a.full, b.full);
        assert_eq!(a.breaking, b.breaking);
    }

    #[test]
    fn test_child_non_breaking_change_propagates_to_parent_full_only() {
        let parent = |batch: i64| {
            StubComponent::new("task", "parent").child(
                "sub",
                StubComponent::new("task", "child")
                    .breaking_scalar("source", "x")
                    .scalar("batch_size", batch)
                    .arc(),
            )
        };
        let a = root_digests(parent(1));
        let b = root_digests(parent(2));
        assert_ne!(a.full, b.full);
        assert_eq!(a.breaking, b.breaking);
    }

    #[test]
    fn test_child_breaking_change_propagates_to_parent_identity() {
        // The child edge is not itself a breaking field; the child's
        // breaking digest still folds into the parent's.
        let parent = |source: &str| {
            StubComponent::new("task", "parent").child(
                "sub",
                StubComponent::new("task", "child")
                    .breaking_scalar("source", source)
                    .arc(),
            )
        };
        let a = root_digests(parent("x"));
        let b = root_digests(parent("y"));
        assert_ne!(a.breaking, b.breaking);
    }

    #[test]
    fn test_label_part_of_identity_input() {
        let a = root_digests(StubComponent::new("task", "one").breaking_scalar("s", "v"));
        let b = root_digests(StubComponent::new("task", "two").breaking_scalar("s", "v"));
        assert_ne!(a.breaking, b.breaking);
        assert_ne!(a.full, b.full);
    }
}
