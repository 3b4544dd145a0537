//! Graph model: arena-backed DAG of component nodes.
//!
//! A [`Graph`] is built by a single depth-first walk from a root
//! component. Children are enumerated in declared field order, with
//! subcomponent sequences flattened in sequence order. The walk fails
//! fast on cycles and on aliased instances (the same component instance
//! under more than one parent).
//!
//! Nodes are appended to the arena only after all of their children, so
//! arena index order *is* a deterministic post-order traversal.

use std::collections::HashSet;
use std::sync::Arc;

use crate::component::Component;
use crate::error::{Error, Result};
use crate::types::{FieldValue, Identity};

/// Opaque handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the component graph.
#[derive(Debug)]
pub struct GraphNode {
    /// The component instance.
    pub component: Arc<dyn Component>,
    /// Direct subcomponent edges in declared field order.
    pub children: Vec<NodeId>,
}

impl GraphNode {
    /// `type_name/label` rendering used in structural errors.
    pub fn path(&self) -> String {
        format!("{}/{}", self.component.type_name(), self.component.label())
    }
}

/// Arena-backed component graph with deterministic post-order.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    root: NodeId,
}

impl Graph {
    /// Build the graph from a root component, rejecting cycles, aliased
    /// subcomponents, and empty labels.
    pub fn build(root: Arc<dyn Component>) -> Result<Self> {
        let mut builder = Builder::default();
        let root_id = builder.visit(root)?;
        Ok(Self {
            nodes: builder.nodes,
            root: root_id,
        })
    }

    /// The root node handle.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes reachable from the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by handle.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    /// Deterministic post-order traversal (children before parents).
    pub fn post_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Direct subcomponent count of a node, for reporting.
    pub fn deps(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |n| n.children.len())
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<GraphNode>,
    /// Pointer addresses of ancestors on the current DFS path.
    visiting: HashSet<usize>,
    /// Pointer addresses of every instance reached so far.
    seen: HashSet<usize>,
}

impl Builder {
    fn visit(&mut self, component: Arc<dyn Component>) -> Result<NodeId> {
        if component.label().is_empty() {
            return Err(Error::empty_label(component.type_name()));
        }

        let addr = Arc::as_ptr(&component).cast::<()>() as usize;
        let at = format!("{}/{}", component.type_name(), component.label());
        if self.visiting.contains(&addr) {
            return Err(Error::cycle_detected(at));
        }
        if !self.seen.insert(addr) {
            return Err(Error::aliased_component(at));
        }
        self.visiting.insert(addr);

        let mut children = Vec::new();
        for field in component.fields() {
            match field.value {
                FieldValue::Component(child) => {
                    children.push(self.visit(child)?);
                }
                FieldValue::ComponentList(list) => {
                    for child in list {
                        children.push(self.visit(child)?);
                    }
                }
                FieldValue::Scalar(_) | FieldValue::Metadata(_) => {}
            }
        }

        self.visiting.remove(&addr);
        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            component,
            children,
        });
        Ok(id)
    }
}

/// Reject ambiguous resources: two distinct nodes resolving to the same
/// identity within one apply pass.
pub(crate) fn verify_unique_identities(identities: &[Identity]) -> Result<()> {
    let mut seen = HashSet::with_capacity(identities.len());
    for identity in identities {
        if !seen.insert(identity.key()) {
            return Err(Error::duplicate_identity(identity.to_string()));
        }
    }
    Ok(())
}
