use crate::models::{Edge, NodeId};

/// Nodes that `node_id` references.
pub fn dependencies_of(edges: &[Edge], node_id: NodeId) -> Vec<NodeId> {
    edges
        .iter()
        .filter(|edge| edge.source == node_id)
        .map(|edge| edge.target)
        .collect()
}

/// Nodes whose variables reference `node_id`.
pub fn dependents_of(edges: &[Edge], node_id: NodeId) -> Vec<NodeId> {
    edges
        .iter()
        .filter(|edge| edge.target == node_id)
        .map(|edge| edge.source)
        .collect()
}
