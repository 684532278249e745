use std::collections::HashSet;

use crate::models::{Edge, Node, NodeId};
use crate::resolver::{NameIndex, resolve_with};

/// Recomputes the complete reference edge set from node variables.
///
/// One `Ref` edge per distinct `(source, target)` pair, ordered by source node position and
/// then by first appearance of the target in the source's variables.
pub fn synthesize(nodes: &[Node]) -> Vec<Edge> {
    let index = NameIndex::new(nodes);
    let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut edges = Vec::new();

    for node in nodes {
        for variable in &node.variables {
            for reference in resolve_with(&variable.value, &index, &node.name) {
                let Some(target) = index.get(&reference.target) else {
                    continue;
                };
                // Two nodes sharing a name collapse onto one index entry.
                if target == node.id {
                    continue;
                }
                if seen.insert((node.id, target)) {
                    edges.push(Edge::reference(node.id, target));
                }
            }
        }
    }

    tracing::debug!(nodes = nodes.len(), edges = edges.len(), "synthesized reference edges");
    edges
}
