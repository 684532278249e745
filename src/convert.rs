//! Conversion between the editable node graph and the persisted, ordered service list.

use serde::Serialize;

use crate::edges;
use crate::error::Result;
use crate::layout::LayoutConfig;
use crate::models::{Edge, Node, NodeId, Service};
use crate::ordering;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HydratedGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub fn to_service(node: &Node) -> Service {
    Service {
        name: node.name.clone(),
        details: node.details.clone(),
        variables: node.variables.clone(),
        volumes: node.volumes.clone(),
    }
}

/// One service per node in `order` sequence. `order` must list every node id exactly once.
pub fn flatten(nodes: &[Node], order: &[NodeId]) -> Result<Vec<Service>> {
    let ids = nodes.iter().map(|node| node.id).collect::<Vec<_>>();
    let permutation = ordering::permutation_for(&ids, order)?;
    Ok(permutation
        .into_iter()
        .map(|index| to_service(&nodes[index]))
        .collect())
}

pub fn hydrate(services: Vec<Service>) -> HydratedGraph {
    hydrate_with(services, &LayoutConfig::default())
}

/// Builds nodes with fresh ids and grid positions, then derives edges once. Persisted ids
/// and edges are never trusted.
pub fn hydrate_with(services: Vec<Service>, layout: &LayoutConfig) -> HydratedGraph {
    let nodes = services
        .into_iter()
        .enumerate()
        .map(|(index, service)| Node {
            id: NodeId::mint(),
            name: service.name,
            details: service.details,
            variables: service.variables,
            volumes: service.volumes,
            position: layout.position_for(index),
        })
        .collect::<Vec<_>>();
    let edges = edges::synthesize(&nodes);
    HydratedGraph { nodes, edges }
}
