use std::collections::{BTreeMap, HashSet};

use anyhow::anyhow;
use serde::Serialize;

use crate::edges;
use crate::error::{LibError, Result};
use crate::models::{Edge, Node, NodeId};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateInvariantViolation {
    EmptyName {
        node_id: NodeId,
    },
    DuplicateName {
        name: String,
        node_ids: Vec<NodeId>,
    },
    VariablesOnDatabase {
        node_id: NodeId,
    },
    VolumesOnDatabase {
        node_id: NodeId,
    },
    UnknownNodeReference {
        edge_id: String,
        missing_node_id: NodeId,
    },
    SelfLoop {
        node_id: NodeId,
    },
    MissingEdge {
        source: NodeId,
        target: NodeId,
    },
    StaleEdge {
        source: NodeId,
        target: NodeId,
    },
}

impl TemplateInvariantViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            TemplateInvariantViolation::EmptyName { .. } => "template_empty_name",
            TemplateInvariantViolation::DuplicateName { .. } => "template_duplicate_name",
            TemplateInvariantViolation::VariablesOnDatabase { .. } => {
                "template_database_variables"
            }
            TemplateInvariantViolation::VolumesOnDatabase { .. } => "template_database_volumes",
            TemplateInvariantViolation::UnknownNodeReference { .. } => {
                "template_unknown_node_reference"
            }
            TemplateInvariantViolation::SelfLoop { .. } => "template_self_loop",
            TemplateInvariantViolation::MissingEdge { .. } => "template_missing_edge",
            TemplateInvariantViolation::StaleEdge { .. } => "template_stale_edge",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            TemplateInvariantViolation::EmptyName { .. } => "Every service needs a name",
            TemplateInvariantViolation::DuplicateName { .. } => "Service names must be unique",
            TemplateInvariantViolation::VariablesOnDatabase { .. } => {
                "Database services do not accept environment variables"
            }
            TemplateInvariantViolation::VolumesOnDatabase { .. } => {
                "Volumes cannot be attached to database services"
            }
            TemplateInvariantViolation::UnknownNodeReference { .. } => {
                "Edge references a service that does not exist"
            }
            TemplateInvariantViolation::SelfLoop { .. } => "A service cannot reference itself",
            TemplateInvariantViolation::MissingEdge { .. } => {
                "A variable reference has no matching edge"
            }
            TemplateInvariantViolation::StaleEdge { .. } => {
                "An edge has no matching variable reference"
            }
        }
    }
}

/// Checks name uniqueness, database exclusivity and that `edges` is exactly the set
/// derived from the node variables.
pub fn template_invariant_violations(
    nodes: &[Node],
    edges: &[Edge],
) -> Vec<TemplateInvariantViolation> {
    let mut violations = Vec::new();

    let mut by_name: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for node in nodes {
        if node.name.trim().is_empty() {
            violations.push(TemplateInvariantViolation::EmptyName { node_id: node.id });
        } else {
            by_name.entry(node.name.as_str()).or_default().push(node.id);
        }

        if node.is_database() {
            if !node.variables.is_empty() {
                violations.push(TemplateInvariantViolation::VariablesOnDatabase {
                    node_id: node.id,
                });
            }
            if !node.volumes.is_empty() {
                violations.push(TemplateInvariantViolation::VolumesOnDatabase {
                    node_id: node.id,
                });
            }
        }
    }
    for (name, node_ids) in by_name {
        if node_ids.len() > 1 {
            violations.push(TemplateInvariantViolation::DuplicateName {
                name: name.to_string(),
                node_ids,
            });
        }
    }

    let node_ids: HashSet<NodeId> = nodes.iter().map(|node| node.id).collect();
    let mut actual = HashSet::with_capacity(edges.len());
    for edge in edges {
        if !node_ids.contains(&edge.source) {
            violations.push(TemplateInvariantViolation::UnknownNodeReference {
                edge_id: edge.id.clone(),
                missing_node_id: edge.source,
            });
            continue;
        }
        if !node_ids.contains(&edge.target) {
            violations.push(TemplateInvariantViolation::UnknownNodeReference {
                edge_id: edge.id.clone(),
                missing_node_id: edge.target,
            });
            continue;
        }
        if edge.source == edge.target {
            violations.push(TemplateInvariantViolation::SelfLoop {
                node_id: edge.source,
            });
            continue;
        }
        actual.insert((edge.source, edge.target));
    }

    let expected = edges::synthesize(nodes);
    let expected_pairs: HashSet<(NodeId, NodeId)> = expected
        .iter()
        .map(|edge| (edge.source, edge.target))
        .collect();
    for edge in &expected {
        if !actual.contains(&(edge.source, edge.target)) {
            violations.push(TemplateInvariantViolation::MissingEdge {
                source: edge.source,
                target: edge.target,
            });
        }
    }
    for edge in edges {
        let pair = (edge.source, edge.target);
        if actual.contains(&pair) && !expected_pairs.contains(&pair) {
            violations.push(TemplateInvariantViolation::StaleEdge {
                source: edge.source,
                target: edge.target,
            });
        }
    }

    violations
}

pub fn ensure_template_invariants(nodes: &[Node], edges: &[Edge]) -> Result<()> {
    let violations = template_invariant_violations(nodes, edges);
    if let Some(first) = violations.first() {
        return Err(LibError::invalid_with_code(
            first.error_code(),
            first.public_message(),
            anyhow!("template invariant validation failed: {:?}", violations),
        ));
    }

    Ok(())
}
