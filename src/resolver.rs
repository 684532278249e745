use std::collections::HashMap;

use crate::interpolation::{ReferenceToken, reference_directives};
use crate::models::{Node, NodeId};

/// A resolved cross-service reference from one variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub target: String,
    /// Distinct tokens used against `target`, in order of first appearance.
    pub tokens: Vec<ReferenceToken>,
}

/// A well-formed reference whose target name matches no node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub source: NodeId,
    pub key: String,
    pub target: String,
}

/// Name -> id lookup. References resolve by exact, case-sensitive name.
pub(crate) struct NameIndex<'a> {
    ids: HashMap<&'a str, NodeId>,
}

impl<'a> NameIndex<'a> {
    pub(crate) fn new(nodes: &'a [Node]) -> Self {
        Self {
            ids: nodes
                .iter()
                .map(|node| (node.name.as_str(), node.id))
                .collect(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }
}

pub fn resolve(value: &str, nodes: &[Node], self_name: &str) -> Vec<Reference> {
    resolve_with(value, &NameIndex::new(nodes), self_name)
}

pub(crate) fn resolve_with(value: &str, index: &NameIndex<'_>, self_name: &str) -> Vec<Reference> {
    let mut references: Vec<Reference> = Vec::new();
    for (service, token) in reference_directives(value) {
        if service == self_name || index.get(&service).is_none() {
            continue;
        }

        match references
            .iter_mut()
            .find(|reference| reference.target == service)
        {
            Some(existing) => {
                if !existing.tokens.contains(&token) {
                    existing.tokens.push(token);
                }
            }
            None => references.push(Reference {
                target: service,
                tokens: vec![token],
            }),
        }
    }
    references
}

/// References that name no existing node, e.g. after a rename or delete. Self references
/// are not reported. Never an error: callers may surface these as warnings.
pub fn dangling_references(nodes: &[Node]) -> Vec<DanglingReference> {
    let index = NameIndex::new(nodes);
    let mut dangling = Vec::new();
    for node in nodes {
        for variable in &node.variables {
            for (service, _) in reference_directives(&variable.value) {
                if service == node.name || index.get(&service).is_some() {
                    continue;
                }
                let already_reported = dangling.iter().any(|entry: &DanglingReference| {
                    entry.source == node.id && entry.key == variable.key && entry.target == service
                });
                if !already_reported {
                    dangling.push(DanglingReference {
                        source: node.id,
                        key: variable.key.clone(),
                        target: service,
                    });
                }
            }
        }
    }
    dangling
}
