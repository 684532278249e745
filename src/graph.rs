//! The editable template graph.
//!
//! Nodes are kept in deployment order. Edges are never edited directly: they are
//! recomputed from node variables after every change that can affect them.
//!
//! References resolve by node name. Renaming or deleting a node does not rewrite the
//! variable text of other nodes, so references to the old name silently stop resolving.

use anyhow::anyhow;

use crate::algorithms;
use crate::convert::{self, HydratedGraph};
use crate::edges;
use crate::error::{LibError, Result};
use crate::interpolation::{self, Directive};
use crate::layout::LayoutConfig;
use crate::models::{
    Edge, NewNode, Node, NodeId, Service, ServiceDetails, ServiceType, SettingsTab, Variable,
    Volume, normalize_name, normalize_variables,
};
use crate::ordering;
use crate::resolver::{self, DanglingReference};

#[derive(Debug, Clone, Default)]
pub struct TemplateGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    layout: LayoutConfig,
}

impl TemplateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: LayoutConfig) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn from_services(services: Vec<Service>, layout: LayoutConfig) -> Self {
        let HydratedGraph { nodes, edges } = convert::hydrate_with(services, &layout);
        Self {
            nodes,
            edges,
            layout,
        }
    }

    /// Adopts existing nodes (e.g. from a draft). Edges are always recomputed.
    pub fn from_nodes(nodes: Vec<Node>, layout: LayoutConfig) -> Self {
        let edges = edges::synthesize(&nodes);
        Self {
            nodes,
            edges,
            layout,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    fn index_of(&self, id: NodeId) -> Result<usize> {
        self.nodes
            .iter()
            .position(|node| node.id == id)
            .ok_or_else(|| {
                LibError::not_found("Service not found", anyhow!("node {} not found", id))
            })
    }

    /// Names are compared exactly (case-sensitive), matching reference resolution.
    fn ensure_unique_name(&self, name: &str, except: Option<NodeId>) -> Result<()> {
        let taken = self
            .nodes
            .iter()
            .any(|node| node.name == name && Some(node.id) != except);
        if taken {
            return Err(LibError::duplicate_name(
                "A service with this name already exists",
                anyhow!("service name {:?} is already taken", name),
            ));
        }
        Ok(())
    }

    fn recompute_edges(&mut self) {
        self.edges = edges::synthesize(&self.nodes);
    }

    pub fn add_node(&mut self, new_node: NewNode) -> Result<Node> {
        let new_node = new_node.normalize()?;
        self.ensure_unique_name(&new_node.name, None)?;

        let node = Node {
            id: NodeId::mint(),
            name: new_node.name,
            details: new_node.details,
            variables: new_node.variables,
            volumes: new_node.volumes,
            position: self.layout.position_for(self.nodes.len()),
        };
        tracing::debug!(
            node_id = %node.id,
            name = %node.name,
            kind = %node.service_type(),
            "added service"
        );
        self.nodes.push(node.clone());
        self.recompute_edges();
        Ok(node)
    }

    pub fn rename_node(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        let index = self.index_of(id)?;
        let new_name = normalize_name(new_name)?;
        if self.nodes[index].name == new_name {
            return Ok(());
        }
        self.ensure_unique_name(&new_name, Some(id))?;

        let old_name = std::mem::replace(&mut self.nodes[index].name, new_name);
        tracing::debug!(
            node_id = %id,
            old_name = %old_name,
            new_name = %self.nodes[index].name,
            "renamed service"
        );
        self.recompute_edges();
        Ok(())
    }

    /// Replaces the variable list and recomputes every edge in the graph.
    pub fn update_variables(&mut self, id: NodeId, variables: Vec<Variable>) -> Result<()> {
        let index = self.index_of(id)?;
        let variables = normalize_variables(variables)?;
        if self.nodes[index].is_database() && !variables.is_empty() {
            return Err(LibError::invalid_operation(
                "Database services do not accept environment variables",
                anyhow!("node {} is a database", id),
            ));
        }

        self.nodes[index].variables = variables;
        self.recompute_edges();
        Ok(())
    }

    pub fn update_details(&mut self, id: NodeId, details: ServiceDetails) -> Result<()> {
        let index = self.index_of(id)?;
        let node = &self.nodes[index];
        if details.service_type() == ServiceType::Database
            && (!node.variables.is_empty() || !node.volumes.is_empty())
        {
            return Err(LibError::invalid_operation(
                "Remove variables and volumes before turning a service into a database",
                anyhow!("node {} still has variables or volumes", id),
            ));
        }

        self.nodes[index].details = details;
        Ok(())
    }

    /// Removes the node and every edge touching it. Other nodes are left untouched, even
    /// when their variables mention the deleted name.
    pub fn delete_node(&mut self, id: NodeId) -> Result<Node> {
        let index = self.index_of(id)?;
        let removed = self.nodes.remove(index);
        self.edges.retain(|edge| !edge.touches(id));
        tracing::debug!(node_id = %id, name = %removed.name, "deleted service");
        Ok(removed)
    }

    pub fn attach_volume(&mut self, id: NodeId, volume: Volume) -> Result<()> {
        let index = self.index_of(id)?;
        let node = &self.nodes[index];
        if node.is_database() {
            return Err(LibError::invalid_operation(
                "Volumes cannot be attached to database services",
                anyhow!("node {} is a database", id),
            ));
        }
        if volume.mount_path.trim().is_empty() {
            return Err(LibError::invalid(
                "Volume mount path is required",
                anyhow!("volume {:?} has an empty mount path", volume.name),
            ));
        }
        if node
            .volumes
            .iter()
            .any(|existing| existing.mount_path == volume.mount_path)
        {
            return Err(LibError::invalid(
                "A volume is already mounted at this path",
                anyhow!("mount path {:?} already used on node {}", volume.mount_path, id),
            ));
        }

        self.nodes[index].volumes.push(volume);
        Ok(())
    }

    pub fn detach_volume(&mut self, id: NodeId, name: &str) -> Result<Volume> {
        let index = self.index_of(id)?;
        let volumes = &mut self.nodes[index].volumes;
        let position = volumes
            .iter()
            .position(|volume| volume.name == name)
            .ok_or_else(|| {
                LibError::not_found(
                    "Volume not found",
                    anyhow!("volume {:?} not found on node {}", name, id),
                )
            })?;
        Ok(volumes.remove(position))
    }

    /// Applies an explicit deployment order; see [`ordering::reorder`].
    pub fn reorder(&mut self, new_order: &[usize]) -> Result<()> {
        self.nodes = ordering::reorder(self.nodes.clone(), new_order)?;
        Ok(())
    }

    pub fn move_node(&mut self, from: usize, to: usize) -> Result<()> {
        ordering::move_item(&mut self.nodes, from, to)
    }

    /// Node ids in deployment order.
    pub fn order(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    /// The persisted form, in the current deployment order.
    pub fn to_services(&self) -> Vec<Service> {
        self.nodes.iter().map(convert::to_service).collect()
    }

    pub fn flatten(&self, order: &[NodeId]) -> Result<Vec<Service>> {
        convert::flatten(&self.nodes, order)
    }

    /// Nodes that can take a volume. Empty when the graph only holds databases.
    pub fn volume_targets(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|node| !node.is_database()).collect()
    }

    pub fn settings_tabs(&self, id: NodeId) -> Result<&'static [SettingsTab]> {
        let index = self.index_of(id)?;
        Ok(self.nodes[index].service_type().settings_tabs())
    }

    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        algorithms::dependencies_of(&self.edges, id)
    }

    pub fn dependents_of(&self, id: NodeId) -> Vec<NodeId> {
        algorithms::dependents_of(&self.edges, id)
    }

    pub fn placeholder_options(&self, id: NodeId) -> Result<Vec<Directive>> {
        let index = self.index_of(id)?;
        Ok(interpolation::placeholder_options(
            &self.nodes,
            &self.nodes[index].name,
        ))
    }

    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        resolver::dangling_references(&self.nodes)
    }
}
