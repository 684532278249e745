use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::drafts::{DraftSlot, DraftSnapshot, DraftStore};
use crate::error::{ErrorKind, LibError, Result};
use crate::graph::TemplateGraph;
use crate::import;
use crate::models::{Edge, NewNode, Node, NodeId, ServiceDetails, TemplateId, Variable, Volume};
use crate::store::{DeploymentExecutor, TemplateStore};

/// Editor actions on a template session.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TemplateOperation {
    AddNode {
        node: NewNode,
    },
    RenameNode {
        node_id: NodeId,
        name: String,
    },
    UpdateVariables {
        node_id: NodeId,
        variables: Vec<Variable>,
    },
    UpdateDetails {
        node_id: NodeId,
        details: ServiceDetails,
    },
    DeleteNode {
        node_id: NodeId,
    },
    AttachVolume {
        node_id: NodeId,
        volume: Volume,
    },
    DetachVolume {
        node_id: NodeId,
        name: String,
    },
    Reorder {
        order: Vec<usize>,
    },
    MoveNode {
        from: usize,
        to: usize,
    },
    ImportVariables {
        node_id: NodeId,
        source: ImportSource,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ImportSource {
    /// Pasted text replaces the row at `index`.
    Paste { index: usize, text: String },
    /// An uploaded `.env` file is appended to the existing rows.
    File { filename: String, contents: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TemplateOperationResult {
    Node { node: Node },
    Deleted { node: Node },
    VolumeDetached { volume: Volume },
    Updated { edges: Vec<Edge> },
}

/// A single editing session over one template.
///
/// Unsaved templates are mirrored to the draft store after every successful edit.
/// Once a template has been saved it is never mirrored again.
pub struct TemplateEditor<S, D> {
    store: S,
    drafts: D,
    slot: DraftSlot,
    template_id: Option<TemplateId>,
    graph: TemplateGraph,
    config: EditorConfig,
}

impl<S: TemplateStore, D: DraftStore> TemplateEditor<S, D> {
    /// Starts a new template, restoring the draft in `slot` if there is one.
    pub fn create(store: S, drafts: D, slot: DraftSlot, config: EditorConfig) -> Self {
        let graph = match drafts.load(&slot) {
            Ok(Some(snapshot)) => {
                tracing::info!(slot = %slot, nodes = snapshot.nodes.len(), "restored draft");
                snapshot.into_graph(config.layout)
            }
            Ok(None) => TemplateGraph::with_layout(config.layout),
            Err(err) => {
                tracing::warn!(slot = %slot, error = %err, "failed to load draft");
                TemplateGraph::with_layout(config.layout)
            }
        };
        Self {
            store,
            drafts,
            slot,
            template_id: None,
            graph,
            config,
        }
    }

    /// Loads a saved template. Node ids and positions are minted fresh.
    pub fn open(
        store: S,
        drafts: D,
        template_id: TemplateId,
        config: EditorConfig,
    ) -> Result<Self> {
        let services = store.load_template(template_id)?;
        tracing::info!(template_id = %template_id, services = services.len(), "opened template");
        let graph = TemplateGraph::from_services(services, config.layout);
        Ok(Self {
            store,
            drafts,
            slot: DraftSlot::for_template(template_id),
            template_id: Some(template_id),
            graph,
            config,
        })
    }

    pub fn graph(&self) -> &TemplateGraph {
        &self.graph
    }

    pub fn template_id(&self) -> Option<TemplateId> {
        self.template_id
    }

    pub fn slot(&self) -> &DraftSlot {
        &self.slot
    }

    pub fn execute(&mut self, operation: TemplateOperation) -> Result<TemplateOperationResult> {
        let result = self.apply(operation)?;
        self.mirror_draft();
        Ok(result)
    }

    fn apply(&mut self, operation: TemplateOperation) -> Result<TemplateOperationResult> {
        match operation {
            TemplateOperation::AddNode { node } => {
                let node = self.graph.add_node(node)?;
                Ok(TemplateOperationResult::Node { node })
            }
            TemplateOperation::RenameNode { node_id, name } => {
                self.graph.rename_node(node_id, &name)?;
                Ok(self.updated())
            }
            TemplateOperation::UpdateVariables { node_id, variables } => {
                self.graph.update_variables(node_id, variables)?;
                Ok(self.updated())
            }
            TemplateOperation::UpdateDetails { node_id, details } => {
                self.graph.update_details(node_id, details)?;
                Ok(self.updated())
            }
            TemplateOperation::DeleteNode { node_id } => {
                let node = self.graph.delete_node(node_id)?;
                Ok(TemplateOperationResult::Deleted { node })
            }
            TemplateOperation::AttachVolume { node_id, volume } => {
                self.graph.attach_volume(node_id, volume)?;
                Ok(self.updated())
            }
            TemplateOperation::DetachVolume { node_id, name } => {
                let volume = self.graph.detach_volume(node_id, &name)?;
                Ok(TemplateOperationResult::VolumeDetached { volume })
            }
            TemplateOperation::Reorder { order } => {
                self.graph.reorder(&order)?;
                Ok(self.updated())
            }
            TemplateOperation::MoveNode { from, to } => {
                self.graph.move_node(from, to)?;
                Ok(self.updated())
            }
            TemplateOperation::ImportVariables { node_id, source } => {
                let node = self.graph.node(node_id).ok_or_else(|| {
                    LibError::not_found("Service not found", anyhow!("node {} not found", node_id))
                })?;
                let existing = &node.variables;
                let variables = match source {
                    ImportSource::Paste { index, text } => {
                        import::apply_paste(existing, index, import::parse(&text))
                    }
                    ImportSource::File { filename, contents } => {
                        import::import_file(existing, &filename, &contents)?
                    }
                };
                self.graph.update_variables(node_id, variables)?;
                Ok(self.updated())
            }
        }
    }

    fn updated(&self) -> TemplateOperationResult {
        TemplateOperationResult::Updated {
            edges: self.graph.edges().to_vec(),
        }
    }

    /// Draft writes are best-effort; a failure never fails the edit.
    fn mirror_draft(&mut self) {
        if self.template_id.is_some() || !self.config.mirror_drafts {
            return;
        }
        let snapshot = DraftSnapshot::capture(&self.graph);
        if let Err(err) = self.drafts.save(&self.slot, &snapshot) {
            tracing::warn!(slot = %self.slot, error = %err, "failed to mirror draft");
        }
    }

    /// Persists the current node order. On failure the graph and draft are left untouched.
    pub fn save(&mut self) -> Result<TemplateId> {
        let services = self.graph.to_services();
        let id = self
            .store
            .save_template(self.template_id, &services)
            .map_err(|err| {
                tracing::warn!(error = %err, "template save failed");
                if err.kind == ErrorKind::Persistence {
                    err
                } else {
                    LibError::persistence("Failed to save template", anyhow!(err))
                }
            })?;

        let first_save = self.template_id.is_none();
        self.template_id = Some(id);
        if first_save {
            if let Err(err) = self.drafts.clear(&self.slot) {
                tracing::warn!(slot = %self.slot, error = %err, "failed to clear draft");
            }
        }
        tracing::info!(template_id = %id, services = services.len(), "saved template");
        Ok(id)
    }

    /// Hands the ordered service list to `executor`.
    pub fn deploy<E: DeploymentExecutor + ?Sized>(&self, executor: &E) -> Result<()> {
        let services = self.graph.to_services();
        tracing::info!(
            template_id = ?self.template_id,
            services = services.len(),
            "deploying template"
        );
        executor.deploy(&services)
    }

    pub fn into_graph(self) -> TemplateGraph {
        self.graph
    }
}
