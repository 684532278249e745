//! Client-local draft mirror for templates that have not been saved yet.
//!
//! Drafts are keyed by an explicit [`DraftSlot`] and cleared after a confirmed save.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};
use crate::graph::TemplateGraph;
use crate::invariants;
use crate::layout::LayoutConfig;
use crate::models::{Edge, Node, TemplateId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DraftSlot(String);

impl DraftSlot {
    pub const NEW_TEMPLATE: &'static str = "new-template";

    /// Slot names are limited to ASCII letters, digits, `-` and `_`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(LibError::invalid(
                "Draft slot name is invalid",
                anyhow!("draft slot {:?} is empty or has unsupported characters", name),
            ));
        }
        Ok(Self(name))
    }

    pub fn new_template() -> Self {
        Self(Self::NEW_TEMPLATE.to_string())
    }

    pub fn for_template(id: TemplateId) -> Self {
        Self(format!("template-{}", id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DraftSlot {
    type Error = LibError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DraftSlot> for String {
    fn from(slot: DraftSlot) -> Self {
        slot.0
    }
}

impl fmt::Display for DraftSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub updated_at: DateTime<Utc>,
}

impl DraftSnapshot {
    pub fn capture(graph: &TemplateGraph) -> Self {
        Self {
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
            updated_at: Utc::now(),
        }
    }

    /// Rebuilds a graph from the snapshot. Stored edges are only compared against the
    /// recomputed ones; any mismatch is logged.
    pub fn into_graph(self, layout: LayoutConfig) -> TemplateGraph {
        let violations = invariants::template_invariant_violations(&self.nodes, &self.edges);
        if !violations.is_empty() {
            tracing::warn!(?violations, "restored draft is inconsistent");
        }
        TemplateGraph::from_nodes(self.nodes, layout)
    }
}

pub trait DraftStore {
    fn load(&self, slot: &DraftSlot) -> Result<Option<DraftSnapshot>>;
    fn save(&mut self, slot: &DraftSlot, snapshot: &DraftSnapshot) -> Result<()>;
    fn clear(&mut self, slot: &DraftSlot) -> Result<()>;
}

impl<T: DraftStore + ?Sized> DraftStore for &mut T {
    fn load(&self, slot: &DraftSlot) -> Result<Option<DraftSnapshot>> {
        (**self).load(slot)
    }

    fn save(&mut self, slot: &DraftSlot, snapshot: &DraftSnapshot) -> Result<()> {
        (**self).save(slot, snapshot)
    }

    fn clear(&mut self, slot: &DraftSlot) -> Result<()> {
        (**self).clear(slot)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDraftStore {
    drafts: HashMap<DraftSlot, DraftSnapshot>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, slot: &DraftSlot) -> bool {
        self.drafts.contains_key(slot)
    }
}

impl DraftStore for InMemoryDraftStore {
    fn load(&self, slot: &DraftSlot) -> Result<Option<DraftSnapshot>> {
        Ok(self.drafts.get(slot).cloned())
    }

    fn save(&mut self, slot: &DraftSlot, snapshot: &DraftSnapshot) -> Result<()> {
        self.drafts.insert(slot.clone(), snapshot.clone());
        Ok(())
    }

    fn clear(&mut self, slot: &DraftSlot) -> Result<()> {
        self.drafts.remove(slot);
        Ok(())
    }
}

/// One JSON document per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, slot: &DraftSlot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.as_str()))
    }
}

fn io_err(public: &'static str, path: &Path, err: io::Error) -> LibError {
    LibError::persistence(public, anyhow!("{}: {}", path.display(), err))
}

impl DraftStore for FileDraftStore {
    fn load(&self, slot: &DraftSlot) -> Result<Option<DraftSnapshot>> {
        let path = self.path_for(slot);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err("Failed to read draft", &path, err)),
        };
        let snapshot = serde_json::from_str(&raw).map_err(|err| {
            LibError::persistence(
                "Stored draft is corrupted",
                anyhow!("{}: {}", path.display(), err),
            )
        })?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, slot: &DraftSlot, snapshot: &DraftSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| io_err("Failed to write draft", &self.dir, err))?;
        let path = self.path_for(slot);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&tmp, body).map_err(|err| io_err("Failed to write draft", &tmp, err))?;
        fs::rename(&tmp, &path).map_err(|err| io_err("Failed to write draft", &path, err))?;
        Ok(())
    }

    fn clear(&mut self, slot: &DraftSlot) -> Result<()> {
        let path = self.path_for(slot);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err("Failed to clear draft", &path, err)),
        }
    }
}
