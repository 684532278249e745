//! Collaborator seams: template persistence and the deployment executor.
//!
//! Both are synchronous request/response calls from the editor's point of view.

use std::collections::HashMap;

use anyhow::anyhow;
use uuid::Uuid;

use crate::error::{LibError, Result};
use crate::models::{Service, TemplateId};

/// Stores and retrieves templates as ordered service lists.
///
/// Saves are last-write-wins; there is no version check.
pub trait TemplateStore {
    fn load_template(&self, id: TemplateId) -> Result<Vec<Service>>;

    /// Creates a template when `id` is `None`, otherwise replaces it.
    fn save_template(&mut self, id: Option<TemplateId>, services: &[Service])
    -> Result<TemplateId>;
}

impl<T: TemplateStore + ?Sized> TemplateStore for &mut T {
    fn load_template(&self, id: TemplateId) -> Result<Vec<Service>> {
        (**self).load_template(id)
    }

    fn save_template(
        &mut self,
        id: Option<TemplateId>,
        services: &[Service],
    ) -> Result<TemplateId> {
        (**self).save_template(id, services)
    }
}

/// Consumes the final ordered service list. Expands secrets and references itself.
pub trait DeploymentExecutor {
    fn deploy(&self, services: &[Service]) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryTemplateStore {
    templates: HashMap<TemplateId, Vec<Service>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn load_template(&self, id: TemplateId) -> Result<Vec<Service>> {
        self.templates.get(&id).cloned().ok_or_else(|| {
            LibError::not_found("Template not found", anyhow!("template {} not found", id))
        })
    }

    fn save_template(
        &mut self,
        id: Option<TemplateId>,
        services: &[Service],
    ) -> Result<TemplateId> {
        let id = match id {
            Some(id) if !self.templates.contains_key(&id) => {
                return Err(LibError::not_found(
                    "Template not found",
                    anyhow!("cannot update missing template {}", id),
                ));
            }
            Some(id) => id,
            None => TemplateId(Uuid::new_v4()),
        };
        self.templates.insert(id, services.to_vec());
        Ok(id)
    }
}
