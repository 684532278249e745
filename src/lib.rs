pub mod algorithms;
pub mod config;
pub mod convert;
pub mod drafts;
pub mod edges;
pub mod error;
pub mod graph;
pub mod import;
pub mod interpolation;
pub mod invariants;
pub mod layout;
pub mod models;
pub mod operations;
pub mod ordering;
pub mod resolver;
pub mod store;

pub mod prelude {
    pub use crate::algorithms::{dependencies_of, dependents_of};
    pub use crate::config::EditorConfig;
    pub use crate::convert::{HydratedGraph, flatten, hydrate, hydrate_with, to_service};
    pub use crate::drafts::{
        DraftSlot, DraftSnapshot, DraftStore, FileDraftStore, InMemoryDraftStore,
    };
    pub use crate::edges::synthesize;
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::graph::TemplateGraph;
    pub use crate::interpolation::{Directive, ReferenceSuffix, ReferenceToken};
    pub use crate::invariants::{
        TemplateInvariantViolation, ensure_template_invariants, template_invariant_violations,
    };
    pub use crate::layout::LayoutConfig;
    pub use crate::models::{
        AppDetails, DatabaseDetails, DatabaseEngine, DockerDetails, Edge, GitSettings, NewNode,
        Node, NodeId, PortMapping, PortScheme, Position, ProviderType, RegistryCredentials,
        RegistryKind, Service, ServiceDetails, ServiceType, SettingsTab, TemplateId, Variable,
        Volume,
    };
    pub use crate::operations::{
        ImportSource, TemplateEditor, TemplateOperation, TemplateOperationResult,
    };
    pub use crate::resolver::{DanglingReference, Reference};
    pub use crate::store::{DeploymentExecutor, InMemoryTemplateStore, TemplateStore};
}
