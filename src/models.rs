use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LibError, Result};

/// Label carried by every derived reference edge.
pub const REFERENCE_EDGE_LABEL: &str = "Ref";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Mints a fresh id. Ids only live for one editing session.
    pub fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for NodeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub Uuid);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for TemplateId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    App,
    Docker,
    Database,
}

impl ServiceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ServiceType::App => "app",
            ServiceType::Docker => "docker",
            ServiceType::Database => "database",
        }
    }

    /// Settings tabs offered for a node of this type. Databases have no environment.
    pub const fn settings_tabs(self) -> &'static [SettingsTab] {
        match self {
            ServiceType::App | ServiceType::Docker => &[
                SettingsTab::Settings,
                SettingsTab::Environment,
                SettingsTab::Volumes,
            ],
            ServiceType::Database => &[SettingsTab::Settings],
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsTab {
    Settings,
    Environment,
    Volumes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Github,
    Gitlab,
    Bitbucket,
    Gitea,
    Azure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSettings {
    pub repository: String,
    pub owner: String,
    pub branch: String,
    #[serde(default = "default_build_path")]
    pub build_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

fn default_build_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "providerType", rename_all = "lowercase")]
pub enum AppDetails {
    Github(GitSettings),
    Gitlab(GitSettings),
    Bitbucket(GitSettings),
    Gitea(GitSettings),
    Azure(GitSettings),
}

impl AppDetails {
    pub const fn provider_type(&self) -> ProviderType {
        match self {
            AppDetails::Github(_) => ProviderType::Github,
            AppDetails::Gitlab(_) => ProviderType::Gitlab,
            AppDetails::Bitbucket(_) => ProviderType::Bitbucket,
            AppDetails::Gitea(_) => ProviderType::Gitea,
            AppDetails::Azure(_) => ProviderType::Azure,
        }
    }

    pub const fn settings(&self) -> &GitSettings {
        match self {
            AppDetails::Github(settings)
            | AppDetails::Gitlab(settings)
            | AppDetails::Bitbucket(settings)
            | AppDetails::Gitea(settings)
            | AppDetails::Azure(settings) => settings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    Docker,
    Github,
    Quay,
    Digitalocean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCredentials {
    pub registry: RegistryKind,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PortScheme {
    #[default]
    Http,
    Https,
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub container_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,
    #[serde(default)]
    pub scheme: PortScheme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerDetails {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryCredentials>,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgres,
    Mongo,
    Mysql,
    Mariadb,
    Redis,
}

impl DatabaseEngine {
    pub const ALL: [DatabaseEngine; 5] = [
        DatabaseEngine::Postgres,
        DatabaseEngine::Mongo,
        DatabaseEngine::Mysql,
        DatabaseEngine::Mariadb,
        DatabaseEngine::Redis,
    ];

    /// Upper-cased engine name used as the `dbtype` part of reference tokens.
    pub const fn token_prefix(self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "POSTGRES",
            DatabaseEngine::Mongo => "MONGO",
            DatabaseEngine::Mysql => "MYSQL",
            DatabaseEngine::Mariadb => "MARIADB",
            DatabaseEngine::Redis => "REDIS",
        }
    }

    pub fn from_token_prefix(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|engine| engine.token_prefix() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDetails {
    pub engine: DatabaseEngine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_port: Option<u16>,
}

/// Service variant payload; the tag is the service `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "typeDetails", rename_all = "lowercase")]
pub enum ServiceDetails {
    App(AppDetails),
    Docker(DockerDetails),
    Database(DatabaseDetails),
}

impl ServiceDetails {
    pub const fn service_type(&self) -> ServiceType {
        match self {
            ServiceDetails::App(_) => ServiceType::App,
            ServiceDetails::Docker(_) => ServiceType::Docker,
            ServiceDetails::Database(_) => ServiceType::Database,
        }
    }

    pub const fn database_engine(&self) -> Option<DatabaseEngine> {
        match self {
            ServiceDetails::Database(details) => Some(details.engine),
            ServiceDetails::App(_) | ServiceDetails::Docker(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True for the empty placeholder row an editor form keeps at the end of the list.
    pub fn is_blank(&self) -> bool {
        self.key.trim().is_empty() && self.value.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    pub mount_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    #[serde(flatten)]
    pub details: ServiceDetails,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub position: Position,
}

impl Node {
    pub const fn service_type(&self) -> ServiceType {
        self.details.service_type()
    }

    pub const fn is_database(&self) -> bool {
        matches!(self.details, ServiceDetails::Database(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub label: String,
}

impl Edge {
    pub fn reference(source: NodeId, target: NodeId) -> Self {
        Self {
            id: format!("ref-{source}-{target}"),
            source,
            target,
            label: REFERENCE_EDGE_LABEL.to_string(),
        }
    }

    pub fn touches(&self, node_id: NodeId) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Persisted form of a node. The deployment order is the index in the service list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    #[serde(flatten)]
    pub details: ServiceDetails,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

impl Service {
    pub const fn service_type(&self) -> ServiceType {
        self.details.service_type()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub name: String,
    #[serde(flatten)]
    pub details: ServiceDetails,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

impl NewNode {
    pub fn new(name: impl Into<String>, details: ServiceDetails) -> Self {
        Self {
            name: name.into(),
            details,
            variables: Vec::new(),
            volumes: Vec::new(),
        }
    }

    pub fn normalize(self) -> Result<NewNode> {
        let name = normalize_name(&self.name)?;
        let variables = normalize_variables(self.variables)?;
        if self.details.service_type() == ServiceType::Database {
            if !variables.is_empty() {
                return Err(LibError::invalid_operation(
                    "Database services do not accept environment variables",
                    anyhow!("database {} created with variables", name),
                ));
            }
            if !self.volumes.is_empty() {
                return Err(LibError::invalid_operation(
                    "Volumes cannot be attached to database services",
                    anyhow!("database {} created with volumes", name),
                ));
            }
        }

        Ok(NewNode {
            name,
            details: self.details,
            variables,
            volumes: self.volumes,
        })
    }
}

pub(crate) fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibError::invalid(
            "Service name is required",
            anyhow!("empty service name"),
        ));
    }
    if !is_referenceable_name(name) {
        return Err(LibError::invalid_with_code(
            "service_name_invalid",
            "Service names cannot contain spaces or braces",
            anyhow!("service name {:?} cannot appear in a placeholder", name),
        ));
    }
    Ok(name.to_string())
}

/// Whether `name` can be written as the service part of a `{{ name.TOKEN }}` placeholder.
pub fn is_referenceable_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == '{' || c == '}')
}

/// Drops blank rows and rejects a value without a key.
pub(crate) fn normalize_variables(variables: Vec<Variable>) -> Result<Vec<Variable>> {
    let mut output = Vec::with_capacity(variables.len());
    for variable in variables {
        if variable.is_blank() {
            continue;
        }
        if variable.key.trim().is_empty() {
            return Err(LibError::invalid_with_code(
                "variable_key_required",
                "Variable key is required",
                anyhow!("variable with value {:?} has no key", variable.value),
            ));
        }
        output.push(variable);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn postgres() -> ServiceDetails {
        ServiceDetails::Database(DatabaseDetails {
            engine: DatabaseEngine::Postgres,
            exposed_port: None,
        })
    }

    #[test]
    fn service_details_serialize_with_type_tag() {
        let service = Service {
            name: "api".to_string(),
            details: ServiceDetails::App(AppDetails::Github(GitSettings {
                repository: "api".to_string(),
                owner: "acme".to_string(),
                branch: "main".to_string(),
                build_path: "/".to_string(),
                port: Some(3000),
            })),
            variables: vec![Variable::new("PORT", "3000")],
            volumes: vec![],
        };

        let value = serde_json::to_value(&service).expect("service should serialize");
        assert_eq!(value["type"], json!("app"));
        assert_eq!(value["typeDetails"]["providerType"], json!("github"));
        assert_eq!(value["typeDetails"]["buildPath"], json!("/"));
        assert!(value.get("details").is_none());

        let back: Service = serde_json::from_value(value).expect("service should deserialize");
        assert_eq!(back, service);
    }

    #[test]
    fn service_record_reads_flat_type_fields() {
        let service: Service = serde_json::from_value(json!({
            "name": "db",
            "type": "database",
            "typeDetails": {"engine": "postgres"},
            "variables": [],
            "volumes": []
        }))
        .expect("flat service record should deserialize");
        assert_eq!(service.name, "db");
        assert_eq!(service.details, postgres());

        let value = serde_json::to_value(&service).expect("service should serialize");
        assert_eq!(value["type"], json!("database"));
        assert_eq!(value["typeDetails"]["engine"], json!("postgres"));
    }

    #[test]
    fn node_and_new_node_use_flat_type_fields() {
        let node = Node {
            id: NodeId::mint(),
            name: "db".to_string(),
            details: postgres(),
            variables: vec![],
            volumes: vec![],
            position: Position { x: 500.0, y: 200.0 },
        };
        let value = serde_json::to_value(&node).expect("node should serialize");
        assert_eq!(value["type"], json!("database"));
        let back: Node = serde_json::from_value(value).expect("node should deserialize");
        assert_eq!(back, node);

        let new_node: NewNode = serde_json::from_value(json!({
            "name": "cache",
            "type": "database",
            "typeDetails": {"engine": "redis"}
        }))
        .expect("new node should deserialize");
        assert_eq!(new_node.details.database_engine(), Some(DatabaseEngine::Redis));
    }

    #[test]
    fn git_settings_default_build_path() {
        let details: AppDetails = serde_json::from_value(json!({
            "providerType": "gitlab",
            "repository": "web",
            "owner": "acme",
            "branch": "main"
        }))
        .expect("app details should deserialize");
        assert_eq!(details.provider_type(), ProviderType::Gitlab);
        assert_eq!(details.settings().build_path, "/");
        assert_eq!(details.settings().port, None);
    }

    #[test]
    fn engine_token_prefix_round_trips() {
        for engine in DatabaseEngine::ALL {
            assert_eq!(
                DatabaseEngine::from_token_prefix(engine.token_prefix()),
                Some(engine)
            );
        }
        assert_eq!(DatabaseEngine::from_token_prefix("postgres"), None);
    }

    #[test]
    fn database_has_no_environment_tab() {
        assert_eq!(
            ServiceType::Database.settings_tabs(),
            &[SettingsTab::Settings]
        );
        assert!(
            ServiceType::Docker
                .settings_tabs()
                .contains(&SettingsTab::Environment)
        );
    }

    #[test]
    fn normalize_trims_name_and_drops_blank_rows() {
        let mut node = NewNode::new(
            "  api  ",
            ServiceDetails::Docker(DockerDetails {
                image: "nginx:latest".to_string(),
                registry: None,
                ports: vec![],
            }),
        );
        node.variables = vec![Variable::new("A", "1"), Variable::new(" ", "")];

        let normalized = node.normalize().expect("node should normalize");
        assert_eq!(normalized.name, "api");
        assert_eq!(normalized.variables, vec![Variable::new("A", "1")]);
    }

    #[test]
    fn normalize_rejects_database_with_variables() {
        let mut node = NewNode::new("db", postgres());
        node.variables = vec![Variable::new("A", "1")];
        let err = node.normalize().expect_err("database variables should fail");
        assert_eq!(err.kind, ErrorKind::InvalidOperation);
    }

    #[test]
    fn normalize_accepts_database_with_only_blank_rows() {
        let mut node = NewNode::new("db", postgres());
        node.variables = vec![Variable::new("", ""), Variable::new(" ", " ")];
        let normalized = node.normalize().expect("blank rows are dropped");
        assert!(normalized.variables.is_empty());
    }

    #[test]
    fn normalize_rejects_names_that_cannot_be_referenced() {
        for name in ["my api", "api\tv2", "{api}"] {
            let err = NewNode::new(name, postgres())
                .normalize()
                .expect_err("name is not referenceable");
            assert_eq!(err.kind, ErrorKind::InvalidInput);
            assert_eq!(err.code, "service_name_invalid");
        }
        assert!(is_referenceable_name("api-v2.internal"));
    }

    #[test]
    fn normalize_rejects_value_without_key() {
        let err = normalize_variables(vec![Variable::new("", "orphan")])
            .expect_err("keyless value should fail");
        assert_eq!(err.code, "variable_key_required");
    }

    #[test]
    fn normalize_rejects_empty_name() {
        let err = NewNode::new("   ", postgres())
            .normalize()
            .expect_err("empty name should fail");
        assert_eq!(err.public, "Service name is required");
    }

    #[test]
    fn reference_edges_use_ref_label() {
        let a = NodeId::mint();
        let b = NodeId::mint();
        let edge = Edge::reference(a, b);
        assert_eq!(edge.label, REFERENCE_EDGE_LABEL);
        assert!(edge.touches(a));
        assert!(edge.touches(b));
        assert!(!edge.touches(NodeId::mint()));
        assert_eq!(edge, Edge::reference(a, b));
    }
}
