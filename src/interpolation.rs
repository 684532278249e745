//! Placeholder grammar shared by reference resolution and the variable field helper.
//!
//! ```text
//! secret-directive    := "{{" ws "secret(" int "," ws quoted-charset ")" ws "}}"
//! reference-directive := "{{" ws name "." token ws "}}"
//! token               := "DFLOW_PUBLIC_DOMAIN" | dbtype "_" suffix
//! ```
//!
//! Directives are only parsed here. Secrets and references are expanded by the deployment
//! executor.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LibError, Result};
use crate::models::{DatabaseEngine, Node, is_referenceable_name};

pub const PUBLIC_DOMAIN_TOKEN: &str = "DFLOW_PUBLIC_DOMAIN";

static DIRECTIVE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("directive pattern should compile"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceSuffix {
    Uri,
    Name,
    Username,
    Password,
    Host,
    Port,
    PublicHost,
    PublicPort,
    PublicUri,
}

impl ReferenceSuffix {
    pub const ALL: [ReferenceSuffix; 9] = [
        ReferenceSuffix::Uri,
        ReferenceSuffix::Name,
        ReferenceSuffix::Username,
        ReferenceSuffix::Password,
        ReferenceSuffix::Host,
        ReferenceSuffix::Port,
        ReferenceSuffix::PublicHost,
        ReferenceSuffix::PublicPort,
        ReferenceSuffix::PublicUri,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ReferenceSuffix::Uri => "URI",
            ReferenceSuffix::Name => "NAME",
            ReferenceSuffix::Username => "USERNAME",
            ReferenceSuffix::Password => "PASSWORD",
            ReferenceSuffix::Host => "HOST",
            ReferenceSuffix::Port => "PORT",
            ReferenceSuffix::PublicHost => "PUBLIC_HOST",
            ReferenceSuffix::PublicPort => "PUBLIC_PORT",
            ReferenceSuffix::PublicUri => "PUBLIC_URI",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|suffix| suffix.as_str() == value)
    }
}

/// The attribute part of a reference directive, e.g. `POSTGRES_URI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReferenceToken {
    PublicDomain,
    Database {
        engine: DatabaseEngine,
        suffix: ReferenceSuffix,
    },
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceToken::PublicDomain => f.write_str(PUBLIC_DOMAIN_TOKEN),
            ReferenceToken::Database { engine, suffix } => {
                write!(f, "{}_{}", engine.token_prefix(), suffix.as_str())
            }
        }
    }
}

impl FromStr for ReferenceToken {
    type Err = LibError;

    fn from_str(value: &str) -> Result<Self> {
        if value == PUBLIC_DOMAIN_TOKEN {
            return Ok(ReferenceToken::PublicDomain);
        }

        for suffix in ReferenceSuffix::ALL {
            let Some(prefix) = value
                .strip_suffix(suffix.as_str())
                .and_then(|rest| rest.strip_suffix('_'))
            else {
                continue;
            };
            if let Some(engine) = DatabaseEngine::from_token_prefix(prefix) {
                return Ok(ReferenceToken::Database { engine, suffix });
            }
        }

        Err(LibError::invalid(
            "Unknown reference token",
            anyhow!("token {:?} is not a known reference token", value),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Directive {
    Secret { length: u32, charset: String },
    Reference { service: String, token: ReferenceToken },
}

impl Directive {
    pub fn secret(length: u32, charset: impl Into<String>) -> Self {
        Directive::Secret {
            length,
            charset: charset.into(),
        }
    }

    pub fn reference(service: impl Into<String>, token: ReferenceToken) -> Self {
        Directive::Reference {
            service: service.into(),
            token,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Secret { length, charset } => {
                write!(f, "{{{{ secret({length}, \"{charset}\") }}}}")
            }
            Directive::Reference { service, token } => write!(f, "{{{{ {service}.{token} }}}}"),
        }
    }
}

/// Parses the text between `{{` and `}}`.
impl FromStr for Directive {
    type Err = LibError;

    fn from_str(inner: &str) -> Result<Self> {
        let inner = inner.trim();
        if let Some(arguments) = inner.strip_prefix("secret(") {
            return parse_secret(inner, arguments);
        }

        let Some((service, token)) = inner.rsplit_once('.') else {
            return Err(LibError::invalid(
                "Malformed placeholder",
                anyhow!("placeholder {:?} has no service separator", inner),
            ));
        };
        if !is_referenceable_name(service) {
            return Err(LibError::invalid(
                "Malformed placeholder",
                anyhow!("placeholder {:?} has an invalid service name", inner),
            ));
        }

        Ok(Directive::Reference {
            service: service.to_string(),
            token: token.parse()?,
        })
    }
}

fn parse_secret(inner: &str, arguments: &str) -> Result<Directive> {
    let malformed = || {
        LibError::invalid(
            "Malformed secret placeholder",
            anyhow!("secret placeholder {:?} is malformed", inner),
        )
    };

    let arguments = arguments.strip_suffix(')').ok_or_else(malformed)?;
    let (length, charset) = arguments.split_once(',').ok_or_else(malformed)?;
    let length = length.trim().parse::<u32>().map_err(|_| malformed())?;
    let charset = charset.trim();
    let charset = charset
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| {
            charset
                .strip_prefix('\'')
                .and_then(|rest| rest.strip_suffix('\''))
        })
        .ok_or_else(malformed)?;

    Ok(Directive::Secret {
        length,
        charset: charset.to_string(),
    })
}

/// Every well-formed directive in `value`, in order of appearance. Malformed placeholders
/// are inert text and are skipped.
pub fn directives(value: &str) -> impl Iterator<Item = Directive> + '_ {
    DIRECTIVE_PATTERN
        .captures_iter(value)
        .filter_map(|captures| captures.get(1))
        .filter_map(|inner| inner.as_str().parse::<Directive>().ok())
}

/// Reference directives in `value` as `(service, token)` pairs.
pub fn reference_directives(value: &str) -> impl Iterator<Item = (String, ReferenceToken)> + '_ {
    directives(value).filter_map(|directive| match directive {
        Directive::Reference { service, token } => Some((service, token)),
        Directive::Secret { .. } => None,
    })
}

/// Field helper: appends the placeholder for `directive` to the end of `field`.
pub fn append_placeholder(field: &str, directive: &Directive) -> String {
    format!("{field}{directive}")
}

/// Reference directives a node named `self_name` may insert: the public domain of every
/// other service, and every connection attribute of every other database. Services whose
/// names cannot be written in a placeholder are left out.
pub fn placeholder_options(nodes: &[Node], self_name: &str) -> Vec<Directive> {
    let mut options = Vec::new();
    let targets = nodes
        .iter()
        .filter(|node| node.name != self_name && is_referenceable_name(&node.name));
    for node in targets {
        match node.details.database_engine() {
            Some(engine) => {
                options.extend(ReferenceSuffix::ALL.into_iter().map(|suffix| {
                    Directive::reference(&node.name, ReferenceToken::Database { engine, suffix })
                }));
            }
            None => options.push(Directive::reference(
                &node.name,
                ReferenceToken::PublicDomain,
            )),
        }
    }
    options
}
