use std::fmt;

use anyhow::anyhow;

pub type Result<T> = std::result::Result<T, LibError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateName,
    InvalidOperation,
    InvalidInput,
    NotFound,
    Import,
    Persistence,
    Unknown,
}

/// Library error carrying a user-facing message (`public`) next to the diagnostic source.
#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub source: anyhow::Error,
}

impl LibError {
    pub fn duplicate_name(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::DuplicateName,
            code: "duplicate_name",
            public,
            source,
        }
    }

    pub fn invalid_operation(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidOperation,
            code: "invalid_operation",
            public,
            source,
        }
    }

    pub fn invalid(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code: "invalid_input",
            public,
            source,
        }
    }

    pub fn invalid_with_code(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code,
            public,
            source,
        }
    }

    pub fn not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code: "not_found",
            public,
            source,
        }
    }

    pub fn import(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Import,
            code: "import_error",
            public,
            source,
        }
    }

    pub fn persistence(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Persistence,
            code: "persistence_error",
            public,
            source,
        }
    }

    pub fn unknown(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: "unknown_error",
            public,
            source,
        }
    }
}

impl fmt::Display for LibError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.public, self.source)
    }
}

impl std::error::Error for LibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + 'static) = &*self.source;
        Some(source)
    }
}

impl From<serde_json::Error> for LibError {
    fn from(value: serde_json::Error) -> Self {
        Self::invalid("Malformed template data", anyhow!(value))
    }
}
