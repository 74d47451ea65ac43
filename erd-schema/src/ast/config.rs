//! Datasource and generator blocks.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::Ident;
use crate::span::SourceLocation;

/// A database provider named in a datasource block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    PostgreSql,
    MySql,
    Sqlite,
    SqlServer,
    MongoDb,
    CockroachDb,
    /// A provider string this core does not know about.
    Other(SmolStr),
}

impl Provider {
    /// Parse a provider string as written in schema text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s {
            "postgresql" | "postgres" => Self::PostgreSql,
            "mysql" => Self::MySql,
            "sqlite" => Self::Sqlite,
            "sqlserver" => Self::SqlServer,
            "mongodb" => Self::MongoDb,
            "cockroachdb" => Self::CockroachDb,
            other => Self::Other(SmolStr::new(other)),
        }
    }

    /// The provider string as written in schema text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
            Self::MongoDb => "mongodb",
            Self::CockroachDb => "cockroachdb",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Multi-schema (`schemas = [...]`, `@@schema`) support.
    pub fn supports_multi_schema(&self) -> bool {
        matches!(self, Self::PostgreSql)
    }

    /// Whether `relationMode = "prisma"` is supported.
    pub fn supports_emulated_relations(&self) -> bool {
        !matches!(self, Self::MongoDb)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How relations are enforced (`relationMode` datasource property).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationMode {
    /// Database-level foreign keys.
    ForeignKeys,
    /// Client-emulated relations.
    Prisma,
}

impl RelationMode {
    /// Parse from the property string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "foreignKeys" => Some(Self::ForeignKeys),
            "prisma" => Some(Self::Prisma),
            _ => None,
        }
    }
}

/// A datasource connection URL, possibly indirected through `env("VAR")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceUrl {
    /// The URL value as written (the raw string, or the `env(...)` call text).
    pub value: String,
    /// Environment variable name when the URL uses `env("VAR")`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_env: Option<String>,
    /// Source location.
    pub location: SourceLocation,
}

impl DatasourceUrl {
    /// A direct URL string.
    pub fn direct(value: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            value: value.into(),
            from_env: None,
            location,
        }
    }

    /// An `env("VAR")` indirection.
    pub fn from_env(var: impl Into<String>, location: SourceLocation) -> Self {
        let var = var.into();
        Self {
            value: format!("env(\"{var}\")"),
            from_env: Some(var),
            location,
        }
    }
}

/// A `datasource` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    /// Block name (commonly `db`).
    pub name: Ident,
    /// Database provider.
    pub provider: Provider,
    /// Connection URL.
    pub url: Option<DatasourceUrl>,
    /// Multi-schema names (`schemas = ["public", "auth"]`).
    pub schemas: Vec<String>,
    /// Relation enforcement mode.
    pub relation_mode: Option<RelationMode>,
    /// Source location of the whole block.
    pub location: SourceLocation,
}

impl Datasource {
    /// Create a datasource with just a name and provider.
    pub fn new(name: Ident, provider: Provider, location: SourceLocation) -> Self {
        Self {
            name,
            provider,
            url: None,
            schemas: vec![],
            relation_mode: None,
            location,
        }
    }
}

/// A `generator` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    /// Block name (commonly `client`).
    pub name: Ident,
    /// Generator provider (e.g., `prisma-client-js`).
    pub provider: Option<String>,
    /// Custom output path.
    pub output: Option<String>,
    /// Enabled preview features.
    pub preview_features: Vec<String>,
    /// Binary targets.
    pub binary_targets: Vec<String>,
    /// Source location of the whole block.
    pub location: SourceLocation,
}

impl Generator {
    /// Create a generator with just a name.
    pub fn new(name: Ident, location: SourceLocation) -> Self {
        Self {
            name,
            provider: None,
            output: None,
            preview_features: vec![],
            binary_targets: vec![],
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::from_str("postgresql"), Provider::PostgreSql);
        assert_eq!(Provider::from_str("postgres"), Provider::PostgreSql);
        assert_eq!(Provider::from_str("mongodb"), Provider::MongoDb);
        assert_eq!(
            Provider::from_str("oracle"),
            Provider::Other("oracle".into())
        );
    }

    #[test]
    fn test_provider_capabilities() {
        assert!(Provider::PostgreSql.supports_multi_schema());
        assert!(!Provider::MySql.supports_multi_schema());
        assert!(!Provider::MongoDb.supports_emulated_relations());
        assert!(Provider::Sqlite.supports_emulated_relations());
    }

    #[test]
    fn test_relation_mode_parse() {
        assert_eq!(
            RelationMode::from_str("foreignKeys"),
            Some(RelationMode::ForeignKeys)
        );
        assert_eq!(RelationMode::from_str("prisma"), Some(RelationMode::Prisma));
        assert_eq!(RelationMode::from_str("other"), None);
    }

    #[test]
    fn test_datasource_url_env() {
        let url = DatasourceUrl::from_env("DATABASE_URL", SourceLocation::start_of_file());
        assert_eq!(url.from_env.as_deref(), Some("DATABASE_URL"));
        assert_eq!(url.value, "env(\"DATABASE_URL\")");
    }
}
