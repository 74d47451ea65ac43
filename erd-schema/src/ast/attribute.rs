//! Typed field-level and block-level attributes.
//!
//! The parser collects attributes as raw name/argument nodes; the AST builder
//! converts them into the tagged variants here so the validator and relation
//! resolver can match exhaustively. Attribute names that are not recognized
//! are kept as `Unknown` so the attribute pass can report them with a span.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::span::SourceLocation;

/// A literal value appearing in an attribute argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteralValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    /// A bare constant such as an enum value (`@default(Admin)`).
    Constant(SmolStr),
}

impl LiteralValue {
    /// Try to get the value as a string literal.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a constant name.
    pub fn as_constant(&self) -> Option<&str> {
        match self {
            Self::Constant(c) => Some(c),
            _ => None,
        }
    }
}

impl std::fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Constant(c) => write!(f, "{c}"),
        }
    }
}

/// The payload of a `@default` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum DefaultValue {
    /// A literal default (`@default(0)`, `@default("active")`).
    Literal { value: LiteralValue },
    /// A call to a known generator function (`@default(now())`).
    Function {
        name: SmolStr,
        args: Vec<LiteralValue>,
    },
    /// A raw database expression (`@default(dbgenerated("gen_random_uuid()"))`).
    DbGenerated { expression: String },
}

impl DefaultValue {
    /// The generator function name, if this default is a function call.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Self::Function { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Check for a specific generator function.
    pub fn is_function(&self, name: &str) -> bool {
        self.function_name() == Some(name)
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal { value } => write!(f, "{value}"),
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::DbGenerated { expression } => write!(f, "dbgenerated(\"{expression}\")"),
        }
    }
}

/// Generator functions usable inside `@default(...)`.
pub const KNOWN_DEFAULT_FUNCTIONS: &[&str] =
    &["autoincrement", "cuid", "uuid", "now", "dbgenerated", "auto"];

/// Referential action applied to dependents on delete/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Parse from the constant used in schema text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Cascade" => Some(Self::Cascade),
            "Restrict" => Some(Self::Restrict),
            "NoAction" => Some(Self::NoAction),
            "SetNull" => Some(Self::SetNull),
            "SetDefault" => Some(Self::SetDefault),
            _ => None,
        }
    }

    /// The constant as written in schema text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cascade => "Cascade",
            Self::Restrict => "Restrict",
            Self::NoAction => "NoAction",
            Self::SetNull => "SetNull",
            Self::SetDefault => "SetDefault",
        }
    }
}

/// Sort order in `@id`/`@unique`/`@@index` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse from the constant used in schema text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Asc" => Some(Self::Asc),
            "Desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// The constant as written in schema text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "Asc",
            Self::Desc => "Desc",
        }
    }
}

/// The arguments of an `@relation` attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAttribute {
    /// Relation name for disambiguation.
    pub name: Option<SmolStr>,
    /// Scalar foreign-key fields on this model.
    pub fields: Vec<SmolStr>,
    /// Referenced fields on the target model.
    pub references: Vec<SmolStr>,
    /// Action on delete of the referenced row.
    pub on_delete: Option<ReferentialAction>,
    /// Action on update of the referenced row.
    pub on_update: Option<ReferentialAction>,
    /// Custom constraint name.
    pub map: Option<String>,
}

impl RelationAttribute {
    /// True when both `fields` and `references` were given.
    pub fn is_fully_specified(&self) -> bool {
        !self.fields.is_empty() && !self.references.is_empty()
    }
}

/// A field-level attribute (`@...`) with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAttribute {
    pub kind: FieldAttributeKind,
    pub location: SourceLocation,
}

impl FieldAttribute {
    /// Create a new field attribute.
    pub fn new(kind: FieldAttributeKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}

/// The recognized field-level attribute variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FieldAttributeKind {
    /// `@id`
    Id {
        map: Option<String>,
        sort: Option<SortOrder>,
    },
    /// `@unique`
    Unique {
        map: Option<String>,
        sort: Option<SortOrder>,
    },
    /// `@default(...)`
    Default { value: DefaultValue },
    /// `@relation(...)`
    Relation { relation: RelationAttribute },
    /// `@map("column")`
    Map { name: String },
    /// `@updatedAt`
    UpdatedAt,
    /// `@ignore`
    Ignore,
    /// Anything else; reported as E4001 by the attribute pass.
    Unknown { name: SmolStr },
}

impl FieldAttributeKind {
    /// A short name for duplicate detection and messages.
    pub fn name(&self) -> &str {
        match self {
            Self::Id { .. } => "id",
            Self::Unique { .. } => "unique",
            Self::Default { .. } => "default",
            Self::Relation { .. } => "relation",
            Self::Map { .. } => "map",
            Self::UpdatedAt => "updatedAt",
            Self::Ignore => "ignore",
            Self::Unknown { name } => name,
        }
    }
}

/// A field inside an `@@index` argument list, with its per-field options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    /// Referenced field name.
    pub name: SmolStr,
    /// Sort order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    /// Prefix length (MySQL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Operator class (PostgreSQL).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops: Option<SmolStr>,
}

impl IndexField {
    /// An index field with no per-field options.
    pub fn plain(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            sort: None,
            length: None,
            ops: None,
        }
    }
}

/// Index algorithm (`@@index(..., type: Hash)`), PostgreSQL-specific beyond BTree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    BTree,
    Hash,
    Gist,
    Gin,
    SpGist,
    Brin,
}

impl IndexType {
    /// Parse from the constant used in schema text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BTree" => Some(Self::BTree),
            "Hash" => Some(Self::Hash),
            "Gist" => Some(Self::Gist),
            "Gin" => Some(Self::Gin),
            "SpGist" => Some(Self::SpGist),
            "Brin" => Some(Self::Brin),
            _ => None,
        }
    }

    /// The constant as written in schema text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BTree => "BTree",
            Self::Hash => "Hash",
            Self::Gist => "Gist",
            Self::Gin => "Gin",
            Self::SpGist => "SpGist",
            Self::Brin => "Brin",
        }
    }
}

/// A block-level attribute (`@@...`) with its source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAttribute {
    pub kind: BlockAttributeKind,
    pub location: SourceLocation,
}

impl BlockAttribute {
    /// Create a new block attribute.
    pub fn new(kind: BlockAttributeKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// True for `@@id`.
    pub fn is_id(&self) -> bool {
        matches!(self.kind, BlockAttributeKind::Id { .. })
    }
}

/// The recognized block-level attribute variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BlockAttributeKind {
    /// `@@id([a, b])` — composite primary key.
    Id {
        fields: Vec<SmolStr>,
        name: Option<String>,
        map: Option<String>,
    },
    /// `@@unique([a, b])` — composite unique constraint.
    Unique {
        fields: Vec<SmolStr>,
        name: Option<String>,
        map: Option<String>,
    },
    /// `@@index([a(sort: Desc)], type: Hash)`.
    Index {
        fields: Vec<IndexField>,
        name: Option<String>,
        map: Option<String>,
        index_type: Option<IndexType>,
    },
    /// `@@map("table")`.
    Map { name: String },
    /// `@@schema("public")` — multi-schema support.
    Schema { name: String },
    /// `@@ignore`.
    Ignore,
    /// Anything else; reported as E4001 by the attribute pass.
    Unknown { name: SmolStr },
}

impl BlockAttributeKind {
    /// A short name for duplicate detection and messages.
    pub fn name(&self) -> &str {
        match self {
            Self::Id { .. } => "id",
            Self::Unique { .. } => "unique",
            Self::Index { .. } => "index",
            Self::Map { .. } => "map",
            Self::Schema { .. } => "schema",
            Self::Ignore => "ignore",
            Self::Unknown { name } => name,
        }
    }
}
