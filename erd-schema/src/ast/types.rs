//! Core type definitions shared across the schema AST.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::span::SourceLocation;

/// An identifier with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    /// The identifier text.
    pub name: SmolStr,
    /// Source location.
    pub location: SourceLocation,
}

impl Ident {
    /// Create a new identifier.
    pub fn new(name: impl Into<SmolStr>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A documentation comment (`///`) attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documentation {
    /// The documentation text without the `///` markers.
    pub text: String,
    /// Source location of the comment block.
    pub location: SourceLocation,
}

impl Documentation {
    /// Create new documentation.
    pub fn new(text: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            text: text.into(),
            location,
        }
    }
}

/// The fixed set of built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Boolean,
    Int,
    BigInt,
    Float,
    Decimal,
    DateTime,
    Json,
    Bytes,
    /// MongoDB object id.
    ObjectId,
}

impl ScalarType {
    /// Parse a scalar type keyword.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "String" => Some(Self::String),
            "Boolean" => Some(Self::Boolean),
            "Int" => Some(Self::Int),
            "BigInt" => Some(Self::BigInt),
            "Float" => Some(Self::Float),
            "Decimal" => Some(Self::Decimal),
            "DateTime" => Some(Self::DateTime),
            "Json" => Some(Self::Json),
            "Bytes" => Some(Self::Bytes),
            "ObjectId" => Some(Self::ObjectId),
            _ => None,
        }
    }

    /// The keyword for this scalar type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
            Self::Bytes => "Bytes",
            Self::ObjectId => "ObjectId",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The type of a field.
///
/// The AST builder only distinguishes scalar keywords from named types; named
/// types start out as [`FieldType::Unresolved`] and the type-resolution pass
/// rewrites them to [`FieldType::Model`] or [`FieldType::Enum`]. A name that
/// resolves to nothing stays `Unresolved` so tooling can still display the
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum FieldType {
    /// A built-in scalar type.
    Scalar(ScalarType),
    /// A reference to a model (a relation field).
    Model(SmolStr),
    /// A reference to an enum.
    Enum(SmolStr),
    /// A reference to a composite (embedded-document) type.
    Composite(SmolStr),
    /// A named type that has not (or could not) be resolved.
    Unresolved(SmolStr),
}

impl FieldType {
    /// Check if this is a scalar type.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Check if this is a relation to another model.
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Check if this is an enum type.
    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    /// Check if the type name never resolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }

    /// The type name as written in the schema.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar(s) => s.as_str(),
            Self::Model(name)
            | Self::Enum(name)
            | Self::Composite(name)
            | Self::Unresolved(name) => name.as_str(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Modifier applied to a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TypeModifier {
    /// No modifier.
    #[default]
    Required,
    /// `?` suffix.
    Optional,
    /// `[]` suffix.
    List,
    /// `[]?` — parses, but is rejected during validation (lists are
    /// non-nullable containers).
    OptionalList,
}

impl TypeModifier {
    /// Check if the field is optional.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional | Self::OptionalList)
    }

    /// Check if the field is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List | Self::OptionalList)
    }

    /// The modifier suffix as written in schema text.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Required => "",
            Self::Optional => "?",
            Self::List => "[]",
            Self::OptionalList => "[]?",
        }
    }
}
