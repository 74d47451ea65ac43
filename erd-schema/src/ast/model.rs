//! Model and enum definitions.

use serde::{Deserialize, Serialize};

use super::{BlockAttribute, BlockAttributeKind, Documentation, Field, Ident};
use crate::span::SourceLocation;

/// A model definition (maps to a database table or collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model name.
    pub name: Ident,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// Block-level attributes (`@@id`, `@@unique`, `@@index`, `@@map`, ...).
    pub attributes: Vec<BlockAttribute>,
    /// Documentation comment.
    pub documentation: Option<Documentation>,
    /// Source location of the whole block.
    pub location: SourceLocation,
}

impl Model {
    /// Create a new model with no fields.
    pub fn new(name: Ident, location: SourceLocation) -> Self {
        Self {
            name,
            fields: vec![],
            attributes: vec![],
            documentation: None,
            location,
        }
    }

    /// Get the model name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get a field by name (first declaration wins).
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Fields carrying `@id`.
    pub fn id_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_id())
    }

    /// Fields whose type references another model.
    pub fn relation_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_relation())
    }

    /// The `@@id` composite primary key, if declared.
    pub fn composite_id(&self) -> Option<&BlockAttribute> {
        self.attributes.iter().find(|a| a.is_id())
    }

    /// True when the model carries `@@ignore`.
    pub fn is_ignored(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a.kind, BlockAttributeKind::Ignore))
    }

    /// The database table name (`@@map` or the model name).
    pub fn table_name(&self) -> &str {
        self.attributes
            .iter()
            .find_map(|a| match &a.kind {
                BlockAttributeKind::Map { name } => Some(name.as_str()),
                _ => None,
            })
            .unwrap_or_else(|| self.name())
    }

    /// Set documentation.
    pub fn with_documentation(mut self, doc: Documentation) -> Self {
        self.documentation = Some(doc);
        self
    }
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    /// Enum name.
    pub name: Ident,
    /// Values in declaration order.
    pub values: Vec<EnumValue>,
    /// Block-level attributes (`@@map`, `@@schema`).
    pub attributes: Vec<BlockAttribute>,
    /// Documentation comment.
    pub documentation: Option<Documentation>,
    /// Source location of the whole block.
    pub location: SourceLocation,
}

impl Enum {
    /// Create a new enum with no values.
    pub fn new(name: Ident, location: SourceLocation) -> Self {
        Self {
            name,
            values: vec![],
            attributes: vec![],
            documentation: None,
            location,
        }
    }

    /// Get the enum name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get a value by name.
    pub fn get_value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name.as_str() == name)
    }

    /// The database enum name (`@@map` or the enum name).
    pub fn db_name(&self) -> &str {
        self.attributes
            .iter()
            .find_map(|a| match &a.kind {
                BlockAttributeKind::Map { name } => Some(name.as_str()),
                _ => None,
            })
            .unwrap_or_else(|| self.name())
    }

    /// Set documentation.
    pub fn with_documentation(mut self, doc: Documentation) -> Self {
        self.documentation = Some(doc);
        self
    }
}

/// A single enum value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Value name.
    pub name: Ident,
    /// Database value from a per-value `@map`.
    pub mapped_name: Option<String>,
    /// Documentation comment.
    pub documentation: Option<Documentation>,
    /// Source location.
    pub location: SourceLocation,
}

impl EnumValue {
    /// Create a new enum value.
    pub fn new(name: Ident, location: SourceLocation) -> Self {
        Self {
            name,
            mapped_name: None,
            documentation: None,
            location,
        }
    }

    /// The database value (`@map` or the value name).
    pub fn db_value(&self) -> &str {
        self.mapped_name.as_deref().unwrap_or(self.name.as_str())
    }
}
