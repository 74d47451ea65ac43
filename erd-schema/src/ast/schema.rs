//! The top-level schema aggregate.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{Datasource, Enum, Generator, Model};
use crate::span::SourceLocation;

/// A complete parsed schema.
///
/// Models and enums are ordered `Vec`s rather than maps so duplicate
/// declarations survive until the uniqueness pass can report them; lookup
/// helpers return the first declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Detected or hinted format version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<SmolStr>,
    /// Datasource blocks (at most one is effective).
    pub datasources: Vec<Datasource>,
    /// Generator blocks.
    pub generators: Vec<Generator>,
    /// Model definitions in source order.
    pub models: Vec<Model>,
    /// Enum definitions in source order.
    pub enums: Vec<Enum>,
    /// Location spanning the whole source.
    pub location: SourceLocation,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a model by name (first declaration wins).
    pub fn get_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name() == name)
    }

    /// Get an enum by name (first declaration wins).
    pub fn get_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name() == name)
    }

    /// The effective datasource used for provider-specific validation.
    pub fn datasource(&self) -> Option<&Datasource> {
        self.datasources.first()
    }

    /// Check if a type name is declared as a model or enum.
    pub fn type_exists(&self, name: &str) -> bool {
        self.get_model(name).is_some() || self.get_enum(name).is_some()
    }

    /// All model names in source order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name())
    }

    /// True when the schema declares nothing at all.
    pub fn is_empty(&self) -> bool {
        self.datasources.is_empty()
            && self.generators.is_empty()
            && self.models.is_empty()
            && self.enums.is_empty()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Schema({} models, {} enums, {} datasources, {} generators)",
            self.models.len(),
            self.enums.len(),
            self.datasources.len(),
            self.generators.len()
        )
    }
}
