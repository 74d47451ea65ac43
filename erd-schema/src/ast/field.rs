//! Field definitions.

use serde::{Deserialize, Serialize};

use super::{
    DefaultValue, Documentation, FieldAttribute, FieldAttributeKind, FieldType, Ident,
    RelationAttribute, TypeModifier,
};
use crate::span::SourceLocation;

/// A field in a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: Ident,
    /// Field type.
    pub field_type: FieldType,
    /// Type modifier (`?`, `[]`).
    pub modifier: TypeModifier,
    /// Field-level attributes.
    pub attributes: Vec<FieldAttribute>,
    /// Documentation comment.
    pub documentation: Option<Documentation>,
    /// Source location of the whole field line.
    pub location: SourceLocation,
}

impl Field {
    /// Create a new field.
    pub fn new(
        name: Ident,
        field_type: FieldType,
        modifier: TypeModifier,
        attributes: Vec<FieldAttribute>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name,
            field_type,
            modifier,
            attributes,
            documentation: None,
            location,
        }
    }

    /// Get the field name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Check if the field is optional.
    pub fn is_optional(&self) -> bool {
        self.modifier.is_optional()
    }

    /// Check if the field is a list.
    pub fn is_list(&self) -> bool {
        self.modifier.is_list()
    }

    /// Check if this field carries `@id`.
    pub fn is_id(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a.kind, FieldAttributeKind::Id { .. }))
    }

    /// Check if this field carries `@unique`.
    pub fn is_unique(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a.kind, FieldAttributeKind::Unique { .. }))
    }

    /// Check if this field carries `@ignore`.
    pub fn is_ignored(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a.kind, FieldAttributeKind::Ignore))
    }

    /// Check if this field carries `@updatedAt`.
    pub fn is_updated_at(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a.kind, FieldAttributeKind::UpdatedAt))
    }

    /// Check if this field's type references another model.
    pub fn is_relation(&self) -> bool {
        self.field_type.is_relation()
    }

    /// The `@default` value, if present.
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.attributes.iter().find_map(|a| match &a.kind {
            FieldAttributeKind::Default { value } => Some(value),
            _ => None,
        })
    }

    /// The `@relation` arguments, if present.
    pub fn relation(&self) -> Option<&RelationAttribute> {
        self.attributes.iter().find_map(|a| match &a.kind {
            FieldAttributeKind::Relation { relation } => Some(relation),
            _ => None,
        })
    }

    /// The database column name (`@map` or the field name).
    pub fn column_name(&self) -> &str {
        self.attributes
            .iter()
            .find_map(|a| match &a.kind {
                FieldAttributeKind::Map { name } => Some(name.as_str()),
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

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.name,
            self.field_type,
            self.modifier.suffix()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ScalarType;
    use pretty_assertions::assert_eq;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1, 0, 10)
    }

    fn field(name: &str, field_type: FieldType, attrs: Vec<FieldAttribute>) -> Field {
        Field::new(
            Ident::new(name, loc()),
            field_type,
            TypeModifier::Required,
            attrs,
            loc(),
        )
    }

    #[test]
    fn test_field_predicates() {
        let f = field(
            "id",
            FieldType::Scalar(ScalarType::Int),
            vec![FieldAttribute::new(
                FieldAttributeKind::Id {
                    map: None,
                    sort: None,
                },
                loc(),
            )],
        );
        assert!(f.is_id());
        assert!(!f.is_unique());
        assert!(!f.is_relation());
    }

    #[test]
    fn test_field_default_value() {
        let f = field(
            "count",
            FieldType::Scalar(ScalarType::Int),
            vec![FieldAttribute::new(
                FieldAttributeKind::Default {
                    value: DefaultValue::Literal {
                        value: crate::ast::LiteralValue::Int(0),
                    },
                },
                loc(),
            )],
        );
        assert!(f.default_value().is_some());
    }

    #[test]
    fn test_field_column_name_uses_map() {
        let f = field(
            "email",
            FieldType::Scalar(ScalarType::String),
            vec![FieldAttribute::new(
                FieldAttributeKind::Map {
                    name: "email_address".into(),
                },
                loc(),
            )],
        );
        assert_eq!(f.column_name(), "email_address");
    }

    #[test]
    fn test_field_column_name_falls_back() {
        let f = field("email", FieldType::Scalar(ScalarType::String), vec![]);
        assert_eq!(f.column_name(), "email");
    }

    #[test]
    fn test_field_display() {
        let mut f = field("posts", FieldType::Model("Post".into()), vec![]);
        f.modifier = TypeModifier::List;
        assert_eq!(f.to_string(), "posts Post[]");
    }
}
