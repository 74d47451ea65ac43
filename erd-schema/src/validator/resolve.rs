//! Type resolution.
//!
//! Rewrites [`FieldType::Unresolved`] names against the schema's name table.
//! Names that resolve to nothing are reported once per occurrence and stay
//! `Unresolved` so tooling can still render the field.

use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::ast::{FieldType, ScalarType, Schema, TypeModifier};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};

pub(super) fn check(schema: &mut Schema, diagnostics: &mut ErrorCollection) {
    let model_names: IndexSet<SmolStr> =
        schema.models.iter().map(|m| m.name.name.clone()).collect();
    let enum_names: IndexSet<SmolStr> = schema.enums.iter().map(|e| e.name.name.clone()).collect();

    for model in &mut schema.models {
        let model_name = model.name.name.clone();
        for field in &mut model.fields {
            if field.modifier == TypeModifier::OptionalList {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E3007,
                    format!(
                        "Field `{}.{}` cannot be an optional list; lists are never null",
                        model_name,
                        field.name()
                    ),
                    field.location,
                ));
            }

            let FieldType::Unresolved(name) = &field.field_type else {
                continue;
            };
            if model_names.contains(name) {
                field.field_type = FieldType::Model(name.clone());
            } else if enum_names.contains(name) {
                field.field_type = FieldType::Enum(name.clone());
            } else if let Some(scalar) = scalar_case_fix(name) {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorCode::E3004,
                        format!(
                            "Unknown type `{}` for field `{}.{}`",
                            name,
                            model_name,
                            field.name()
                        ),
                        field.location,
                    )
                    .with_suggestion(format!("Did you mean `{}`?", scalar.as_str())),
                );
            } else {
                let mut diagnostic = Diagnostic::new(
                    ErrorCode::E3006,
                    format!(
                        "Unknown type `{}` for field `{}.{}`",
                        name,
                        model_name,
                        field.name()
                    ),
                    field.location,
                );
                if let Some(close) = close_match(name, &model_names, &enum_names) {
                    diagnostic = diagnostic.with_suggestion(format!("Did you mean `{close}`?"));
                }
                diagnostics.push(diagnostic);
            }
        }
    }
}

/// A scalar keyword written with the wrong casing (`string`, `DATETIME`).
///
/// Exact scalar matches never reach this pass; the builder classifies them
/// directly.
fn scalar_case_fix(name: &str) -> Option<ScalarType> {
    [
        ScalarType::String,
        ScalarType::Boolean,
        ScalarType::Int,
        ScalarType::BigInt,
        ScalarType::Float,
        ScalarType::Decimal,
        ScalarType::DateTime,
        ScalarType::Json,
        ScalarType::Bytes,
        ScalarType::ObjectId,
    ]
    .into_iter()
    .find(|s| s.as_str().eq_ignore_ascii_case(name))
}

/// A declared type name differing only in case.
fn close_match(
    name: &str,
    model_names: &IndexSet<SmolStr>,
    enum_names: &IndexSet<SmolStr>,
) -> Option<SmolStr> {
    model_names
        .iter()
        .chain(enum_names.iter())
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_schema;
    use crate::parser;
    use crate::scanner::Lexer;
    use pretty_assertions::assert_eq;

    fn validate(source: &str) -> (Schema, ErrorCollection) {
        let mut diagnostics = ErrorCollection::new();
        let tokens = Lexer::tokenize(source, &mut diagnostics);
        let tree = parser::parse_tree(tokens, &mut diagnostics);
        let mut schema = build_schema(&tree, &mut diagnostics);
        check(&mut schema, &mut diagnostics);
        (schema, diagnostics)
    }

    #[test]
    fn test_resolve_model_and_enum_references() {
        let (schema, diagnostics) = validate(
            "model Post {\n  id Int @id\n  author User\n  status Status\n}\nmodel User {\n  id Int @id\n}\nenum Status {\n  DRAFT\n}",
        );
        assert!(!diagnostics.has_errors());
        let post = schema.get_model("Post").unwrap();
        assert_eq!(
            post.get_field("author").unwrap().field_type,
            FieldType::Model("User".into())
        );
        assert_eq!(
            post.get_field("status").unwrap().field_type,
            FieldType::Enum("Status".into())
        );
    }

    #[test]
    fn test_unknown_type_stays_unresolved() {
        let (schema, diagnostics) = validate("model Post {\n  id Int @id\n  author User\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E3006), 1);
        let post = schema.get_model("Post").unwrap();
        assert!(post.get_field("author").unwrap().field_type.is_unresolved());
    }

    #[test]
    fn test_unknown_type_reported_per_occurrence() {
        let (_, diagnostics) = validate(
            "model Post {\n  id Int @id\n  author User\n  editor User\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E3006), 2);
    }

    #[test]
    fn test_miscased_scalar_suggests_fix() {
        let (_, diagnostics) = validate("model Post {\n  id Int @id\n  title string\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E3004), 1);
        let d = diagnostics.errors().next().unwrap();
        assert_eq!(d.suggestions[0], "Did you mean `String`?");
    }

    #[test]
    fn test_miscased_model_suggests_fix() {
        let (_, diagnostics) = validate(
            "model Post {\n  id Int @id\n  author user\n}\nmodel User {\n  id Int @id\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E3006), 1);
        let d = diagnostics.errors().next().unwrap();
        assert_eq!(d.suggestions[0], "Did you mean `User`?");
    }

    #[test]
    fn test_optional_list_rejected() {
        let (_, diagnostics) = validate("model Post {\n  id Int @id\n  tags String[]?\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E3007), 1);
    }
}
