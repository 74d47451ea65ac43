//! Duplicate declarations.
//!
//! Models and enums share one type namespace. The first declaration of a name
//! always wins; every later declaration is reported at its own location.

use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::ast::Schema;
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};

pub(super) fn check(schema: &Schema, diagnostics: &mut ErrorCollection) {
    let mut type_names: IndexSet<SmolStr> = IndexSet::new();

    for model in &schema.models {
        if !type_names.insert(model.name.name.clone()) {
            diagnostics.push(
                Diagnostic::new(
                    ErrorCode::E2002,
                    format!("Duplicate model name `{}`", model.name()),
                    model.name.location,
                )
                .with_suggestion(format!("Rename one of the `{}` declarations", model.name())),
            );
        }

        let mut field_names: IndexSet<SmolStr> = IndexSet::new();
        for field in &model.fields {
            if !field_names.insert(field.name.name.clone()) {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E3002,
                    format!(
                        "Duplicate field name `{}` on model `{}`",
                        field.name(),
                        model.name()
                    ),
                    field.name.location,
                ));
            }
        }
    }

    for definition in &schema.enums {
        if !type_names.insert(definition.name.name.clone()) {
            diagnostics.push(
                Diagnostic::new(
                    ErrorCode::E6002,
                    format!("Duplicate enum name `{}`", definition.name()),
                    definition.name.location,
                )
                .with_suggestion(format!(
                    "Rename one of the `{}` declarations",
                    definition.name()
                )),
            );
        }

        let mut value_names: IndexSet<SmolStr> = IndexSet::new();
        for value in &definition.values {
            if !value_names.insert(value.name.name.clone()) {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E6004,
                    format!(
                        "Duplicate value `{}` in enum `{}`",
                        value.name,
                        definition.name()
                    ),
                    value.name.location,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_schema;
    use crate::parser;
    use crate::scanner::Lexer;
    use pretty_assertions::assert_eq;

    fn validate(source: &str) -> ErrorCollection {
        let mut diagnostics = ErrorCollection::new();
        let tokens = Lexer::tokenize(source, &mut diagnostics);
        let tree = parser::parse_tree(tokens, &mut diagnostics);
        let schema = build_schema(&tree, &mut diagnostics);
        check(&schema, &mut diagnostics);
        diagnostics
    }

    #[test]
    fn test_duplicate_model_reported_at_second_occurrence() {
        let diagnostics =
            validate("model User {\n  id Int @id\n}\nmodel User {\n  id Int @id\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E2002), 1);
        let d = diagnostics.errors().next().unwrap();
        assert_eq!(d.location.line, 4);
    }

    #[test]
    fn test_triplicate_model_reported_twice() {
        let diagnostics = validate(
            "model User {\n  id Int @id\n}\nmodel User {\n  id Int @id\n}\nmodel User {\n  id Int @id\n}",
        );
        assert_eq!(diagnostics.count_of(ErrorCode::E2002), 2);
    }

    #[test]
    fn test_enum_sharing_model_name() {
        let diagnostics = validate("model Role {\n  id Int @id\n}\nenum Role {\n  USER\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E6002), 1);
    }

    #[test]
    fn test_duplicate_field() {
        let diagnostics = validate("model User {\n  id Int @id\n  email String\n  email String\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E3002), 1);
        let d = diagnostics.errors().next().unwrap();
        assert_eq!(d.location.line, 4);
    }

    #[test]
    fn test_duplicate_enum_value() {
        let diagnostics = validate("enum Role {\n  USER\n  ADMIN\n  USER\n}");
        assert_eq!(diagnostics.count_of(ErrorCode::E6004), 1);
    }

    #[test]
    fn test_distinct_names_pass() {
        let diagnostics = validate(
            "model User {\n  id Int @id\n}\nmodel Post {\n  id Int @id\n}\nenum Role {\n  USER\n  ADMIN\n}",
        );
        assert!(!diagnostics.has_errors());
    }
}
