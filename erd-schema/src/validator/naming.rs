//! Naming conventions and reserved names.

use std::sync::LazyLock;

use convert_case::{Case, Casing};
use regex_lite::Regex;

use crate::ast::{Enum, Model, ScalarType, Schema};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};

static PASCAL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Z][a-zA-Z0-9]*$").expect("valid pattern"));
static CAMEL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z][a-zA-Z0-9]*$").expect("valid pattern"));

/// Type names that would shadow a built-in scalar.
fn is_reserved_type_name(name: &str) -> bool {
    ScalarType::from_str(name).is_some()
}

pub(super) fn check(schema: &Schema, diagnostics: &mut ErrorCollection) {
    for model in &schema.models {
        check_model(model, diagnostics);
    }
    for definition in &schema.enums {
        check_enum(definition, diagnostics);
    }
}

fn check_model(model: &Model, diagnostics: &mut ErrorCollection) {
    let name = model.name();
    if is_reserved_type_name(name) {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E2005,
            format!("Model name `{name}` shadows a built-in type"),
            model.name.location,
        ));
    } else if name.starts_with('_') {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E2004,
            format!("Model name `{name}` must start with a letter"),
            model.name.location,
        ));
    } else if !PASCAL_CASE.is_match(name) {
        diagnostics.push(
            Diagnostic::new(
                ErrorCode::E2001,
                format!("Model name `{name}` must be PascalCase"),
                model.name.location,
            )
            .with_suggestion(format!("Rename to `{}`", name.to_case(Case::Pascal))),
        );
    }

    for field in &model.fields {
        let field_name = field.name();
        if field_name.starts_with('_') {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E3008,
                format!(
                    "Field name `{field_name}` on `{name}` is reserved (leading underscore)"
                ),
                field.name.location,
            ));
        } else if !CAMEL_CASE.is_match(field_name) {
            diagnostics.push(
                Diagnostic::new(
                    ErrorCode::E3001,
                    format!("Field name `{field_name}` on `{name}` must be camelCase"),
                    field.name.location,
                )
                .with_suggestion(format!("Rename to `{}`", field_name.to_case(Case::Camel))),
            );
        }
    }
}

fn check_enum(definition: &Enum, diagnostics: &mut ErrorCollection) {
    let name = definition.name();
    if is_reserved_type_name(name) {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E6006,
            format!("Enum name `{name}` shadows a built-in type"),
            definition.name.location,
        ));
    } else if !PASCAL_CASE.is_match(name) {
        diagnostics.push(
            Diagnostic::new(
                ErrorCode::E6001,
                format!("Enum name `{name}` must be PascalCase"),
                definition.name.location,
            )
            .with_suggestion(format!("Rename to `{}`", name.to_case(Case::Pascal))),
        );
    }

    for value in &definition.values {
        if value.name.as_str().starts_with('_') {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E6005,
                format!(
                    "Enum value `{}` in `{name}` must start with a letter",
                    value.name
                ),
                value.name.location,
            ));
        }
    }
}
