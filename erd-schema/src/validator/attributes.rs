//! Attribute placement and argument checks.
//!
//! Runs after type resolution, so field types are final and `@default` can be
//! checked against the field's scalar or enum type.

use crate::ast::{
    BlockAttributeKind, DefaultValue, Field, FieldAttributeKind, FieldType, LiteralValue, Model,
    ScalarType, Schema, KNOWN_DEFAULT_FUNCTIONS,
};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};

const KNOWN_FIELD_ATTRIBUTES: &[&str] =
    &["id", "unique", "default", "relation", "map", "updatedAt", "ignore"];

pub(super) fn check(schema: &Schema, diagnostics: &mut ErrorCollection) {
    for model in &schema.models {
        check_model(schema, model, diagnostics);
    }
    for definition in &schema.enums {
        for attr in &definition.attributes {
            if let BlockAttributeKind::Unknown { name } = &attr.kind {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4001,
                    format!("Unknown attribute `@@{name}` on enum `{}`", definition.name()),
                    attr.location,
                ));
            }
        }
    }
}

fn check_model(schema: &Schema, model: &Model, diagnostics: &mut ErrorCollection) {
    check_primary_key(model, diagnostics);

    for field in &model.fields {
        check_field(schema, model, field, diagnostics);
    }
    check_block_attributes(model, diagnostics);
}

fn check_primary_key(model: &Model, diagnostics: &mut ErrorCollection) {
    let id_fields: Vec<&Field> = model.id_fields().collect();

    if !id_fields.is_empty() && model.composite_id().is_some() {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E4008,
            format!(
                "Model `{}` declares both an `@id` field and an `@@id` block attribute",
                model.name()
            ),
            model.composite_id().map(|a| a.location).unwrap_or(model.location),
        ));
    } else if id_fields.len() > 1 {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E4008,
            format!("Model `{}` declares more than one `@id` field", model.name()),
            id_fields[1].location,
        ));
    } else if id_fields.is_empty() && model.composite_id().is_none() && !model.is_ignored() {
        diagnostics.push(
            Diagnostic::new(
                ErrorCode::E4003,
                format!(
                    "Model `{}` must define an `@id` field or an `@@id` block attribute",
                    model.name()
                ),
                model.name.location,
            )
            .with_suggestion("Add a field like `id Int @id @default(autoincrement())`"),
        );
    }
}

fn check_field(schema: &Schema, model: &Model, field: &Field, diagnostics: &mut ErrorCollection) {
    let mut seen: Vec<&str> = vec![];
    for attr in &field.attributes {
        let name = attr.kind.name();
        if seen.contains(&name) {
            let code = if matches!(attr.kind, FieldAttributeKind::Id { .. }) {
                ErrorCode::E4008
            } else {
                ErrorCode::E4004
            };
            diagnostics.push(Diagnostic::new(
                code,
                format!(
                    "Duplicate `@{name}` attribute on field `{}.{}`",
                    model.name(),
                    field.name()
                ),
                attr.location,
            ));
            continue;
        }
        seen.push(name);

        match &attr.kind {
            FieldAttributeKind::Id { .. } if field.is_optional() => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4007,
                    format!(
                        "`@id` field `{}.{}` cannot be optional",
                        model.name(),
                        field.name()
                    ),
                    attr.location,
                ));
            }
            FieldAttributeKind::UpdatedAt
                if field.field_type != FieldType::Scalar(ScalarType::DateTime) =>
            {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4002,
                    format!(
                        "`@updatedAt` requires a `DateTime` field, but `{}.{}` is `{}`",
                        model.name(),
                        field.name(),
                        field.field_type
                    ),
                    attr.location,
                ));
            }
            FieldAttributeKind::Relation { .. } if !field.field_type.is_relation() => {
                // An unresolved type was already reported by the resolve pass.
                if !field.field_type.is_unresolved() {
                    diagnostics.push(Diagnostic::new(
                        ErrorCode::E5002,
                        format!(
                            "`@relation` is only valid on model-typed fields, but `{}.{}` is `{}`",
                            model.name(),
                            field.name(),
                            field.field_type
                        ),
                        attr.location,
                    ));
                }
            }
            FieldAttributeKind::Default { value } => {
                check_default(schema, model, field, value, attr.location, diagnostics);
            }
            FieldAttributeKind::Unknown { name } => {
                let mut diagnostic = Diagnostic::new(
                    ErrorCode::E4001,
                    format!(
                        "Unknown attribute `@{name}` on field `{}.{}`",
                        model.name(),
                        field.name()
                    ),
                    attr.location,
                );
                if let Some(known) = KNOWN_FIELD_ATTRIBUTES
                    .iter()
                    .find(|k| k.eq_ignore_ascii_case(name))
                {
                    diagnostic = diagnostic.with_suggestion(format!("Did you mean `@{known}`?"));
                }
                diagnostics.push(diagnostic);
            }
            _ => {}
        }
    }
}

fn check_default(
    schema: &Schema,
    model: &Model,
    field: &Field,
    value: &DefaultValue,
    location: crate::span::SourceLocation,
    diagnostics: &mut ErrorCollection,
) {
    let describe = |msg: String| {
        Diagnostic::new(
            ErrorCode::E4005,
            format!("{msg} (field `{}.{}`)", model.name(), field.name()),
            location,
        )
    };

    if field.field_type.is_relation() {
        diagnostics.push(describe("Relation fields cannot have `@default`".into()));
        return;
    }

    match value {
        // Raw database expressions are passed through unchecked.
        DefaultValue::DbGenerated { .. } => {}
        DefaultValue::Function { name, .. } => {
            if !KNOWN_DEFAULT_FUNCTIONS.contains(&name.as_str()) {
                diagnostics.push(describe(format!("Unknown default function `{name}()`")));
                return;
            }
            let ok = match &field.field_type {
                FieldType::Scalar(ScalarType::String) => {
                    matches!(name.as_str(), "uuid" | "cuid" | "now")
                }
                FieldType::Scalar(ScalarType::Int | ScalarType::BigInt) => {
                    name.as_str() == "autoincrement"
                }
                FieldType::Scalar(ScalarType::DateTime) => name.as_str() == "now",
                FieldType::Scalar(ScalarType::ObjectId) => name.as_str() == "auto",
                _ => false,
            };
            if !ok {
                diagnostics.push(describe(format!(
                    "`{name}()` cannot be the default for a `{}` field",
                    field.field_type
                )));
            }
        }
        DefaultValue::Literal { value: literal } => {
            check_default_literal(schema, model, field, literal, location, diagnostics)
        }
    }
}

fn check_default_literal(
    schema: &Schema,
    model: &Model,
    field: &Field,
    literal: &LiteralValue,
    location: crate::span::SourceLocation,
    diagnostics: &mut ErrorCollection,
) {
    let ok = match (&field.field_type, literal) {
        (FieldType::Scalar(ScalarType::String | ScalarType::Json), LiteralValue::String(_)) => true,
        (FieldType::Scalar(ScalarType::Int | ScalarType::BigInt), LiteralValue::Int(_)) => true,
        (
            FieldType::Scalar(ScalarType::Float | ScalarType::Decimal),
            LiteralValue::Int(_) | LiteralValue::Float(_),
        ) => true,
        (FieldType::Scalar(ScalarType::Boolean), LiteralValue::Boolean(_)) => true,
        (FieldType::Enum(enum_name), LiteralValue::Constant(constant)) => {
            let declared = schema
                .get_enum(enum_name)
                .is_some_and(|e| e.get_value(constant).is_some());
            if !declared {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4005,
                    format!(
                        "`{constant}` is not a value of enum `{enum_name}` (field `{}.{}`)",
                        model.name(),
                        field.name()
                    ),
                    location,
                ));
            }
            return;
        }
        // Unresolved types were already reported; do not pile on.
        (FieldType::Unresolved(_), _) => true,
        _ => false,
    };

    if !ok {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E4005,
            format!(
                "Default value `{literal}` does not match the `{}` type of field `{}.{}`",
                field.field_type,
                model.name(),
                field.name()
            ),
            location,
        ));
    }
}

fn check_block_attributes(model: &Model, diagnostics: &mut ErrorCollection) {
    let mut seen: Vec<&str> = vec![];
    for attr in &model.attributes {
        let name = attr.kind.name();
        // @@unique and @@index may appear any number of times.
        let repeatable = matches!(
            attr.kind,
            BlockAttributeKind::Unique { .. } | BlockAttributeKind::Index { .. }
        );
        if !repeatable {
            if seen.contains(&name) {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4004,
                    format!(
                        "Duplicate `@@{name}` attribute on model `{}`",
                        model.name()
                    ),
                    attr.location,
                ));
                continue;
            }
            seen.push(name);
        }

        match &attr.kind {
            BlockAttributeKind::Id { fields, .. } => {
                check_field_list(model, fields, ErrorCode::E4009, "@@id", attr.location, diagnostics);
            }
            BlockAttributeKind::Unique { fields, .. } => {
                check_field_list(
                    model,
                    fields,
                    ErrorCode::E4010,
                    "@@unique",
                    attr.location,
                    diagnostics,
                );
            }
            BlockAttributeKind::Index { fields, .. } => {
                let names: Vec<smol_str::SmolStr> =
                    fields.iter().map(|f| f.name.clone()).collect();
                check_field_list(
                    model,
                    &names,
                    ErrorCode::E4011,
                    "@@index",
                    attr.location,
                    diagnostics,
                );
            }
            BlockAttributeKind::Unknown { name } => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4001,
                    format!("Unknown attribute `@@{name}` on model `{}`", model.name()),
                    attr.location,
                ));
            }
            _ => {}
        }
    }
}

fn check_field_list(
    model: &Model,
    fields: &[smol_str::SmolStr],
    code: ErrorCode,
    attribute: &str,
    location: crate::span::SourceLocation,
    diagnostics: &mut ErrorCollection,
) {
    if fields.is_empty() {
        diagnostics.push(Diagnostic::new(
            code,
            format!("`{attribute}` on model `{}` lists no fields", model.name()),
            location,
        ));
        return;
    }
    for name in fields {
        if model.get_field(name).is_none() {
            diagnostics.push(Diagnostic::new(
                code,
                format!(
                    "`{attribute}` on model `{}` references unknown field `{name}`",
                    model.name()
                ),
                location,
            ));
        }
    }
}
