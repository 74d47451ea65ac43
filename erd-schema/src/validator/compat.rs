//! Provider and version compatibility, plus advisory lints.
//!
//! Version-gated checks only run when the caller supplies a format version
//! hint; a schema file does not encode its own format version.

use crate::ast::{
    BlockAttributeKind, FieldType, Model, Provider, RelationMode, ScalarType, Schema,
};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};

/// Format version that introduced `relationMode`.
const RELATION_MODE_SINCE: (u32, u32) = (4, 8);

/// Preview features folded into the stable surface as of 5.0.
const GA_PREVIEW_FEATURES: &[&str] =
    &["extendedWhereUnique", "fieldReference", "filteredRelationCount"];

/// Field names that look like a last-modified timestamp.
const UPDATED_AT_NAMES: &[&str] = &["updatedAt", "updated_at", "lastUpdated", "modifiedAt"];

/// Models with more fields than this draw a readability warning.
const LARGE_MODEL_FIELDS: usize = 50;

pub(super) fn check(schema: &Schema, version_hint: Option<&str>, diagnostics: &mut ErrorCollection) {
    check_datasource(schema, diagnostics);
    if let Some(version) = version_hint {
        check_version(schema, version, diagnostics);
    }
    lint(schema, diagnostics);
}

fn check_datasource(schema: &Schema, diagnostics: &mut ErrorCollection) {
    let Some(datasource) = schema.datasource() else {
        return;
    };

    match &datasource.provider {
        Provider::Other(name) if name.is_empty() => {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E4003,
                format!(
                    "Datasource `{}` is missing a `provider` property",
                    datasource.name
                ),
                datasource.location,
            ));
        }
        Provider::Other(name) => {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E7004,
                format!("Provider `{name}` is not supported"),
                datasource.location,
            ));
        }
        _ => {}
    }

    let uses_multi_schema = !datasource.schemas.is_empty()
        || schema.models.iter().any(has_schema_attribute)
        || schema
            .enums
            .iter()
            .any(|e| e.attributes.iter().any(|a| matches!(a.kind, BlockAttributeKind::Schema { .. })));
    if uses_multi_schema && !datasource.provider.supports_multi_schema() {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E7004,
            format!(
                "Provider `{}` does not support multiple database schemas",
                datasource.provider
            ),
            datasource.location,
        ));
    }

    if datasource.relation_mode == Some(RelationMode::Prisma) {
        if !datasource.provider.supports_emulated_relations() {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E7005,
                format!(
                    "`relationMode = \"prisma\"` is not supported on provider `{}`",
                    datasource.provider
                ),
                datasource.location,
            ));
        } else {
            diagnostics.push(Diagnostic::from_code(
                ErrorCode::W5001,
                datasource.location,
            ));
        }
    }
}

fn has_schema_attribute(model: &Model) -> bool {
    model
        .attributes
        .iter()
        .any(|a| matches!(a.kind, BlockAttributeKind::Schema { .. }))
}

fn check_version(schema: &Schema, version: &str, diagnostics: &mut ErrorCollection) {
    let location = schema.location;
    let Some(parsed) = parse_version(version) else {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E7001,
            format!("`{version}` is not a valid format version"),
            location,
        ));
        return;
    };
    if parsed.0 < 2 {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E7001,
            format!("Format version `{version}` is no longer supported"),
            location,
        ));
        return;
    }

    if parsed < RELATION_MODE_SINCE
        && schema
            .datasource()
            .is_some_and(|d| d.relation_mode.is_some())
    {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E7002,
            format!(
                "`relationMode` requires format version {}.{} or newer (have {version})",
                RELATION_MODE_SINCE.0, RELATION_MODE_SINCE.1
            ),
            schema.datasource().map(|d| d.location).unwrap_or(location),
        ));
    }

    if parsed >= (5, 0) {
        for generator in &schema.generators {
            for feature in &generator.preview_features {
                if GA_PREVIEW_FEATURES.contains(&feature.as_str()) {
                    diagnostics.push(Diagnostic::new(
                        ErrorCode::E7003,
                        format!(
                            "Preview feature `{feature}` is generally available since 5.0 and can be removed"
                        ),
                        generator.location,
                    ));
                }
            }
        }
    }
}

/// Parse `"4.8"`, `"4.8.1"`, or `"v4.8"` into (major, minor).
fn parse_version(version: &str) -> Option<(u32, u32)> {
    let version = version.strip_prefix('v').unwrap_or(version);
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = match parts.next() {
        Some(part) => part.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

// ==================== Lints ====================

fn lint(schema: &Schema, diagnostics: &mut ErrorCollection) {
    let emulated = schema
        .datasource()
        .is_some_and(|d| d.relation_mode == Some(RelationMode::Prisma));

    for model in &schema.models {
        if schema.models.len() >= 2 && !model.is_ignored() && is_isolated(schema, model) {
            diagnostics.push(Diagnostic::new(
                ErrorCode::W1001,
                format!("Model `{}` has no relations to any other model", model.name()),
                model.name.location,
            ));
        }

        if model.fields.len() > LARGE_MODEL_FIELDS {
            diagnostics.push(Diagnostic::new(
                ErrorCode::W4001,
                format!(
                    "Model `{}` has {} fields; consider splitting it",
                    model.name(),
                    model.fields.len()
                ),
                model.name.location,
            ));
        }

        for field in &model.fields {
            if field.field_type == FieldType::Scalar(ScalarType::DateTime)
                && !field.is_updated_at()
                && UPDATED_AT_NAMES.contains(&field.name())
            {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::W2001,
                    format!(
                        "Field `{}.{}` looks like a modification timestamp; consider `@updatedAt`",
                        model.name(),
                        field.name()
                    ),
                    field.location,
                ));
            }
        }

        if emulated {
            lint_unindexed_foreign_keys(model, diagnostics);
        }
    }
}

/// No relation fields on the model, and no other model points at it.
fn is_isolated(schema: &Schema, model: &Model) -> bool {
    if model.relation_fields().next().is_some() {
        return false;
    }
    !schema.models.iter().any(|other| {
        other
            .relation_fields()
            .any(|f| f.field_type.type_name() == model.name())
    })
}

/// With emulated relations the database has no foreign-key indexes, so
/// unindexed FK columns degrade every join.
fn lint_unindexed_foreign_keys(model: &Model, diagnostics: &mut ErrorCollection) {
    for field in model.relation_fields() {
        let Some(relation) = field.relation() else {
            continue;
        };
        for fk_name in &relation.fields {
            let indexed = model
                .get_field(fk_name)
                .is_some_and(|f| f.is_unique() || f.is_id())
                || model.attributes.iter().any(|a| match &a.kind {
                    BlockAttributeKind::Id { fields, .. }
                    | BlockAttributeKind::Unique { fields, .. } => fields.first() == Some(fk_name),
                    BlockAttributeKind::Index { fields, .. } => {
                        fields.first().map(|f| &f.name) == Some(fk_name)
                    }
                    _ => false,
                });
            if !indexed {
                diagnostics.push(
                    Diagnostic::new(
                        ErrorCode::W3001,
                        format!(
                            "Foreign-key field `{}.{fk_name}` is not indexed",
                            model.name()
                        ),
                        field.location,
                    )
                    .with_suggestion(format!("Add `@@index([{fk_name}])` to `{}`", model.name())),
                );
            }
        }
    }
}
