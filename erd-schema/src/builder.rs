//! Builds the typed AST from the untyped parse tree.
//!
//! Type names are classified into scalars and named references here; named
//! references start out [`FieldType::Unresolved`] and are rewritten by the
//! type-resolution pass once the whole name table is known. Attribute
//! arguments are checked for shape (arity and literal kinds) in this module;
//! semantic checks against the rest of the schema belong to the validator.

use smol_str::SmolStr;

use crate::ast::{
    BlockAttribute, BlockAttributeKind, Datasource, DatasourceUrl, DefaultValue, Documentation,
    Enum, EnumValue, Field, FieldAttribute, FieldAttributeKind, FieldType, Generator, Ident,
    IndexField, IndexType, LiteralValue, Model, Provider, RelationAttribute, RelationMode,
    ReferentialAction, ScalarType, Schema, SortOrder,
};
use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection};
use crate::parser::{AttributeNode, Block, BlockKind, Member, SchemaTree, ValueNode};
use crate::span::SourceLocation;

/// Build a typed [`Schema`] from the parse tree.
///
/// Entities with shape problems (an empty model, a malformed attribute) are
/// still added so downstream tooling can display them; the problems are
/// reported into `diagnostics`.
pub fn build_schema(tree: &SchemaTree, diagnostics: &mut ErrorCollection) -> Schema {
    let mut schema = Schema::new();

    for block in &tree.blocks {
        match block.kind {
            BlockKind::Model => schema.models.push(build_model(block, diagnostics)),
            BlockKind::Enum => schema.enums.push(build_enum(block, diagnostics)),
            BlockKind::Datasource => schema.datasources.push(build_datasource(block, diagnostics)),
            BlockKind::Generator => schema.generators.push(build_generator(block, diagnostics)),
        }
    }

    schema.location = tree
        .blocks
        .iter()
        .map(|b| b.location)
        .reduce(SourceLocation::merge)
        .unwrap_or_default();
    schema
}

fn documentation(text: &Option<String>, location: SourceLocation) -> Option<Documentation> {
    text.as_ref().map(|t| Documentation::new(t.clone(), location))
}

// ==================== Models ====================

fn build_model(block: &Block, diagnostics: &mut ErrorCollection) -> Model {
    let mut model = Model::new(block.name.clone(), block.location);
    model.documentation = documentation(&block.documentation, block.location);

    for member in &block.members {
        match member {
            Member::Field {
                name,
                type_name,
                modifier,
                attributes,
                documentation: doc,
                location,
            } => {
                let field_type = classify_type(type_name);
                let attributes = attributes
                    .iter()
                    .map(|a| build_field_attribute(a, diagnostics))
                    .collect();
                let mut field =
                    Field::new(name.clone(), field_type, *modifier, attributes, *location);
                field.documentation = documentation(doc, *location);
                model.fields.push(field);
            }
            Member::BlockAttribute(attr) => {
                model
                    .attributes
                    .push(build_block_attribute(attr, diagnostics));
            }
            _ => {}
        }
    }

    if model.fields.is_empty() {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E2003,
            format!("Model `{}` has no fields", model.name()),
            block.name.location,
        ));
    }
    model
}

/// Scalar keywords become [`FieldType::Scalar`]; everything else is a named
/// reference resolved later.
fn classify_type(type_name: &Ident) -> FieldType {
    match ScalarType::from_str(type_name.as_str()) {
        Some(scalar) => FieldType::Scalar(scalar),
        None => FieldType::Unresolved(type_name.name.clone()),
    }
}

// ==================== Enums ====================

fn build_enum(block: &Block, diagnostics: &mut ErrorCollection) -> Enum {
    let mut definition = Enum::new(block.name.clone(), block.location);
    definition.documentation = documentation(&block.documentation, block.location);

    for member in &block.members {
        match member {
            Member::EnumValue {
                name,
                attributes,
                documentation: doc,
                location,
            } => {
                let mut value = EnumValue::new(name.clone(), *location);
                value.documentation = documentation(doc, *location);
                for attr in attributes {
                    match attr.name.as_str() {
                        "map" => match attr.first_positional().and_then(ValueNode::as_str) {
                            Some(mapped) => value.mapped_name = Some(mapped.to_string()),
                            None => diagnostics.push(Diagnostic::new(
                                ErrorCode::E4003,
                                "`@map` requires a string argument",
                                attr.location,
                            )),
                        },
                        other => diagnostics.push(Diagnostic::new(
                            ErrorCode::E4001,
                            format!("Unknown attribute `@{other}` on enum value `{name}`"),
                            attr.location,
                        )),
                    }
                }
                definition.values.push(value);
            }
            Member::BlockAttribute(attr) => {
                definition
                    .attributes
                    .push(build_block_attribute(attr, diagnostics));
            }
            _ => {}
        }
    }

    if definition.values.is_empty() {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E6003,
            format!("Enum `{}` has no values", definition.name()),
            block.name.location,
        ));
    }
    definition
}

// ==================== Datasource / Generator ====================

fn build_datasource(block: &Block, diagnostics: &mut ErrorCollection) -> Datasource {
    let mut provider = Provider::Other(SmolStr::default());
    let mut url = None;
    let mut schemas = vec![];
    let mut relation_mode = None;

    for member in &block.members {
        let Member::Property {
            key,
            value,
            location,
        } = member
        else {
            continue;
        };
        match key.as_str() {
            "provider" => match value.as_str() {
                Some(p) => provider = Provider::from_str(p),
                None => diagnostics.push(Diagnostic::new(
                    ErrorCode::E4002,
                    "`provider` must be a string",
                    *location,
                )),
            },
            "url" | "directUrl" | "shadowDatabaseUrl" => {
                let parsed = match value {
                    ValueNode::Str(s) => Some(DatasourceUrl::direct(s.clone(), *location)),
                    ValueNode::Function { name, args } if name.as_str() == "env" => {
                        match args.first().and_then(|a| a.value.as_str()) {
                            Some(var) => Some(DatasourceUrl::from_env(var, *location)),
                            None => {
                                diagnostics.push(Diagnostic::new(
                                    ErrorCode::E4003,
                                    "`env()` requires a variable name",
                                    *location,
                                ));
                                None
                            }
                        }
                    }
                    _ => {
                        diagnostics.push(Diagnostic::new(
                            ErrorCode::E4002,
                            format!("`{}` must be a string or `env(\"VAR\")`", key.as_str()),
                            *location,
                        ));
                        None
                    }
                };
                // Only the primary url is kept on the datasource.
                if key.as_str() == "url" {
                    url = parsed;
                }
            }
            "schemas" => schemas = string_array(value, key, diagnostics, *location),
            "relationMode" => match value.as_str().and_then(RelationMode::from_str) {
                Some(mode) => relation_mode = Some(mode),
                None => diagnostics.push(Diagnostic::new(
                    ErrorCode::E4002,
                    "`relationMode` must be \"foreignKeys\" or \"prisma\"",
                    *location,
                )),
            },
            _ => {}
        }
    }

    let mut datasource = Datasource::new(block.name.clone(), provider, block.location);
    datasource.url = url;
    datasource.schemas = schemas;
    datasource.relation_mode = relation_mode;
    datasource
}

fn build_generator(block: &Block, diagnostics: &mut ErrorCollection) -> Generator {
    let mut generator = Generator::new(block.name.clone(), block.location);

    for member in &block.members {
        let Member::Property {
            key,
            value,
            location,
        } = member
        else {
            continue;
        };
        match key.as_str() {
            "provider" => generator.provider = value.as_str().map(String::from),
            "output" => generator.output = value.as_str().map(String::from),
            "previewFeatures" => {
                generator.preview_features = string_array(value, key, diagnostics, *location)
            }
            "binaryTargets" => {
                generator.binary_targets = string_array(value, key, diagnostics, *location)
            }
            _ => {}
        }
    }
    generator
}

fn string_array(
    value: &ValueNode,
    key: &Ident,
    diagnostics: &mut ErrorCollection,
    location: SourceLocation,
) -> Vec<String> {
    let ValueNode::Array(items) = value else {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E4002,
            format!("`{}` must be an array of strings", key.as_str()),
            location,
        ));
        return vec![];
    };
    items
        .iter()
        .filter_map(|item| match item.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4002,
                    format!("`{}` entries must be strings", key.as_str()),
                    location,
                ));
                None
            }
        })
        .collect()
}

// ==================== Field Attributes ====================

fn build_field_attribute(attr: &AttributeNode, diagnostics: &mut ErrorCollection) -> FieldAttribute {
    let kind = match attr.name.as_str() {
        "id" => FieldAttributeKind::Id {
            map: named_string(attr, "map"),
            sort: named_sort(attr, diagnostics),
        },
        "unique" => FieldAttributeKind::Unique {
            map: named_string(attr, "map"),
            sort: named_sort(attr, diagnostics),
        },
        "default" => match attr.first_positional() {
            Some(value) => match build_default_value(value, attr.location, diagnostics) {
                Some(value) => FieldAttributeKind::Default { value },
                None => FieldAttributeKind::Unknown {
                    name: "default".into(),
                },
            },
            None => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4003,
                    "`@default` requires a value argument",
                    attr.location,
                ));
                FieldAttributeKind::Unknown {
                    name: "default".into(),
                }
            }
        },
        "relation" => FieldAttributeKind::Relation {
            relation: build_relation_attribute(attr, diagnostics),
        },
        "map" => match attr.first_positional().and_then(ValueNode::as_str) {
            Some(name) => FieldAttributeKind::Map {
                name: name.to_string(),
            },
            None => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4003,
                    "`@map` requires a string argument",
                    attr.location,
                ));
                FieldAttributeKind::Unknown { name: "map".into() }
            }
        },
        "updatedAt" => FieldAttributeKind::UpdatedAt,
        "ignore" => FieldAttributeKind::Ignore,
        other => FieldAttributeKind::Unknown {
            name: SmolStr::new(other),
        },
    };
    FieldAttribute::new(kind, attr.location)
}

fn build_default_value(
    value: &ValueNode,
    location: SourceLocation,
    diagnostics: &mut ErrorCollection,
) -> Option<DefaultValue> {
    match value {
        ValueNode::Function { name, args } if name.as_str() == "dbgenerated" => {
            let expression = args
                .first()
                .and_then(|a| a.value.as_str())
                .unwrap_or_default()
                .to_string();
            Some(DefaultValue::DbGenerated { expression })
        }
        ValueNode::Function { name, args } => {
            let mut literals = vec![];
            for arg in args {
                match value_to_literal(&arg.value) {
                    Some(lit) => literals.push(lit),
                    None => {
                        diagnostics.push(Diagnostic::new(
                            ErrorCode::E4002,
                            format!("Invalid argument to `{}()` in `@default`", name.as_str()),
                            location,
                        ));
                        return None;
                    }
                }
            }
            Some(DefaultValue::Function {
                name: name.name.clone(),
                args: literals,
            })
        }
        other => match value_to_literal(other) {
            Some(lit) => Some(DefaultValue::Literal { value: lit }),
            None => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4002,
                    "Invalid `@default` argument",
                    location,
                ));
                None
            }
        },
    }
}

fn value_to_literal(value: &ValueNode) -> Option<LiteralValue> {
    match value {
        ValueNode::Str(s) => Some(LiteralValue::String(s.clone())),
        ValueNode::Int(i) => Some(LiteralValue::Int(*i)),
        ValueNode::Float(f) => Some(LiteralValue::Float(*f)),
        ValueNode::Constant(c) => Some(match c.as_str() {
            "true" => LiteralValue::Boolean(true),
            "false" => LiteralValue::Boolean(false),
            _ => LiteralValue::Constant(c.clone()),
        }),
        _ => None,
    }
}

fn build_relation_attribute(
    attr: &AttributeNode,
    diagnostics: &mut ErrorCollection,
) -> RelationAttribute {
    let mut relation = RelationAttribute::default();

    for arg in &attr.args {
        match arg.name.as_ref().map(Ident::as_str) {
            // The positional argument is the relation name.
            None | Some("name") => match &arg.value {
                ValueNode::Str(s) => relation.name = Some(SmolStr::new(s)),
                _ => diagnostics.push(Diagnostic::new(
                    ErrorCode::E4002,
                    "Relation name must be a string",
                    arg.location,
                )),
            },
            Some("fields") => relation.fields = name_list(&arg.value, "fields", diagnostics, arg.location),
            Some("references") => {
                relation.references = name_list(&arg.value, "references", diagnostics, arg.location)
            }
            Some(key @ ("onDelete" | "onUpdate")) => {
                match arg.value.as_constant().and_then(ReferentialAction::from_str) {
                    Some(action) if key == "onDelete" => relation.on_delete = Some(action),
                    Some(action) => relation.on_update = Some(action),
                    None => diagnostics.push(Diagnostic::new(
                        ErrorCode::E4002,
                        format!(
                            "`{key}` must be one of Cascade, Restrict, NoAction, SetNull, SetDefault"
                        ),
                        arg.location,
                    )),
                }
            }
            Some("map") => relation.map = arg.value.as_str().map(String::from),
            Some(other) => diagnostics.push(Diagnostic::new(
                ErrorCode::E4002,
                format!("Unknown `@relation` argument `{other}`"),
                arg.location,
            )),
        }
    }
    relation
}

/// An array of bare field names (`[authorId, tenantId]`).
fn name_list(
    value: &ValueNode,
    key: &str,
    diagnostics: &mut ErrorCollection,
    location: SourceLocation,
) -> Vec<SmolStr> {
    let ValueNode::Array(items) = value else {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E4002,
            format!("`{key}` must be an array of field names"),
            location,
        ));
        return vec![];
    };
    items
        .iter()
        .filter_map(|item| match item.as_constant() {
            Some(name) => Some(SmolStr::new(name)),
            None => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4002,
                    format!("`{key}` entries must be field names"),
                    location,
                ));
                None
            }
        })
        .collect()
}

fn named_string(attr: &AttributeNode, key: &str) -> Option<String> {
    attr.named(key).and_then(ValueNode::as_str).map(String::from)
}

fn named_sort(attr: &AttributeNode, diagnostics: &mut ErrorCollection) -> Option<SortOrder> {
    let value = attr.named("sort")?;
    match value.as_constant().and_then(SortOrder::from_str) {
        Some(sort) => Some(sort),
        None => {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E4002,
                "`sort` must be `Asc` or `Desc`",
                attr.location,
            ));
            None
        }
    }
}

// ==================== Block Attributes ====================

fn build_block_attribute(attr: &AttributeNode, diagnostics: &mut ErrorCollection) -> BlockAttribute {
    let kind = match attr.name.as_str() {
        "id" => BlockAttributeKind::Id {
            fields: required_name_list(attr, diagnostics),
            name: named_string(attr, "name"),
            map: named_string(attr, "map"),
        },
        "unique" => BlockAttributeKind::Unique {
            fields: required_name_list(attr, diagnostics),
            name: named_string(attr, "name"),
            map: named_string(attr, "map"),
        },
        "index" => BlockAttributeKind::Index {
            fields: index_fields(attr, diagnostics),
            name: named_string(attr, "name"),
            map: named_string(attr, "map"),
            index_type: index_type(attr, diagnostics),
        },
        "map" => match attr.first_positional().and_then(ValueNode::as_str) {
            Some(name) => BlockAttributeKind::Map {
                name: name.to_string(),
            },
            None => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4003,
                    "`@@map` requires a string argument",
                    attr.location,
                ));
                BlockAttributeKind::Unknown { name: "map".into() }
            }
        },
        "schema" => match attr.first_positional().and_then(ValueNode::as_str) {
            Some(name) => BlockAttributeKind::Schema {
                name: name.to_string(),
            },
            None => {
                diagnostics.push(Diagnostic::new(
                    ErrorCode::E4003,
                    "`@@schema` requires a string argument",
                    attr.location,
                ));
                BlockAttributeKind::Unknown {
                    name: "schema".into(),
                }
            }
        },
        "ignore" => BlockAttributeKind::Ignore,
        other => BlockAttributeKind::Unknown {
            name: SmolStr::new(other),
        },
    };
    BlockAttribute::new(kind, attr.location)
}

fn required_name_list(attr: &AttributeNode, diagnostics: &mut ErrorCollection) -> Vec<SmolStr> {
    let key = attr.name.as_str();
    match attr.first_positional().or_else(|| attr.named("fields")) {
        Some(value) => name_list(value, key, diagnostics, attr.location),
        None => {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E4003,
                format!("`@@{key}` requires a list of fields"),
                attr.location,
            ));
            vec![]
        }
    }
}

fn index_fields(attr: &AttributeNode, diagnostics: &mut ErrorCollection) -> Vec<IndexField> {
    let Some(value) = attr.first_positional().or_else(|| attr.named("fields")) else {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E4003,
            "`@@index` requires a list of fields",
            attr.location,
        ));
        return vec![];
    };
    let ValueNode::Array(items) = value else {
        diagnostics.push(Diagnostic::new(
            ErrorCode::E4002,
            "`@@index` fields must be an array",
            attr.location,
        ));
        return vec![];
    };

    let mut fields = vec![];
    for item in items {
        match item {
            ValueNode::Constant(name) => fields.push(IndexField::plain(name.clone())),
            // `title(sort: Desc, length: 10, ops: raw("..."))`
            ValueNode::Function { name, args } => {
                let mut field = IndexField::plain(name.name.clone());
                for arg in args {
                    match arg.name.as_ref().map(Ident::as_str) {
                        Some("sort") => {
                            field.sort = arg.value.as_constant().and_then(SortOrder::from_str);
                            if field.sort.is_none() {
                                diagnostics.push(Diagnostic::new(
                                    ErrorCode::E4002,
                                    "`sort` must be `Asc` or `Desc`",
                                    arg.location,
                                ));
                            }
                        }
                        Some("length") => match arg.value {
                            ValueNode::Int(n) if n >= 0 => field.length = Some(n as u32),
                            _ => diagnostics.push(Diagnostic::new(
                                ErrorCode::E4002,
                                "`length` must be a non-negative integer",
                                arg.location,
                            )),
                        },
                        Some("ops") => {
                            field.ops = arg.value.as_constant().map(SmolStr::new);
                        }
                        _ => diagnostics.push(Diagnostic::new(
                            ErrorCode::E4002,
                            format!("Unknown index field option on `{}`", name.as_str()),
                            arg.location,
                        )),
                    }
                }
                fields.push(field);
            }
            _ => diagnostics.push(Diagnostic::new(
                ErrorCode::E4002,
                "`@@index` entries must be field names",
                attr.location,
            )),
        }
    }
    fields
}

fn index_type(attr: &AttributeNode, diagnostics: &mut ErrorCollection) -> Option<IndexType> {
    let value = attr.named("type")?;
    match value.as_constant().and_then(IndexType::from_str) {
        Some(t) => Some(t),
        None => {
            diagnostics.push(Diagnostic::new(
                ErrorCode::E4002,
                "Unknown index type",
                attr.location,
            ));
            None
        }
    }
}
