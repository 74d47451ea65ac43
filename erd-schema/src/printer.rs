//! Renders a [`Schema`] back to schema text.
//!
//! The printer emits canonical formatting (two-space indent, one blank line
//! between blocks) rather than preserving input whitespace. Printing a built
//! schema and reparsing it yields an equivalent schema.

use std::fmt::Write;

use crate::ast::{
    BlockAttribute, BlockAttributeKind, Datasource, Documentation, Enum, Field, FieldAttribute,
    FieldAttributeKind, Generator, IndexField, Model, RelationAttribute, Schema,
};

/// Render `schema` as schema text.
pub fn print_schema(schema: &Schema) -> String {
    let mut out = String::new();
    let mut first = true;

    for datasource in &schema.datasources {
        separate(&mut out, &mut first);
        print_datasource(&mut out, datasource);
    }
    for generator in &schema.generators {
        separate(&mut out, &mut first);
        print_generator(&mut out, generator);
    }
    for model in &schema.models {
        separate(&mut out, &mut first);
        print_model(&mut out, model);
    }
    for definition in &schema.enums {
        separate(&mut out, &mut first);
        print_enum(&mut out, definition);
    }
    out
}

fn separate(out: &mut String, first: &mut bool) {
    if !*first {
        out.push('\n');
    }
    *first = false;
}

fn print_doc(out: &mut String, doc: &Option<Documentation>, indent: &str) {
    if let Some(doc) = doc {
        for line in doc.text.lines() {
            let _ = writeln!(out, "{indent}/// {line}");
        }
    }
}

fn print_datasource(out: &mut String, datasource: &Datasource) {
    let _ = writeln!(out, "datasource {} {{", datasource.name);
    let _ = writeln!(out, "  provider = \"{}\"", datasource.provider);
    if let Some(url) = &datasource.url {
        match &url.from_env {
            Some(var) => {
                let _ = writeln!(out, "  url = env(\"{var}\")");
            }
            None => {
                let _ = writeln!(out, "  url = \"{}\"", url.value);
            }
        }
    }
    if !datasource.schemas.is_empty() {
        let _ = writeln!(out, "  schemas = [{}]", quoted_list(&datasource.schemas));
    }
    if let Some(mode) = datasource.relation_mode {
        let mode = match mode {
            crate::ast::RelationMode::ForeignKeys => "foreignKeys",
            crate::ast::RelationMode::Prisma => "prisma",
        };
        let _ = writeln!(out, "  relationMode = \"{mode}\"");
    }
    out.push_str("}\n");
}

fn print_generator(out: &mut String, generator: &Generator) {
    let _ = writeln!(out, "generator {} {{", generator.name);
    if let Some(provider) = &generator.provider {
        let _ = writeln!(out, "  provider = \"{provider}\"");
    }
    if let Some(output) = &generator.output {
        let _ = writeln!(out, "  output = \"{output}\"");
    }
    if !generator.preview_features.is_empty() {
        let _ = writeln!(
            out,
            "  previewFeatures = [{}]",
            quoted_list(&generator.preview_features)
        );
    }
    if !generator.binary_targets.is_empty() {
        let _ = writeln!(
            out,
            "  binaryTargets = [{}]",
            quoted_list(&generator.binary_targets)
        );
    }
    out.push_str("}\n");
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_model(out: &mut String, model: &Model) {
    print_doc(out, &model.documentation, "");
    let _ = writeln!(out, "model {} {{", model.name);
    for field in &model.fields {
        print_field(out, field);
    }
    if !model.fields.is_empty() && !model.attributes.is_empty() {
        out.push('\n');
    }
    for attr in &model.attributes {
        print_block_attribute(out, attr);
    }
    out.push_str("}\n");
}

fn print_field(out: &mut String, field: &Field) {
    print_doc(out, &field.documentation, "  ");
    let _ = write!(
        out,
        "  {} {}{}",
        field.name,
        field.field_type,
        field.modifier.suffix()
    );
    for attr in &field.attributes {
        out.push(' ');
        print_field_attribute(out, attr);
    }
    out.push('\n');
}

fn print_field_attribute(out: &mut String, attr: &FieldAttribute) {
    match &attr.kind {
        FieldAttributeKind::Id { map, sort } => {
            out.push_str("@id");
            print_map_sort(out, map, sort);
        }
        FieldAttributeKind::Unique { map, sort } => {
            out.push_str("@unique");
            print_map_sort(out, map, sort);
        }
        FieldAttributeKind::Default { value } => {
            let _ = write!(out, "@default({value})");
        }
        FieldAttributeKind::Relation { relation } => print_relation(out, relation),
        FieldAttributeKind::Map { name } => {
            let _ = write!(out, "@map(\"{name}\")");
        }
        FieldAttributeKind::UpdatedAt => out.push_str("@updatedAt"),
        FieldAttributeKind::Ignore => out.push_str("@ignore"),
        FieldAttributeKind::Unknown { name } => {
            let _ = write!(out, "@{name}");
        }
    }
}

fn print_map_sort(out: &mut String, map: &Option<String>, sort: &Option<crate::ast::SortOrder>) {
    let mut args = vec![];
    if let Some(map) = map {
        args.push(format!("map: \"{map}\""));
    }
    if let Some(sort) = sort {
        args.push(format!("sort: {}", sort.as_str()));
    }
    if !args.is_empty() {
        let _ = write!(out, "({})", args.join(", "));
    }
}

fn print_relation(out: &mut String, relation: &RelationAttribute) {
    let mut args = vec![];
    if let Some(name) = &relation.name {
        args.push(format!("\"{name}\""));
    }
    if !relation.fields.is_empty() {
        args.push(format!("fields: [{}]", relation.fields.join(", ")));
    }
    if !relation.references.is_empty() {
        args.push(format!("references: [{}]", relation.references.join(", ")));
    }
    if let Some(action) = relation.on_delete {
        args.push(format!("onDelete: {}", action.as_str()));
    }
    if let Some(action) = relation.on_update {
        args.push(format!("onUpdate: {}", action.as_str()));
    }
    if let Some(map) = &relation.map {
        args.push(format!("map: \"{map}\""));
    }
    if args.is_empty() {
        out.push_str("@relation");
    } else {
        let _ = write!(out, "@relation({})", args.join(", "));
    }
}

fn print_block_attribute(out: &mut String, attr: &BlockAttribute) {
    out.push_str("  ");
    match &attr.kind {
        BlockAttributeKind::Id { fields, name, map } => {
            let mut args = vec![format!("[{}]", fields.join(", "))];
            if let Some(name) = name {
                args.push(format!("name: \"{name}\""));
            }
            if let Some(map) = map {
                args.push(format!("map: \"{map}\""));
            }
            let _ = writeln!(out, "@@id({})", args.join(", "));
        }
        BlockAttributeKind::Unique { fields, name, map } => {
            let mut args = vec![format!("[{}]", fields.join(", "))];
            if let Some(name) = name {
                args.push(format!("name: \"{name}\""));
            }
            if let Some(map) = map {
                args.push(format!("map: \"{map}\""));
            }
            let _ = writeln!(out, "@@unique({})", args.join(", "));
        }
        BlockAttributeKind::Index {
            fields,
            name,
            map,
            index_type,
        } => {
            let rendered: Vec<String> = fields.iter().map(index_field).collect();
            let mut args = vec![format!("[{}]", rendered.join(", "))];
            if let Some(name) = name {
                args.push(format!("name: \"{name}\""));
            }
            if let Some(map) = map {
                args.push(format!("map: \"{map}\""));
            }
            if let Some(t) = index_type {
                args.push(format!("type: {}", t.as_str()));
            }
            let _ = writeln!(out, "@@index({})", args.join(", "));
        }
        BlockAttributeKind::Map { name } => {
            let _ = writeln!(out, "@@map(\"{name}\")");
        }
        BlockAttributeKind::Schema { name } => {
            let _ = writeln!(out, "@@schema(\"{name}\")");
        }
        BlockAttributeKind::Ignore => out.push_str("@@ignore\n"),
        BlockAttributeKind::Unknown { name } => {
            let _ = writeln!(out, "@@{name}");
        }
    }
}

fn index_field(field: &IndexField) -> String {
    let mut options = vec![];
    if let Some(sort) = field.sort {
        options.push(format!("sort: {}", sort.as_str()));
    }
    if let Some(length) = field.length {
        options.push(format!("length: {length}"));
    }
    if let Some(ops) = &field.ops {
        options.push(format!("ops: {ops}"));
    }
    if options.is_empty() {
        field.name.to_string()
    } else {
        format!("{}({})", field.name, options.join(", "))
    }
}

fn print_enum(out: &mut String, definition: &Enum) {
    print_doc(out, &definition.documentation, "");
    let _ = writeln!(out, "enum {} {{", definition.name);
    for value in &definition.values {
        print_doc(out, &value.documentation, "  ");
        match &value.mapped_name {
            Some(mapped) => {
                let _ = writeln!(out, "  {} @map(\"{mapped}\")", value.name);
            }
            None => {
                let _ = writeln!(out, "  {}", value.name);
            }
        }
    }
    if !definition.attributes.is_empty() {
        out.push('\n');
        for attr in &definition.attributes {
            print_block_attribute(out, attr);
        }
    }
    out.push_str("}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_schema;
    use crate::diagnostics::ErrorCollection;
    use crate::parser;
    use crate::scanner::Lexer;
    use pretty_assertions::assert_eq;

    fn build(source: &str) -> Schema {
        let mut diagnostics = ErrorCollection::new();
        let tokens = Lexer::tokenize(source, &mut diagnostics);
        let tree = parser::parse_tree(tokens, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{diagnostics:?}");
        build_schema(&tree, &mut diagnostics)
    }

    #[test]
    fn test_print_model() {
        let schema = build(
            "model User {\n  id Int @id @default(autoincrement())\n  email String @unique\n  posts Post[]\n  @@map(\"users\")\n}",
        );
        let printed = print_schema(&schema);
        assert_eq!(
            printed,
            "model User {\n  id Int @id @default(autoincrement())\n  email String @unique\n  posts Post[]\n\n  @@map(\"users\")\n}\n"
        );
    }

    #[test]
    fn test_print_datasource_and_generator() {
        let schema = build(
            "datasource db {\n  provider = \"postgresql\"\n  url = env(\"DATABASE_URL\")\n}\ngenerator client {\n  provider = \"prisma-client-js\"\n}",
        );
        let printed = print_schema(&schema);
        assert!(printed.contains("datasource db {\n  provider = \"postgresql\"\n  url = env(\"DATABASE_URL\")\n}"));
        assert!(printed.contains("generator client {\n  provider = \"prisma-client-js\"\n}"));
    }

    #[test]
    fn test_print_enum_with_doc() {
        let schema = build("/// Account roles.\nenum Role {\n  USER\n  ADMIN @map(\"administrator\")\n}");
        let printed = print_schema(&schema);
        assert_eq!(
            printed,
            "/// Account roles.\nenum Role {\n  USER\n  ADMIN @map(\"administrator\")\n}\n"
        );
    }

    #[test]
    fn test_print_relation_field() {
        let schema = build(
            "model Post {\n  id Int @id\n  author User @relation(\"Wrote\", fields: [authorId], references: [id], onDelete: Cascade)\n  authorId Int\n}",
        );
        let printed = print_schema(&schema);
        assert!(printed.contains(
            "author User @relation(\"Wrote\", fields: [authorId], references: [id], onDelete: Cascade)"
        ));
    }

    #[test]
    fn test_round_trip_is_stable() {
        let source = "datasource db {\n  provider = \"postgresql\"\n  url = env(\"DATABASE_URL\")\n}\n\nmodel User {\n  id Int @id @default(autoincrement())\n  email String @unique\n  posts Post[]\n}\n\nmodel Post {\n  id Int @id\n  title String @map(\"post_title\")\n  author User @relation(fields: [authorId], references: [id])\n  authorId Int\n\n  @@index([authorId], name: \"by_author\")\n}\n\nenum Role {\n  USER\n  ADMIN\n}\n";
        let first = print_schema(&build(source));
        let second = print_schema(&build(&first));
        assert_eq!(first, second);
    }
}
