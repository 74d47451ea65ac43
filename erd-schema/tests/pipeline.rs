//! End-to-end tests over the public parse pipeline.

use erd_schema::{parse_schema, print_schema, ErrorCode, ParseOptions, RelationType};
use pretty_assertions::assert_eq;

const BLOG: &str = "\
datasource db {
  provider = \"postgresql\"
  url = env(\"DATABASE_URL\")
}

model User {
  id Int @id @default(autoincrement())
  email String @unique
  posts Post[]
}

model Post {
  id Int @id @default(autoincrement())
  title String
  author User @relation(fields: [authorId], references: [id], onDelete: Cascade)
  authorId Int
}
";

// ==================== Happy Path ====================

#[test]
fn test_minimal_schema_is_valid() {
    let outcome = parse_schema("model User {\n  id Int @id\n}");
    assert!(outcome.is_valid());
    assert!(outcome.diagnostics.is_empty());
    assert!(outcome.relations.is_empty());
}

#[test]
fn test_blog_schema_resolves_one_relation() {
    let outcome = parse_schema(BLOG);
    assert!(outcome.is_valid(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.relations.len(), 1);
    let relation = &outcome.relations[0];
    assert_eq!(relation.relation_type, RelationType::OneToMany);
    assert_eq!(relation.from.to_string(), "Post.author");
    assert_eq!(relation.to.to_string(), "User.posts");
}

#[test]
fn test_relation_ids_are_idempotent() {
    let first = parse_schema(BLOG);
    let second = parse_schema(BLOG);
    let first_ids: Vec<&str> = first.relations.iter().map(|r| r.id.as_str()).collect();
    let second_ids: Vec<&str> = second.relations.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(first_ids, second_ids);
}

#[test]
fn test_printer_round_trip_preserves_semantics() {
    let outcome = parse_schema(BLOG);
    let printed = print_schema(&outcome.schema);
    let reparsed = parse_schema(&printed);
    assert!(reparsed.is_valid(), "{:?}", reparsed.diagnostics);
    assert_eq!(
        outcome.schema.model_names().collect::<Vec<_>>(),
        reparsed.schema.model_names().collect::<Vec<_>>()
    );
    assert_eq!(outcome.relations.len(), reparsed.relations.len());
    assert_eq!(outcome.relations[0].id, reparsed.relations[0].id);
    // A second print is byte-identical.
    assert_eq!(printed, print_schema(&reparsed.schema));
}

// ==================== Diagnostics ====================

#[test]
fn test_duplicate_model_reported_once_at_second_site() {
    let outcome = parse_schema(
        "model User {\n  id Int @id\n}\nmodel User {\n  id Int @id\n}",
    );
    assert_eq!(outcome.diagnostics.count_of(ErrorCode::E2002), 1);
    let duplicate = outcome
        .diagnostics
        .iter()
        .find(|d| d.code == ErrorCode::E2002)
        .unwrap();
    assert_eq!(duplicate.location.line, 4);
    assert_eq!(duplicate.location.column, 7);
}

#[test]
fn test_unknown_type_keeps_field_displayable() {
    let outcome = parse_schema("model Post {\n  id Int @id\n  author Writer\n}");
    assert_eq!(outcome.diagnostics.count_of(ErrorCode::E3006), 1);
    let field = outcome
        .schema
        .get_model("Post")
        .unwrap()
        .get_field("author")
        .unwrap();
    assert!(field.field_type.is_unresolved());
    assert_eq!(field.field_type.type_name(), "Writer");
}

#[test]
fn test_ambiguous_relations_reported_beyond_first() {
    let outcome = parse_schema(
        "model User {\n  id Int @id\n  a Post[]\n  b Post[]\n  c Post[]\n}\nmodel Post {\n  id Int @id\n  x User @relation(fields: [xId], references: [id])\n  xId Int\n  y User @relation(fields: [yId], references: [id])\n  yId Int\n  z User @relation(fields: [zId], references: [id])\n  zId Int\n}",
    );
    assert_eq!(outcome.diagnostics.count_of(ErrorCode::E5003), 2);
}

#[test]
fn test_multiple_errors_collected_in_one_run() {
    let outcome = parse_schema(
        "model user {\n  First_Name String\n  role Role\n}",
    );
    // Bad model case, bad field case, missing @id, unknown type.
    assert!(outcome.diagnostics.count_of(ErrorCode::E2001) == 1);
    assert!(outcome.diagnostics.count_of(ErrorCode::E3001) == 1);
    assert!(outcome.diagnostics.count_of(ErrorCode::E4003) == 1);
    assert!(outcome.diagnostics.count_of(ErrorCode::E3006) == 1);
    assert!(!outcome.is_valid());
}

#[test]
fn test_errors_suppress_relation_resolution() {
    let outcome = parse_schema(
        "model user {\n  id Int @id\n  posts Post[]\n}\nmodel Post {\n  id Int @id\n  author user @relation(fields: [authorId], references: [id])\n  authorId Int\n}",
    );
    assert!(!outcome.is_valid());
    assert!(outcome.relations.is_empty());
}

// ==================== Recovery ====================

#[test]
fn test_unclosed_block_keeps_sibling_blocks() {
    let outcome = parse_schema(
        "model User {\n  id Int @id\nmodel Post {\n  id Int @id\n}\nenum Role {\n  ADMIN\n}",
    );
    assert_eq!(outcome.diagnostics.count_of(ErrorCode::E1005), 1);
    assert!(outcome.schema.get_model("User").is_some());
    assert!(outcome.schema.get_model("Post").is_some());
    assert!(outcome.schema.get_enum("Role").is_some());
}

#[test]
fn test_lexer_garbage_does_not_stop_the_pipeline() {
    let outcome = parse_schema("model User {\n  id Int @id\n}\n\u{00a7}\u{00a7}\nmodel Post {\n  id Int @id\n}");
    assert!(outcome.diagnostics.count_of(ErrorCode::E1006) >= 1);
    assert_eq!(outcome.schema.models.len(), 2);
}

// ==================== Rendering ====================

#[test]
fn test_json_view_shape() {
    let outcome = parse_schema(
        "datasource db {\n  provider = \"mysql\"\n  relationMode = \"prisma\"\n}\nmodel User {\n  id Int @id\n}\nmodel User {\n  id Int @id\n}",
    );
    let json = outcome.diagnostics.to_json();
    let errors = json["errors"].as_array().unwrap();
    let warnings = json["warnings"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(!warnings.is_empty());
    assert_eq!(errors[0]["code"], "E2002");
    assert_eq!(errors[0]["severity"], "error");
    assert!(errors[0]["location"]["line"].is_number());
}

#[test]
fn test_terminal_rendering_includes_code_frame() {
    let source = "model User {\n  id Int @id\n}\nmodel User {\n  id Int @id\n}";
    let outcome = parse_schema(source);
    let rendered = outcome.diagnostics.render_terminal(source);
    assert!(rendered.contains("ERROR: Duplicate model name `User`"));
    assert!(rendered.contains("--> E2002 at line 4, column 7"));
    assert!(rendered.contains(">    4 | model User {"));
}

// ==================== Warnings ====================

#[test]
fn test_warnings_never_flip_validity() {
    let outcome = parse_schema(
        "datasource db {\n  provider = \"mysql\"\n  relationMode = \"prisma\"\n}\nmodel User {\n  id Int @id\n  updatedAt DateTime\n}",
    );
    assert!(outcome.is_valid());
    assert!(outcome.diagnostics.has_warnings());
    assert_eq!(outcome.diagnostics.count_of(ErrorCode::W5001), 1);
    assert_eq!(outcome.diagnostics.count_of(ErrorCode::W2001), 1);
}

// ==================== Options ====================

#[test]
fn test_version_gated_check() {
    let source = "datasource db {\n  provider = \"mysql\"\n  relationMode = \"prisma\"\n}\nmodel User {\n  id Int @id\n}";
    let old = erd_schema::parse_schema_with_options(
        source,
        &ParseOptions::new().with_version_hint("4.2"),
    )
    .unwrap();
    assert_eq!(old.diagnostics.count_of(ErrorCode::E7002), 1);

    let current = erd_schema::parse_schema_with_options(
        source,
        &ParseOptions::new().with_version_hint("5.0"),
    )
    .unwrap();
    assert_eq!(current.diagnostics.count_of(ErrorCode::E7002), 0);
}
