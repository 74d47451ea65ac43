//! Parser and semantic analyzer for Prisma-style schema files.
//!
//! The pipeline runs lexing, parsing, AST building, validation, and relation
//! resolution over a source string, accumulating every problem into one
//! diagnostics collection instead of stopping at the first error:
//!
//! ```
//! let outcome = erd_schema::parse_schema(
//!     "model User {\n  id Int @id\n  posts Post[]\n}\nmodel Post {\n  id Int @id\n  author User @relation(fields: [authorId], references: [id])\n  authorId Int\n}",
//! );
//! assert!(outcome.is_valid());
//! assert_eq!(outcome.relations.len(), 1);
//! assert_eq!(outcome.relations[0].relation_type.as_str(), "1:N");
//! ```
//!
//! Diagnostics carry stable error codes (`E1001`..`E7005`, `W1001`..`W5001`),
//! exact source locations, and render either as terminal text with a code
//! frame or as JSON.

pub mod ast;
pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod printer;
pub mod relations;
pub mod scanner;
pub mod span;
pub mod validator;

use std::path::Path;

use smol_str::SmolStr;
use tracing::debug;

pub use crate::ast::{Datasource, Enum, Field, Generator, Model, Schema};
pub use crate::diagnostics::{Diagnostic, ErrorCode, ErrorCollection, Severity};
pub use crate::error::{SchemaError, SchemaResult};
pub use crate::printer::print_schema;
pub use crate::relations::{RelationMetadata, RelationType};
pub use crate::span::SourceLocation;

/// Options for a parse run.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Format version used for version-gated compatibility checks.
    pub version_hint: Option<SmolStr>,
    /// Reject sources larger than this many bytes.
    pub max_source_len: Option<usize>,
}

impl ParseOptions {
    /// Default options: no version gating, no size cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the format version hint.
    pub fn with_version_hint(mut self, version: impl Into<SmolStr>) -> Self {
        self.version_hint = Some(version.into());
        self
    }

    /// Set the source size cap in bytes.
    pub fn with_max_source_len(mut self, max: usize) -> Self {
        self.max_source_len = Some(max);
        self
    }
}

/// The result of one parse run.
///
/// A schema is always produced, even for badly broken input; check
/// [`is_valid`](Self::is_valid) or the diagnostics before trusting it.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// The built schema, possibly partial when errors were reported.
    pub schema: Schema,
    /// Resolved relations; empty when any error was reported.
    pub relations: Vec<RelationMetadata>,
    /// Everything reported during the run.
    pub diagnostics: ErrorCollection,
}

impl ParseOutcome {
    /// True when no error-severity diagnostic was reported.
    ///
    /// Warnings never make an outcome invalid.
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Convert to a hard `Result`, failing when errors were reported.
    pub fn into_result(self) -> SchemaResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(SchemaError::ValidationFailed {
                count: self.diagnostics.errors().count(),
            })
        }
    }
}

/// Parse and validate `source` with default options.
pub fn parse_schema(source: &str) -> ParseOutcome {
    run_pipeline(source, &ParseOptions::default())
}

/// Parse and validate `source` with explicit options.
///
/// Only the size cap makes this fallible; everything wrong with the source
/// itself is reported through the outcome's diagnostics.
pub fn parse_schema_with_options(
    source: &str,
    options: &ParseOptions,
) -> SchemaResult<ParseOutcome> {
    if let Some(max) = options.max_source_len {
        if source.len() > max {
            return Err(SchemaError::SourceTooLarge {
                len: source.len(),
                max,
            });
        }
    }
    Ok(run_pipeline(source, options))
}

/// Read and parse a schema file.
pub fn parse_schema_file(
    path: impl AsRef<Path>,
    options: &ParseOptions,
) -> SchemaResult<ParseOutcome> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_schema_with_options(&source, options)
}

fn run_pipeline(source: &str, options: &ParseOptions) -> ParseOutcome {
    let mut diagnostics = ErrorCollection::new();

    debug!(len = source.len(), "lexing schema source");
    let tokens = scanner::Lexer::tokenize(source, &mut diagnostics);

    debug!(tokens = tokens.len(), "parsing block tree");
    let tree = parser::parse_tree(tokens, &mut diagnostics);

    debug!(blocks = tree.blocks.len(), "building typed schema");
    let mut schema = builder::build_schema(&tree, &mut diagnostics);
    schema.version = options.version_hint.clone();

    validator::run(
        &mut schema,
        options.version_hint.as_deref(),
        &mut diagnostics,
    );

    // Relation facts are only meaningful over a schema with no errors.
    let relations = if diagnostics.has_errors() {
        debug!("skipping relation resolution, errors present");
        vec![]
    } else {
        debug!("resolving relations");
        relations::resolve_relations(&schema, &mut diagnostics)
    };

    ParseOutcome {
        schema,
        relations,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_schema_minimal() {
        let outcome = parse_schema("model User {\n  id Int @id\n}");
        assert!(outcome.is_valid());
        assert!(outcome.relations.is_empty());
        assert_eq!(outcome.schema.models.len(), 1);
    }

    #[test]
    fn test_parse_schema_sets_version_from_hint() {
        let options = ParseOptions::new().with_version_hint("5.1");
        let outcome =
            parse_schema_with_options("model User {\n  id Int @id\n}", &options).unwrap();
        assert_eq!(outcome.schema.version.as_deref(), Some("5.1"));
    }

    #[test]
    fn test_parse_schema_size_cap() {
        let options = ParseOptions::new().with_max_source_len(8);
        let err = parse_schema_with_options("model User {\n  id Int @id\n}", &options)
            .unwrap_err();
        assert!(matches!(err, SchemaError::SourceTooLarge { max: 8, .. }));
    }

    #[test]
    fn test_parse_schema_file_missing() {
        let err = parse_schema_file("/no/such/schema.prisma", &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }

    #[test]
    fn test_into_result_on_invalid_schema() {
        let outcome = parse_schema("model user {\n  id Int @id\n}");
        let err = outcome.into_result().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ValidationFailed { count: 1 }
        ));
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let outcome = parse_schema(
            "datasource db {\n  provider = \"mysql\"\n  relationMode = \"prisma\"\n}\nmodel User {\n  id Int @id\n}",
        );
        assert!(outcome.is_valid());
        assert!(outcome.diagnostics.has_warnings());
    }
}
