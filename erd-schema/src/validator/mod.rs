//! Semantic validation passes.
//!
//! Validation runs as a fixed sequence of passes over the built schema, each
//! appending into the shared [`ErrorCollection`]:
//!
//! 1. [`naming`] — naming conventions and reserved names
//! 2. [`uniqueness`] — duplicate models, enums, fields, and values
//! 3. [`resolve`] — rewrites unresolved type names against the name table
//! 4. [`attributes`] — attribute placement, arguments, and primary keys
//! 5. [`compat`] — provider capabilities, format versions, and lint warnings
//!
//! Passes never early-exit on errors from earlier passes; each pass guards
//! only against the specific shapes it cannot interpret.

mod attributes;
mod compat;
mod naming;
mod resolve;
mod uniqueness;

use tracing::debug;

use crate::ast::Schema;
use crate::diagnostics::ErrorCollection;

/// Run all validation passes over `schema`.
///
/// `version_hint` enables the version-gated checks in the compatibility pass;
/// without it those checks are skipped.
pub fn run(schema: &mut Schema, version_hint: Option<&str>, diagnostics: &mut ErrorCollection) {
    debug!("running naming pass");
    naming::check(schema, diagnostics);
    debug!("running uniqueness pass");
    uniqueness::check(schema, diagnostics);
    debug!("running type resolution pass");
    resolve::check(schema, diagnostics);
    debug!("running attribute pass");
    attributes::check(schema, diagnostics);
    debug!("running compatibility pass");
    compat::check(schema, version_hint, diagnostics);
}
