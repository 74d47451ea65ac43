//! Typed AST for parsed schemas.
//!
//! These types are the crate's primary output: the [`Schema`] aggregate owns
//! its models, enums, datasources, and generators; fields and attributes are
//! owned by their model or field. Relation facts derived from this tree live
//! in [`crate::relations`] and hold names, never ownership.

mod attribute;
mod config;
mod field;
mod model;
mod schema;
mod types;

pub use attribute::*;
pub use config::*;
pub use field::*;
pub use model::*;
pub use schema::*;
pub use types::*;
