//! RuralAid Store — read-mostly program catalog backed by SQLite.
//!
//! Callers describe what they want with a [`CatalogQuery`] (field/operator/value
//! clauses combined with OR) and hand it to any [`ProgramCatalog`]. The
//! SQLite implementation lives in [`sqlite`]; tests and alternative backends
//! implement the trait directly.

pub mod catalog;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use catalog::{CatalogQuery, Clause, MatchOp, ProgramCatalog, ProgramField};
pub use sqlite::SqliteCatalog;
pub use types::*;
