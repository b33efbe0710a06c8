//! SQLite access layer for classmesh-grouper
//!
//! Every function takes a `&mut SqliteConnection` so it can run on a pooled
//! connection or inside the caller's transaction.

pub mod catalog;
pub mod classes;
pub mod groups;

pub use catalog::SqliteCatalog;

use classmesh_common::{Error, Result};
use uuid::Uuid;

/// Parse a TEXT guid column
pub(crate) fn parse_guid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Internal(format!("Invalid UUID in database '{}': {}", raw, e)))
}

/// Map a unique-constraint violation to [`Error::Conflict`]
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: impl FnOnce() -> String) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Conflict(what()),
        _ => Error::Database(err),
    }
}
