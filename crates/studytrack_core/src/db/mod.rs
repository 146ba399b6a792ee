//! SQLite storage bootstrap and schema migrations.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the study store.
//! - Bring the subjects/contents/study_events schema up to date.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No repository touches a connection before its migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{schema_version, MigrationReport};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the study store.
#[derive(Debug)]
pub enum DbError {
    /// Opening the file or applying connection pragmas failed.
    Connection(rusqlite::Error),
    /// One migration script failed. The whole pending batch was rolled back,
    /// so the stored schema version is unchanged.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The store was written by a build with a newer schema.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Stable code used in `event=db_open` error lines.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "db_connection_failed",
            Self::Migration { .. } => "db_migration_failed",
            Self::SchemaTooNew { .. } => "db_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "cannot open study database: {err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "study schema migration {version} ({name}) failed: {source}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "study database uses schema {found}; this build supports up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}
