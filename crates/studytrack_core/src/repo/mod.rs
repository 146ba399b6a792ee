//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for subjects and contents.
//! - Keep SQL details out of services.
//!
//! # Invariants
//! - Writes call `validate()` on the record before touching SQL.
//! - Reads reject invalid persisted rows with `RepoError::InvalidData`.
//! - Repositories are explicit handles over a borrowed connection; there is
//!   no process-wide store.

use crate::db::migrations::latest_version;
use crate::db::{schema_version, DbError};
use crate::model::content::ContentId;
use crate::model::subject::SubjectId;
use crate::model::validation::ValidationError;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod content_repo;
pub mod subject_repo;

pub type RepoResult<T> = Result<T, RepoError>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistence and query error for subject/content repositories.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    /// Schema inspection failed.
    Db(DbError),
    /// A repository statement failed.
    Sqlite(rusqlite::Error),
    SubjectNotFound(SubjectId),
    ContentNotFound(ContentId),
    /// A study write was built from an older copy of the item.
    StaleContent {
        id: ContentId,
        expected_reviews: u32,
        stored_reviews: u32,
    },
    /// Persisted row cannot be converted into a valid record.
    InvalidData(String),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "study store query failed: {err}"),
            Self::SubjectNotFound(id) => write!(f, "subject not found: {id}"),
            Self::ContentNotFound(id) => write!(f, "content not found: {id}"),
            Self::StaleContent {
                id,
                expected_reviews,
                stored_reviews,
            } => write!(
                f,
                "content {id} changed since it was read: expected {expected_reviews} reviews, store has {stored_reviews}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted study data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "study repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date value `{value}` in {column}")))
}

fn parse_count(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid count value `{value}` in {column}")))
}
