//! Subject repository contract and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `name` (case-insensitive), then `uuid`.
//! - Deleting a subject removes its contents and their study events in the
//!   same transaction.

use crate::model::subject::{Subject, SubjectId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const SUBJECT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    description,
    created_at,
    updated_at
FROM subjects";

/// Repository interface for subject CRUD.
pub trait SubjectRepository {
    fn create_subject(&self, subject: &Subject) -> RepoResult<SubjectId>;
    /// Overwrites name, description and `updated_at`.
    fn update_subject(&self, subject: &Subject) -> RepoResult<()>;
    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>>;
    fn list_subjects(&self) -> RepoResult<Vec<Subject>>;
    /// Hard-deletes a subject and everything it owns.
    ///
    /// Returns the number of content items removed with it.
    fn delete_subject(&self, id: SubjectId) -> RepoResult<usize>;
}

/// SQLite-backed subject repository.
pub struct SqliteSubjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubjectRepository<'conn> {
    /// Wraps a connection opened through `crate::db`.
    ///
    /// Fails when the connection schema is not fully migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SubjectRepository for SqliteSubjectRepository<'_> {
    fn create_subject(&self, subject: &Subject) -> RepoResult<SubjectId> {
        subject.validate()?;

        self.conn.execute(
            "INSERT INTO subjects (
                uuid,
                name,
                description,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                subject.uuid.to_string(),
                subject.name.as_str(),
                subject.description.as_deref(),
                subject.created_at,
                subject.updated_at,
            ],
        )?;

        Ok(subject.uuid)
    }

    fn update_subject(&self, subject: &Subject) -> RepoResult<()> {
        subject.validate()?;

        let changed = self.conn.execute(
            "UPDATE subjects
             SET
                name = ?1,
                description = ?2,
                updated_at = ?3
             WHERE uuid = ?4;",
            params![
                subject.name.as_str(),
                subject.description.as_deref(),
                subject.updated_at,
                subject.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::SubjectNotFound(subject.uuid));
        }

        Ok(())
    }

    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBJECT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subject_row(row)?));
        }
        Ok(None)
    }

    fn list_subjects(&self) -> RepoResult<Vec<Subject>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBJECT_SELECT_SQL} ORDER BY name COLLATE NOCASE ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut subjects = Vec::new();
        while let Some(row) = rows.next()? {
            subjects.push(parse_subject_row(row)?);
        }
        Ok(subjects)
    }

    fn delete_subject(&self, id: SubjectId) -> RepoResult<usize> {
        let id_text = id.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM subjects WHERE uuid = ?1;",
                [id_text.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::SubjectNotFound(id));
        }

        // Contents and study events follow through ON DELETE CASCADE.
        let removed_contents = tx.execute(
            "DELETE FROM contents WHERE subject_uuid = ?1;",
            [id_text.as_str()],
        )?;
        tx.execute("DELETE FROM subjects WHERE uuid = ?1;", [id_text.as_str()])?;
        tx.commit()?;

        Ok(removed_contents)
    }
}

fn parse_subject_row(row: &Row<'_>) -> RepoResult<Subject> {
    let uuid_text: String = row.get("uuid")?;
    let subject = Subject {
        uuid: parse_uuid(&uuid_text, "subjects.uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    subject.validate()?;
    Ok(subject)
}
