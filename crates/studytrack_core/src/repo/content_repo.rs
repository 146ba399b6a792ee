//! Content repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist content items together with their ordered study history.
//! - Serve review queues (due on/before a day) straight from SQL.
//!
//! # Invariants
//! - Listing is ordered by `next_review_date ASC, uuid ASC`.
//! - `update_content` never touches scheduling fields; those only change
//!   through `record_study`.
//! - `record_study` writes the scheduling fields and appends the event in a
//!   single transaction.
//! - `record_study` only applies on top of the review count it was computed
//!   from; a write built from an older copy fails with `StaleContent`.

use crate::model::content::{Content, ContentId, StudyEvent};
use crate::model::subject::SubjectId;
use crate::repo::{
    date_to_db, ensure_connection_ready, parse_count, parse_date, parse_uuid, RepoError,
    RepoResult,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const CONTENT_SELECT_SQL: &str = "SELECT
    uuid,
    subject_uuid,
    title,
    description,
    review_level,
    next_review_date,
    total_reviews,
    created_at,
    updated_at
FROM contents";

/// Filters for listing content items. All filters combine with `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentListQuery {
    /// Restrict to one subject.
    pub subject_uuid: Option<SubjectId>,
    /// Keep items whose next review is on or before this day.
    pub due_on_or_before: Option<NaiveDate>,
    /// Keep items whose next review is strictly before this day.
    pub due_before: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ContentListQuery {
    pub fn for_subject(subject_uuid: SubjectId) -> Self {
        Self {
            subject_uuid: Some(subject_uuid),
            ..Self::default()
        }
    }
}

/// Repository interface for content CRUD and study recording.
pub trait ContentRepository {
    /// Inserts the item and any study history it already carries.
    fn create_content(&self, content: &Content) -> RepoResult<ContentId>;
    /// Overwrites subject, title, description and `updated_at`.
    fn update_content(&self, content: &Content) -> RepoResult<()>;
    fn get_content(&self, id: ContentId) -> RepoResult<Option<Content>>;
    fn list_contents(&self, query: &ContentListQuery) -> RepoResult<Vec<Content>>;
    fn delete_content(&self, id: ContentId) -> RepoResult<()>;
    /// Persists a study transition produced by `crate::scheduler`.
    ///
    /// `content` carries the new level, date, counter and `updated_at`;
    /// `event` is appended to the stored history.
    fn record_study(&self, content: &Content, event: &StudyEvent) -> RepoResult<()>;
    fn subject_exists(&self, id: SubjectId) -> RepoResult<bool>;
}

/// SQLite-backed content repository.
pub struct SqliteContentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentRepository<'conn> {
    /// Wraps a connection opened through `crate::db`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContentRepository for SqliteContentRepository<'_> {
    fn create_content(&self, content: &Content) -> RepoResult<ContentId> {
        content.validate()?;
        if !self.subject_exists(content.subject_uuid)? {
            return Err(RepoError::SubjectNotFound(content.subject_uuid));
        }

        let uuid_text = content.uuid.to_string();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO contents (
                uuid,
                subject_uuid,
                title,
                description,
                review_level,
                next_review_date,
                total_reviews,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                uuid_text.as_str(),
                content.subject_uuid.to_string(),
                content.title.as_str(),
                content.description.as_deref(),
                content.review_level,
                date_to_db(content.next_review_date),
                content.total_reviews,
                content.created_at,
                content.updated_at,
            ],
        )?;
        for (index, event) in content.study_history.iter().enumerate() {
            tx.execute(
                "INSERT INTO study_events (content_uuid, seq, studied_at)
                 VALUES (?1, ?2, ?3);",
                params![uuid_text.as_str(), index as i64 + 1, event.studied_at],
            )?;
        }
        tx.commit()?;

        Ok(content.uuid)
    }

    fn update_content(&self, content: &Content) -> RepoResult<()> {
        content.validate()?;
        if !self.subject_exists(content.subject_uuid)? {
            return Err(RepoError::SubjectNotFound(content.subject_uuid));
        }

        let changed = self.conn.execute(
            "UPDATE contents
             SET
                subject_uuid = ?1,
                title = ?2,
                description = ?3,
                updated_at = ?4
             WHERE uuid = ?5;",
            params![
                content.subject_uuid.to_string(),
                content.title.as_str(),
                content.description.as_deref(),
                content.updated_at,
                content.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::ContentNotFound(content.uuid));
        }

        Ok(())
    }

    fn get_content(&self, id: ContentId) -> RepoResult<Option<Content>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_content_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_contents(&self, query: &ContentListQuery) -> RepoResult<Vec<Content>> {
        let mut sql = format!("{CONTENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(subject_uuid) = query.subject_uuid {
            sql.push_str(" AND subject_uuid = ?");
            bind_values.push(Value::Text(subject_uuid.to_string()));
        }
        if let Some(day) = query.due_on_or_before {
            sql.push_str(" AND next_review_date <= ?");
            bind_values.push(Value::Text(date_to_db(day)));
        }
        if let Some(day) = query.due_before {
            sql.push_str(" AND next_review_date < ?");
            bind_values.push(Value::Text(date_to_db(day)));
        }

        sql.push_str(" ORDER BY next_review_date ASC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut contents = Vec::new();
        while let Some(row) = rows.next()? {
            contents.push(parse_content_row(self.conn, row)?);
        }
        Ok(contents)
    }

    fn delete_content(&self, id: ContentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contents WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ContentNotFound(id));
        }
        Ok(())
    }

    fn record_study(&self, content: &Content, event: &StudyEvent) -> RepoResult<()> {
        content.validate()?;
        if content.study_history.last() != Some(event) {
            return Err(RepoError::InvalidData(format!(
                "study event for content {} is not the last history entry",
                content.uuid
            )));
        }
        let Some(previous_reviews) = content.total_reviews.checked_sub(1) else {
            return Err(RepoError::InvalidData(format!(
                "study transition for content {} carries no reviews",
                content.uuid
            )));
        };

        let uuid_text = content.uuid.to_string();
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE contents
             SET
                review_level = ?1,
                next_review_date = ?2,
                total_reviews = ?3,
                updated_at = ?4
             WHERE uuid = ?5 AND total_reviews = ?6;",
            params![
                content.review_level,
                date_to_db(content.next_review_date),
                content.total_reviews,
                content.updated_at,
                uuid_text.as_str(),
                previous_reviews,
            ],
        )?;
        if changed == 0 {
            let stored: Option<i64> = tx
                .query_row(
                    "SELECT total_reviews FROM contents WHERE uuid = ?1;",
                    [uuid_text.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            return match stored {
                None => Err(RepoError::ContentNotFound(content.uuid)),
                Some(stored) => Err(RepoError::StaleContent {
                    id: content.uuid,
                    expected_reviews: previous_reviews,
                    stored_reviews: parse_count(stored, "contents.total_reviews")?,
                }),
            };
        }

        // History rows are numbered 1..=total_reviews.
        tx.execute(
            "INSERT INTO study_events (content_uuid, seq, studied_at)
             VALUES (?1, ?2, ?3);",
            params![uuid_text.as_str(), content.total_reviews, event.studied_at],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn subject_exists(&self, id: SubjectId) -> RepoResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM subjects WHERE uuid = ?1;",
                [id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn parse_content_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Content> {
    let uuid_text: String = row.get("uuid")?;
    let subject_text: String = row.get("subject_uuid")?;
    let date_text: String = row.get("next_review_date")?;

    let content = Content {
        uuid: parse_uuid(&uuid_text, "contents.uuid")?,
        subject_uuid: parse_uuid(&subject_text, "contents.subject_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        review_level: parse_count(row.get("review_level")?, "contents.review_level")?,
        next_review_date: parse_date(&date_text, "contents.next_review_date")?,
        study_history: load_study_history(conn, &uuid_text)?,
        total_reviews: parse_count(row.get("total_reviews")?, "contents.total_reviews")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    content.validate()?;
    Ok(content)
}

fn load_study_history(conn: &Connection, content_uuid: &str) -> RepoResult<Vec<StudyEvent>> {
    let mut stmt = conn.prepare(
        "SELECT studied_at
         FROM study_events
         WHERE content_uuid = ?1
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([content_uuid])?;
    let mut history = Vec::new();
    while let Some(row) = rows.next()? {
        history.push(StudyEvent {
            studied_at: row.get(0)?,
        });
    }
    Ok(history)
}
