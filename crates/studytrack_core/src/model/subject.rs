//! Subject domain model.
//!
//! # Responsibility
//! - Define the grouping record that owns content items.
//! - Provide constructors and validation for subject writes.
//!
//! # Invariants
//! - `name` is never blank for a persisted subject.
//! - Deleting a subject deletes every content item it owns.

use crate::model::validation::{check_timestamps, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a subject.
pub type SubjectId = Uuid;

/// A named group of study content (a course, a language, an exam topic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "id")]
    pub uuid: SubjectId,
    pub name: String,
    pub description: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Never earlier than `created_at`.
    pub updated_at: i64,
}

impl Subject {
    /// Creates a subject with a generated stable ID.
    pub fn new(name: impl Into<String>, now_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4(), name, now_ms)
    }

    /// Creates a subject with a caller-provided ID.
    pub fn with_id(uuid: SubjectId, name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            uuid,
            name: name.into(),
            description: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Checks write-side invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankSubjectName(self.uuid));
        }
        check_timestamps(self.uuid, self.created_at, self.updated_at)
    }
}

/// Input for creating a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSubject {
    pub name: String,
    pub description: Option<String>,
}

/// Partial subject update. `None` fields are left unchanged.
///
/// A `description` of `Some("")` clears the stored description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SubjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}
