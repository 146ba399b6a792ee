//! Content domain model.
//!
//! # Responsibility
//! - Define the reviewable study item and its spaced-repetition state.
//! - Expose status helpers that delegate to `crate::scheduler`.
//!
//! # Invariants
//! - `total_reviews == study_history.len()`.
//! - `review_level` only grows, by exactly one per study event.
//! - `next_review_date` is recomputed from `review_level` after each study.

use crate::model::subject::SubjectId;
use crate::model::validation::{check_timestamps, ValidationError};
use crate::scheduler;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a content item.
pub type ContentId = Uuid;

/// One recorded study of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyEvent {
    /// Unix epoch milliseconds.
    pub studied_at: i64,
}

/// Review status of a content item relative to a given day.
///
/// The four variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentStatus {
    /// Next review is after today.
    OnTrack,
    /// Next review is today.
    DueToday,
    /// Next review was before today.
    Overdue,
    /// Review level reached the end of the interval table.
    Completed,
}

impl ContentStatus {
    /// Stable wire name (`on-track`, `due-today`, `overdue`, `completed`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on-track",
            Self::DueToday => "due-today",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::OnTrack => "On Track",
            Self::DueToday => "Due Today",
            Self::Overdue => "Overdue",
            Self::Completed => "Completed",
        }
    }

    /// Whether the item belongs in a study session queue.
    pub fn needs_review(self) -> bool {
        matches!(self, Self::DueToday | Self::Overdue)
    }
}

/// A reviewable study item owned by one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(rename = "id")]
    pub uuid: ContentId,
    #[serde(rename = "subjectId")]
    pub subject_uuid: SubjectId,
    pub title: String,
    pub description: Option<String>,
    pub review_level: u32,
    pub next_review_date: NaiveDate,
    pub study_history: Vec<StudyEvent>,
    pub total_reviews: u32,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Content {
    /// Creates a fresh item at review level 0, due on `today`.
    pub fn new(
        subject_uuid: SubjectId,
        title: impl Into<String>,
        today: NaiveDate,
        now_ms: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            subject_uuid,
            title: title.into(),
            description: None,
            review_level: 0,
            next_review_date: scheduler::next_review_date_on(0, today),
            study_history: Vec::new(),
            total_reviews: 0,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Status of this item as seen on `today`.
    pub fn status_on(&self, today: NaiveDate) -> ContentStatus {
        scheduler::classify_status_on(
            self.next_review_date,
            self.review_level,
            scheduler::MAX_REVIEW_LEVEL,
            today,
        )
    }

    /// Whole days past the review date as seen on `today`; zero when not late.
    pub fn days_overdue_on(&self, today: NaiveDate) -> u32 {
        scheduler::days_overdue_on(self.next_review_date, today)
    }

    /// Timestamp of the most recent study, if any.
    pub fn last_studied_at(&self) -> Option<i64> {
        self.study_history.last().map(|event| event.studied_at)
    }

    /// Checks write-side invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankContentTitle(self.uuid));
        }
        if self.total_reviews as usize != self.study_history.len() {
            return Err(ValidationError::ReviewCountMismatch {
                content_uuid: self.uuid,
                total_reviews: self.total_reviews,
                history_len: self.study_history.len(),
            });
        }
        check_timestamps(self.uuid, self.created_at, self.updated_at)
    }
}

/// Input for creating a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub subject_uuid: SubjectId,
    pub title: String,
    pub description: Option<String>,
}

/// Partial content update. `None` fields are left unchanged.
///
/// Scheduling fields are not patchable; they only move through study events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPatch {
    /// Moves the item to another subject.
    pub subject_uuid: Option<SubjectId>,
    pub title: Option<String>,
    /// `Some("")` clears the stored description.
    pub description: Option<String>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self.subject_uuid.is_none() && self.title.is_none() && self.description.is_none()
    }
}
