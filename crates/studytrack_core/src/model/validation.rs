//! Validation errors shared by subject and content records.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Record-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Subject name is empty after trim.
    BlankSubjectName(Uuid),
    /// Content title is empty after trim.
    BlankContentTitle(Uuid),
    /// `total_reviews` disagrees with the recorded study history.
    ReviewCountMismatch {
        content_uuid: Uuid,
        total_reviews: u32,
        history_len: usize,
    },
    /// `updated_at` precedes `created_at`.
    UpdatedBeforeCreated {
        uuid: Uuid,
        created_at: i64,
        updated_at: i64,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankSubjectName(uuid) => write!(f, "subject {uuid} has a blank name"),
            Self::BlankContentTitle(uuid) => write!(f, "content {uuid} has a blank title"),
            Self::ReviewCountMismatch {
                content_uuid,
                total_reviews,
                history_len,
            } => write!(
                f,
                "content {content_uuid} has total_reviews={total_reviews} but {history_len} study events"
            ),
            Self::UpdatedBeforeCreated {
                uuid,
                created_at,
                updated_at,
            } => write!(
                f,
                "record {uuid} has updated_at={updated_at} earlier than created_at={created_at}"
            ),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn check_timestamps(
    uuid: Uuid,
    created_at: i64,
    updated_at: i64,
) -> Result<(), ValidationError> {
    if updated_at < created_at {
        return Err(ValidationError::UpdatedBeforeCreated {
            uuid,
            created_at,
            updated_at,
        });
    }
    Ok(())
}

/// Trims optional free text and maps blank input to `None`.
pub fn normalize_description(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
