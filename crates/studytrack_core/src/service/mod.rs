//! Study use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply scheduling rules on top of storage.
//! - Return written records directly instead of reloading collections.

use crate::model::content::ContentId;
use crate::model::subject::SubjectId;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod content_service;
pub mod dashboard_service;
pub mod subject_service;

/// Error for subject/content/dashboard use-cases.
#[derive(Debug)]
pub enum StudyServiceError {
    /// Subject name is blank after trim.
    InvalidName,
    /// Content title is blank after trim.
    InvalidTitle,
    SubjectNotFound(SubjectId),
    ContentNotFound(ContentId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back disagrees.
    InconsistentState(&'static str),
}

impl Display for StudyServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "subject name must not be blank"),
            Self::InvalidTitle => write!(f, "content title must not be blank"),
            Self::SubjectNotFound(id) => write!(f, "subject not found: {id}"),
            Self::ContentNotFound(id) => write!(f, "content not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent study state: {details}"),
        }
    }
}

impl Error for StudyServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StudyServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SubjectNotFound(id) => Self::SubjectNotFound(id),
            RepoError::ContentNotFound(id) => Self::ContentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, StudyServiceError>;

fn normalize_required(value: &str, err: StudyServiceError) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_string())
}
