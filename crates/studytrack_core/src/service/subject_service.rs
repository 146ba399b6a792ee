//! Subject use-case service.
//!
//! # Invariants
//! - Names are trimmed and must not be blank.
//! - Deleting a subject deletes its contents.

use crate::clock::{Clock, SystemClock};
use crate::model::subject::{NewSubject, Subject, SubjectId, SubjectPatch};
use crate::model::validation::normalize_description;
use crate::repo::subject_repo::SubjectRepository;
use crate::service::{normalize_required, ServiceResult, StudyServiceError};
use log::info;

/// Subject service facade over a repository handle.
pub struct SubjectService<R: SubjectRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: SubjectRepository> SubjectService<R, SystemClock> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: SubjectRepository, C: Clock> SubjectService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates one subject and returns the stored record.
    pub fn create_subject(&self, input: NewSubject) -> ServiceResult<Subject> {
        let name = normalize_required(&input.name, StudyServiceError::InvalidName)?;
        let mut subject = Subject::new(name, self.clock.now_ms());
        subject.description = normalize_description(input.description);

        self.repo.create_subject(&subject)?;
        info!(
            "event=subject_create module=service status=ok subject_uuid={}",
            subject.uuid
        );
        Ok(subject)
    }

    /// Applies a partial update and returns the stored record.
    pub fn update_subject(&self, id: SubjectId, patch: SubjectPatch) -> ServiceResult<Subject> {
        let mut subject = self.require_subject(id)?;
        if patch.is_empty() {
            return Ok(subject);
        }

        if let Some(name) = patch.name {
            subject.name = normalize_required(&name, StudyServiceError::InvalidName)?;
        }
        if let Some(description) = patch.description {
            subject.description = normalize_description(Some(description));
        }
        subject.updated_at = self.clock.now_ms().max(subject.updated_at);

        self.repo.update_subject(&subject)?;
        Ok(subject)
    }

    pub fn get_subject(&self, id: SubjectId) -> ServiceResult<Option<Subject>> {
        Ok(self.repo.get_subject(id)?)
    }

    /// Lists subjects ordered by name.
    pub fn list_subjects(&self) -> ServiceResult<Vec<Subject>> {
        Ok(self.repo.list_subjects()?)
    }

    /// Deletes a subject together with its contents.
    ///
    /// Returns the number of content items removed.
    pub fn delete_subject(&self, id: SubjectId) -> ServiceResult<usize> {
        let removed = self.repo.delete_subject(id)?;
        info!(
            "event=subject_delete module=service status=ok subject_uuid={id} removed_contents={removed}"
        );
        Ok(removed)
    }

    fn require_subject(&self, id: SubjectId) -> ServiceResult<Subject> {
        self.repo
            .get_subject(id)?
            .ok_or(StudyServiceError::SubjectNotFound(id))
    }
}
