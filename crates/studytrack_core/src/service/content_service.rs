//! Content use-case service.
//!
//! # Responsibility
//! - Create, edit and delete content items under existing subjects.
//! - Serve due/overdue review queues relative to the service clock.
//! - Record study events through `crate::scheduler`.
//!
//! # Invariants
//! - New items start at level 0 and are due on their creation day.
//! - `register_study` persists level, date, counter and history together.
//!
//! Concurrent `register_study` calls on the same item are not serialized.
//! The first write wins; a call that read the item before that write fails
//! with `RepoError::StaleContent` and leaves the stored item untouched.

use crate::clock::{Clock, SystemClock};
use crate::model::content::{Content, ContentId, ContentPatch, ContentStatus, NewContent};
use crate::model::subject::SubjectId;
use crate::model::validation::normalize_description;
use crate::repo::content_repo::{ContentListQuery, ContentRepository};
use crate::scheduler;
use crate::service::{normalize_required, ServiceResult, StudyServiceError};
use log::info;

/// Content service facade over a repository handle.
pub struct ContentService<R: ContentRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: ContentRepository> ContentService<R, SystemClock> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: ContentRepository, C: Clock> ContentService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates one content item and returns the stored record.
    pub fn create_content(&self, input: NewContent) -> ServiceResult<Content> {
        let title = normalize_required(&input.title, StudyServiceError::InvalidTitle)?;
        if !self.repo.subject_exists(input.subject_uuid)? {
            return Err(StudyServiceError::SubjectNotFound(input.subject_uuid));
        }

        let now = self.clock.now();
        let mut content = Content::new(
            input.subject_uuid,
            title,
            now.date_naive(),
            now.timestamp_millis(),
        );
        content.description = normalize_description(input.description);

        self.repo.create_content(&content)?;
        info!(
            "event=content_create module=service status=ok content_uuid={} subject_uuid={}",
            content.uuid, content.subject_uuid
        );
        Ok(content)
    }

    /// Applies a partial update and returns the stored record.
    pub fn update_content(&self, id: ContentId, patch: ContentPatch) -> ServiceResult<Content> {
        let mut content = self.require_content(id)?;
        if patch.is_empty() {
            return Ok(content);
        }

        if let Some(subject_uuid) = patch.subject_uuid {
            if !self.repo.subject_exists(subject_uuid)? {
                return Err(StudyServiceError::SubjectNotFound(subject_uuid));
            }
            content.subject_uuid = subject_uuid;
        }
        if let Some(title) = patch.title {
            content.title = normalize_required(&title, StudyServiceError::InvalidTitle)?;
        }
        if let Some(description) = patch.description {
            content.description = normalize_description(Some(description));
        }
        content.updated_at = self.clock.now_ms().max(content.updated_at);

        self.repo.update_content(&content)?;
        Ok(content)
    }

    pub fn get_content(&self, id: ContentId) -> ServiceResult<Option<Content>> {
        Ok(self.repo.get_content(id)?)
    }

    pub fn delete_content(&self, id: ContentId) -> ServiceResult<()> {
        self.repo.delete_content(id)?;
        info!("event=content_delete module=service status=ok content_uuid={id}");
        Ok(())
    }

    /// Lists every item ordered by next review date.
    pub fn list_contents(&self) -> ServiceResult<Vec<Content>> {
        Ok(self.repo.list_contents(&ContentListQuery::default())?)
    }

    /// Lists one subject's items ordered by next review date.
    pub fn list_by_subject(&self, subject_uuid: SubjectId) -> ServiceResult<Vec<Content>> {
        Ok(self
            .repo
            .list_contents(&ContentListQuery::for_subject(subject_uuid))?)
    }

    /// Items whose next review is today or earlier.
    pub fn due_today(&self) -> ServiceResult<Vec<Content>> {
        let query = ContentListQuery {
            due_on_or_before: Some(self.clock.today()),
            ..ContentListQuery::default()
        };
        Ok(self.repo.list_contents(&query)?)
    }

    /// Items whose next review was before today.
    pub fn overdue(&self) -> ServiceResult<Vec<Content>> {
        let query = ContentListQuery {
            due_before: Some(self.clock.today()),
            ..ContentListQuery::default()
        };
        Ok(self.repo.list_contents(&query)?)
    }

    /// One subject's items that need review now, skipping completed ones.
    pub fn study_session(&self, subject_uuid: SubjectId) -> ServiceResult<Vec<Content>> {
        let today = self.clock.today();
        let query = ContentListQuery {
            subject_uuid: Some(subject_uuid),
            due_on_or_before: Some(today),
            ..ContentListQuery::default()
        };
        Ok(self
            .repo
            .list_contents(&query)?
            .into_iter()
            .filter(|content| content.status_on(today).needs_review())
            .collect())
    }

    /// Records that the item was studied now and returns the new state.
    pub fn register_study(&self, id: ContentId) -> ServiceResult<Content> {
        let content = self.require_content(id)?;
        let studied = scheduler::register_study_event_at(&content, self.clock.now());
        let event = studied
            .study_history
            .last()
            .copied()
            .ok_or(StudyServiceError::InconsistentState(
                "study transition produced no history entry",
            ))?;

        self.repo.record_study(&studied, &event)?;
        info!(
            "event=study_register module=service status=ok content_uuid={} review_level={} next_review_date={}",
            studied.uuid, studied.review_level, studied.next_review_date
        );
        Ok(studied)
    }

    /// Status of `content` as of the service clock.
    pub fn status_of(&self, content: &Content) -> ContentStatus {
        content.status_on(self.clock.today())
    }

    /// Days overdue of `content` as of the service clock.
    pub fn overdue_days_of(&self, content: &Content) -> u32 {
        content.days_overdue_on(self.clock.today())
    }

    fn require_content(&self, id: ContentId) -> ServiceResult<Content> {
        self.repo
            .get_content(id)?
            .ok_or(StudyServiceError::ContentNotFound(id))
    }
}
