//! Core domain logic for StudyTrack.
//! This crate owns the review scheduling rules and the subject/content store.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::content::{Content, ContentId, ContentPatch, ContentStatus, NewContent, StudyEvent};
pub use model::subject::{NewSubject, Subject, SubjectId, SubjectPatch};
pub use model::validation::ValidationError;
pub use repo::content_repo::{ContentListQuery, ContentRepository, SqliteContentRepository};
pub use repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
pub use repo::{RepoError, RepoResult};
pub use scheduler::{
    classify_status, compute_next_review_date, days_overdue, register_study_event,
    MAX_REVIEW_LEVEL, SPACED_REPETITION_INTERVALS,
};
pub use service::content_service::ContentService;
pub use service::dashboard_service::{
    Dashboard, DashboardService, DashboardStats, SubjectCategory, SubjectSummary,
    DEFAULT_DAILY_GOAL,
};
pub use service::subject_service::SubjectService;
pub use service::StudyServiceError;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
