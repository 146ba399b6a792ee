//! Domain model for subjects, content items and their review state.
//!
//! # Responsibility
//! - Define canonical records used by scheduler, repositories and services.
//! - Keep write-side drafts (`New*`, `*Patch`) separate from stored records.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Content belongs to exactly one subject.
//! - `Content::total_reviews` always equals `Content::study_history.len()`.

pub mod content;
pub mod subject;
pub mod validation;
