//! Dashboard aggregation over subjects and contents.
//!
//! # Responsibility
//! - Compute headline review counts for the current day.
//! - Compute per-subject card counts, completion flag and mastery.
//!
//! # Invariants
//! - Each dashboard load reads subjects and contents once.
//! - `due_today` counts every item due today or earlier, so it includes
//!   `overdue`.

use crate::clock::{Clock, SystemClock};
use crate::model::content::{Content, ContentStatus};
use crate::model::subject::{Subject, SubjectId};
use crate::repo::content_repo::{ContentListQuery, ContentRepository};
use crate::repo::subject_repo::SubjectRepository;
use crate::service::{ServiceResult, StudyServiceError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Default number of reviews a user aims for per day.
pub const DEFAULT_DAILY_GOAL: u32 = 50;

/// Review level treated as full mastery in `average_mastery`.
pub const MASTERY_LEVEL_CAP: u32 = 10;

static CATEGORY_RULES: Lazy<Vec<(SubjectCategory, Regex)>> = Lazy::new(|| {
    [
        (SubjectCategory::Biology, r"(?i)biolog"),
        (SubjectCategory::Chemistry, r"(?i)chemist|organic"),
        (SubjectCategory::History, r"(?i)histor"),
        (SubjectCategory::Language, r"(?i)italian|spanish|french|language"),
        (SubjectCategory::Math, r"(?i)math|algebra|calculus"),
        (SubjectCategory::Physics, r"(?i)physic"),
    ]
    .into_iter()
    .map(|(category, pattern)| (category, Regex::new(pattern).expect("valid category regex")))
    .collect()
});

/// Broad subject area guessed from a subject name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectCategory {
    #[serde(rename = "default")]
    General,
    Biology,
    Chemistry,
    History,
    Language,
    Math,
    Physics,
}

impl SubjectCategory {
    /// First matching category by keyword, `General` otherwise.
    pub fn from_name(name: &str) -> Self {
        CATEGORY_RULES
            .iter()
            .find(|(_, pattern)| pattern.is_match(name))
            .map_or(Self::General, |(category, _)| *category)
    }

    /// Material icon name used by front ends.
    pub fn icon(self) -> &'static str {
        match self {
            Self::General => "folder",
            Self::Biology => "biotech",
            Self::Chemistry => "science",
            Self::History => "public",
            Self::Language => "translate",
            Self::Math => "calculate",
            Self::Physics => "psychology",
        }
    }
}

/// Headline counts for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_subjects: usize,
    pub total_contents: usize,
    /// Items due today or earlier.
    pub due_today: usize,
    /// Items due before today.
    pub overdue: usize,
    /// Items whose status is `completed`.
    pub completed: usize,
    pub daily_goal: u32,
}

/// Per-subject dashboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    #[serde(rename = "id")]
    pub subject_uuid: SubjectId,
    pub name: String,
    pub category: SubjectCategory,
    pub total_cards: usize,
    /// Cards due today or earlier.
    pub due_cards: usize,
    /// Cards whose status is `overdue`.
    pub overdue_cards: usize,
    /// The subject has cards and none of them is due.
    pub is_done: bool,
    /// Rounded percentage of `MASTERY_LEVEL_CAP` reached on average.
    pub average_mastery: u32,
}

/// Full dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub subjects: Vec<SubjectSummary>,
}

/// Dashboard service over subject and content repository handles.
pub struct DashboardService<S, R, C = SystemClock>
where
    S: SubjectRepository,
    R: ContentRepository,
    C: Clock,
{
    subjects: S,
    contents: R,
    clock: C,
    daily_goal: u32,
}

impl<S: SubjectRepository, R: ContentRepository> DashboardService<S, R, SystemClock> {
    pub fn new(subjects: S, contents: R) -> Self {
        Self::with_clock(subjects, contents, SystemClock)
    }
}

impl<S: SubjectRepository, R: ContentRepository, C: Clock> DashboardService<S, R, C> {
    pub fn with_clock(subjects: S, contents: R, clock: C) -> Self {
        Self {
            subjects,
            contents,
            clock,
            daily_goal: DEFAULT_DAILY_GOAL,
        }
    }

    pub fn with_daily_goal(mut self, daily_goal: u32) -> Self {
        self.daily_goal = daily_goal;
        self
    }

    /// Builds stats and per-subject rows as of the service clock.
    pub fn load(&self) -> ServiceResult<Dashboard> {
        let today = self.clock.today();
        let subjects = self.subjects.list_subjects()?;
        let contents = self.contents.list_contents(&ContentListQuery::default())?;

        let stats = DashboardStats {
            total_subjects: subjects.len(),
            total_contents: contents.len(),
            due_today: contents
                .iter()
                .filter(|content| content.next_review_date <= today)
                .count(),
            overdue: contents
                .iter()
                .filter(|content| content.next_review_date < today)
                .count(),
            completed: contents
                .iter()
                .filter(|content| content.status_on(today) == ContentStatus::Completed)
                .count(),
            daily_goal: self.daily_goal,
        };

        let summaries = subjects
            .iter()
            .map(|subject| {
                let owned: Vec<&Content> = contents
                    .iter()
                    .filter(|content| content.subject_uuid == subject.uuid)
                    .collect();
                summarize(subject, &owned, today)
            })
            .collect();

        Ok(Dashboard {
            stats,
            subjects: summaries,
        })
    }

    /// Summary row for one subject.
    pub fn subject_summary(&self, id: SubjectId) -> ServiceResult<SubjectSummary> {
        let subject = self
            .subjects
            .get_subject(id)?
            .ok_or(StudyServiceError::SubjectNotFound(id))?;
        let contents = self
            .contents
            .list_contents(&ContentListQuery::for_subject(id))?;
        let owned: Vec<&Content> = contents.iter().collect();
        Ok(summarize(&subject, &owned, self.clock.today()))
    }
}

fn summarize(subject: &Subject, contents: &[&Content], today: NaiveDate) -> SubjectSummary {
    let due_cards = contents
        .iter()
        .filter(|content| content.next_review_date <= today)
        .count();
    let overdue_cards = contents
        .iter()
        .filter(|content| content.status_on(today) == ContentStatus::Overdue)
        .count();

    SubjectSummary {
        subject_uuid: subject.uuid,
        name: subject.name.clone(),
        category: SubjectCategory::from_name(&subject.name),
        total_cards: contents.len(),
        due_cards,
        overdue_cards,
        is_done: due_cards == 0 && !contents.is_empty(),
        average_mastery: average_mastery(contents),
    }
}

fn average_mastery(contents: &[&Content]) -> u32 {
    if contents.is_empty() {
        return 0;
    }
    let total_level: u64 = contents
        .iter()
        .map(|content| u64::from(content.review_level))
        .sum();
    let ceiling = contents.len() as u64 * u64::from(MASTERY_LEVEL_CAP);
    let percent = (total_level as f64 / ceiling as f64 * 100.0).round();
    percent.min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::{average_mastery, SubjectCategory};
    use crate::model::content::Content;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn category_follows_first_matching_keyword() {
        assert_eq!(SubjectCategory::from_name("Marine Biology"), SubjectCategory::Biology);
        assert_eq!(SubjectCategory::from_name("Organic compounds"), SubjectCategory::Chemistry);
        assert_eq!(SubjectCategory::from_name("SPANISH B2"), SubjectCategory::Language);
        assert_eq!(SubjectCategory::from_name("Linear Algebra"), SubjectCategory::Math);
        assert_eq!(SubjectCategory::from_name("Guitar"), SubjectCategory::General);
        assert_eq!(SubjectCategory::General.icon(), "folder");
        assert_eq!(
            serde_json::to_string(&SubjectCategory::General).unwrap(),
            "\"default\""
        );
        assert_eq!(
            serde_json::to_string(&SubjectCategory::Math).unwrap(),
            "\"math\""
        );
    }

    #[test]
    fn mastery_is_rounded_percentage_of_cap() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let subject = Uuid::new_v4();
        let mut first = Content::new(subject, "a", today, 0);
        let mut second = Content::new(subject, "b", today, 0);
        first.review_level = 3;
        second.review_level = 4;
        // 7 / 20 = 35%
        assert_eq!(average_mastery(&[&first, &second]), 35);
        assert_eq!(average_mastery(&[]), 0);
    }
}
