//! Fixed-table spaced-repetition scheduling.
//!
//! # Responsibility
//! - Map a review level to the next review date.
//! - Classify a stored review date against "today" into a `ContentStatus`.
//! - Apply a study event to a content record as one value transition.
//!
//! # Invariants
//! - Levels past the end of the interval table reuse its last entry.
//! - All comparisons are done on calendar dates, never on times of day.
//! - `days_overdue*` never returns a negative count.
//!
//! The `*_on`/`*_at` variants take the reference day explicitly; the plain
//! variants read the local system clock.

use crate::model::content::{Content, ContentStatus, StudyEvent};
use chrono::{DateTime, Days, Local, NaiveDate};

/// Days until the next review, indexed by review level.
pub const SPACED_REPETITION_INTERVALS: [u32; 6] = [0, 1, 3, 7, 15, 30];

/// Review level at which an item counts as completed.
pub const MAX_REVIEW_LEVEL: u32 = SPACED_REPETITION_INTERVALS.len() as u32;

/// Interval for `level`, clamped to the last table entry.
pub fn interval_days(level: u32) -> u32 {
    let last = SPACED_REPETITION_INTERVALS.len() - 1;
    let index = usize::try_from(level).map_or(last, |level| level.min(last));
    SPACED_REPETITION_INTERVALS[index]
}

/// Today's date in the local time zone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Local calendar date of an epoch-millisecond timestamp.
pub fn local_date_of(epoch_ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(epoch_ms).map(|utc| utc.with_timezone(&Local).date_naive())
}

/// Next review date for `level`, counted from `today`.
pub fn next_review_date_on(level: u32, today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(interval_days(level))))
        .unwrap_or(NaiveDate::MAX)
}

/// Next review date for `level`, counted from the local current day.
pub fn compute_next_review_date(level: u32) -> NaiveDate {
    next_review_date_on(level, today_local())
}

/// Classifies a review date as seen on `today`.
///
/// Precedence: completed, then overdue, then due-today, then on-track.
pub fn classify_status_on(
    next_review_date: NaiveDate,
    review_level: u32,
    max_level: u32,
    today: NaiveDate,
) -> ContentStatus {
    if review_level >= max_level {
        return ContentStatus::Completed;
    }
    if next_review_date < today {
        return ContentStatus::Overdue;
    }
    if next_review_date == today {
        return ContentStatus::DueToday;
    }
    ContentStatus::OnTrack
}

/// Classifies a review date against the local current day.
pub fn classify_status(
    next_review_date: NaiveDate,
    review_level: u32,
    max_level: u32,
) -> ContentStatus {
    classify_status_on(next_review_date, review_level, max_level, today_local())
}

/// Whole days between `next_review_date` and `today`, or zero when not late.
pub fn days_overdue_on(next_review_date: NaiveDate, today: NaiveDate) -> u32 {
    let days = today.signed_duration_since(next_review_date).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Days overdue against the local current day.
pub fn days_overdue(next_review_date: NaiveDate) -> u32 {
    days_overdue_on(next_review_date, today_local())
}

/// Returns `content` after one study at `now`.
///
/// Bumps the level by one, reschedules from `now`'s calendar day, appends the
/// study event and bumps the review counter. The input is left untouched.
pub fn register_study_event_at(content: &Content, now: DateTime<Local>) -> Content {
    let review_level = content.review_level.saturating_add(1);
    let now_ms = now.timestamp_millis();

    let mut study_history = Vec::with_capacity(content.study_history.len() + 1);
    study_history.extend_from_slice(&content.study_history);
    study_history.push(StudyEvent { studied_at: now_ms });

    Content {
        review_level,
        next_review_date: next_review_date_on(review_level, now.date_naive()),
        study_history,
        total_reviews: content.total_reviews.saturating_add(1),
        updated_at: now_ms.max(content.updated_at),
        ..content.clone()
    }
}

/// Returns `content` after one study at the current local time.
pub fn register_study_event(content: &Content) -> Content {
    register_study_event_at(content, Local::now())
}

#[cfg(test)]
mod tests {
    use super::{
        classify_status, classify_status_on, compute_next_review_date, days_overdue,
        days_overdue_on, interval_days, next_review_date_on, register_study_event,
        register_study_event_at, today_local, MAX_REVIEW_LEVEL, SPACED_REPETITION_INTERVALS,
    };
    use crate::clock::{Clock, FixedClock};
    use crate::model::content::{Content, ContentStatus, StudyEvent};
    use chrono::{Days, NaiveDate};
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn minus(date: NaiveDate, days: u64) -> NaiveDate {
        date.checked_sub_days(Days::new(days)).unwrap()
    }

    #[test]
    fn next_review_date_follows_clamped_table() {
        let today = day(2024, 6, 1);
        for level in 0..20u32 {
            let index = (level as usize).min(SPACED_REPETITION_INTERVALS.len() - 1);
            let expected = today
                .checked_add_days(Days::new(u64::from(SPACED_REPETITION_INTERVALS[index])))
                .unwrap();
            assert_eq!(next_review_date_on(level, today), expected, "level {level}");
        }
    }

    #[test]
    fn level_zero_is_due_today_and_high_levels_clamp() {
        let today = day(2024, 12, 20);
        assert_eq!(next_review_date_on(0, today), today);
        assert_eq!(next_review_date_on(5, today), next_review_date_on(100, today));
        assert_eq!(next_review_date_on(5, today), day(2025, 1, 19));
        assert_eq!(interval_days(u32::MAX), 30);
    }

    #[test]
    fn completed_wins_over_overdue() {
        let today = day(2024, 6, 10);
        let status =
            classify_status_on(minus(today, 40), MAX_REVIEW_LEVEL, MAX_REVIEW_LEVEL, today);
        assert_eq!(status, ContentStatus::Completed);
    }

    #[test]
    fn classify_status_orders_past_present_future() {
        let today = day(2024, 6, 10);
        let tomorrow = today.succ_opt().unwrap();
        assert_eq!(
            classify_status_on(minus(today, 1), 2, MAX_REVIEW_LEVEL, today),
            ContentStatus::Overdue
        );
        assert_eq!(
            classify_status_on(today, 2, MAX_REVIEW_LEVEL, today),
            ContentStatus::DueToday
        );
        assert_eq!(
            classify_status_on(tomorrow, 2, MAX_REVIEW_LEVEL, today),
            ContentStatus::OnTrack
        );
    }

    #[test]
    fn days_overdue_is_never_negative() {
        let today = day(2024, 3, 31);
        assert_eq!(days_overdue_on(today, today), 0);
        assert_eq!(days_overdue_on(minus(today, 3), today), 3);
        assert_eq!(days_overdue_on(today.succ_opt().unwrap(), today), 0);
        // Spans the March DST switch in many zones; calendar math is unaffected.
        assert_eq!(days_overdue_on(day(2024, 3, 1), today), 30);
    }

    #[test]
    fn study_event_bumps_all_review_fields_together() {
        let clock = FixedClock::on_date(day(2024, 5, 1));
        let mut content = Content::new(Uuid::new_v4(), "Photosynthesis", day(2024, 4, 1), 0);
        content.review_level = 2;
        content.total_reviews = 5;
        content.study_history = (1..=5).map(|n| StudyEvent { studied_at: n }).collect();

        let studied = register_study_event_at(&content, clock.now());

        assert_eq!(studied.review_level, 3);
        assert_eq!(studied.total_reviews, 6);
        assert_eq!(studied.study_history.len(), 6);
        assert_eq!(studied.study_history[..5], content.study_history[..]);
        assert_eq!(studied.last_studied_at(), Some(clock.now_ms()));
        assert_eq!(studied.next_review_date, day(2024, 5, 8));
        assert_eq!(content.review_level, 2, "input must stay untouched");
        studied.validate().unwrap();
    }

    #[test]
    fn first_study_moves_new_item_on_track() {
        let today = day(2024, 7, 15);
        let clock = FixedClock::on_date(today);
        let content = Content::new(Uuid::new_v4(), "Past tense", today, 0);
        assert_eq!(content.status_on(today), ContentStatus::DueToday);

        let studied = register_study_event_at(&content, clock.now());
        assert_eq!(studied.next_review_date, day(2024, 7, 16));
        assert_eq!(studied.status_on(today), ContentStatus::OnTrack);
    }

    #[test]
    fn yesterday_at_level_two_is_one_day_overdue() {
        let today = day(2024, 1, 1);
        let mut content = Content::new(Uuid::new_v4(), "Integrals", today, 0);
        content.review_level = 2;
        content.next_review_date = minus(today, 1);
        assert_eq!(content.status_on(today), ContentStatus::Overdue);
        assert_eq!(content.days_overdue_on(today), 1);
    }

    #[test]
    fn level_keeps_growing_past_the_table() {
        let today = day(2024, 1, 1);
        let clock = FixedClock::on_date(today);
        let mut content = Content::new(Uuid::new_v4(), "Periodic table", today, 0);
        content.review_level = MAX_REVIEW_LEVEL;
        let studied = register_study_event_at(&content, clock.now());
        assert_eq!(studied.review_level, MAX_REVIEW_LEVEL + 1);
        assert_eq!(studied.next_review_date, day(2024, 1, 31));
        assert_eq!(studied.status_on(today), ContentStatus::Completed);
    }

    #[test]
    fn wall_clock_variants_use_the_local_day() {
        // Retry once in case the test straddles local midnight.
        for _ in 0..2 {
            let today = today_local();
            let week = compute_next_review_date(3);
            let status = classify_status(minus(today, 1), 2, MAX_REVIEW_LEVEL);
            let late = days_overdue(today);
            let studied =
                register_study_event(&Content::new(Uuid::new_v4(), "Atoms", today, 0));
            if today_local() != today {
                continue;
            }

            assert_eq!(compute_next_review_date(0), today);
            assert_eq!(week, today.checked_add_days(Days::new(7)).unwrap());
            assert_eq!(status, ContentStatus::Overdue);
            assert_eq!(late, 0);
            assert_eq!(days_overdue(minus(today, 3)), 3);
            assert_eq!(studied.review_level, 1);
            assert_eq!(studied.total_reviews, 1);
            assert_eq!(
                studied.next_review_date,
                today.checked_add_days(Days::new(1)).unwrap()
            );
            return;
        }
        panic!("local day changed twice during the test");
    }
}
