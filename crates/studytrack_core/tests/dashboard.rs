use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use studytrack_core::db::open_db_in_memory;
use studytrack_core::{
    Content, ContentRepository, DashboardService, FixedClock, SqliteContentRepository,
    SqliteSubjectRepository, StudyEvent, StudyServiceError, Subject, SubjectCategory,
    SubjectRepository, DEFAULT_DAILY_GOAL, MAX_REVIEW_LEVEL,
};
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 14).unwrap()
}

fn shift(days: i64) -> NaiveDate {
    if days >= 0 {
        today().checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today().checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

fn seed_subject(conn: &Connection, name: &str) -> Subject {
    let subject = Subject::new(name, 0);
    SqliteSubjectRepository::try_new(conn)
        .unwrap()
        .create_subject(&subject)
        .unwrap();
    subject
}

fn seed_content(conn: &Connection, subject: &Subject, level: u32, due_in_days: i64) {
    let mut content = Content::new(subject.uuid, format!("card {level}"), today(), 0);
    content.review_level = level;
    content.total_reviews = level;
    content.study_history = (0..level)
        .map(|n| StudyEvent {
            studied_at: i64::from(n),
        })
        .collect();
    content.next_review_date = shift(due_in_days);
    SqliteContentRepository::try_new(conn)
        .unwrap()
        .create_content(&content)
        .unwrap();
}

fn dashboard(
    conn: &Connection,
) -> DashboardService<SqliteSubjectRepository<'_>, SqliteContentRepository<'_>, FixedClock> {
    DashboardService::with_clock(
        SqliteSubjectRepository::try_new(conn).unwrap(),
        SqliteContentRepository::try_new(conn).unwrap(),
        FixedClock::on_date(today()),
    )
}

#[test]
fn empty_store_yields_zero_stats() {
    let conn = open_db_in_memory().unwrap();
    let loaded = dashboard(&conn).load().unwrap();

    assert_eq!(loaded.stats.total_subjects, 0);
    assert_eq!(loaded.stats.total_contents, 0);
    assert_eq!(loaded.stats.due_today, 0);
    assert_eq!(loaded.stats.daily_goal, DEFAULT_DAILY_GOAL);
    assert!(loaded.subjects.is_empty());
}

#[test]
fn stats_count_due_overdue_and_completed() {
    let conn = open_db_in_memory().unwrap();
    let biology = seed_subject(&conn, "Cell Biology");
    let math = seed_subject(&conn, "Algebra");
    let empty = seed_subject(&conn, "Zoology");

    seed_content(&conn, &biology, 1, -3);
    seed_content(&conn, &biology, 2, 0);
    seed_content(&conn, &biology, MAX_REVIEW_LEVEL, -10);
    seed_content(&conn, &math, 4, 5);
    seed_content(&conn, &math, 8, 12);

    let loaded = dashboard(&conn).with_daily_goal(20).load().unwrap();
    let stats = &loaded.stats;
    assert_eq!(stats.total_subjects, 3);
    assert_eq!(stats.total_contents, 5);
    assert_eq!(stats.due_today, 3);
    assert_eq!(stats.overdue, 2);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.daily_goal, 20);

    let names: Vec<&str> = loaded.subjects.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Algebra", "Cell Biology", "Zoology"]);

    let algebra = &loaded.subjects[0];
    assert_eq!(algebra.category, SubjectCategory::Math);
    assert_eq!(algebra.total_cards, 2);
    assert_eq!(algebra.due_cards, 0);
    assert!(algebra.is_done);
    // (4 + 8) / (2 * 10) = 60%
    assert_eq!(algebra.average_mastery, 60);

    let cell = &loaded.subjects[1];
    assert_eq!(cell.subject_uuid, biology.uuid);
    assert_eq!(cell.category, SubjectCategory::Biology);
    assert_eq!(cell.total_cards, 3);
    assert_eq!(cell.due_cards, 3);
    assert_eq!(cell.overdue_cards, 1);
    assert!(!cell.is_done);

    let zoo = &loaded.subjects[2];
    assert_eq!(zoo.subject_uuid, empty.uuid);
    assert_eq!(zoo.total_cards, 0);
    assert!(!zoo.is_done, "a subject without cards is never done");
    assert_eq!(zoo.average_mastery, 0);
}

#[test]
fn subject_summary_matches_dashboard_row() {
    let conn = open_db_in_memory().unwrap();
    let history = seed_subject(&conn, "World History");
    seed_content(&conn, &history, 1, -1);
    seed_content(&conn, &history, 3, 2);
    let service = dashboard(&conn);

    let summary = service.subject_summary(history.uuid).unwrap();
    let loaded = service.load().unwrap();
    assert_eq!(loaded.subjects, vec![summary.clone()]);
    assert_eq!(summary.category, SubjectCategory::History);
    assert_eq!(summary.due_cards, 1);

    let missing = Uuid::new_v4();
    let err = service.subject_summary(missing).unwrap_err();
    assert!(matches!(err, StudyServiceError::SubjectNotFound(id) if id == missing));
}

#[test]
fn dashboard_serializes_camel_case() {
    let conn = open_db_in_memory().unwrap();
    let physics = seed_subject(&conn, "Physics");
    seed_content(&conn, &physics, 0, 0);

    let json = serde_json::to_value(dashboard(&conn).load().unwrap()).unwrap();
    assert_eq!(json["stats"]["dueToday"], 1);
    assert_eq!(json["stats"]["dailyGoal"], 50);
    assert_eq!(json["subjects"][0]["category"], "physics");
    assert_eq!(json["subjects"][0]["id"], physics.uuid.to_string());
}
