use chrono::NaiveDate;
use studytrack_core::db::open_db_in_memory;
use studytrack_core::{
    Clock, Content, ContentListQuery, ContentRepository, FixedClock, NewSubject, RepoError,
    SqliteContentRepository, SqliteSubjectRepository, StudyEvent, StudyServiceError, Subject,
    SubjectPatch, SubjectRepository, SubjectService,
};
use uuid::Uuid;

fn clock() -> FixedClock {
    FixedClock::on_date(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSubjectRepository::try_new(&conn).unwrap();

    let mut subject = Subject::new("Biology", 1_000);
    subject.description = Some("Cells and genetics".to_string());
    repo.create_subject(&subject).unwrap();

    let loaded = repo.get_subject(subject.uuid).unwrap().unwrap();
    assert_eq!(loaded, subject);
}

#[test]
fn list_is_sorted_by_name_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SubjectService::with_clock(SqliteSubjectRepository::try_new(&conn).unwrap(), clock());

    for name in ["physics", "Art History", "biology"] {
        service
            .create_subject(NewSubject {
                name: name.to_string(),
                description: None,
            })
            .unwrap();
    }

    let names: Vec<String> = service
        .list_subjects()
        .unwrap()
        .into_iter()
        .map(|subject| subject.name)
        .collect();
    assert_eq!(names, ["Art History", "biology", "physics"]);
}

#[test]
fn create_trims_name_and_rejects_blank() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SubjectService::with_clock(SqliteSubjectRepository::try_new(&conn).unwrap(), clock());

    let created = service
        .create_subject(NewSubject {
            name: "  Italian  ".to_string(),
            description: Some("   ".to_string()),
        })
        .unwrap();
    assert_eq!(created.name, "Italian");
    assert_eq!(created.description, None);

    let err = service
        .create_subject(NewSubject {
            name: " \t ".to_string(),
            description: None,
        })
        .unwrap_err();
    assert!(matches!(err, StudyServiceError::InvalidName));
}

#[test]
fn partial_update_keeps_unset_fields() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SubjectService::with_clock(SqliteSubjectRepository::try_new(&conn).unwrap(), clock());

    let created = service
        .create_subject(NewSubject {
            name: "Chemistry".to_string(),
            description: Some("Organic".to_string()),
        })
        .unwrap();

    let renamed = service
        .update_subject(
            created.uuid,
            SubjectPatch {
                name: Some("Organic Chemistry".to_string()),
                description: None,
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Organic Chemistry");
    assert_eq!(renamed.description.as_deref(), Some("Organic"));

    let cleared = service
        .update_subject(
            created.uuid,
            SubjectPatch {
                name: None,
                description: Some(String::new()),
            },
        )
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(service.get_subject(created.uuid).unwrap(), Some(cleared));
}

#[test]
fn update_keeps_a_newer_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let later = FixedClock::on_date(NaiveDate::from_ymd_opt(2024, 9, 20).unwrap()).now_ms();
    let subject = Subject::new("Geology", later);
    SqliteSubjectRepository::try_new(&conn)
        .unwrap()
        .create_subject(&subject)
        .unwrap();

    let service =
        SubjectService::with_clock(SqliteSubjectRepository::try_new(&conn).unwrap(), clock());
    let renamed = service
        .update_subject(
            subject.uuid,
            SubjectPatch {
                name: Some("Geology and Soils".to_string()),
                description: None,
            },
        )
        .unwrap();

    assert_eq!(renamed.updated_at, later);
    assert_eq!(service.get_subject(subject.uuid).unwrap(), Some(renamed));
}

#[test]
fn update_missing_subject_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSubjectRepository::try_new(&conn).unwrap();

    let subject = Subject::new("Ghost", 0);
    let err = repo.update_subject(&subject).unwrap_err();
    assert!(matches!(err, RepoError::SubjectNotFound(id) if id == subject.uuid));
}

#[test]
fn delete_cascades_to_contents_and_study_events() {
    let conn = open_db_in_memory().unwrap();
    let subjects = SqliteSubjectRepository::try_new(&conn).unwrap();
    let contents = SqliteContentRepository::try_new(&conn).unwrap();
    let today = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();

    let doomed = Subject::new("History", 0);
    let kept = Subject::new("Math", 0);
    subjects.create_subject(&doomed).unwrap();
    subjects.create_subject(&kept).unwrap();

    let mut studied = Content::new(doomed.uuid, "Treaty of Westphalia", today, 0);
    studied.total_reviews = 1;
    studied.review_level = 1;
    studied.study_history.push(StudyEvent { studied_at: 10 });
    contents.create_content(&studied).unwrap();
    contents
        .create_content(&Content::new(doomed.uuid, "French Revolution", today, 0))
        .unwrap();
    contents
        .create_content(&Content::new(kept.uuid, "Limits", today, 0))
        .unwrap();

    let service = SubjectService::with_clock(subjects, clock());
    assert_eq!(service.delete_subject(doomed.uuid).unwrap(), 2);

    let remaining = contents.list_contents(&ContentListQuery::default()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].subject_uuid, kept.uuid);

    let orphan_events: i64 = conn
        .query_row("SELECT COUNT(*) FROM study_events;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphan_events, 0);
}

#[test]
fn delete_missing_subject_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SubjectService::with_clock(SqliteSubjectRepository::try_new(&conn).unwrap(), clock());
    let missing = Uuid::new_v4();

    let err = service.delete_subject(missing).unwrap_err();
    assert!(matches!(err, StudyServiceError::SubjectNotFound(id) if id == missing));
}
