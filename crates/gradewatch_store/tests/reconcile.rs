use std::sync::Once;

use gradewatch_core::{ExamEntry, LectureResult};
use gradewatch_store::GradeStore;
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(portal_logging::initialize_for_tests);
}

fn midterm(date: &str) -> LectureResult {
    LectureResult {
        name: "Algorithms".to_string(),
        exams: vec![ExamEntry {
            name: "Midterm".to_string(),
            percentage: "40%".to_string(),
            date: date.to_string(),
        }],
    }
}

#[test]
fn department_and_lecture_creation_is_idempotent() {
    init_logging();
    let mut store = GradeStore::open_in_memory().unwrap();

    store.upsert("CS Dept", &[midterm("2024-03-01")]).unwrap();
    store.upsert("CS Dept", &[midterm("2024-03-01")]).unwrap();

    let departments = store.departments().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].1, "CS Dept");

    let lectures = store.lectures(departments[0].0).unwrap();
    assert_eq!(lectures.len(), 1);
    assert_eq!(lectures[0].1, "Algorithms");
}

#[test]
fn identical_upsert_keeps_the_row_and_its_id() {
    init_logging();
    let mut store = GradeStore::open_in_memory().unwrap();

    let changes = store.upsert("CS Dept", &[midterm("2024-03-01")]).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].exam, "Midterm");

    let lecture_id = changes[0].lecture_id;
    let before = store.exams(lecture_id).unwrap();
    assert_eq!(before.len(), 1);

    // Same values again: no-op, same row id, no change events.
    let changes = store.upsert("CS Dept", &[midterm("2024-03-01")]).unwrap();
    assert!(changes.is_empty());

    let after = store.exams(lecture_id).unwrap();
    assert_eq!(after, before);
}

#[test]
fn changed_date_replaces_the_row() {
    init_logging();
    let mut store = GradeStore::open_in_memory().unwrap();

    let changes = store.upsert("CS Dept", &[midterm("2024-03-01")]).unwrap();
    let lecture_id = changes[0].lecture_id;
    let (old_id, _) = store.exams(lecture_id).unwrap()[0].clone();

    let changes = store.upsert("CS Dept", &[midterm("2024-03-05")]).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].lecture, "Algorithms");

    let rows = store.exams(lecture_id).unwrap();
    assert_eq!(rows.len(), 1);
    let (new_id, entry) = rows[0].clone();
    assert_ne!(new_id, old_id);
    assert_eq!(entry.date, "2024-03-05");
    assert_eq!(entry.percentage, "40%");
}

#[test]
fn one_transaction_covers_multiple_lectures() {
    init_logging();
    let mut store = GradeStore::open_in_memory().unwrap();

    let lectures = vec![
        midterm("2024-03-01"),
        LectureResult {
            name: "Operating Systems".to_string(),
            exams: vec![
                ExamEntry {
                    name: "Final".to_string(),
                    percentage: "60%".to_string(),
                    date: "2024-06-10".to_string(),
                },
                ExamEntry {
                    name: "Letter Grade".to_string(),
                    percentage: "100%".to_string(),
                    date: "2024-06-12".to_string(),
                },
            ],
        },
    ];

    let changes = store.upsert("CS Dept", &lectures).unwrap();
    assert_eq!(changes.len(), 3);

    let departments = store.departments().unwrap();
    let listed = store.lectures(departments[0].0).unwrap();
    assert_eq!(listed.len(), 2);
}

#[test]
fn on_disk_store_survives_reopen() {
    init_logging();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("results.db");

    {
        let mut store = GradeStore::open(&path).unwrap();
        store.upsert("CS Dept", &[midterm("2024-03-01")]).unwrap();
    }

    let store = GradeStore::open(&path).unwrap();
    let departments = store.departments().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(store.lectures(departments[0].0).unwrap().len(), 1);
}
