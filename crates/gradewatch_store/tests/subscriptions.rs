use std::sync::Once;

use gradewatch_core::{ExamEntry, LectureResult};
use gradewatch_store::GradeStore;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(portal_logging::initialize_for_tests);
}

fn store_with_lecture() -> (GradeStore, i64) {
    let mut store = GradeStore::open_in_memory().unwrap();
    let changes = store
        .upsert(
            "CS Dept",
            &[LectureResult {
                name: "Algorithms".to_string(),
                exams: vec![ExamEntry {
                    name: "Midterm".to_string(),
                    percentage: "40%".to_string(),
                    date: "2024-03-01".to_string(),
                }],
            }],
        )
        .unwrap();
    let lecture_id = changes[0].lecture_id;
    (store, lecture_id)
}

#[test]
fn double_add_keeps_one_row() {
    init_logging();
    let (store, lecture_id) = store_with_lecture();

    assert!(store.add_subscription(lecture_id, "user-1"));
    assert!(store.add_subscription(lecture_id, "user-1"));

    assert!(store.is_subscribed(lecture_id, "user-1").unwrap());
    assert_eq!(store.subscribers(lecture_id).unwrap(), vec!["user-1"]);
}

#[test]
fn remove_on_absent_pair_succeeds() {
    init_logging();
    let (store, lecture_id) = store_with_lecture();

    assert!(store.remove_subscription(lecture_id, "nobody"));
    assert!(store.subscribers(lecture_id).unwrap().is_empty());
}

#[test]
fn add_then_remove_round_trip() {
    init_logging();
    let (store, lecture_id) = store_with_lecture();

    assert!(store.add_subscription(lecture_id, "user-1"));
    assert!(store.remove_subscription(lecture_id, "user-1"));
    assert!(!store.is_subscribed(lecture_id, "user-1").unwrap());
}

#[test]
fn subscriptions_lists_lectures_per_user() {
    init_logging();
    let (mut store, lecture_id) = store_with_lecture();
    let changes = store
        .upsert(
            "CS Dept",
            &[LectureResult {
                name: "Operating Systems".to_string(),
                exams: Vec::new(),
            }],
        )
        .unwrap();
    // A lecture with no exams produces no change events; look it up instead.
    assert!(changes.is_empty());
    let departments = store.departments().unwrap();
    let lectures = store.lectures(departments[0].0).unwrap();
    let other_id = lectures
        .iter()
        .find(|(_, name)| name == "Operating Systems")
        .map(|(id, _)| *id)
        .unwrap();

    store.add_subscription(lecture_id, "user-1");
    store.add_subscription(other_id, "user-1");

    let mut subscribed = store.subscriptions("user-1").unwrap();
    subscribed.sort_unstable();
    let mut expected = vec![lecture_id, other_id];
    expected.sort_unstable();
    assert_eq!(subscribed, expected);
}

#[test]
fn name_lookups_for_front_end_callbacks() {
    init_logging();
    let (store, lecture_id) = store_with_lecture();
    let departments = store.departments().unwrap();

    assert_eq!(
        store.department_name(departments[0].0).unwrap().as_deref(),
        Some("CS Dept")
    );
    assert_eq!(
        store.lecture_name(lecture_id).unwrap().as_deref(),
        Some("Algorithms")
    );
    assert_eq!(store.department_name(9999).unwrap(), None);
    assert_eq!(store.lecture_name(9999).unwrap(), None);
}
