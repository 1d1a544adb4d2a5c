//! Snapshot persistence: round trips, first-run seeding, and write failures.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};

use gradebook_core::clock::{Clock, FixedClock};
use gradebook_core::{
    AssessmentRegistry, AttemptStatus, JsonFileStore, MemoryStore, NewQuestion, RegistryOptions,
    Snapshot, SnapshotStore, StoreError, Student,
};

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap())
}

fn unseeded() -> RegistryOptions {
    RegistryOptions {
        seed_demo_data: false,
        ..Default::default()
    }
}

/// A store whose writes always fail.
struct FailingStore;

impl SnapshotStore for FailingStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(None)
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}

fn populate(reg: &mut AssessmentRegistry) -> (u32, u32) {
    let student = reg.add_student("Ada Lovelace", "G1", "ada@example.org").unwrap();
    let test = reg.add_test("Arithmetic", "Mathematics", 30).unwrap();
    let q = reg
        .add_question_to_test(
            test,
            NewQuestion::single_choice("2 + 2 = ?", ["3", "4"], ["4"]).with_points(2.0),
        )
        .unwrap();
    let essay = reg
        .add_question_to_test(test, NewQuestion::free_text("Why?"))
        .unwrap();
    let attempt = reg.create_attempt(student, test).unwrap();
    reg.start_attempt(attempt).unwrap();
    reg.submit_answer(attempt, q, vec!["4".into()]).unwrap();
    reg.finish_attempt(attempt).unwrap();
    reg.evaluate_attempt(attempt, Some(BTreeMap::from([(essay, 1.0)])))
        .unwrap();
    (student, attempt)
}

#[test]
fn memory_store_round_trip_preserves_state_and_counters() {
    let store = MemoryStore::new();
    let mut reg = AssessmentRegistry::open(store.clone(), clock(), unseeded());
    let (student, attempt) = populate(&mut reg);
    let before = reg.snapshot();

    let reopened = AssessmentRegistry::open(store, clock(), unseeded());
    assert_eq!(reopened.snapshot(), before);
    assert_eq!(reopened.counters(), reg.counters());
    assert_eq!(
        reopened.student_attempts(student, None)[0].id,
        attempt,
        "attempt lists are rebuilt on load"
    );
}

#[test]
fn json_file_round_trip_and_ids_keep_increasing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradebook.json");

    let mut reg = AssessmentRegistry::open(JsonFileStore::new(&path), clock(), unseeded());
    let (student, attempt) = populate(&mut reg);
    assert!(path.exists());

    let mut reopened = AssessmentRegistry::open(JsonFileStore::new(&path), clock(), unseeded());
    let restored = reopened.find_attempt_by_id(attempt).unwrap();
    assert_eq!(restored.status, AttemptStatus::Evaluated);
    assert_eq!(restored.final_score, 3.0);
    assert_eq!(restored.percentage, 100.0);
    assert_eq!(restored.started_at, clock().now());

    let next = reopened.add_student("Grace Hopper", "G1", "").unwrap();
    assert_eq!(next, student + 1);
    let test = reopened.add_test("Second", "History", 10).unwrap();
    assert_eq!(test, 2);
    let q = reopened
        .add_question_to_test(test, NewQuestion::free_text("When?"))
        .unwrap();
    assert_eq!(q, 3);
}

#[test]
fn first_run_seeds_demo_data_and_saves_it() {
    let store = MemoryStore::new();
    let reg = AssessmentRegistry::open(store.clone(), clock(), RegistryOptions::default());

    assert_eq!(reg.students().count(), 3);
    assert_eq!(reg.tests().count(), 2);
    assert_eq!(reg.attempts().count(), 0);
    assert_eq!(reg.find_test_by_id(1).unwrap().max_score(), 5.0);
    assert_eq!(reg.find_students_by_group("Group 101").len(), 2);

    let saved = store.snapshot().expect("seed is persisted");
    assert_eq!(saved.students.len(), 3);
    assert_eq!(saved.counters.question, 6);
}

#[test]
fn seeding_can_be_disabled() {
    let store = MemoryStore::new();
    let reg = AssessmentRegistry::open(store.clone(), clock(), unseeded());
    assert_eq!(reg.students().count(), 0);
    assert!(store.snapshot().is_none());
}

#[test]
fn malformed_file_falls_back_to_seed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradebook.json");
    std::fs::write(&path, "{ not json").unwrap();

    let reg = AssessmentRegistry::open(JsonFileStore::new(&path), clock(), RegistryOptions::default());
    assert_eq!(reg.students().count(), 3);

    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: Snapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.tests.len(), 2);

    let backup = dir.path().join("gradebook.json.bak");
    assert_eq!(std::fs::read_to_string(backup).unwrap(), "{ not json");
}

#[test]
fn snapshot_using_the_largest_id_falls_back_to_seed() {
    let snapshot = Snapshot {
        students: vec![Student::new(u32::MAX, "Max", "G9", "")],
        ..Snapshot::default()
    };
    let store = MemoryStore::with_snapshot(snapshot);
    let reg = AssessmentRegistry::open(store.clone(), clock(), RegistryOptions::default());

    assert_eq!(reg.students().count(), 3);
    assert!(reg.find_student_by_id(u32::MAX).is_none());
    assert_eq!(reg.counters().student, 4);
    assert_eq!(store.snapshot().unwrap().students.len(), 3);
}

#[test]
fn failed_saves_do_not_fail_commands() {
    let mut reg = AssessmentRegistry::open(FailingStore, clock(), unseeded());
    let (student, attempt) = populate(&mut reg);

    assert!(reg.find_student_by_id(student).is_some());
    assert_eq!(
        reg.find_attempt_by_id(attempt).unwrap().status,
        AttemptStatus::Evaluated
    );
    assert!(matches!(reg.save(), Err(StoreError::Io(_))));
}
