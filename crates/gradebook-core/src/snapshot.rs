//! Full-state snapshots.
//!
//! A [`Snapshot`] is a self-contained value holding every student, test
//! (questions nested), attempt, and id counter. Capturing and restoring are
//! pure conversions; where the bytes go is up to a
//! [`SnapshotStore`](crate::store::SnapshotStore).

use serde::{Deserialize, Serialize};

use crate::attempt::Attempt;
use crate::error::{EntityKind, StoreError};
use crate::model::{Student, Test};
use crate::registry::RegistryState;

/// Next id to hand out for each entity kind. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub student: u32,
    pub test: u32,
    pub question: u32,
    pub attempt: u32,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            student: 1,
            test: 1,
            question: 1,
            attempt: 1,
        }
    }
}

/// Return the current value of `counter` and advance it, or `None` once
/// the id space is used up.
pub(crate) fn next_id(counter: &mut u32) -> Option<u32> {
    let id = *counter;
    *counter = id.checked_add(1)?;
    Some(id)
}

fn next_after(ids: impl Iterator<Item = u32>) -> Option<u32> {
    match ids.max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

/// Complete serialized registry state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    #[serde(default)]
    pub counters: Counters,
}

impl Snapshot {
    pub(crate) fn capture(state: &RegistryState) -> Self {
        Self {
            students: state.students.values().cloned().collect(),
            tests: state.tests.values().cloned().collect(),
            attempts: state.attempts.values().cloned().collect(),
            counters: state.counters,
        }
    }

    /// Rebuild the in-memory graph, relinking attempts to their student and
    /// test by id.
    ///
    /// Attempts whose student or test is missing, or whose id repeats, are
    /// dropped. Counters are raised past every id present so the next
    /// allocation cannot collide; a snapshot that already uses the largest
    /// id of some kind is refused.
    pub(crate) fn restore(self) -> Result<RegistryState, StoreError> {
        let mut state = RegistryState::default();

        for mut student in self.students {
            student.attempts.clear();
            if state.students.insert(student.id, student).is_some() {
                tracing::warn!("snapshot contains a duplicate student id, keeping the last one");
            }
        }

        for test in self.tests {
            if state.tests.insert(test.id, test).is_some() {
                tracing::warn!("snapshot contains a duplicate test id, keeping the last one");
            }
        }

        for attempt in self.attempts {
            if state.attempts.contains_key(&attempt.id) {
                tracing::warn!(
                    "snapshot contains a duplicate attempt id {}, keeping the first one",
                    attempt.id
                );
                continue;
            }
            if !state.tests.contains_key(&attempt.test_id) {
                tracing::warn!(
                    "dropping attempt {}: test {} does not exist",
                    attempt.id,
                    attempt.test_id
                );
                continue;
            }
            let Some(student) = state.students.get_mut(&attempt.student_id) else {
                tracing::warn!(
                    "dropping attempt {}: student {} does not exist",
                    attempt.id,
                    attempt.student_id
                );
                continue;
            };
            student.attempts.push(attempt.id);
            state.attempts.insert(attempt.id, attempt);
        }

        let exhausted = StoreError::IdsExhausted;
        let mut counters = self.counters;
        counters.student = counters.student.max(
            next_after(state.students.keys().copied()).ok_or(exhausted(EntityKind::Student))?,
        );
        counters.test = counters
            .test
            .max(next_after(state.tests.keys().copied()).ok_or(exhausted(EntityKind::Test))?);
        counters.attempt = counters.attempt.max(
            next_after(state.attempts.keys().copied()).ok_or(exhausted(EntityKind::Attempt))?,
        );

        let live_questions = state
            .tests
            .values()
            .flat_map(|t| t.questions.iter().map(|q| q.id));
        let recorded_questions = state
            .attempts
            .values()
            .flat_map(|a| a.answers.keys().chain(a.scores.keys()).copied());
        counters.question = counters.question.max(
            next_after(live_questions.chain(recorded_questions))
                .ok_or(exhausted(EntityKind::Question))?,
        );

        state.counters = counters;
        Ok(state)
    }
}
