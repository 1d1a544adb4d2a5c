//! The assessment registry: owner of every student, test, and attempt.
//!
//! Each command that changes state writes a full snapshot through the
//! configured [`SnapshotStore`] before returning. A failed write is logged
//! and the in-memory state stays authoritative.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::attempt::Attempt;
use crate::clock::{Clock, SystemClock};
use crate::config::GradebookConfig;
use crate::error::{EntityKind, RegistryError, StoreError};
use crate::model::{
    AttemptId, QuestionId, Student, StudentId, Test, TestId, DEFAULT_PASSING_SCORE,
};
use crate::question::{Question, QuestionKind};
use crate::report::{Overview, TestOverview};
use crate::seed;
use crate::snapshot::{next_id, Counters, Snapshot};
use crate::statistics::{compute_test_statistics, rank_students, StudentPerformance, TestStatistics};
use crate::store::SnapshotStore;

/// A student may attempt the same test at most this many times.
pub const MAX_ATTEMPTS_PER_TEST: usize = 3;

/// Entity collections keyed by id, in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RegistryState {
    pub(crate) students: IndexMap<StudentId, Student>,
    pub(crate) tests: IndexMap<TestId, Test>,
    pub(crate) attempts: IndexMap<AttemptId, Attempt>,
    pub(crate) counters: Counters,
}

/// Behaviour switches for a registry.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Seed demonstration data when no snapshot can be loaded.
    pub seed_demo_data: bool,
    /// Passing threshold given to newly created tests.
    pub default_passing_score: f64,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            seed_demo_data: true,
            default_passing_score: DEFAULT_PASSING_SCORE,
        }
    }
}

impl From<&GradebookConfig> for RegistryOptions {
    fn from(config: &GradebookConfig) -> Self {
        Self {
            seed_demo_data: config.seed_demo_data,
            default_passing_score: config.default_passing_score,
        }
    }
}

fn allocate(counter: &mut u32, kind: EntityKind) -> Result<u32, RegistryError> {
    next_id(counter).ok_or(RegistryError::IdsExhausted { kind })
}

fn check_passing_score(passing_score: f64) -> Result<(), RegistryError> {
    if (0.0..=100.0).contains(&passing_score) {
        Ok(())
    } else {
        Err(RegistryError::Invalid(format!(
            "passing score must be between 0 and 100, got {passing_score}"
        )))
    }
}

/// Everything needed to add a question to a test.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub text: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub correct_answers: Vec<String>,
    pub max_points: f64,
}

impl NewQuestion {
    pub fn new(text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            text: text.into(),
            kind,
            options: Vec::new(),
            correct_answers: Vec::new(),
            max_points: 1.0,
        }
    }

    pub fn single_choice<S: Into<String>>(
        text: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        correct: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(text, QuestionKind::SingleChoice)
            .with_options(options)
            .with_correct_answers(correct)
    }

    pub fn multiple_choice<S: Into<String>>(
        text: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        correct: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(text, QuestionKind::MultipleChoice)
            .with_options(options)
            .with_correct_answers(correct)
    }

    pub fn free_text(text: impl Into<String>) -> Self {
        Self::new(text, QuestionKind::FreeText)
    }

    pub fn with_options<S: Into<String>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_correct_answers<S: Into<String>>(
        mut self,
        correct: impl IntoIterator<Item = S>,
    ) -> Self {
        self.correct_answers = correct.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_points(mut self, max_points: f64) -> Self {
        self.max_points = max_points;
        self
    }
}

/// Aggregate root coordinating creation, lookup, deletion guards, attempt
/// lifecycle, and statistics.
pub struct AssessmentRegistry {
    state: RegistryState,
    store: Box<dyn SnapshotStore>,
    clock: Box<dyn Clock>,
    options: RegistryOptions,
    autosave: bool,
}

impl std::fmt::Debug for AssessmentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentRegistry")
            .field("students", &self.state.students.len())
            .field("tests", &self.state.tests.len())
            .field("attempts", &self.state.attempts.len())
            .field("counters", &self.state.counters)
            .finish()
    }
}

impl AssessmentRegistry {
    /// An empty registry that does not touch the store until the first
    /// command.
    pub fn new(
        store: impl SnapshotStore + 'static,
        clock: impl Clock + 'static,
        options: RegistryOptions,
    ) -> Self {
        Self {
            state: RegistryState::default(),
            store: Box::new(store),
            clock: Box::new(clock),
            options,
            autosave: true,
        }
    }

    /// Restore the registry from `store`.
    ///
    /// With no prior snapshot, or one that cannot be read, the registry is
    /// seeded with demonstration data (if enabled) and saved. An unreadable
    /// snapshot is first set aside by the store.
    pub fn open(
        store: impl SnapshotStore + 'static,
        clock: impl Clock + 'static,
        options: RegistryOptions,
    ) -> Self {
        let mut registry = Self::new(store, clock, options);
        let loaded = registry
            .store
            .load()
            .and_then(|snapshot| snapshot.map(Snapshot::restore).transpose());
        match loaded {
            Ok(Some(state)) => {
                registry.state = state;
                tracing::info!(
                    "loaded {} students, {} tests, {} attempts",
                    registry.state.students.len(),
                    registry.state.tests.len(),
                    registry.state.attempts.len()
                );
            }
            Ok(None) => {
                tracing::info!("no saved gradebook found");
                registry.seed_if_enabled();
            }
            Err(e) => {
                tracing::error!("failed to load gradebook, starting over: {e}");
                match registry.store.set_aside() {
                    Ok(Some(backup)) => {
                        tracing::warn!("unreadable gradebook kept at {}", backup.display())
                    }
                    Ok(None) => {}
                    Err(e) => tracing::error!("failed to keep a copy of the unreadable gradebook: {e}"),
                }
                registry.seed_if_enabled();
            }
        }
        registry
    }

    /// [`open`](Self::open) with the wall clock and default options.
    pub fn open_default(store: impl SnapshotStore + 'static) -> Self {
        Self::open(store, SystemClock, RegistryOptions::default())
    }

    fn seed_if_enabled(&mut self) {
        if !self.options.seed_demo_data {
            return;
        }
        self.autosave = false;
        seed::populate(self);
        self.autosave = true;
        self.persist();
    }

    /// Capture the full state as a self-contained value.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Write a snapshot now, reporting failure to the caller.
    pub fn save(&self) -> Result<(), StoreError> {
        self.store.save(&self.snapshot())
    }

    fn persist(&self) {
        if !self.autosave {
            return;
        }
        if let Err(e) = self.save() {
            tracing::error!("failed to save gradebook: {e}");
        }
    }

    pub fn counters(&self) -> Counters {
        self.state.counters
    }

    // -----------------------------------------------------------------------
    // Students
    // -----------------------------------------------------------------------

    pub fn add_student(
        &mut self,
        full_name: impl Into<String>,
        group: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<StudentId, RegistryError> {
        let id = allocate(&mut self.state.counters.student, EntityKind::Student)?;
        let student = Student::new(id, full_name, group, email);
        tracing::debug!("added student {id} ({})", student.full_name);
        self.state.students.insert(id, student);
        self.persist();
        Ok(id)
    }

    pub fn find_student_by_id(&self, id: StudentId) -> Option<&Student> {
        self.state.students.get(&id)
    }

    pub fn find_students_by_group(&self, group: &str) -> Vec<&Student> {
        self.state
            .students
            .values()
            .filter(|s| s.group == group)
            .collect()
    }

    pub fn students(&self) -> impl Iterator<Item = &Student> + '_ {
        self.state.students.values()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    /// Create a test with the configured default passing threshold.
    pub fn add_test(
        &mut self,
        title: impl Into<String>,
        subject: impl Into<String>,
        time_limit_minutes: u32,
    ) -> Result<TestId, RegistryError> {
        let passing_score = self.options.default_passing_score;
        self.insert_test(title.into(), subject.into(), time_limit_minutes, passing_score)
    }

    /// Create a test with its own passing threshold. The threshold is
    /// checked before anything is created.
    pub fn add_test_with_passing_score(
        &mut self,
        title: impl Into<String>,
        subject: impl Into<String>,
        time_limit_minutes: u32,
        passing_score: f64,
    ) -> Result<TestId, RegistryError> {
        check_passing_score(passing_score)?;
        self.insert_test(title.into(), subject.into(), time_limit_minutes, passing_score)
    }

    fn insert_test(
        &mut self,
        title: String,
        subject: String,
        time_limit_minutes: u32,
        passing_score: f64,
    ) -> Result<TestId, RegistryError> {
        let id = allocate(&mut self.state.counters.test, EntityKind::Test)?;
        let mut test = Test::new(id, title, subject, time_limit_minutes);
        test.passing_score = passing_score;
        tracing::debug!("added test {id} ({})", test.title);
        self.state.tests.insert(id, test);
        self.persist();
        Ok(id)
    }

    pub fn find_test_by_id(&self, id: TestId) -> Option<&Test> {
        self.state.tests.get(&id)
    }

    pub fn tests(&self) -> impl Iterator<Item = &Test> + '_ {
        self.state.tests.values()
    }

    fn test_mut(&mut self, id: TestId) -> Result<&mut Test, RegistryError> {
        self.state
            .tests
            .get_mut(&id)
            .ok_or(RegistryError::not_found(EntityKind::Test, id))
    }

    /// Flip a test's active flag. Returns the new value.
    pub fn toggle_test_active(&mut self, id: TestId) -> Result<bool, RegistryError> {
        let active = self.test_mut(id)?.toggle_active();
        self.persist();
        Ok(active)
    }

    pub fn set_passing_score(&mut self, id: TestId, passing_score: f64) -> Result<(), RegistryError> {
        check_passing_score(passing_score)?;
        self.test_mut(id)?.passing_score = passing_score;
        self.persist();
        Ok(())
    }

    /// Delete a test nobody has attempted.
    ///
    /// Refused while any attempt, in any status, references the test.
    pub fn delete_test(&mut self, id: TestId) -> Result<Test, RegistryError> {
        if !self.state.tests.contains_key(&id) {
            return Err(RegistryError::not_found(EntityKind::Test, id));
        }
        let attempts = self
            .state
            .attempts
            .values()
            .filter(|a| a.test_id == id)
            .count();
        if attempts > 0 {
            let err = RegistryError::Blocked {
                test_id: id,
                attempts,
            };
            tracing::warn!("{err}");
            return Err(err);
        }

        let test = self
            .state
            .tests
            .shift_remove(&id)
            .ok_or(RegistryError::not_found(EntityKind::Test, id))?;
        tracing::info!("deleted test {id} ({})", test.title);
        self.persist();
        Ok(test)
    }

    /// Warnings about a test's configuration, or `None` if it does not exist.
    pub fn validate_test(&self, id: TestId) -> Option<Vec<String>> {
        self.find_test_by_id(id).map(Test::validate)
    }

    // -----------------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------------

    pub fn add_question_to_test(
        &mut self,
        test_id: TestId,
        new: NewQuestion,
    ) -> Result<QuestionId, RegistryError> {
        if new.max_points <= 0.0 || !new.max_points.is_finite() {
            return Err(RegistryError::Invalid(format!(
                "max points must be a positive number, got {}",
                new.max_points
            )));
        }
        if !self.state.tests.contains_key(&test_id) {
            return Err(RegistryError::not_found(EntityKind::Test, test_id));
        }

        let id = allocate(&mut self.state.counters.question, EntityKind::Question)?;
        let question = Question::new(
            id,
            new.text,
            new.kind,
            new.options,
            new.correct_answers,
            new.max_points,
        );
        for warning in question.validate() {
            tracing::warn!("question {id} on test {test_id}: {warning}");
        }
        self.test_mut(test_id)?.add_question(question);
        self.persist();
        Ok(id)
    }

    /// Remove a question from its test.
    ///
    /// Not guarded: attempts keep any answers and scores recorded for it.
    /// Returns whether a question was removed.
    pub fn delete_question(
        &mut self,
        test_id: TestId,
        question_id: QuestionId,
    ) -> Result<bool, RegistryError> {
        let removed = self.test_mut(test_id)?.remove_question(question_id);
        self.persist();
        Ok(removed)
    }

    /// Flip a question's active flag. Returns the new value.
    pub fn toggle_question_active(
        &mut self,
        test_id: TestId,
        question_id: QuestionId,
    ) -> Result<bool, RegistryError> {
        let active = self
            .test_mut(test_id)?
            .question_mut(question_id)
            .ok_or(RegistryError::not_found(EntityKind::Question, question_id))?
            .toggle_active();
        self.persist();
        Ok(active)
    }

    // -----------------------------------------------------------------------
    // Attempts
    // -----------------------------------------------------------------------

    /// Create a new, not yet started attempt.
    ///
    /// Refused when either id is unknown, the test has been deactivated, or
    /// the student already has [`MAX_ATTEMPTS_PER_TEST`] attempts on it.
    pub fn create_attempt(
        &mut self,
        student_id: StudentId,
        test_id: TestId,
    ) -> Result<AttemptId, RegistryError> {
        let student = self
            .state
            .students
            .get(&student_id)
            .ok_or(RegistryError::not_found(EntityKind::Student, student_id))?;
        let test = self
            .state
            .tests
            .get(&test_id)
            .ok_or(RegistryError::not_found(EntityKind::Test, test_id))?;
        if !test.is_active {
            let err = RegistryError::Inactive { test_id };
            tracing::warn!("{err}");
            return Err(err);
        }

        let previous = student
            .attempts
            .iter()
            .filter_map(|id| self.state.attempts.get(id))
            .filter(|a| a.test_id == test_id)
            .count();
        if previous >= MAX_ATTEMPTS_PER_TEST {
            let err = RegistryError::LimitExceeded {
                student_id,
                test_id,
                limit: MAX_ATTEMPTS_PER_TEST,
            };
            tracing::warn!("{err}");
            return Err(err);
        }

        let id = allocate(&mut self.state.counters.attempt, EntityKind::Attempt)?;
        let attempt = Attempt::new(id, student_id, test_id, self.clock.now());
        self.state.attempts.insert(id, attempt);
        if let Some(student) = self.state.students.get_mut(&student_id) {
            student.attempts.push(id);
        }
        tracing::debug!("created attempt {id} for student {student_id} on test {test_id}");
        self.persist();
        Ok(id)
    }

    pub fn find_attempt_by_id(&self, id: AttemptId) -> Option<&Attempt> {
        self.state.attempts.get(&id)
    }

    pub fn attempts(&self) -> impl Iterator<Item = &Attempt> + '_ {
        self.state.attempts.values()
    }

    /// A student's attempts in creation order, optionally limited to one test.
    pub fn student_attempts(&self, student_id: StudentId, test_id: Option<TestId>) -> Vec<&Attempt> {
        let Some(student) = self.find_student_by_id(student_id) else {
            return Vec::new();
        };
        student
            .attempts
            .iter()
            .filter_map(|id| self.state.attempts.get(id))
            .filter(|a| test_id.map_or(true, |t| a.test_id == t))
            .collect()
    }

    /// Borrow an attempt mutably together with the test it belongs to.
    fn attempt_with_test(
        &mut self,
        id: AttemptId,
    ) -> Result<(&mut Attempt, &Test), RegistryError> {
        let attempt = self
            .state
            .attempts
            .get_mut(&id)
            .ok_or(RegistryError::not_found(EntityKind::Attempt, id))?;
        let test = self
            .state
            .tests
            .get(&attempt.test_id)
            .ok_or(RegistryError::not_found(EntityKind::Test, attempt.test_id))?;
        Ok((attempt, test))
    }

    pub fn start_attempt(&mut self, id: AttemptId) -> Result<&Attempt, RegistryError> {
        let now = self.clock.now();
        let (attempt, _) = self.attempt_with_test(id)?;
        attempt.start(now)?;
        self.persist();
        Ok(&self.state.attempts[&id])
    }

    /// Record an answer. Returns the points awarded automatically, if any.
    pub fn submit_answer(
        &mut self,
        id: AttemptId,
        question_id: QuestionId,
        answers: Vec<String>,
    ) -> Result<Option<f64>, RegistryError> {
        let (attempt, test) = self.attempt_with_test(id)?;
        let awarded = attempt.submit_answer(test, question_id, answers)?;
        self.persist();
        Ok(awarded)
    }

    pub fn finish_attempt(&mut self, id: AttemptId) -> Result<&Attempt, RegistryError> {
        let now = self.clock.now();
        let (attempt, test) = self.attempt_with_test(id)?;
        attempt.finish(test, now)?;
        self.persist();
        Ok(&self.state.attempts[&id])
    }

    /// Evaluate (or re-evaluate) a completed attempt, merging manual scores.
    pub fn evaluate_attempt(
        &mut self,
        id: AttemptId,
        manual_scores: Option<BTreeMap<QuestionId, f64>>,
    ) -> Result<&Attempt, RegistryError> {
        if let Some(scores) = &manual_scores {
            if let Some((qid, points)) = scores.iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
                return Err(RegistryError::Invalid(format!(
                    "manual score for question {qid} must be a non-negative number, got {points}"
                )));
            }
        }
        let (attempt, test) = self.attempt_with_test(id)?;
        attempt.evaluate(test, manual_scores)?;
        tracing::debug!(
            "evaluated attempt {id}: {:.1}% ({})",
            attempt.percentage,
            if attempt.is_passed { "passed" } else { "failed" }
        );
        self.persist();
        Ok(&self.state.attempts[&id])
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Rollup over the evaluated attempts of one test.
    pub fn test_statistics(&self, test_id: TestId) -> Option<TestStatistics> {
        compute_test_statistics(test_id, self.state.attempts.values())
    }

    /// Students ranked by mean evaluated percentage, best first.
    pub fn top_performers(&self, limit: usize) -> Vec<StudentPerformance> {
        rank_students(
            self.state.students.values(),
            |student| {
                student
                    .attempts
                    .iter()
                    .filter_map(|id| self.state.attempts.get(id))
                    .collect()
            },
            limit,
        )
    }

    /// System-wide summary: counts, per-test statistics, and top performers.
    pub fn overview(&self, top: usize) -> Overview {
        Overview {
            total_students: self.state.students.len(),
            total_tests: self.state.tests.len(),
            total_attempts: self.state.attempts.len(),
            tests: self
                .state
                .tests
                .values()
                .map(|t| TestOverview {
                    test_id: t.id,
                    title: t.title.clone(),
                    statistics: self.test_statistics(t.id),
                })
                .collect(),
            top_performers: self.top_performers(top),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    use crate::clock::FixedClock;

    fn registry() -> AssessmentRegistry {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap());
        AssessmentRegistry::new(MemoryStore::new(), clock, RegistryOptions::default())
    }

    #[test]
    fn ids_are_allocated_per_kind() {
        let mut reg = registry();
        assert_eq!(reg.add_student("Ada", "G1", ""), Ok(1));
        assert_eq!(reg.add_student("Grace", "G1", ""), Ok(2));
        assert_eq!(reg.add_test("Algebra", "Mathematics", 30), Ok(1));
        let q = reg
            .add_question_to_test(1, NewQuestion::free_text("Why?"))
            .unwrap();
        assert_eq!(q, 1);
        assert_eq!(reg.counters().student, 3);
    }

    #[test]
    fn lookups_return_none_for_unknown_ids() {
        let reg = registry();
        assert!(reg.find_student_by_id(1).is_none());
        assert!(reg.find_test_by_id(1).is_none());
        assert!(reg.find_attempt_by_id(1).is_none());
        assert!(reg.student_attempts(1, None).is_empty());
        assert!(reg.validate_test(1).is_none());
    }

    #[test]
    fn question_points_must_be_positive() {
        let mut reg = registry();
        let test = reg.add_test("Algebra", "Mathematics", 30).unwrap();
        let err = reg
            .add_question_to_test(test, NewQuestion::free_text("Why?").with_points(0.0))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));
        assert_eq!(reg.counters().question, 1);
    }

    #[test]
    fn passing_score_is_range_checked() {
        let mut reg = registry();
        let test = reg.add_test("Algebra", "Mathematics", 30).unwrap();
        assert!(reg.set_passing_score(test, 101.0).is_err());
        reg.set_passing_score(test, 75.0).unwrap();
        assert_eq!(reg.find_test_by_id(test).unwrap().passing_score, 75.0);
    }

    #[test]
    fn rejected_passing_score_creates_no_test() {
        let mut reg = registry();
        let err = reg
            .add_test_with_passing_score("Ghost", "None", 30, 150.0)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));
        assert_eq!(reg.tests().count(), 0);
        assert_eq!(reg.counters().test, 1);

        let id = reg
            .add_test_with_passing_score("Algebra", "Mathematics", 30, 75.0)
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(reg.find_test_by_id(id).unwrap().passing_score, 75.0);
    }

    #[test]
    fn exhausted_counter_refuses_new_ids() {
        let snapshot = Snapshot {
            counters: Counters {
                student: u32::MAX,
                ..Counters::default()
            },
            ..Snapshot::default()
        };
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap());
        let mut reg = AssessmentRegistry::open(
            MemoryStore::with_snapshot(snapshot),
            clock,
            RegistryOptions::default(),
        );
        assert_eq!(
            reg.add_student("Ada", "G1", ""),
            Err(RegistryError::IdsExhausted {
                kind: EntityKind::Student
            })
        );
        assert_eq!(reg.students().count(), 0);
        assert_eq!(reg.add_test("Algebra", "Mathematics", 30), Ok(1));
    }

    #[test]
    fn inactive_tests_refuse_new_attempts() {
        let mut reg = registry();
        let student = reg.add_student("Ada", "G1", "").unwrap();
        let test = reg.add_test("Algebra", "Mathematics", 30).unwrap();
        assert!(!reg.toggle_test_active(test).unwrap());
        assert_eq!(
            reg.create_attempt(student, test),
            Err(RegistryError::Inactive { test_id: test })
        );
    }

    #[test]
    fn negative_manual_scores_are_rejected() {
        let mut reg = registry();
        let student = reg.add_student("Ada", "G1", "").unwrap();
        let test = reg.add_test("Algebra", "Mathematics", 30).unwrap();
        let attempt = reg.create_attempt(student, test).unwrap();
        reg.start_attempt(attempt).unwrap();
        reg.finish_attempt(attempt).unwrap();
        let err = reg
            .evaluate_attempt(attempt, Some(BTreeMap::from([(1, -2.0)])))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));
    }
}
