//! Attempts: one student's run through one test.
//!
//! Status only moves forward:
//! `NotStarted → InProgress → Completed → Evaluated`. An evaluated attempt
//! may be evaluated again (manual regrading) without leaving `Evaluated`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AttemptError;
use crate::model::{AttemptId, QuestionId, StudentId, Test, TestId};

/// Lifecycle status of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Completed,
    Evaluated,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::NotStarted => write!(f, "not started"),
            AttemptStatus::InProgress => write!(f, "in progress"),
            AttemptStatus::Completed => write!(f, "completed"),
            AttemptStatus::Evaluated => write!(f, "evaluated"),
        }
    }
}

/// One student's run through one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub student_id: StudentId,
    pub test_id: TestId,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
    /// Raw submissions keyed by question id.
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, Vec<String>>,
    /// Awarded points keyed by question id. May outlive the question itself.
    #[serde(default)]
    pub scores: BTreeMap<QuestionId, f64>,
    #[serde(default)]
    pub final_score: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub is_passed: bool,
}

impl Attempt {
    pub fn new(id: AttemptId, student_id: StudentId, test_id: TestId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            student_id,
            test_id,
            started_at: now,
            finished_at: None,
            status: AttemptStatus::NotStarted,
            answers: BTreeMap::new(),
            scores: BTreeMap::new(),
            final_score: 0.0,
            percentage: 0.0,
            is_passed: false,
        }
    }

    fn require(&self, allowed: &[AttemptStatus], action: &'static str) -> Result<(), AttemptError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(AttemptError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    /// NotStarted → InProgress. Resets the start timestamp to `now`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), AttemptError> {
        self.require(&[AttemptStatus::NotStarted], "start")?;
        self.status = AttemptStatus::InProgress;
        self.started_at = now;
        Ok(())
    }

    /// Record an answer, replacing any earlier submission for the question.
    ///
    /// Choice questions are scored immediately and the awarded points are
    /// returned. Free-text answers and answers to questions the test no
    /// longer contains are recorded without a score.
    pub fn submit_answer(
        &mut self,
        test: &Test,
        question_id: QuestionId,
        answers: Vec<String>,
    ) -> Result<Option<f64>, AttemptError> {
        self.require(&[AttemptStatus::InProgress], "answer")?;

        let awarded = test
            .question(question_id)
            .and_then(|q| q.auto_score(&answers));
        self.answers.insert(question_id, answers);
        if let Some(points) = awarded {
            self.scores.insert(question_id, points);
        }
        Ok(awarded)
    }

    /// InProgress → Completed. Stamps the end time and recomputes the outcome
    /// from whatever scores are recorded so far.
    pub fn finish(&mut self, test: &Test, now: DateTime<Utc>) -> Result<(), AttemptError> {
        self.require(&[AttemptStatus::InProgress], "finish")?;
        self.status = AttemptStatus::Completed;
        self.finished_at = Some(now);
        self.recalculate(test);
        Ok(())
    }

    /// Completed (or Evaluated) → Evaluated.
    ///
    /// Manual scores are merged over the recorded ones; this is how free-text
    /// questions receive credit. The outcome is recomputed against the
    /// test's current max score.
    pub fn evaluate(
        &mut self,
        test: &Test,
        manual_scores: Option<BTreeMap<QuestionId, f64>>,
    ) -> Result<(), AttemptError> {
        self.require(&[AttemptStatus::Completed, AttemptStatus::Evaluated], "evaluate")?;
        self.status = AttemptStatus::Evaluated;
        if let Some(manual) = manual_scores {
            self.scores.extend(manual);
        }
        self.recalculate(test);
        Ok(())
    }

    /// Recompute final score, percentage, and pass flag from scratch.
    pub fn recalculate(&mut self, test: &Test) {
        self.final_score = self.scores.values().fold(0.0, |total, p| total + *p);
        let max_score = test.max_score();
        self.percentage = if max_score > 0.0 {
            self.final_score / max_score * 100.0
        } else {
            0.0
        };
        self.is_passed = self.percentage >= test.passing_score;
    }

    /// Elapsed minutes between start and finish, or 0 while unfinished.
    pub fn duration_minutes(&self) -> f64 {
        match self.finished_at {
            Some(end) => (end - self.started_at).num_milliseconds() as f64 / 60_000.0,
            None => 0.0,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.status == AttemptStatus::Evaluated
    }
}
