//! Core data model types for gradebook.
//!
//! Tests own their questions; students keep the ids of their attempts in
//! creation order. Everything is owned by the registry.

use serde::{Deserialize, Serialize};

use crate::question::Question;

pub type StudentId = u32;
pub type TestId = u32;
pub type QuestionId = u32;
pub type AttemptId = u32;

/// Default passing threshold, in percent.
pub const DEFAULT_PASSING_SCORE: f64 = 60.0;

/// Default time limit, in minutes.
pub const DEFAULT_TIME_LIMIT_MINUTES: u32 = 60;

/// An ordered set of questions plus grading configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: TestId,
    pub title: String,
    pub subject: String,
    /// Informational only; never enforced.
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    /// Minimum percentage (0–100) an attempt needs to pass.
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_MINUTES
}

fn default_passing_score() -> f64 {
    DEFAULT_PASSING_SCORE
}

fn default_true() -> bool {
    true
}

impl Test {
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        subject: impl Into<String>,
        time_limit_minutes: u32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            subject: subject.into(),
            time_limit_minutes,
            passing_score: DEFAULT_PASSING_SCORE,
            is_active: true,
            questions: Vec::new(),
        }
    }

    /// Append a question. Ids are allocated by the registry, so no duplicate
    /// check happens here.
    pub fn add_question(&mut self, question: Question) {
        self.questions.push(question);
    }

    /// Remove a question by id. Returns whether anything was removed.
    pub fn remove_question(&mut self, question_id: QuestionId) -> bool {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != question_id);
        self.questions.len() != before
    }

    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn question_mut(&mut self, question_id: QuestionId) -> Option<&mut Question> {
        self.questions.iter_mut().find(|q| q.id == question_id)
    }

    /// Active questions in insertion order.
    pub fn active_questions(&self) -> impl Iterator<Item = &Question> + Clone + '_ {
        self.questions.iter().filter(|q| q.is_active)
    }

    /// Sum of max points over the active questions, computed on every call.
    pub fn max_score(&self) -> f64 {
        self.active_questions().fold(0.0, |total, q| total + q.max_points)
    }

    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.is_active
    }

    /// Test-level configuration warnings plus every question's warnings,
    /// prefixed with the question id.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !(0.0..=100.0).contains(&self.passing_score) {
            warnings.push(format!(
                "passing score {} is outside 0..=100",
                self.passing_score
            ));
        }
        if self.active_questions().next().is_none() {
            warnings.push("test has no active questions".to_string());
        }
        for question in &self.questions {
            for w in question.validate() {
                warnings.push(format!("question {}: {w}", question.id));
            }
        }
        warnings
    }
}

/// A student who accumulates attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    /// Group or cohort label.
    pub group: String,
    #[serde(default)]
    pub email: String,
    /// Attempt ids in creation order. Rebuilt from the attempts on restore.
    #[serde(skip)]
    pub attempts: Vec<AttemptId>,
}

impl Student {
    pub fn new(
        id: StudentId,
        full_name: impl Into<String>,
        group: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            group: group.into(),
            email: email.into(),
            attempts: Vec::new(),
        }
    }

    pub fn attempts_count(&self) -> usize {
        self.attempts.len()
    }
}
