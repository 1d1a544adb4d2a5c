//! Questions and answer checking.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// How a question is answered and whether it can be graded automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    FreeText,
}

impl QuestionKind {
    /// Choice questions are scored the moment an answer is submitted.
    pub fn is_auto_scored(self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultipleChoice)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::SingleChoice => write!(f, "single"),
            QuestionKind::MultipleChoice => write!(f, "multiple"),
            QuestionKind::FreeText => write!(f, "text"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single_choice" | "single-choice" => Ok(QuestionKind::SingleChoice),
            "multiple" | "multiple_choice" | "multiple-choice" => Ok(QuestionKind::MultipleChoice),
            "text" | "free_text" | "free-text" => Ok(QuestionKind::FreeText),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// A gradable unit owned by exactly one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// Prompt shown to the student.
    pub text: String,
    pub kind: QuestionKind,
    /// Offered options, in display order. Empty for free text.
    #[serde(default)]
    pub options: Vec<String>,
    /// Option values that count as correct. Empty for free text.
    #[serde(default)]
    pub correct_answers: Vec<String>,
    pub max_points: f64,
    /// Inactive questions are excluded from a test's max score.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Question {
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        kind: QuestionKind,
        options: Vec<String>,
        correct_answers: Vec<String>,
        max_points: f64,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            kind,
            options,
            correct_answers,
            max_points,
            is_active: true,
        }
    }

    pub fn toggle_active(&mut self) -> bool {
        self.is_active = !self.is_active;
        self.is_active
    }

    /// Check a submission against the stored correct answers.
    ///
    /// - single choice: the first submitted value must be a correct answer
    /// - multiple choice: the submitted set must equal the correct set exactly
    /// - free text: always `true`; such answers are graded by hand
    pub fn check_answer(&self, submitted: &[String]) -> bool {
        match self.kind {
            QuestionKind::SingleChoice => submitted
                .first()
                .is_some_and(|first| self.correct_answers.contains(first)),
            QuestionKind::MultipleChoice => {
                let submitted: BTreeSet<&str> = submitted.iter().map(String::as_str).collect();
                let correct: BTreeSet<&str> =
                    self.correct_answers.iter().map(String::as_str).collect();
                submitted == correct
            }
            QuestionKind::FreeText => true,
        }
    }

    /// Points awarded automatically for a submission, or `None` when the
    /// question needs manual grading.
    pub fn auto_score(&self, submitted: &[String]) -> Option<f64> {
        if !self.kind.is_auto_scored() {
            return None;
        }
        Some(if self.check_answer(submitted) {
            self.max_points
        } else {
            0.0
        })
    }

    /// Report configuration problems that would make grading meaningless.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_points <= 0.0 {
            warnings.push(format!("max points must be positive, got {}", self.max_points));
        }

        match self.kind {
            QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
                if self.options.is_empty() {
                    warnings.push("choice question has no options".to_string());
                }
                if self.correct_answers.is_empty() {
                    warnings.push("choice question has no correct answers".to_string());
                }
                for answer in &self.correct_answers {
                    if !self.options.contains(answer) {
                        warnings.push(format!("correct answer '{answer}' is not an offered option"));
                    }
                }
                if self.kind == QuestionKind::SingleChoice && self.correct_answers.len() > 1 {
                    warnings.push(format!(
                        "single choice question has {} correct answers",
                        self.correct_answers.len()
                    ));
                }
            }
            QuestionKind::FreeText => {
                if !self.options.is_empty() || !self.correct_answers.is_empty() {
                    warnings.push("free text question carries options or correct answers".to_string());
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn single() -> Question {
        Question::new(
            1,
            "2 + 2 * 2 = ?",
            QuestionKind::SingleChoice,
            strings(&["6", "8", "10"]),
            strings(&["6"]),
            1.0,
        )
    }

    fn multiple() -> Question {
        Question::new(
            2,
            "Which numbers are prime?",
            QuestionKind::MultipleChoice,
            strings(&["2", "4", "7", "9", "11"]),
            strings(&["2", "7", "11"]),
            2.0,
        )
    }

    #[test]
    fn single_choice_checks_first_value() {
        let q = single();
        assert!(q.check_answer(&strings(&["6"])));
        assert!(!q.check_answer(&strings(&["8"])));
        assert!(q.check_answer(&strings(&["6", "8"])));
        assert!(!q.check_answer(&strings(&["8", "6"])));
        assert!(!q.check_answer(&[]));
    }

    #[test]
    fn multiple_choice_requires_exact_set() {
        let q = multiple();
        assert!(q.check_answer(&strings(&["7", "2", "11"])));
        assert!(q.check_answer(&strings(&["2", "7", "11", "7"])));
        assert!(!q.check_answer(&strings(&["2", "7"])));
        assert!(!q.check_answer(&strings(&["2", "4", "7", "11"])));
        assert!(!q.check_answer(&[]));
    }

    #[test]
    fn free_text_always_passes_the_automatic_check() {
        let q = Question::new(3, "State the theorem", QuestionKind::FreeText, vec![], vec![], 3.0);
        assert!(q.check_answer(&strings(&["anything"])));
        assert!(q.check_answer(&[]));
        assert_eq!(q.auto_score(&strings(&["anything"])), None);
    }

    #[test]
    fn auto_score_is_all_or_nothing() {
        let q = multiple();
        assert_eq!(q.auto_score(&strings(&["11", "7", "2"])), Some(2.0));
        assert_eq!(q.auto_score(&strings(&["2", "7"])), Some(0.0));
    }

    #[test]
    fn validate_flags_unknown_correct_answer() {
        let mut q = single();
        q.correct_answers = strings(&["7"]);
        let warnings = q.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'7'"));
    }

    #[test]
    fn validate_accepts_well_formed_questions() {
        assert!(single().validate().is_empty());
        assert!(multiple().validate().is_empty());
    }

    #[test]
    fn kind_display_and_parse() {
        assert_eq!(QuestionKind::FreeText.to_string(), "text");
        assert_eq!("single".parse::<QuestionKind>().unwrap(), QuestionKind::SingleChoice);
        assert_eq!(
            "Multiple-Choice".parse::<QuestionKind>().unwrap(),
            QuestionKind::MultipleChoice
        );
        assert!("essay".parse::<QuestionKind>().is_err());
    }
}
