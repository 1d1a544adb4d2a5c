//! Error types for registry commands, attempt transitions, and snapshot storage.
//!
//! Expected business outcomes (a refused deletion, an exhausted retry cap) are
//! ordinary `Err` values with a readable `Display`; lookups that miss return
//! `None` instead of an error.

use thiserror::Error;

use crate::attempt::AttemptStatus;
use crate::model::{StudentId, TestId};

/// The kind of entity a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Student,
    Test,
    Question,
    Attempt,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Student => write!(f, "student"),
            EntityKind::Test => write!(f, "test"),
            EntityKind::Question => write!(f, "question"),
            EntityKind::Attempt => write!(f, "attempt"),
        }
    }
}

/// Errors returned by [`AssessmentRegistry`](crate::registry::AssessmentRegistry) commands.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// An id did not resolve to an existing entity.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u32 },

    /// Deletion refused because attempts still reference the test.
    #[error("test {test_id} is used by {attempts} attempt(s) and cannot be deleted")]
    Blocked { test_id: TestId, attempts: usize },

    /// The test has been retired from new attempts.
    #[error("test {test_id} is inactive and does not accept new attempts")]
    Inactive { test_id: TestId },

    /// The per-test retry cap has been reached.
    #[error("student {student_id} already has {limit} attempts on test {test_id} (maximum {limit} per test)")]
    LimitExceeded {
        student_id: StudentId,
        test_id: TestId,
        limit: usize,
    },

    /// The attempt refused a lifecycle transition.
    #[error(transparent)]
    Attempt(#[from] AttemptError),

    /// An argument was outside its allowed range.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Every id of this kind has already been handed out.
    #[error("no {kind} ids left")]
    IdsExhausted { kind: EntityKind },
}

impl RegistryError {
    pub(crate) fn not_found(kind: EntityKind, id: u32) -> Self {
        RegistryError::NotFound { kind, id }
    }
}

/// Errors raised by the attempt state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    /// Transitions only move forward: NotStarted → InProgress → Completed → Evaluated.
    #[error("cannot {action} an attempt that is {from}")]
    InvalidTransition {
        from: AttemptStatus,
        action: &'static str,
    },
}

/// Errors raised while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("failed to replace snapshot file: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// Restoring would leave no unused id for this entity kind.
    #[error("snapshot leaves no free {0} ids")]
    IdsExhausted(EntityKind),
}
