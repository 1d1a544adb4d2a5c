//! gradebook-core: assessment model, attempt scoring, and statistics.
//!
//! This crate defines tests, questions, students, and attempts, the rules
//! that grade an attempt, and the registry that owns them all and persists
//! its state as whole snapshots.

pub mod attempt;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod question;
pub mod registry;
pub mod report;
mod seed;
pub mod snapshot;
pub mod statistics;
pub mod store;

pub use attempt::{Attempt, AttemptStatus};
pub use error::{AttemptError, EntityKind, RegistryError, StoreError};
pub use model::{AttemptId, QuestionId, Student, StudentId, Test, TestId};
pub use question::{Question, QuestionKind};
pub use registry::{AssessmentRegistry, NewQuestion, RegistryOptions, MAX_ATTEMPTS_PER_TEST};
pub use snapshot::Snapshot;
pub use store::{JsonFileStore, MemoryStore, SnapshotStore};
