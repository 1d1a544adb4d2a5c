//! Rollup statistics over evaluated attempts.
//!
//! Only attempts in the `Evaluated` state count. All averages are plain
//! arithmetic means.

use serde::{Deserialize, Serialize};

use crate::attempt::Attempt;
use crate::model::{Student, StudentId, TestId};

/// Outcome summary for one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStatistics {
    pub test_id: TestId,
    /// Number of evaluated attempts.
    pub evaluated_attempts: usize,
    /// Evaluated attempts that passed.
    pub passed_attempts: usize,
    /// `passed / evaluated * 100`.
    pub pass_rate: f64,
    /// Mean percentage across evaluated attempts.
    pub average_percentage: f64,
    /// Mean duration in minutes across evaluated attempts.
    pub average_duration_minutes: f64,
}

/// Compute statistics for `test_id` over a set of attempts.
///
/// Returns `None` when no evaluated attempt exists for the test.
pub fn compute_test_statistics<'a>(
    test_id: TestId,
    attempts: impl IntoIterator<Item = &'a Attempt>,
) -> Option<TestStatistics> {
    let evaluated: Vec<&Attempt> = attempts
        .into_iter()
        .filter(|a| a.test_id == test_id && a.is_evaluated())
        .collect();
    if evaluated.is_empty() {
        return None;
    }

    let n = evaluated.len() as f64;
    let passed = evaluated.iter().filter(|a| a.is_passed).count();
    let average_percentage = evaluated.iter().map(|a| a.percentage).sum::<f64>() / n;
    let average_duration_minutes = evaluated.iter().map(|a| a.duration_minutes()).sum::<f64>() / n;

    Some(TestStatistics {
        test_id,
        evaluated_attempts: evaluated.len(),
        passed_attempts: passed,
        pass_rate: passed as f64 / n * 100.0,
        average_percentage,
        average_duration_minutes,
    })
}

/// One row of the top-performer ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentPerformance {
    pub student_id: StudentId,
    pub full_name: String,
    pub group: String,
    /// Mean percentage over this student's evaluated attempts only.
    pub average_percentage: f64,
    pub evaluated_attempts: usize,
    /// All attempts, whatever their status.
    pub total_attempts: usize,
}

/// Rank students by mean evaluated percentage, best first.
///
/// Students without an evaluated attempt are left out. Ties keep the order
/// in which `students` yields them. At most `limit` rows are returned.
pub fn rank_students<'a, F>(
    students: impl IntoIterator<Item = &'a Student>,
    attempt_lookup: F,
    limit: usize,
) -> Vec<StudentPerformance>
where
    F: Fn(&Student) -> Vec<&'a Attempt>,
{
    let mut ranking: Vec<StudentPerformance> = students
        .into_iter()
        .filter_map(|student| {
            let attempts = attempt_lookup(student);
            let evaluated: Vec<f64> = attempts
                .iter()
                .filter(|a| a.is_evaluated())
                .map(|a| a.percentage)
                .collect();
            if evaluated.is_empty() {
                return None;
            }
            Some(StudentPerformance {
                student_id: student.id,
                full_name: student.full_name.clone(),
                group: student.group.clone(),
                average_percentage: evaluated.iter().sum::<f64>() / evaluated.len() as f64,
                evaluated_attempts: evaluated.len(),
                total_attempts: attempts.len(),
            })
        })
        .collect();

    // sort_by is stable, so equal averages stay in collection order
    ranking.sort_by(|a, b| b.average_percentage.total_cmp(&a.average_percentage));
    ranking.truncate(limit);
    ranking
}
