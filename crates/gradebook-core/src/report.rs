//! System overview report with text, markdown, and JSON output.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::TestId;
use crate::statistics::{StudentPerformance, TestStatistics};

/// Counts, per-test statistics, and the top-performer ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_students: usize,
    pub total_tests: usize,
    pub total_attempts: usize,
    /// One entry per test, in creation order.
    pub tests: Vec<TestOverview>,
    pub top_performers: Vec<StudentPerformance>,
}

/// A test and its statistics, if it has any evaluated attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOverview {
    pub test_id: TestId,
    pub title: String,
    pub statistics: Option<TestStatistics>,
}

impl Overview {
    /// Save the overview as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize overview")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write overview to {}", path.display()))?;
        Ok(())
    }

    /// Plain-text rendering for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Students: {}", self.total_students);
        let _ = writeln!(out, "Tests:    {}", self.total_tests);
        let _ = writeln!(out, "Attempts: {}", self.total_attempts);
        out.push_str("\nTest statistics:\n");

        for test in &self.tests {
            let _ = writeln!(out, "\n{} (#{})", test.title, test.test_id);
            match &test.statistics {
                Some(s) => {
                    let _ = writeln!(out, "  Evaluated attempts: {}", s.evaluated_attempts);
                    let _ = writeln!(out, "  Passed:             {}", s.passed_attempts);
                    let _ = writeln!(out, "  Pass rate:          {:.1}%", s.pass_rate);
                    let _ = writeln!(out, "  Average score:      {:.1}%", s.average_percentage);
                    let _ = writeln!(
                        out,
                        "  Average time:       {:.1} min",
                        s.average_duration_minutes
                    );
                }
                None => out.push_str("  No evaluated attempts\n"),
            }
        }

        out.push_str("\nTop students:\n");
        if self.top_performers.is_empty() {
            out.push_str("  No students with evaluated attempts\n");
        }
        for (rank, p) in self.top_performers.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} - {:.1}% (attempts: {})",
                rank + 1,
                p.full_name,
                p.average_percentage,
                p.total_attempts
            );
        }

        out
    }

    /// Markdown rendering with one table per section.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} students, {} tests, {} attempts\n\n",
            self.total_students, self.total_tests, self.total_attempts
        ));

        md.push_str("### Tests\n\n");
        md.push_str("| Test | Evaluated | Passed | Pass rate | Avg score | Avg time |\n");
        md.push_str("|------|-----------|--------|-----------|-----------|----------|\n");
        for test in &self.tests {
            match &test.statistics {
                Some(s) => md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% | {:.1}% | {:.1} min |\n",
                    test.title,
                    s.evaluated_attempts,
                    s.passed_attempts,
                    s.pass_rate,
                    s.average_percentage,
                    s.average_duration_minutes
                )),
                None => md.push_str(&format!("| {} | 0 | - | - | - | - |\n", test.title)),
            }
        }
        md.push('\n');

        if !self.top_performers.is_empty() {
            md.push_str("### Top students\n\n");
            md.push_str("| # | Student | Group | Avg score | Attempts |\n");
            md.push_str("|---|---------|-------|-----------|----------|\n");
            for (rank, p) in self.top_performers.iter().enumerate() {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% | {} |\n",
                    rank + 1,
                    p.full_name,
                    p.group,
                    p.average_percentage,
                    p.total_attempts
                ));
            }
        }

        md
    }
}
