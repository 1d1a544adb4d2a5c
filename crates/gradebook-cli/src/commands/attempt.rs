//! The `gradebook attempt` commands.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use gradebook_core::{Attempt, AttemptStatus};

use super::{yes_no, Context};

#[derive(Subcommand)]
pub enum AttemptCommand {
    /// Create a new attempt for a student on a test
    Create {
        #[arg(long)]
        student: u32,

        #[arg(long)]
        test: u32,
    },

    /// Start an attempt
    Start { id: u32 },

    /// Submit an answer; choice questions are scored immediately
    Answer {
        id: u32,

        #[arg(long)]
        question: u32,

        /// Selected option(s) or free-text answer
        #[arg(required = true)]
        answers: Vec<String>,
    },

    /// Finish an attempt
    Finish { id: u32 },

    /// Evaluate a finished attempt
    Evaluate {
        id: u32,

        /// Manual score as QUESTION=POINTS (repeatable)
        #[arg(long = "score", value_parser = parse_score)]
        scores: Vec<(u32, f64)>,
    },

    /// List attempts
    List {
        #[arg(long)]
        student: Option<u32>,

        #[arg(long)]
        test: Option<u32>,
    },
}

fn parse_score(s: &str) -> Result<(u32, f64), String> {
    let (question, points) = s
        .split_once('=')
        .ok_or_else(|| format!("expected QUESTION=POINTS, got '{s}'"))?;
    let question = question
        .trim()
        .parse()
        .map_err(|_| format!("invalid question id '{question}'"))?;
    let points = points
        .trim()
        .parse()
        .map_err(|_| format!("invalid points '{points}'"))?;
    Ok((question, points))
}

fn describe(attempt: &Attempt) -> String {
    match attempt.status {
        AttemptStatus::Evaluated => format!(
            "Attempt {}: {} points, {:.1}% - {}",
            attempt.id,
            attempt.final_score,
            attempt.percentage,
            if attempt.is_passed { "passed" } else { "failed" }
        ),
        status => format!("Attempt {} is {status}", attempt.id),
    }
}

pub fn execute(ctx: &Context, command: AttemptCommand) -> Result<()> {
    let (_, mut registry) = ctx.open()?;

    match command {
        AttemptCommand::Create { student, test } => {
            let id = registry.create_attempt(student, test)?;
            println!("Created attempt {id} for student {student} on test {test}");
        }
        AttemptCommand::Start { id } => {
            let attempt = registry.start_attempt(id)?;
            println!("{}", describe(attempt));
        }
        AttemptCommand::Answer {
            id,
            question,
            answers,
        } => match registry.submit_answer(id, question, answers)? {
            Some(points) => println!("Recorded answer to question {question}: {points} point(s)"),
            None => println!("Recorded answer to question {question} (awaiting manual grading)"),
        },
        AttemptCommand::Finish { id } => {
            let attempt = registry.finish_attempt(id)?;
            println!("{}", describe(attempt));
        }
        AttemptCommand::Evaluate { id, scores } => {
            let manual = (!scores.is_empty()).then(|| scores.into_iter().collect::<BTreeMap<_, _>>());
            let attempt = registry.evaluate_attempt(id, manual)?;
            println!("{}", describe(attempt));
        }
        AttemptCommand::List { student, test } => {
            let attempts: Vec<&Attempt> = match student {
                Some(student) => registry.student_attempts(student, test),
                None => registry
                    .attempts()
                    .filter(|a| test.map_or(true, |t| a.test_id == t))
                    .collect(),
            };
            if attempts.is_empty() {
                println!("No attempts found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec![
                "ID", "Student", "Test", "Status", "Score", "Percent", "Passed",
            ]);
            for a in attempts {
                let evaluated = a.is_evaluated();
                table.add_row(vec![
                    Cell::new(a.id),
                    Cell::new(a.student_id),
                    Cell::new(a.test_id),
                    Cell::new(a.status),
                    Cell::new(a.final_score),
                    Cell::new(if evaluated {
                        format!("{:.1}%", a.percentage)
                    } else {
                        "-".to_string()
                    }),
                    Cell::new(if evaluated { yes_no(a.is_passed) } else { "-" }),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_argument_parsing() {
        assert_eq!(parse_score("3=2.5"), Ok((3, 2.5)));
        assert_eq!(parse_score(" 4 = 1 "), Ok((4, 1.0)));
        assert!(parse_score("3").is_err());
        assert!(parse_score("x=1").is_err());
        assert!(parse_score("3=lots").is_err());
    }
}
