//! The `gradebook question` commands.

use anyhow::{Context as _, Result};
use clap::Subcommand;
use comfy_table::{Cell, Table};

use gradebook_core::{NewQuestion, QuestionKind};

use super::{yes_no, Context};

#[derive(Subcommand)]
pub enum QuestionCommand {
    /// Add a question to a test
    Add {
        /// Test to add the question to
        #[arg(long)]
        test: u32,

        /// Question prompt
        #[arg(long)]
        text: String,

        /// Question kind: single, multiple, text
        #[arg(long)]
        kind: QuestionKind,

        /// Offered option (repeat for each option)
        #[arg(long = "option")]
        options: Vec<String>,

        /// Correct option (repeat for each correct option)
        #[arg(long = "correct")]
        correct: Vec<String>,

        /// Points awarded for a correct answer
        #[arg(long, default_value = "1.0")]
        points: f64,
    },

    /// List the questions of a test
    List {
        #[arg(long)]
        test: u32,
    },

    /// Activate or deactivate a question
    Toggle {
        #[arg(long)]
        test: u32,

        id: u32,
    },

    /// Remove a question from its test
    Delete {
        #[arg(long)]
        test: u32,

        id: u32,
    },
}

pub fn execute(ctx: &Context, command: QuestionCommand) -> Result<()> {
    let (_, mut registry) = ctx.open()?;

    match command {
        QuestionCommand::Add {
            test,
            text,
            kind,
            options,
            correct,
            points,
        } => {
            let question = NewQuestion::new(text, kind)
                .with_options(options)
                .with_correct_answers(correct)
                .with_points(points);
            let id = registry.add_question_to_test(test, question)?;
            println!("Added question {id} to test {test}");
        }
        QuestionCommand::List { test } => {
            let test = registry
                .find_test_by_id(test)
                .with_context(|| format!("test {test} not found"))?;
            if test.questions.is_empty() {
                println!("Test {} has no questions.", test.id);
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["ID", "Kind", "Question", "Options", "Points", "Active"]);
            for q in &test.questions {
                table.add_row(vec![
                    Cell::new(q.id),
                    Cell::new(q.kind),
                    Cell::new(&q.text),
                    Cell::new(q.options.join(", ")),
                    Cell::new(q.max_points),
                    Cell::new(yes_no(q.is_active)),
                ]);
            }
            println!("{table}");
            println!("Max score: {}", test.max_score());
        }
        QuestionCommand::Toggle { test, id } => {
            let active = registry.toggle_question_active(test, id)?;
            println!(
                "Question {id} is now {}",
                if active { "active" } else { "inactive" }
            );
        }
        QuestionCommand::Delete { test, id } => {
            if registry.delete_question(test, id)? {
                println!("Deleted question {id} from test {test}");
            } else {
                println!("Test {test} has no question {id}");
            }
        }
    }

    Ok(())
}
