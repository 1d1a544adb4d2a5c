//! The `gradebook student` commands.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use super::Context;

#[derive(Subcommand)]
pub enum StudentCommand {
    /// Register a student
    Add {
        /// Full name
        #[arg(long)]
        name: String,

        /// Study group, e.g. "Group 101"
        #[arg(long)]
        group: String,

        #[arg(long, default_value = "")]
        email: String,
    },

    /// List students
    List {
        /// Only show one group
        #[arg(long)]
        group: Option<String>,
    },
}

pub fn execute(ctx: &Context, command: StudentCommand) -> Result<()> {
    let (_, mut registry) = ctx.open()?;

    match command {
        StudentCommand::Add { name, group, email } => {
            let id = registry.add_student(name, group, email)?;
            if let Some(student) = registry.find_student_by_id(id) {
                println!(
                    "Added student {id}: {} ({})",
                    student.full_name, student.group
                );
            }
        }
        StudentCommand::List { group } => {
            let students = match &group {
                Some(group) => registry.find_students_by_group(group),
                None => registry.students().collect(),
            };
            if students.is_empty() {
                println!("No students found.");
                return Ok(());
            }

            let mut table = Table::new();
            table.set_header(vec!["ID", "Name", "Group", "Email", "Attempts"]);
            for student in students {
                table.add_row(vec![
                    Cell::new(student.id),
                    Cell::new(&student.full_name),
                    Cell::new(&student.group),
                    Cell::new(&student.email),
                    Cell::new(student.attempts_count()),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
