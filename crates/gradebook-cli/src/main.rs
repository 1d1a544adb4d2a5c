//! gradebook CLI: record students, tests, and attempts, then grade them.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::attempt::AttemptCommand;
use commands::question::QuestionCommand;
use commands::student::StudentCommand;
use commands::test::TestCommand;
use commands::Context;

#[derive(Parser)]
#[command(name = "gradebook", version, about = "Student assessment tracking")]
struct Cli {
    /// Snapshot file (overrides `data_file` from the config)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and an initial gradebook
    Init,

    /// Manage students
    Student {
        #[command(subcommand)]
        command: StudentCommand,
    },

    /// Manage tests
    Test {
        #[command(subcommand)]
        command: TestCommand,
    },

    /// Manage the questions of a test
    Question {
        #[command(subcommand)]
        command: QuestionCommand,
    },

    /// Create, take, and grade attempts
    Attempt {
        #[command(subcommand)]
        command: AttemptCommand,
    },

    /// Show pass rates, averages, and the top students
    Stats {
        /// Limit the report to one test
        #[arg(long)]
        test: Option<u32>,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Number of top students to show
        #[arg(long, default_value = "5")]
        top: usize,

        /// Also write the JSON overview to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check every test for configuration problems
    Validate,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gradebook=info")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = Context::new(cli.data, cli.config);

    let result = match cli.command {
        Commands::Init => commands::init::execute(&ctx),
        Commands::Student { command } => commands::student::execute(&ctx, command),
        Commands::Test { command } => commands::test::execute(&ctx, command),
        Commands::Question { command } => commands::question::execute(&ctx, command),
        Commands::Attempt { command } => commands::attempt::execute(&ctx, command),
        Commands::Stats {
            test,
            format,
            top,
            output,
        } => commands::stats::execute(&ctx, test, format, top, output),
        Commands::Validate => commands::validate::execute(&ctx),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
