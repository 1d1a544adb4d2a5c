//! The `gradebook stats` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::Context;

pub fn execute(
    ctx: &Context,
    test: Option<u32>,
    format: String,
    top: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let (_, registry) = ctx.open()?;

    if let Some(test_id) = test {
        let Some(test) = registry.find_test_by_id(test_id) else {
            bail!("test {test_id} not found");
        };
        let stats = registry.test_statistics(test_id);
        match format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
            "text" | "markdown" | "md" => match stats {
                Some(s) => {
                    println!("{} (#{})", test.title, test.id);
                    println!("  Evaluated attempts: {}", s.evaluated_attempts);
                    println!("  Passed:             {}", s.passed_attempts);
                    println!("  Pass rate:          {:.1}%", s.pass_rate);
                    println!("  Average score:      {:.1}%", s.average_percentage);
                    println!("  Average time:       {:.1} min", s.average_duration_minutes);
                }
                None => println!("{} (#{}): no evaluated attempts", test.title, test.id),
            },
            other => bail!("unknown format: {other} (expected text, markdown, or json)"),
        }
        return Ok(());
    }

    let overview = registry.overview(top);
    if let Some(path) = &output {
        overview.save_json(path)?;
        eprintln!("Overview written to {}", path.display());
    }

    match format.as_str() {
        "markdown" | "md" => println!("{}", overview.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&overview)?),
        "text" => print!("{}", overview.to_text()),
        other => bail!("unknown format: {other} (expected text, markdown, or json)"),
    }

    Ok(())
}
