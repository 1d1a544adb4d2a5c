//! The `gradebook validate` command.

use anyhow::Result;

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let (_, registry) = ctx.open()?;

    let mut total_warnings = 0;

    for test in registry.tests() {
        println!("Test {}: {} ({} questions)", test.id, test.title, test.questions.len());

        let warnings = registry.validate_test(test.id).unwrap_or_default();
        for w in &warnings {
            println!("  WARNING: {w}");
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All tests valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
