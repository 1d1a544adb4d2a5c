//! The `gradebook init` command.

use std::path::Path;

use anyhow::Result;

use gradebook_core::config::SAMPLE_CONFIG;

use super::Context;

pub fn execute(ctx: &Context) -> Result<()> {
    let config_path = Path::new("gradebook.toml");
    if config_path.exists() {
        println!("gradebook.toml already exists, skipping.");
    } else {
        std::fs::write(config_path, SAMPLE_CONFIG)?;
        println!("Created gradebook.toml");
    }

    let (config, registry) = ctx.open()?;
    println!(
        "Gradebook at {} ({} students, {} tests)",
        config.data_file.display(),
        registry.students().count(),
        registry.tests().count()
    );

    println!("\nNext steps:");
    println!("  1. Run: gradebook student list");
    println!("  2. Run: gradebook attempt create --student 1 --test 1");
    println!("  3. Run: gradebook stats");

    Ok(())
}
