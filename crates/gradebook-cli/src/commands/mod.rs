//! Subcommand implementations.

pub mod attempt;
pub mod init;
pub mod question;
pub mod stats;
pub mod student;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;

use gradebook_core::clock::SystemClock;
use gradebook_core::config::{load_config_from, GradebookConfig};
use gradebook_core::{AssessmentRegistry, JsonFileStore, RegistryOptions};

/// Global flags shared by every subcommand.
pub struct Context {
    data: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl Context {
    pub fn new(data: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        Self { data, config }
    }

    /// Resolve the configuration, applying `--data` over `data_file`.
    pub fn config(&self) -> Result<GradebookConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(data) = &self.data {
            config.data_file = data.clone();
        }
        Ok(config)
    }

    /// Open the gradebook the command works on.
    pub fn open(&self) -> Result<(GradebookConfig, AssessmentRegistry)> {
        let config = self.config()?;
        let store = JsonFileStore::new(&config.data_file);
        let registry = AssessmentRegistry::open(store, SystemClock, RegistryOptions::from(&config));
        Ok((config, registry))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
