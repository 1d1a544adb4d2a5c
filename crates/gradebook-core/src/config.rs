//! Gradebook configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{DEFAULT_PASSING_SCORE, DEFAULT_TIME_LIMIT_MINUTES};

/// Top-level gradebook configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradebookConfig {
    /// Where the JSON snapshot lives.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Seed demonstration data when no snapshot can be loaded.
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,
    /// Time limit given to new tests when none is specified.
    #[serde(default = "default_time_limit")]
    pub default_time_limit_minutes: u32,
    /// Passing threshold given to new tests.
    #[serde(default = "default_passing_score")]
    pub default_passing_score: f64,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("gradebook-data.json")
}
fn default_true() -> bool {
    true
}
fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_MINUTES
}
fn default_passing_score() -> f64 {
    DEFAULT_PASSING_SCORE
}

impl Default for GradebookConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            seed_demo_data: true,
            default_time_limit_minutes: default_time_limit(),
            default_passing_score: default_passing_score(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradebook.toml` in the current directory
/// 2. `~/.config/gradebook/config.toml`
///
/// Environment variable override: `GRADEBOOK_DATA_FILE`.
pub fn load_config() -> Result<GradebookConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradebookConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("gradebook.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradebookConfig::default(),
    };

    if let Ok(data_file) = std::env::var("GRADEBOOK_DATA_FILE") {
        config.data_file = PathBuf::from(data_file);
    }
    config.data_file = PathBuf::from(resolve_env_vars(&config.data_file.to_string_lossy()));

    anyhow::ensure!(
        (0.0..=100.0).contains(&config.default_passing_score),
        "default_passing_score must be between 0 and 100"
    );

    Ok(config)
}

/// Parse a TOML configuration string.
pub fn parse_config(content: &str) -> Result<GradebookConfig> {
    Ok(toml::from_str(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradebook"))
}

/// Starter configuration written by `gradebook init`.
pub const SAMPLE_CONFIG: &str = r#"# gradebook configuration

# Snapshot file holding students, tests, and attempts.
data_file = "gradebook-data.json"

# Fill an empty gradebook with demonstration students and tests.
seed_demo_data = true

default_time_limit_minutes = 60
default_passing_score = 60.0
"#;
