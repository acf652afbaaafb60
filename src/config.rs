use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::common::error::{ImportError, Result};
use crate::pipeline::matcher::MatcherConfig;

/// Crate configuration, loaded from a TOML file. Every section falls back to
/// its defaults, so a missing or partial file is fine.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matcher: MatcherConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content)
            .map_err(|e| ImportError::Config(format!("invalid config file: {e}")))
    }
}
