//! File-based configuration
//!
//! Settings come from `surveyrec.toml`. Priority order (highest to
//! lowest): explicit path via `SURVEYREC_CONFIG`, a `surveyrec.toml`
//! found walking up from the current directory, built-in defaults.
//! CLI flags override whatever the file supplies.

use crate::error::Result;
use crate::report::ReconcileOptions;
use crate::transform::TransformConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "surveyrec.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reconcile: ReconcileSettings,
    #[serde(default)]
    pub transform: Option<TransformConfig>,
}

/// Reconciliation settings as they appear in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    #[serde(default = "default_key_column")]
    pub key_column: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub strict_schema: bool,
}

fn default_key_column() -> String {
    crate::report::DEFAULT_KEY_COLUMN.to_string()
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            key_column: default_key_column(),
            limit: 0,
            strict_schema: false,
        }
    }
}

impl ReconcileSettings {
    pub fn to_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            key_column: self.key_column.clone(),
            limit: self.limit,
            strict_schema: self.strict_schema,
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolve configuration: `SURVEYREC_CONFIG` env var first, then a
    /// `surveyrec.toml` discovered walking up from the current
    /// directory, then defaults.
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = env::var("SURVEYREC_CONFIG") {
            return Self::load_from(Path::new(&config_path));
        }

        if let Ok(mut dir) = env::current_dir() {
            loop {
                let candidate = dir.join(CONFIG_FILE_NAME);
                if candidate.exists() {
                    return Self::load_from(&candidate);
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        Ok(Self::default())
    }
}
