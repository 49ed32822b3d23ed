// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CLI configuration.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Relative type file paths are resolved against the directory of the
//! configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Output format of `encode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `0x`-prefixed hex text.
    #[default]
    Hex,
    /// Raw bytes.
    Binary,
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Type definition files, concatenated into one registry.
    #[serde(default)]
    pub types: Vec<PathBuf>,

    /// Default output format of `encode`.
    #[serde(default)]
    pub output: OutputFormat,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            output: OutputFormat::Hex,
            log_level: default_log_level(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        if let Some(base) = path.parent() {
            for file in &mut config.types {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level `{}`",
                self.log_level
            )));
        }
        for file in &self.types {
            if !file.is_file() {
                return Err(ConfigError::Invalid(format!(
                    "Type file {} does not exist",
                    file.display()
                )));
            }
        }
        Ok(())
    }

    /// Type files of the configuration followed by `extra`.
    pub fn type_files(&self, extra: &[PathBuf]) -> Vec<PathBuf> {
        self.types.iter().chain(extra).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert!(config.types.is_empty());
        assert_eq!(config.output, OutputFormat::Hex);
        assert_eq!(config.log_level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_output_format_names() {
        let config: CliConfig = toml::from_str("output = \"binary\"").unwrap();
        assert_eq!(config.output, OutputFormat::Binary);
        assert!(toml::from_str::<CliConfig>("output = \"octal\"").is_err());
    }

    #[test]
    fn test_validation() {
        let config = CliConfig {
            types: vec![PathBuf::from("/nonexistent/types.tys")],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_type_files_order() {
        let config = CliConfig {
            types: vec![PathBuf::from("a.tys")],
            ..Default::default()
        };
        assert_eq!(
            config.type_files(&[PathBuf::from("b.tys")]),
            vec![PathBuf::from("a.tys"), PathBuf::from("b.tys")]
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = CliConfig {
            types: vec![PathBuf::from("types/chain.tys")],
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        assert!(toml_str.contains("\"types/chain.tys\""));
        assert!(toml_str.contains("output = \"hex\""));
    }
}
