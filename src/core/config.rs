//! Configuration management for the privacy graph engine
//!
//! Settings come from an optional TOML file, then environment overrides,
//! then validation. Every section has defaults, so an empty file is valid.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "privacy-graph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Traversal engine configuration
    pub engine: EngineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Traversal engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum locator nesting depth before a request is aborted
    pub max_depth: usize,

    /// Maximum sibling locators resolved concurrently per record
    pub max_concurrency: usize,

    /// Abort when a locator reappears in its own ancestor chain
    pub detect_cycles: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact)
    pub format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_concurrency: 16,
            detect_cycles: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(depth) = env::var("PG_MAX_DEPTH") {
            self.engine.max_depth = depth
                .parse()
                .map_err(|e| Error::config(format!("Invalid max depth: {}", e)))?;
        }

        if let Ok(concurrency) = env::var("PG_MAX_CONCURRENCY") {
            self.engine.max_concurrency = concurrency
                .parse()
                .map_err(|e| Error::config(format!("Invalid max concurrency: {}", e)))?;
        }

        if let Ok(detect) = env::var("PG_DETECT_CYCLES") {
            self.engine.detect_cycles = detect
                .parse()
                .map_err(|e| Error::config(format!("Invalid detect cycles flag: {}", e)))?;
        }

        if let Ok(level) = env::var("PG_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("PG_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_depth == 0 {
            return Err(Error::config("Max depth must be at least 1"));
        }

        if self.engine.max_concurrency == 0 || self.engine.max_concurrency > 1024 {
            return Err(Error::config("Max concurrency must be between 1 and 1024"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }
}
