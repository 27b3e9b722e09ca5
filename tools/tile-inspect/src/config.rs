//! Configuration for the tile inspector.

use anyhow::{anyhow, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Tile inspector configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Tiles per GPU, overriding what the node capacity reports.
    pub tiles_per_gpu: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            tiles_per_gpu: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_level = lookup("GAS_LOG_LEVEL").unwrap_or(defaults.log_level);

        let log_format = match lookup("GAS_LOG_FORMAT") {
            Some(s) => s.parse()?,
            None => defaults.log_format,
        };

        let tiles_per_gpu = lookup("GAS_TILES_PER_GPU")
            .map(|s| {
                s.parse::<u32>()
                    .map_err(|e| anyhow!("invalid GAS_TILES_PER_GPU '{s}': {e}"))
            })
            .transpose()?;

        Ok(Self {
            log_level,
            log_format,
            tiles_per_gpu,
        })
    }
}
