// ABOUTME: Configuration management for the docflow application
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pipeline::PipelineConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub field_confidence: f64,
    pub table_confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent(),
            pipeline: PipelineSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            field_confidence: defaults.field_confidence,
            table_confidence: defaults.table_confidence,
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
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file()?,
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&contents)?
        } else {
            Config::default()
        };
        config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine would only catch by panicking.
    fn validate(&self) -> Result<()> {
        if self.max_concurrent_tasks == 0 {
            return Err(anyhow::anyhow!(
                "max_concurrent_tasks must be at least 1, got 0"
            ));
        }
        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Result<PathBuf> {
        let possible_paths = vec![
            PathBuf::from("docflow.yaml"),
            PathBuf::from("docflow.yml"),
            PathBuf::from(".docflow.yaml"),
            PathBuf::from(".docflow.yml"),
        ];

        // Check home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".docflow").join("config.yaml");
            if home_config.exists() {
                return Ok(home_config);
            }
        }

        // Check current directory
        for path in possible_paths {
            if path.exists() {
                return Ok(path);
            }
        }

        // Return default path (may not exist)
        Ok(PathBuf::from("docflow.yaml"))
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("DOCFLOW_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("DOCFLOW_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(max_tasks) = std::env::var("DOCFLOW_MAX_CONCURRENT") {
            self.max_concurrent_tasks = max_tasks.parse()?;
        }
        Ok(())
    }

    /// Pipeline tunables in the form the stage executors take.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            field_confidence: self.pipeline.field_confidence,
            table_confidence: self.pipeline.table_confidence,
        }
    }
}
