use std::path::Path;

use anyhow::{Context, Result};
use extract::GraphSchema;
use extract::prompt::{DEFAULT_ENTITY_TYPES, DEFAULT_EXTRACTION_PROMPT, DEFAULT_RELATIONSHIP_TYPES};
use serde::{Deserialize, Serialize};
use tracing::Level;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub schema: SchemaConfig,
    pub merge: MergeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub entity_types: Vec<String>,
    pub relationship_types: Vec<String>,
    /// Falls back to the built-in template when absent.
    pub extraction_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Bound on queued extractions waiting for the merge task.
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            entity_types: DEFAULT_ENTITY_TYPES.iter().map(|t| t.to_string()).collect(),
            relationship_types: DEFAULT_RELATIONSHIP_TYPES.iter().map(|t| t.to_string()).collect(),
            extraction_prompt: None,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        let config: PipelineConfig = serde_json::from_str(&raw)
            .context(format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the validated schema for one extraction run.
    pub fn to_schema(&self) -> Result<GraphSchema> {
        let prompt = self
            .schema
            .extraction_prompt
            .as_deref()
            .unwrap_or(DEFAULT_EXTRACTION_PROMPT);

        GraphSchema::new(&self.schema.entity_types, &self.schema.relationship_types, prompt)
            .context("Invalid schema configuration")
    }

    pub fn log_level(&self) -> Result<Level> {
        self.logging
            .level
            .parse::<Level>()
            .map_err(|_| anyhow::anyhow!("Unknown log level: {}", self.logging.level))
    }
}
