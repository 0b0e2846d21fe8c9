//! Typed application configuration.
//!
//! Loaded from a YAML file (`LECTERN_CONFIG_PATH`, then `<data>/config.yml`,
//! then `<project>/config.yml`); every field has a default so a missing file
//! yields a fully usable configuration.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::core::errors::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub ingest: IngestConfig,
    pub agent: AgentConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

/// Connection settings for the OpenAI-compatible completion/embedding
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            api_key: None,
            model: "qwen2.5:7b-instruct".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// What to do with document text that appears before the first lesson
/// marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreamblePolicy {
    /// Attribute the text to a synthetic lesson 0 so it stays searchable.
    LessonZero,
    /// Discard the text.
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Folder of course documents ingested at startup, relative to the
    /// project root unless absolute.
    pub docs_dir: PathBuf,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of a lesson.
    pub chunk_overlap: usize,
    pub preamble: PreamblePolicy,
    /// Clear both collections and re-ingest everything at startup.
    pub rebuild_on_start: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            chunk_size: 800,
            chunk_overlap: 100,
            preamble: PreamblePolicy::LessonZero,
            rebuild_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Rounds of tool use allowed before the model is forced to answer.
    pub max_tool_rounds: usize,
    /// Ranked matches returned per search tool call.
    pub max_results: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 2,
            max_results: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Exchanges (query/answer pairs) retained per session.
    pub max_history: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_history: 2 }
    }
}

pub fn load_config(paths: &AppPaths) -> Result<AppConfig, AppError> {
    let path = config_path(paths);
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("cannot parse {}: {}", path.display(), e)))
}

fn config_path(paths: &AppPaths) -> PathBuf {
    if let Ok(path) = env::var("LECTERN_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    let data_config = paths.data_dir.join("config.yml");
    if data_config.exists() {
        return data_config;
    }

    paths.project_root.join("config.yml")
}
