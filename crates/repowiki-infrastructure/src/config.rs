//! Layered configuration: built-in defaults, then `config.toml`, then
//! `REPOWIKI_`-prefixed environment variables, via `figment`.

use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use repowiki_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which vector-store backend to instantiate at the composition root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    /// In-process cosine-similarity store; suitable for tests and small
    /// single-node deployments.
    Memory,
    /// Qdrant over HTTP.
    Qdrant,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite connection string for the relational store (e.g. `sqlite:repowiki.db`).
    pub database_url: String,
    /// Redis connection string backing the cancellation registry, progress
    /// bus, and job queue.
    pub redis_url: String,
    /// Root directory under which per-repo Git clones are checked out.
    pub clones_root: PathBuf,
    /// Vector-store backend selection.
    pub vector_backend: VectorBackend,
    /// Qdrant base URL, used only when `vector_backend == qdrant`.
    pub qdrant_url: String,
    /// Base URL of the LLM provider's chat-completion endpoint.
    pub llm_endpoint: String,
    /// Model name passed on every LLM call.
    pub llm_model: String,
    /// API key for the LLM provider.
    pub llm_api_key: String,
    /// Base URL of the embedding provider's endpoint.
    pub embedding_endpoint: String,
    /// Model name passed on every embedding call.
    pub embedding_model: String,
    /// API key for the embedding provider.
    pub embedding_api_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:repowiki.db".to_owned(),
            redis_url: "redis://127.0.0.1:6379".to_owned(),
            clones_root: PathBuf::from("./clones"),
            vector_backend: VectorBackend::Memory,
            qdrant_url: "http://127.0.0.1:6333".to_owned(),
            llm_endpoint: "https://api.openai.com/v1".to_owned(),
            llm_model: "gpt-4o-mini".to_owned(),
            llm_api_key: String::new(),
            embedding_endpoint: "https://api.openai.com/v1".to_owned(),
            embedding_model: "text-embedding-3-small".to_owned(),
            embedding_api_key: String::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration, layering (in increasing priority):
    /// built-in defaults, `config.toml` in the current directory (if
    /// present), then `REPOWIKI_*` environment variables.
    pub fn load() -> Result<Self> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("REPOWIKI_"))
            .extract()
            .map_err(|e| Error::validation(format!("failed to load configuration: {e}")))
    }

    /// Load configuration from an explicit TOML file path, still layered
    /// under defaults and above environment overrides.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("REPOWIKI_"))
            .extract()
            .map_err(|e| Error::validation(format!("failed to load configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loadable_without_a_config_file() {
        let config = AppConfig::default();
        assert_eq!(config.vector_backend, VectorBackend::Memory);
        assert!(config.database_url.starts_with("sqlite:"));
    }
}
