//! Runtime configuration for the vector store, embedding and LLM clients.
//!
//! Every constructor takes an explicit key lookup so callers decide where the
//! values come from: the process environment, a `.env` file loaded at startup,
//! or a fixed map in tests. Blank values are treated as missing.

use crate::error::ConfigError;
use crate::models::{DEFAULT_COLLECTION, DEFAULT_VECTOR_SIZE};
use std::time::Duration;

pub const QDRANT_URL_ENV: &str = "qdrant_url";
pub const QDRANT_API_KEY_ENV: &str = "qdrant_api";
pub const GROQ_API_KEY_ENV: &str = "groq_api";
pub const DOCUMENTS_PATH_ENV: &str = "DOCUMENTS_PATH";
pub const EMBEDDING_URL_ENV: &str = "EMBEDDING_URL";
pub const EMBEDDING_MODEL_ENV: &str = "EMBEDDING_MODEL";
pub const EMBEDDING_API_KEY_ENV: &str = "EMBEDDING_API_KEY";
pub const EMBEDDING_DIMENSIONS_ENV: &str = "EMBEDDING_DIMENSIONS";
pub const LLM_MODEL_ENV: &str = "LLM_MODEL";

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:8080";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or(ConfigError::MissingEnv(key))
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub timeout: Duration,
}

impl StoreConfig {
    /// Requires both `qdrant_url` and `qdrant_api`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = required(&lookup, QDRANT_URL_ENV)?;
        let api_key = required(&lookup, QDRANT_API_KEY_ENV)?;
        Ok(Self {
            url,
            api_key: Some(api_key),
            collection: DEFAULT_COLLECTION.to_string(),
            timeout: Duration::from_secs(60),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// For stores living inside this process: no endpoint, no credentials.
    pub fn process_local() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            collection: DEFAULT_COLLECTION.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub dimensions: usize,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EMBEDDING_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_VECTOR_SIZE,
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl EmbeddingConfig {
    /// All keys are optional; unset ones keep their defaults.
    /// `EMBEDDING_DIMENSIONS` must match the model's output size.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let dimensions = match optional(&lookup, EMBEDDING_DIMENSIONS_ENV) {
            Some(value) => parse_dimensions(value)?,
            None => defaults.dimensions,
        };
        Ok(Self {
            endpoint: optional(&lookup, EMBEDDING_URL_ENV).unwrap_or(defaults.endpoint),
            model: optional(&lookup, EMBEDDING_MODEL_ENV).unwrap_or(defaults.model),
            api_key: optional(&lookup, EMBEDDING_API_KEY_ENV),
            dimensions,
            ..defaults
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }
}

fn parse_dimensions(value: String) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(dimensions) if dimensions > 0 => Ok(dimensions),
        _ => Err(ConfigError::Invalid {
            key: EMBEDDING_DIMENSIONS_ENV,
            value,
        }),
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub timeout: Duration,
    pub initial_backoff: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.0,
            max_retries: 2,
            timeout: Duration::from_secs(60),
            initial_backoff: Duration::from_millis(500),
        }
    }

    /// Requires `groq_api`; `LLM_MODEL` optionally overrides the model.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(required(&lookup, GROQ_API_KEY_ENV)?);
        if let Some(model) = optional(&lookup, LLM_MODEL_ENV) {
            config.model = model;
        }
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }
}

/// Path of the document set processed by the batch run.
pub fn documents_path<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    required(&lookup, DOCUMENTS_PATH_ENV)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn store_config_requires_url_and_key() {
        let result = StoreConfig::from_lookup(lookup(&[("qdrant_url", "http://q:6333")]));
        assert!(matches!(result, Err(ConfigError::MissingEnv("qdrant_api"))));

        let config = StoreConfig::from_lookup(lookup(&[
            ("qdrant_url", "http://q:6333"),
            ("qdrant_api", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.collection, "rag");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let result = StoreConfig::from_lookup(lookup(&[
            ("qdrant_url", "   "),
            ("qdrant_api", "secret"),
        ]));
        assert!(matches!(result, Err(ConfigError::MissingEnv("qdrant_url"))));
    }

    #[test]
    fn llm_config_has_bounded_deterministic_policy() {
        let config = LlmConfig::from_lookup(lookup(&[("groq_api", "gsk")])).unwrap();
        assert_eq!(config.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.timeout, Duration::from_secs(60));

        let missing = LlmConfig::from_lookup(lookup(&[]));
        assert!(matches!(missing, Err(ConfigError::MissingEnv("groq_api"))));
    }

    #[test]
    fn embedding_config_falls_back_to_defaults() {
        let config = EmbeddingConfig::from_lookup(lookup(&[("EMBEDDING_MODEL", "nomic")])).unwrap();
        assert_eq!(config.endpoint, DEFAULT_EMBEDDING_URL);
        assert_eq!(config.model, "nomic");
        assert_eq!(config.dimensions, DEFAULT_VECTOR_SIZE);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn embedding_dimensions_follow_the_model() {
        let config = EmbeddingConfig::from_lookup(lookup(&[
            ("EMBEDDING_MODEL", "sentence-transformers/all-MiniLM-L6-v2"),
            ("EMBEDDING_DIMENSIONS", " 384 "),
        ]))
        .unwrap();
        assert_eq!(config.dimensions, 384);
    }

    #[test]
    fn malformed_embedding_dimensions_are_rejected() {
        for bad in ["zero", "0", "-384", "38.4"] {
            let result = EmbeddingConfig::from_lookup(lookup(&[("EMBEDDING_DIMENSIONS", bad)]));
            match result {
                Err(ConfigError::Invalid { key, value }) => {
                    assert_eq!(key, "EMBEDDING_DIMENSIONS");
                    assert_eq!(value, bad);
                }
                other => panic!("expected invalid config for {bad}, got {other:?}"),
            }
        }
    }
}
