//! Configuration management for the Costbook ledger
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with COSTBOOK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Receipt extraction collaborator configuration
    pub extraction: ExtractionConfig,

    /// Name matching collaborator configuration
    pub matching: MatchingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// OpenAI-compatible chat-completions endpoint
    pub api_endpoint: String,

    /// API key for the extraction service
    pub api_key: String,

    /// Vision-capable model identifier
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    /// OpenAI-compatible chat-completions endpoint
    pub api_endpoint: String,

    /// API key for the matching service
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Confidence at or above which a candidate name is unified with an
    /// existing ingredient without asking
    pub auto_unify_threshold: f32,

    /// Confidence at or above which the match is surfaced for confirmation;
    /// below it a new ingredient is created
    pub confirm_threshold: f32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("COSTBOOK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("extraction.api_endpoint", "https://api.openai.com/v1/chat/completions")?
            .set_default("extraction.api_key", "")?
            .set_default("extraction.model", "gpt-4o")?
            .set_default("matching.api_endpoint", "https://api.openai.com/v1/chat/completions")?
            .set_default("matching.api_key", "")?
            .set_default("matching.model", "gpt-4o-mini")?
            .set_default("matching.auto_unify_threshold", 0.9)?
            .set_default("matching.confirm_threshold", 0.6)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (COSTBOOK_ prefix)
            .add_source(
                Environment::with_prefix("COSTBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
