//! Configuration service.
//!
//! Loads `config.toml` and `secret.json` from [`GitMatePaths`]. Environment
//! variables take precedence over the secret file for the Gemini key.

use crate::paths::GitMatePaths;
use gitmate_core::config::{GeminiSecret, GitMateConfig, SecretConfig};
use gitmate_core::error::Result;

/// Environment variables checked, in order, for the Gemini API key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Loads settings and secrets.
#[derive(Debug, Clone)]
pub struct ConfigService {
    paths: GitMatePaths,
}

impl ConfigService {
    pub fn new(paths: GitMatePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &GitMatePaths {
        &self.paths
    }

    /// Reads `config.toml`; a missing or empty file yields defaults.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed TOML.
    pub fn load_config(&self) -> Result<GitMateConfig> {
        let path = self.paths.config_file()?;
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(GitMateConfig::default());
        }

        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(GitMateConfig::default());
        }
        Ok(toml::from_str(&content)?)
    }

    /// Reads `secret.json`, creating the template when absent, then applies
    /// the environment override.
    pub fn load_secrets(&self) -> Result<SecretConfig> {
        let env_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok());
        self.load_secrets_with(env_key)
    }

    fn load_secrets_with(&self, env_key: Option<String>) -> Result<SecretConfig> {
        let path = self.paths.ensure_secret_file()?;
        let content = std::fs::read_to_string(&path)?;
        let mut secrets: SecretConfig = if content.trim().is_empty() {
            SecretConfig::default()
        } else {
            serde_json::from_str(&content)?
        };

        if let Some(api_key) = env_key.filter(|key| !key.trim().is_empty()) {
            tracing::debug!("Using Gemini API key from the environment");
            secrets.gemini = Some(GeminiSecret { api_key });
        }

        Ok(secrets)
    }
}
