//! Configuration types.
//!
//! `GitMateConfig` lives in `config.toml`; `SecretConfig` lives in
//! `secret.json` so that API keys never share a file with shareable settings.

use crate::chat::ChatModel;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_USER_AGENT: &str = "gitmate";

/// Application settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct GitMateConfig {
    /// Model for newly started workspaces
    #[serde(default)]
    pub default_model: ChatModel,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub github: GithubSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GeminiSettings {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GithubSettings {
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_github_api_base() -> String {
    DEFAULT_GITHUB_API_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// API keys.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiSecret>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct GeminiSecret {
    pub api_key: String,
}

impl SecretConfig {
    /// The Gemini key, if one is configured and non-blank.
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .as_ref()
            .map(|g| g.api_key.trim())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: GitMateConfig = toml::from_str("").unwrap();
        assert_eq!(config, GitMateConfig::default());
        assert_eq!(config.gemini.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.github.api_base, DEFAULT_GITHUB_API_BASE);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: GitMateConfig = toml::from_str(
            r#"
default_model = "gemini-3-pro-preview"

[github]
api_base = "http://localhost:9000"
"#,
        )
        .unwrap();
        assert_eq!(config.default_model, ChatModel::Pro);
        assert_eq!(config.github.api_base, "http://localhost:9000");
        assert_eq!(config.github.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let secrets = SecretConfig {
            gemini: Some(GeminiSecret {
                api_key: "  ".to_string(),
            }),
        };
        assert!(secrets.gemini_api_key().is_none());
        assert!(SecretConfig::default().gemini_api_key().is_none());
    }
}
