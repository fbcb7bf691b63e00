//! Selectable chat models.

use crate::error::GitMateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Thinking budget handed to the provider for the reasoning variant.
pub const PRO_THINKING_BUDGET: u32 = 32768;

/// The small set of models a workspace can chat with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChatModel {
    /// Fast, low-latency variant (default).
    #[default]
    #[serde(rename = "gemini-2.5-flash")]
    Flash,
    /// Deep-reasoning variant.
    #[serde(rename = "gemini-3-pro-preview")]
    Pro,
}

impl ChatModel {
    /// Provider model identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Flash => "gemini-2.5-flash",
            Self::Pro => "gemini-3-pro-preview",
        }
    }

    /// Human-readable label used in status turns.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Flash => "Flash (Fast)",
            Self::Pro => "Pro (Reasoning)",
        }
    }

    /// The other model.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Flash => Self::Pro,
            Self::Pro => Self::Flash,
        }
    }

    /// Reasoning depth; only the Pro variant thinks.
    pub fn reasoning_budget(&self) -> Option<u32> {
        match self {
            Self::Flash => None,
            Self::Pro => Some(PRO_THINKING_BUDGET),
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ChatModel {
    type Err = GitMateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flash" | "fast" | "gemini-2.5-flash" => Ok(Self::Flash),
            "pro" | "reasoning" | "gemini-3-pro-preview" => Ok(Self::Pro),
            other => Err(GitMateError::invalid_input(format!(
                "unknown model '{other}' (expected 'flash' or 'pro')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_flash() {
        assert_eq!(ChatModel::default(), ChatModel::Flash);
    }

    #[test]
    fn test_only_pro_has_reasoning() {
        assert_eq!(ChatModel::Flash.reasoning_budget(), None);
        assert_eq!(ChatModel::Pro.reasoning_budget(), Some(PRO_THINKING_BUDGET));
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("pro".parse::<ChatModel>().unwrap(), ChatModel::Pro);
        assert_eq!(" Flash ".parse::<ChatModel>().unwrap(), ChatModel::Flash);
        assert_eq!(
            "gemini-3-pro-preview".parse::<ChatModel>().unwrap(),
            ChatModel::Pro
        );
        assert!("ultra".parse::<ChatModel>().is_err());
    }

    #[test]
    fn test_serializes_as_provider_id() {
        let json = serde_json::to_string(&ChatModel::Pro).unwrap();
        assert_eq!(json, "\"gemini-3-pro-preview\"");
        assert_eq!(ChatModel::Pro.toggled(), ChatModel::Flash);
    }
}
