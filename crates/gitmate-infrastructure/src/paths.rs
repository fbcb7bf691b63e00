//! Path management for GitMate's configuration and state files.

use gitmate_core::config::{GeminiSecret, SecretConfig};
use gitmate_core::error::{GitMateError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "gitmate";

/// Resolves every file GitMate reads or writes.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/gitmate/           # Config directory (platform specific)
/// ├── config.toml              # Application configuration
/// ├── secret.json              # API keys
/// ├── workspace.json           # Persisted workspace record
/// └── logs/                    # Application logs
///     └── gitmate.log.YYYY-MM-DD
/// ```
///
/// Passing a base directory replaces `~/.config/gitmate` entirely, which is
/// how tests keep their files inside a temp dir.
#[derive(Debug, Clone)]
pub struct GitMatePaths {
    base: Option<PathBuf>,
}

impl GitMatePaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory.
    ///
    /// # Errors
    ///
    /// Returns `Config` when no base was given and the platform config
    /// directory cannot be determined.
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| GitMateError::config("Cannot find the user config directory")),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Path to `secret.json`. Keep it at mode 600.
    pub fn secret_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("secret.json"))
    }

    pub fn workspace_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("workspace.json"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("logs"))
    }

    /// Ensures the secret file exists, creating a template if it doesn't.
    ///
    /// The template carries an empty Gemini key for the user to fill in. On
    /// Unix the new file is restricted to user read/write.
    pub fn ensure_secret_file(&self) -> Result<PathBuf> {
        let secret_path = self.secret_file()?;
        if secret_path.exists() {
            return Ok(secret_path);
        }

        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = SecretConfig {
            gemini: Some(GeminiSecret {
                api_key: String::new(),
            }),
        };
        std::fs::write(&secret_path, serde_json::to_string_pretty(&template)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        tracing::info!("Created secret template at {}", secret_path.display());
        Ok(secret_path)
    }
}
