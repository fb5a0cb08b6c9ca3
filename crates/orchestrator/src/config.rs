//! Configuration for Switchboard.
//!
//! # Security
//!
//! - Config file permission validation on Unix systems
//! - Rejects world-readable files containing API keys
//! - Warns about API keys stored in config files

use serde::{Deserialize, Serialize};
use switchboard_common::{UserDirectory, UserIdentity};
use tracing::warn;

/// Top-level Switchboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    /// Configured users, in clarification-prompt order.
    #[serde(default)]
    pub users: Vec<UserEntry>,

    /// Routing classifier provider settings.
    pub classifier: ClassifierConfig,
}

/// One configured user, with optional per-platform credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    /// Stable identifier, e.g. "user1".
    pub id: String,

    /// Platform username.
    pub username: String,

    /// Name shown in clarification prompts.
    pub display_name: String,

    /// GitHub token. If unset, resolved from `GITHUB_TOKEN_<ID>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Linear API key. If unset, resolved from `LINEAR_API_KEY_<ID>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear_api_key: Option<String>,
}

impl UserEntry {
    /// Resolve the GitHub token from config or `GITHUB_TOKEN_<ID>`.
    pub fn resolve_github_token(&self) -> Option<String> {
        resolve_credential(self.github_token.as_deref(), "GITHUB_TOKEN", &self.id)
    }

    /// Resolve the Linear key from config or `LINEAR_API_KEY_<ID>`.
    pub fn resolve_linear_api_key(&self) -> Option<String> {
        resolve_credential(self.linear_api_key.as_deref(), "LINEAR_API_KEY", &self.id)
    }
}

fn resolve_credential(explicit: Option<&str>, prefix: &str, user_id: &str) -> Option<String> {
    if let Some(value) = explicit {
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    std::env::var(format!("{prefix}_{}", user_id.to_uppercase())).ok()
}

/// Settings for the LLM-backed routing classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// OpenAI-compatible endpoint base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name.
    pub model: String,

    /// API key. If unset, resolved from `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_timeout() -> u64 {
    30000
}

impl ClassifierConfig {
    /// Resolve the API key from config or the `OPENAI_API_KEY` variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("OPENAI_API_KEY").ok()
    }
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// On Unix this validates that the file is a regular file, is not
    /// world-writable, and is not world-readable when it embeds an API key.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_config_file_permissions(path)?;

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;

        if config.classifier.api_key.is_some()
            || config.users.iter().any(|u| u.github_token.is_some())
            || config.users.iter().any(|u| u.linear_api_key.is_some())
        {
            warn!(
                "Credentials found in config file '{}'. For better security, \
                 use environment variables instead (OPENAI_API_KEY, \
                 GITHUB_TOKEN_<ID>, LINEAR_API_KEY_<ID>).",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    ///
    /// Use this only for testing or when you've already validated the file.
    pub fn from_file_unchecked(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build the immutable directory snapshot, in declaration order.
    pub fn directory(&self) -> UserDirectory {
        UserDirectory::new(
            self.users
                .iter()
                .map(|u| UserIdentity {
                    id: u.id.clone(),
                    username: u.username.clone(),
                    display_name: u.display_name.clone(),
                })
                .collect(),
        )
    }

    /// Validate the configuration, returning every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.resolve_classifier_key_missing() {
            errors.push(
                "Classifier API key is not set (api_key or OPENAI_API_KEY)".to_string(),
            );
        }

        if self.users.is_empty() {
            errors.push("No users configured. At least one user is required.".to_string());
            return errors;
        }

        for user in &self.users {
            if user.resolve_github_token().is_none() {
                errors.push(format!(
                    "GITHUB_TOKEN_{} is not set",
                    user.id.to_uppercase()
                ));
            }
            if user.resolve_linear_api_key().is_none() {
                errors.push(format!(
                    "LINEAR_API_KEY_{} is not set",
                    user.id.to_uppercase()
                ));
            }
        }

        errors
    }

    fn resolve_classifier_key_missing(&self) -> bool {
        self.classifier.resolve_api_key().is_none()
    }
}

/// Validate config file permissions on Unix systems.
///
/// Requirements:
/// - File must be a regular file (not symlink, directory, etc.)
/// - File must not be world-writable
/// - If file contains credential keys, must not be world-readable
#[cfg(unix)]
fn validate_config_file_permissions(path: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Symlinks and directories are not allowed.",
            path.display()
        );
    }

    let mode = metadata.permissions().mode();
    let permission_bits = mode & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). \
             This is a security risk. Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    let content = std::fs::read_to_string(path).unwrap_or_default();
    let has_credentials = content.contains("api_key")
        || content.contains("github_token")
        || content.contains("linear_api_key");

    if has_credentials && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains credentials but is world-readable (mode {:04o}). \
             This is a security risk. Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> SwitchboardConfig {
        toml::from_str(toml_str).unwrap()
    }

    const TWO_USERS: &str = r#"
        [classifier]
        model = "gpt-4o"
        api_key = "sk-test"

        [[users]]
        id = "user1"
        username = "alice-dev"
        display_name = "Alice"
        github_token = "ghp_alice"
        linear_api_key = "lin_alice"

        [[users]]
        id = "user2"
        username = "bob-codes"
        display_name = "Bob"
        github_token = "ghp_bob"
        linear_api_key = "lin_bob"
    "#;

    #[test]
    fn parses_users_and_classifier() {
        let config = parse(TWO_USERS);
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.classifier.model, "gpt-4o");
        assert_eq!(config.classifier.api_url, "https://api.openai.com/v1");
        assert_eq!(config.classifier.timeout_ms, 30000);
    }

    #[test]
    fn directory_preserves_declaration_order() {
        let config = parse(TWO_USERS);
        let directory = config.directory();
        let ids: Vec<_> = directory.users().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["user1", "user2"]);
    }

    #[test]
    fn explicit_credentials_win_over_env() {
        let config = parse(TWO_USERS);
        assert_eq!(
            config.users[0].resolve_github_token().as_deref(),
            Some("ghp_alice")
        );
        assert_eq!(
            config.users[1].resolve_linear_api_key().as_deref(),
            Some("lin_bob")
        );
    }

    #[test]
    fn validate_accepts_complete_config() {
        let config = parse(TWO_USERS);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn validate_reports_missing_users() {
        let config = parse(
            r#"
            [classifier]
            model = "gpt-4o"
            api_key = "sk-test"
        "#,
        );
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("No users configured"));
    }
}
