use std::io::ErrorKind;
use std::path::Path;

use intellichat_types::ProviderName;
use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

// ============================================================================
// Config (root)
// ============================================================================

/// Server configuration. API keys are never read from this file; see
/// [`crate::keys::KeyStore`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on handling a single request, provider call included.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    180
}

// ============================================================================
// ChatConfig
// ============================================================================

/// Defaults applied to chat requests that leave fields unset.
#[derive(Debug, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_provider")]
    pub default_provider: ProviderName,
    #[serde(default = "default_system_message")]
    pub default_system_message: String,
    #[serde(default = "default_n")]
    pub default_n: u32,
    /// Prior messages kept when context augmentation is requested.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Document chunks fetched in one-key mode.
    #[serde(default = "default_search_results")]
    pub search_results: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            default_system_message: default_system_message(),
            default_n: default_n(),
            context_window: default_context_window(),
            search_results: default_search_results(),
        }
    }
}

fn default_provider() -> ProviderName {
    ProviderName::OpenAI
}

fn default_system_message() -> String {
    "You are a helpful assistant. Format response in Markdown where needed.".to_string()
}

fn default_n() -> u32 {
    2
}

fn default_context_window() -> usize {
    4
}

fn default_search_results() -> usize {
    3
}

// ============================================================================
// EndpointsConfig
// ============================================================================

/// Base URLs of the upstream APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_openai_url")]
    pub openai: String,
    #[serde(default = "default_mistral_url")]
    pub mistral: String,
    #[serde(default = "default_anthropic_url")]
    pub anthropic: String,
    #[serde(default = "default_cohere_url")]
    pub cohere: String,
    /// Overrides `https://{resourceName}.openai.azure.com` for every request.
    #[serde(default)]
    pub azure: Option<String>,
    #[serde(default = "default_azure_api_version")]
    pub azure_api_version: String,
    #[serde(default = "default_intellinode_url")]
    pub intellinode: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            openai: default_openai_url(),
            mistral: default_mistral_url(),
            anthropic: default_anthropic_url(),
            cohere: default_cohere_url(),
            azure: None,
            azure_api_version: default_azure_api_version(),
            intellinode: default_intellinode_url(),
        }
    }
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_mistral_url() -> String {
    "https://api.mistral.ai/v1".to_string()
}

fn default_anthropic_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_cohere_url() -> String {
    "https://api.cohere.com".to_string()
}

fn default_azure_api_version() -> String {
    "2024-02-01".to_string()
}

fn default_intellinode_url() -> String {
    "https://api.intellinode.ai".to_string()
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 180);
        assert_eq!(config.chat.default_provider, ProviderName::OpenAI);
        assert_eq!(config.chat.default_n, 2);
        assert_eq!(config.chat.context_window, 4);
        assert!(
            config
                .chat
                .default_system_message
                .starts_with("You are a helpful assistant.")
        );
        assert_eq!(config.endpoints.openai, "https://api.openai.com/v1");
        assert!(config.endpoints.azure.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(&missing_path).await.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chat.default_n, 2);
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 3000
  request_timeout_seconds: 60
chat:
  default_provider: anthropic
  default_system_message: "Answer in French."
  default_n: 1
  context_window: 6
endpoints:
  openai: "http://localhost:4010/v1"
  azure: "http://localhost:4011"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(config.chat.default_provider, ProviderName::Anthropic);
        assert_eq!(config.chat.default_system_message, "Answer in French.");
        assert_eq!(config.chat.default_n, 1);
        assert_eq!(config.chat.context_window, 6);
        assert_eq!(config.endpoints.openai, "http://localhost:4010/v1");
        assert_eq!(
            config.endpoints.azure.as_deref(),
            Some("http://localhost:4011")
        );
        assert_eq!(config.endpoints.mistral, "https://api.mistral.ai/v1"); // default
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  port: 9000
"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0"); // default
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout_seconds, 180); // default
        assert_eq!(config.chat.search_results, 3); // default
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_unknown_provider_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chat:\n  default_provider: replicate").unwrap();

        let result = Config::load(file.path()).await;
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_config_error_display() {
        let io_error = ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "test",
        ));
        assert!(io_error.to_string().contains("failed to read config file"));
    }
}
