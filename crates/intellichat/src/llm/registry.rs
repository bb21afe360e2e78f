//! Provider registry: builds provider clients from per-request settings.

use std::sync::Arc;

use intellichat_types::{AzureConfig, ProviderConfig, ProviderName};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::anthropic::AnthropicProvider;
use super::azure::AzureOpenAIProvider;
use super::cohere::CohereProvider;
use super::error::LLMError;
use super::openai::OpenAICompatibleProvider;
use super::provider::LLMProvider;
use crate::config::EndpointsConfig;

/// A provider client together with the model to request from it.
pub struct ChatTarget {
    pub provider: Arc<dyn LLMProvider>,
    pub model: String,
}

/// Builds provider clients against the configured endpoints.
///
/// Keys arrive with each request, so providers are built per call. The HTTP
/// client (and its connection pool) is shared.
#[derive(Clone)]
pub struct ProviderRegistry {
    client: Client,
    endpoints: Arc<EndpointsConfig>,
}

impl ProviderRegistry {
    pub fn new(endpoints: EndpointsConfig) -> Self {
        Self {
            client: Client::new(),
            endpoints: Arc::new(endpoints),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn endpoints(&self) -> &EndpointsConfig {
        &self.endpoints
    }

    /// Model used when the caller does not name one.
    pub fn default_model(provider: ProviderName) -> Option<&'static str> {
        match provider {
            ProviderName::OpenAI => Some("gpt-4o-mini"),
            ProviderName::Mistral => Some("mistral-medium-latest"),
            ProviderName::Anthropic => Some("claude-3-5-sonnet-latest"),
            ProviderName::Cohere => Some("command-r-plus"),
            // Azure models are deployments named by the caller.
            ProviderName::Azure => None,
        }
    }

    /// Build the chat client for `config`, which must carry the API key.
    pub fn chat_provider(&self, config: &ProviderConfig) -> Result<ChatTarget, LLMError> {
        let name = config.name();
        let model = config
            .model()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| Self::default_model(name))
            .ok_or(LLMError::MissingField("model"))?
            .to_string();

        let provider: Arc<dyn LLMProvider> = match config {
            ProviderConfig::Azure(azure) => Arc::new(self.azure_provider(azure)?),
            ProviderConfig::OpenAI(_) => Arc::new(OpenAICompatibleProvider::new(
                self.client.clone(),
                &self.endpoints.openai,
                config_key(config)?,
            )),
            ProviderConfig::Mistral(_) => Arc::new(OpenAICompatibleProvider::new(
                self.client.clone(),
                &self.endpoints.mistral,
                config_key(config)?,
            )),
            ProviderConfig::Anthropic(_) => Arc::new(AnthropicProvider::new(
                self.client.clone(),
                &self.endpoints.anthropic,
                config_key(config)?,
            )),
            ProviderConfig::Cohere(_) => Arc::new(CohereProvider::new(
                self.client.clone(),
                &self.endpoints.cohere,
                config_key(config)?,
            )),
        };

        Ok(ChatTarget { provider, model })
    }

    /// Build the Azure client (chat deployment plus optional embeddings deployment).
    pub fn azure_provider(&self, config: &AzureConfig) -> Result<AzureOpenAIProvider, LLMError> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LLMError::MissingField("apiKey"))?;
        let deployment = config
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or(LLMError::MissingField("model"))?;

        let endpoint = match (&self.endpoints.azure, config.resource_name.as_deref()) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(resource)) if !resource.trim().is_empty() => {
                AzureOpenAIProvider::resource_endpoint(resource)
            }
            _ => return Err(LLMError::MissingField("resourceName")),
        };
        let api_version = config
            .api_version
            .clone()
            .unwrap_or_else(|| self.endpoints.azure_api_version.clone());

        Ok(AzureOpenAIProvider::new(
            self.client.clone(),
            endpoint,
            SecretString::new(key.to_string()),
            api_version,
            deployment,
        )
        .with_embedding_deployment(config.embedding_name.clone()))
    }

    /// OpenAI embeddings client used for context selection.
    pub fn openai_embedder(&self, key: &SecretString) -> OpenAICompatibleProvider {
        OpenAICompatibleProvider::new(
            self.client.clone(),
            &self.endpoints.openai,
            SecretString::new(key.expose_secret().clone()),
        )
    }
}

fn config_key(config: &ProviderConfig) -> Result<SecretString, LLMError> {
    config
        .api_key()
        .map(|k| SecretString::new(k.to_string()))
        .ok_or(LLMError::MissingField("apiKey"))
}
