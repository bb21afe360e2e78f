//! Azure OpenAI provider.
//!
//! Same wire format as OpenAI, but requests are routed to named deployments
//! under the resource endpoint and authenticated with an `api-key` header.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::error::{LLMError, check_status};
use super::provider::{EmbeddingProvider, LLMProvider};
use super::types::{CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse};

pub struct AzureOpenAIProvider {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    api_version: String,
    deployment: String,
    embedding_deployment: Option<String>,
}

impl AzureOpenAIProvider {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: SecretString,
        api_version: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            api_version: api_version.into(),
            deployment: deployment.into(),
            embedding_deployment: None,
        }
    }

    pub fn with_embedding_deployment(mut self, deployment: Option<String>) -> Self {
        self.embedding_deployment = deployment.filter(|d| !d.trim().is_empty());
        self
    }

    /// Whether an embeddings deployment is configured.
    pub fn has_embeddings(&self) -> bool {
        self.embedding_deployment.is_some()
    }

    /// Default endpoint for an Azure resource name.
    pub fn resource_endpoint(resource_name: &str) -> String {
        format!("https://{resource_name}.openai.azure.com")
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> Result<Url, LLMError> {
        let mut url = Url::parse(&format!(
            "{}/openai/deployments/{}/{}",
            self.endpoint, deployment, operation
        ))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[async_trait]
impl LLMProvider for AzureOpenAIProvider {
    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError> {
        let url = self.deployment_url(&self.deployment, "chat/completions")?;

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAIProvider {
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        let deployment = self
            .embedding_deployment
            .as_deref()
            .ok_or(LLMError::MissingField("embeddingName"))?;
        let url = self.deployment_url(deployment, "embeddings")?;
        let body = EmbeddingRequest {
            model: None,
            input: &inputs,
        };

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let vectors = check_status(response)
            .await?
            .json::<EmbeddingResponse>()
            .await?
            .into_vectors();

        if vectors.len() != inputs.len() {
            return Err(LLMError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}
