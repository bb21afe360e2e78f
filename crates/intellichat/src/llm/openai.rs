//! OpenAI-compatible LLM provider.
//!
//! Works with OpenAI, Mistral, and other compatible APIs.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::error::{LLMError, check_status};
use super::provider::{EmbeddingProvider, LLMProvider};
use super::types::{CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse};

/// OpenAI-compatible provider (works for OpenAI and Mistral).
pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    embedding_model: String,
}

impl OpenAICompatibleProvider {
    pub const DEFAULT_EMBEDDING_MODEL: &'static str = "text-embedding-3-small";

    pub fn new(client: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            embedding_model: Self::DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", self.bearer())
            .json(&request)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAICompatibleProvider {
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: Some(&self.embedding_model),
            input: &inputs,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", self.bearer())
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

#[cfg(test)]
mod tests {
    use intellichat_types::Role;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::llm::types::Message;

    fn provider(server: &MockServer) -> OpenAICompatibleProvider {
        OpenAICompatibleProvider::new(
            Client::new(),
            format!("{}/v1/", server.uri()),
            SecretString::new("sk-test".to_string()),
        )
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message {
                role: Role::User,
                content: "hi".to_string(),
            }],
            n: Some(2),
            temperature: None,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn chat_sends_bearer_and_parses_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "n": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"},
                    {"index": 1, "message": {"role": "assistant", "content": "hey"}, "finish_reason": "stop"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server).chat(request()).await.unwrap();
        assert_eq!(response.into_texts(), vec!["hello", "hey"]);
    }

    #[tokio::test]
    async fn chat_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = provider(&server).chat(request()).await.unwrap_err();
        match err {
            LLMError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn embed_returns_vectors_in_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({"model": "text-embedding-3-small"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let vectors = provider(&server)
            .embed(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn embed_rejects_short_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [1.0]}]
            })))
            .mount(&server)
            .await;

        let result = provider(&server)
            .embed(vec!["a".to_string(), "b".to_string()])
            .await;
        assert!(matches!(result, Err(LLMError::InvalidResponse(_))));
    }
}
