//! LLM provider traits.

use async_trait::async_trait;
use futures::future::try_join_all;

use super::error::LLMError;
use super::types::{CompletionRequest, CompletionResponse};

/// Trait for LLM providers with different API formats.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Make a chat completion request.
    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError>;

    /// Whether the API honors `n` in a single call.
    fn supports_n(&self) -> bool {
        true
    }
}

/// Trait for providers that can embed text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed each input, returning one vector per input in input order.
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError>;
}

/// Generate `n` candidate replies.
///
/// Providers that support `n` get a single request; the rest get `n`
/// concurrent requests whose first choices are collected in order.
pub async fn complete_n(
    provider: &dyn LLMProvider,
    mut request: CompletionRequest,
    n: u32,
) -> Result<Vec<String>, LLMError> {
    let n = n.max(1);

    if provider.supports_n() {
        request.n = Some(n);
        let texts = provider.chat(request).await?.into_texts();
        if texts.is_empty() {
            return Err(LLMError::InvalidResponse("no choices returned".to_string()));
        }
        return Ok(texts);
    }

    request.n = None;
    let calls = (0..n).map(|_| provider.chat(request.clone()));
    let responses = try_join_all(calls).await?;

    responses
        .into_iter()
        .map(|response| {
            response
                .into_texts()
                .into_iter()
                .next()
                .ok_or_else(|| LLMError::InvalidResponse("no choices returned".to_string()))
        })
        .collect()
}
