use async_trait::async_trait;
use intellichat_types::{ChatMessage, ResponseText};
use tracing::debug;

use super::{AzureChatParams, ChatBackend, ChatOutput, ChatServiceError, GenericChatParams};
use crate::config::Config;
use crate::context::{
    DocumentSearch, augment_system_message, references_from_hits, select_relevant,
};
use crate::llm::{CompletionRequest, Message, ProviderRegistry, complete_n};

/// [`ChatBackend`] backed by real provider APIs.
pub struct ProviderBackend {
    registry: ProviderRegistry,
    search: DocumentSearch,
    context_window: usize,
    search_results: usize,
}

impl ProviderBackend {
    pub fn new(config: &Config) -> Self {
        let registry = ProviderRegistry::new(config.endpoints.clone());
        let search = DocumentSearch::new(registry.client().clone(), &config.endpoints.intellinode);
        Self {
            registry,
            search,
            context_window: config.chat.context_window,
            search_results: config.chat.search_results,
        }
    }
}

#[async_trait]
impl ChatBackend for ProviderBackend {
    async fn chat(&self, params: GenericChatParams) -> Result<ChatOutput, ChatServiceError> {
        let latest = params
            .messages
            .last()
            .ok_or(ChatServiceError::EmptyConversation)?;
        let target = self.registry.chat_provider(&params.provider)?;

        let history = if params.with_context {
            let key = params
                .context_key
                .as_ref()
                .ok_or(ChatServiceError::MissingContextKey)?;
            let embedder = self.registry.openai_embedder(key);
            select_relevant(&embedder, &params.messages, self.context_window).await?
        } else {
            params.messages.clone()
        };

        let (system_message, references) = match params.one_key.as_deref() {
            Some(one_key) => {
                let hits = self
                    .search
                    .search(one_key, &latest.content, self.search_results)
                    .await
                    .map_err(ChatServiceError::Search)?;
                debug!(hits = hits.len(), "Document search complete");
                (
                    augment_system_message(&params.system_message, &hits),
                    references_from_hits(&hits),
                )
            }
            None => (params.system_message.clone(), Vec::new()),
        };

        debug!(
            provider = %params.provider.name(),
            model = %target.model,
            messages = history.len(),
            n = params.n,
            "Requesting completions"
        );
        let request = completion_request(target.model, &system_message, &history);
        let texts = complete_n(target.provider.as_ref(), request, params.n).await?;

        Ok(ChatOutput {
            result: ResponseText::Choices(texts),
            references,
        })
    }

    async fn azure_chat(&self, params: AzureChatParams) -> Result<ResponseText, ChatServiceError> {
        if params.messages.is_empty() {
            return Err(ChatServiceError::EmptyConversation);
        }
        let provider = self.registry.azure_provider(&params.config)?;

        let history = if params.with_context && provider.has_embeddings() {
            select_relevant(&provider, &params.messages, self.context_window).await?
        } else {
            if params.with_context {
                debug!("Azure embedding deployment not configured, sending full conversation");
            }
            params.messages.clone()
        };

        let deployment = params.config.model.clone().unwrap_or_default();
        debug!(deployment = %deployment, n = params.n, "Requesting Azure completions");
        let request = completion_request(deployment, &params.system_message, &history);
        let texts = complete_n(&provider, request, params.n).await?;

        Ok(ResponseText::Choices(texts))
    }
}

fn completion_request(
    model: String,
    system_message: &str,
    history: &[ChatMessage],
) -> CompletionRequest {
    let messages = std::iter::once(Message::system(system_message))
        .chain(history.iter().map(Message::from))
        .collect();
    CompletionRequest {
        model,
        messages,
        n: None,
        temperature: None,
        max_tokens: None,
    }
}
