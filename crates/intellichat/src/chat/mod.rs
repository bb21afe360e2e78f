//! Chat service: turns a resolved request into provider calls.

mod backend;

use async_trait::async_trait;
use intellichat_types::{AzureConfig, ChatMessage, ProviderConfig, Reference, ResponseText};
use thiserror::Error;

use crate::keys::ApiKey;
use crate::llm::LLMError;

pub use backend::ProviderBackend;

/// Input for the generic provider path.
#[derive(Debug)]
pub struct GenericChatParams {
    /// Provider settings with the resolved API key merged in.
    pub provider: ProviderConfig,
    pub system_message: String,
    pub messages: Vec<ChatMessage>,
    pub n: u32,
    pub with_context: bool,
    /// OpenAI key used for embeddings when `with_context` is set.
    pub context_key: Option<ApiKey>,
    /// Present only in one-key mode; enables document search.
    pub one_key: Option<String>,
}

/// Input for the Azure path.
#[derive(Debug)]
pub struct AzureChatParams {
    /// Azure settings with the resolved API key merged in.
    pub config: AzureConfig,
    pub system_message: String,
    pub messages: Vec<ChatMessage>,
    pub n: u32,
    pub with_context: bool,
}

/// Result of the generic path.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutput {
    pub result: ResponseText,
    pub references: Vec<Reference>,
}

#[derive(Debug, Error)]
pub enum ChatServiceError {
    #[error(transparent)]
    Llm(#[from] LLMError),

    #[error("document search failed: {0}")]
    Search(#[source] LLMError),

    #[error("conversation has no messages")]
    EmptyConversation,

    #[error("context requested without a context key")]
    MissingContextKey,
}

/// Generates replies for the request handler.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, params: GenericChatParams) -> Result<ChatOutput, ChatServiceError>;

    async fn azure_chat(&self, params: AzureChatParams) -> Result<ResponseText, ChatServiceError>;
}
