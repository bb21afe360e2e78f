//! LLM provider clients for chat completions and embeddings.

mod anthropic;
mod azure;
mod cohere;
mod error;
mod openai;
mod provider;
mod registry;
mod types;

pub use anthropic::AnthropicProvider;
pub use azure::AzureOpenAIProvider;
pub use cohere::CohereProvider;
pub use error::{LLMError, check_status};
pub use openai::OpenAICompatibleProvider;
pub use provider::{EmbeddingProvider, LLMProvider, complete_n};
pub use registry::{ChatTarget, ProviderRegistry};
pub use types::{Choice, CompletionRequest, CompletionResponse, Message, Usage};
