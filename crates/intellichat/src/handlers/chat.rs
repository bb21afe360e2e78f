//! `POST /api/chat`.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use intellichat_types::{
    AzureConfig, ChatRequest, ChatResponse, ProviderConfig, ProviderName,
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chat::{AzureChatParams, ChatServiceError, GenericChatParams};
use crate::keys::{resolve_api_key, resolve_context_key};
use crate::response;
use crate::server::AppState;

// ============================================================================
// Errors
// ============================================================================

/// Every failure is reported as 400 `{ "error": <message> }`.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error(
        "no api key provided for {provider}, either add it to your .env file or in the chat settings"
    )]
    MissingKey { provider: ProviderName },

    #[error(
        "OpenAi key was not provided, either add it to your .env file or in the chat settings"
    )]
    MissingContextKey,

    #[error("oneKey is required when intellinodeData is enabled")]
    MissingOneKey,

    #[error("provider {provider} is not configured, add its settings in the chat settings")]
    ProviderNotConfigured { provider: ProviderName },

    /// Provider details are logged, never returned.
    #[error("invalid api key or provider")]
    ProviderCall(#[source] ChatServiceError),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        response::bad_request(self.to_string()).into_response()
    }
}

// ============================================================================
// Handler
// ============================================================================

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(request) = payload.map_err(|rejection| ChatError::Validation(rejection.body_text()))?;
    validate(&request)?;

    let defaults = &state.config.chat;
    let provider = request.provider.unwrap_or(defaults.default_provider);
    let system_message = request
        .system_message
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| defaults.default_system_message.clone());
    let n = request.n.unwrap_or(defaults.default_n);

    let key = resolve_api_key(
        &request.providers,
        provider,
        request.one_key.as_deref(),
        &state.keys,
    )
    .ok_or_else(|| {
        warn!(%provider, "No API key resolved");
        ChatError::MissingKey { provider }
    })?;

    let context_key = resolve_context_key(&request.providers, &state.keys);
    if request.with_context && context_key.is_none() {
        warn!("Context requested without an OpenAI key");
        return Err(ChatError::MissingContextKey);
    }

    let one_key = request.one_key.clone().filter(|k| !k.trim().is_empty());
    if request.intellinode_data && one_key.is_none() {
        return Err(ChatError::MissingOneKey);
    }

    let key = key.expose_secret().clone();
    match (provider, request.providers.get(&provider)) {
        (ProviderName::Azure, Some(ProviderConfig::Azure(azure))) => {
            debug!("Dispatching to Azure");
            let params = AzureChatParams {
                config: AzureConfig {
                    api_key: Some(key),
                    ..azure.clone()
                },
                system_message,
                messages: request.messages,
                n,
                with_context: request.with_context,
            };
            let result = state
                .backend
                .azure_chat(params)
                .await
                .map_err(|e| provider_failure(provider, e))?;
            Ok(Json(ChatResponse {
                response: result,
                references: None,
            }))
        }
        (ProviderName::Azure, _) | (_, Some(ProviderConfig::Azure(_))) => {
            warn!(%provider, "Provider settings missing or mismatched");
            Err(ChatError::ProviderNotConfigured { provider })
        }
        // The key was resolved for the slot, so it must not travel to another provider.
        (_, Some(config)) if config.name() != provider => {
            warn!(%provider, configured = %config.name(), "Provider settings name another provider");
            Err(ChatError::ProviderNotConfigured { provider })
        }
        (_, config) => {
            let config = config
                .cloned()
                .unwrap_or_else(|| ProviderConfig::default_for(provider))
                .with_api_key(key);
            debug!(provider = %config.name(), "Dispatching to provider");
            let params = GenericChatParams {
                provider: config,
                system_message,
                messages: request.messages,
                n,
                with_context: request.with_context,
                context_key,
                one_key: if request.intellinode_data { one_key } else { None },
            };
            let output = state
                .backend
                .chat(params)
                .await
                .map_err(|e| provider_failure(provider, e))?;
            Ok(Json(ChatResponse {
                response: output.result,
                references: Some(output.references),
            }))
        }
    }
}

fn validate(request: &ChatRequest) -> Result<(), ChatError> {
    if request.messages.is_empty() {
        return Err(ChatError::Validation(
            "messages must contain at least one message".to_string(),
        ));
    }
    if request.n == Some(0) {
        return Err(ChatError::Validation("n must be at least 1".to_string()));
    }
    Ok(())
}

fn provider_failure(provider: ProviderName, error: ChatServiceError) -> ChatError {
    warn!(%provider, error = %error, "Provider call failed");
    ChatError::ProviderCall(error)
}

// ============================================================================
// Tests
// ============================================================================
