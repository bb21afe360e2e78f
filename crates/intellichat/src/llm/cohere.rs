//! Cohere LLM provider (v2 chat API).

use async_trait::async_trait;
use intellichat_types::Role;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::error::{LLMError, check_status};
use super::provider::LLMProvider;
use super::types::{Choice, CompletionRequest, CompletionResponse, Message, Usage};

pub struct CohereProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl CohereProvider {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl LLMProvider for CohereProvider {
    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError> {
        let url = format!("{}/v2/chat", self.base_url);
        let cohere_request = Request {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&cohere_request)
            .send()
            .await?;

        let cohere_response: Response = check_status(response).await?.json().await?;
        Ok(from_response(cohere_response))
    }

    fn supports_n(&self) -> bool {
        false
    }
}

// --- Request/Response types ---

#[derive(serde::Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(serde::Deserialize)]
struct Response {
    #[serde(default)]
    id: String,
    message: ResponseMessage,
    finish_reason: Option<String>,
    usage: Option<ResponseUsage>,
}

#[derive(serde::Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<Content>,
}

#[derive(serde::Deserialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(serde::Deserialize)]
struct ResponseUsage {
    tokens: Option<Tokens>,
}

#[derive(serde::Deserialize)]
struct Tokens {
    #[serde(default)]
    input_tokens: f64,
    #[serde(default)]
    output_tokens: f64,
}

fn from_response(response: Response) -> CompletionResponse {
    let content = response
        .message
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text)
        .collect::<Vec<_>>()
        .join("");

    let usage = response.usage.and_then(|u| u.tokens).map(|t| {
        let prompt_tokens = t.input_tokens as u32;
        let completion_tokens = t.output_tokens as u32;
        Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    });

    CompletionResponse {
        id: response.id,
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: Role::Assistant,
                content,
            },
            finish_reason: response.finish_reason,
        }],
        usage,
    }
}
