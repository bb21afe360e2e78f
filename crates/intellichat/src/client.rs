//! HTTP client for a running gateway.

use intellichat_types::{ChatRequest, ChatResponse, ErrorBody};
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with an error body.
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },
}

pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        let url = format!("{}/api/chat", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use intellichat_types::{ChatMessage, ResponseText};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn send_parses_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"messages": [{"role": "user", "content": "hi"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": ["one", "two"],
                "references": []
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(format!("{}/", server.uri()));
        let response = client
            .send(&ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(
            response.response,
            ResponseText::Choices(vec!["one".to_string(), "two".to_string()])
        );
        assert_eq!(response.references, Some(vec![]));
    }

    #[tokio::test]
    async fn send_maps_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": "invalid api key or provider"})),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri());
        let err = client
            .send(&ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid api key or provider");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
