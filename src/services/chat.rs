//! Chat relay API client
//!
//! Plain messages are relayed to an external HTTP chat-completion backend.
//! The backend and its persona prompt templates live elsewhere; the bot only
//! passes a prompt and a persona name through and returns the reply text.

use std::time::Duration;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::ChatApiConfig;
use crate::utils::errors::{RelayBotError, Result};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    persona: &'a str,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: Option<String>,
}

/// HTTP client for the chat relay backend
#[derive(Debug, Clone)]
pub struct ChatApiClient {
    client: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("RelayBot/1.0")
            .build()
            .map_err(RelayBotError::Http)?;

        Ok(Self { client, config })
    }

    /// The persona used when a member has not picked one
    pub fn default_persona(&self) -> &str {
        &self.config.default_persona
    }

    /// Relay one prompt and return the reply text
    pub async fn ask(&self, prompt: &str, persona: &str) -> Result<String> {
        debug!(persona = persona, "Relaying message to chat API");

        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                prompt,
                persona,
                temperature: 0.7,
                max_tokens: 2000,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RelayBotError::ChatApi(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let body: ChatResponse = response.json().await?;
        body.response
            .ok_or_else(|| RelayBotError::ChatApi("No response received".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wiremock::matchers::{body_partial_json, method, path};

    fn client_for(server: &MockServer) -> ChatApiClient {
        ChatApiClient::new(ChatApiConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
            default_persona: "assistant".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_ask_returns_reply_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "prompt": "hello",
                "persona": "pirate"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "ahoy"
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server).ask("hello", "pirate").await.unwrap();
        assert_eq!(reply, "ahoy");
    }

    #[tokio::test]
    async fn test_ask_surfaces_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("hello", "pirate").await.unwrap_err();
        assert!(matches!(err, RelayBotError::ChatApi(_)));
    }

    #[tokio::test]
    async fn test_ask_rejects_missing_reply_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("hello", "pirate").await.unwrap_err();
        assert!(matches!(err, RelayBotError::ChatApi(_)));
    }
}
