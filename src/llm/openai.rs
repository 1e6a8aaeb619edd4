//! OpenAI-compatible backend.
//!
//! Talks to `{base_url}/chat/completions`, which covers OpenAI itself and the
//! many gateways that mirror its API.

use super::{ChatTransport, TransportError, SYSTEM_PROMPT};
use crate::config::ApiSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const VERIFY_PROMPT: &str = "You are a helpful assistant for programmers. Please respond with \
'API key verified successfully' if you receive this message.";
const VERIFY_MAX_TOKENS: u32 = 50;
const VERIFY_TEMPERATURE: f64 = 0.3;

/// Chat transport for OpenAI-style APIs.
pub struct OpenAiTransport {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiTransport {
    /// Create a transport from settings and an API key.
    pub fn new(settings: &ApiSettings, api_key: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self::with_client(settings, api_key, client))
    }

    /// Create a transport that reuses an existing HTTP client.
    pub fn with_client(settings: &ApiSettings, api_key: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            endpoint: endpoint(&settings.base_url),
            model: settings.model.clone(),
            api_key: api_key.into(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a short probe to confirm the key is accepted. Returns the
    /// model's answer to the probe.
    pub async fn verify(&self) -> Result<String, TransportError> {
        info!(model = %self.model, "verifying api key");
        let messages = vec![ChatMessage::new("user", VERIFY_PROMPT)];
        self.complete(messages, VERIFY_MAX_TOKENS, VERIFY_TEMPERATURE)
            .await
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String, TransportError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "sending chat request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Api {
                status,
                message: error_message(&body),
            });
        }

        let reply: ChatResponse = response.json().await?;
        let text = reply_text(reply)?;
        debug!(chars = text.len(), "received reply");
        Ok(text)
    }
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    async fn send_message(&self, text: &str) -> Result<String, TransportError> {
        let messages = vec![
            ChatMessage::new("system", SYSTEM_PROMPT),
            ChatMessage::new("user", text),
        ];
        self.complete(messages, self.max_tokens, self.temperature)
            .await
    }
}

fn endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// First choice's content. A null content is an empty reply.
fn reply_text(response: ChatResponse) -> Result<String, TransportError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(TransportError::EmptyResponse)
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        "Unknown error".to_string()
    } else {
        body.to_string()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn settings(base_url: &str) -> ApiSettings {
        ApiSettings {
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
            ..ApiSettings::default()
        }
    }

    fn transport(base_url: &str) -> OpenAiTransport {
        let client = Client::builder().no_proxy().build().unwrap();
        OpenAiTransport::with_client(&settings(base_url), "sk-test", client)
    }

    /// Accept one HTTP request, answer with `status` and `body`, and hand
    /// back the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().to_string())
                        })
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}/v1/", addr), handle)
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            endpoint("https://api.example.com/v1/"),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("https://api.example.com/v1"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_PROMPT),
                ChatMessage::new("user", "hi"),
            ],
            max_tokens: 2000,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_reply_text_takes_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "first"}}, {"message": {"content": "second"}}]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(response).unwrap(), "first");
    }

    #[test]
    fn test_null_content_is_empty_reply() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(reply_text(response).unwrap(), "");
    }

    #[test]
    fn test_no_choices_is_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            reply_text(response),
            Err(TransportError::EmptyResponse)
        ));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error": {"message": "Invalid API key"}}"#),
            "Invalid API key"
        );
        assert_eq!(error_message(r#"{"error": "quota exceeded"}"#), "quota exceeded");
        assert_eq!(error_message(r#"{"message": "forbidden"}"#), "forbidden");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(""), "Unknown error");
    }

    #[tokio::test]
    async fn test_send_message_round_trip() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"choices": [{"message": {"role": "assistant", "content": "Quack!\n```py\nprint(1)\n```"}}]}"#,
        )
        .await;

        let reply = transport(&base_url).send_message("hello duck").await.unwrap();
        assert_eq!(reply, "Quack!\n```py\nprint(1)\n```");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""model":"test-model""#));
        assert!(request.contains("You are Ducky"));
        assert!(request.contains("hello duck"));
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let (base_url, server) = serve_once(
            "401 Unauthorized",
            r#"{"error": {"message": "Invalid API key"}}"#,
        )
        .await;

        let err = transport(&base_url).verify().await.unwrap_err();
        match err {
            TransportError::Api { status, message } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let request = server.await.unwrap();
        assert!(request.contains(r#""max_tokens":50"#));
        assert!(!request.contains("You are Ducky"));
    }
}
