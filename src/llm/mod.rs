//! Chat completion transport.
//!
//! The interactive loop only needs "send this text, get the reply text back".
//! [`ChatTransport`] is that seam; [`OpenAiTransport`] implements it against
//! any OpenAI-compatible `/chat/completions` endpoint.

pub mod openai;

pub use openai::OpenAiTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Persona sent as the system message with every chat request.
pub const SYSTEM_PROMPT: &str = "You are Ducky, a helpful AI assistant specialized in helping \
programmers. Provide clear, concise responses with code examples when appropriate.";

/// Failure talking to the completion endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API request failed with status {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("the model returned no choices")]
    EmptyResponse,
}

/// Sends one user message and returns the model's raw reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<String, TransportError>;
}
