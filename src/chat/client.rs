//! OpenAI-compatible chat client.
//!
//! Non-streaming `POST {base_url}/chat/completions`. The client keeps the
//! running session so follow-up questions carry their context.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tokio::sync::Mutex;

use super::errors::ChatError;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::ChatConfig;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Collaborator Trait ──────────────────────────────────────────────────────

/// The chat backend the dispatcher falls back to.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one user message and return the reply text.
    async fn send_message(&self, text: &str) -> Result<String, ChatError>;
}

// ─── ChatClient ──────────────────────────────────────────────────────────────

/// Chat session against an OpenAI-compatible endpoint.
pub struct ChatClient {
    http: HttpClient,
    config: ChatConfig,
    /// User/assistant turns so far, oldest first. Failed turns are not kept.
    session: Mutex<Vec<ChatMessage>>,
}

impl ChatClient {
    /// Build the client. Does NOT check connectivity.
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::ConnectionFailed {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config,
            session: Mutex::new(Vec::new()),
        })
    }

    /// Number of messages in the running session.
    pub async fn session_len(&self) -> usize {
        self.session.lock().await.len()
    }

    /// Forget the running session.
    pub async fn reset_session(&self) {
        self.session.lock().await.clear();
    }

    fn build_request(&self, history: &[ChatMessage], text: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(text));

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            stream: false,
        }
    }
}

#[async_trait]
impl ChatCompletion for ChatClient {
    async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        // Held across the request so concurrent turns stay in order.
        let mut session = self.session.lock().await;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = self.build_request(&session, text);

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::ConnectionFailed {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ChatError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response.text().await.map_err(|e| ChatError::InvalidResponse {
            reason: format!("failed to read response body: {e}"),
        })?;

        let reply = parse_completion_response(&body_text)?;

        session.push(ChatMessage::user(text));
        session.push(ChatMessage::assistant(reply.clone()));
        tracing::debug!(
            model = %self.config.model,
            turns = session.len() / 2,
            reply_chars = reply.chars().count(),
            "chat reply received"
        );

        Ok(reply)
    }
}

/// Extract the first choice's text from a non-streaming response body.
pub fn parse_completion_response(body: &str) -> Result<String, ChatError> {
    let resp: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ChatError::InvalidResponse {
            reason: format!("failed to parse chat completion: {e}"),
        })?;

    let content = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(ChatError::EmptyReply);
    }
    Ok(content)
}
