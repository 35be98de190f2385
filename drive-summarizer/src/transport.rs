use crate::traits::{Transport, TransportError};
use crate::types::{InvocationRequest, LlmConfig, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

const USER_AGENT: &str = "drive-summarizer/0.1";
const ERROR_BODY_LIMIT: usize = 300;

/// OpenAI-compatible chat completions client (OpenRouter by default).
pub struct OpenRouterTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterTransport {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiError>,
}

/// Wire body for one attempt. Images travel as PNG data URLs.
pub fn chat_request_body(request: &InvocationRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system_text {
        messages.push(ChatMessage {
            role: "system",
            content: Value::String(system.clone()),
        });
    }

    let content = if request.images.is_empty() {
        Value::String(request.prompt_text.clone())
    } else {
        let mut parts = vec![json!({ "type": "text", "text": request.prompt_text })];
        parts.extend(request.images.iter().map(|png| {
            json!({
                "type": "image_url",
                "image_url": { "url": format!("data:image/png;base64,{}", BASE64.encode(png)) },
            })
        }));
        Value::Array(parts)
    };
    messages.push(ChatMessage { role: "user", content });

    ChatRequest {
        model: request.model_identifier.clone(),
        messages,
    }
}

/// Pull `choices[0].message.content` out of a success body.
pub fn completion_text(body: &str) -> std::result::Result<String, TransportError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| TransportError::EmptyCompletion(format!("unparseable body: {}", e)))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty());

    match content {
        Some(text) => Ok(text),
        None => {
            // Some providers report failures inside a 200 body.
            let message = parsed
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "no choices in response".to_string());
            Err(TransportError::EmptyCompletion(message))
        }
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.chars().take(ERROR_BODY_LIMIT).collect())
}

#[async_trait]
impl Transport for OpenRouterTransport {
    async fn send(&self, request: &InvocationRequest) -> std::result::Result<String, TransportError> {
        let body = chat_request_body(request);
        debug!(
            "POST {} (model={}, prompt length={}, images={})",
            self.base_url,
            request.model_identifier,
            request.prompt_text.len(),
            request.images.len()
        );

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("X-Title", "drive-summarizer")
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&text);
            warn!("Model {} returned HTTP {}: {}", request.model_identifier, status.as_u16(), message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        completion_text(&text).map_err(|e| {
            warn!("Model {} returned no usable content: {}", request.model_identifier, e);
            e
        })
    }
}
