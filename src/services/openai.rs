use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::generation::{ConversationMessage, GenerativeApi, GenerativeError, SystemPrompt};

/// Chat-completions client that asks for JSON-object output.
pub struct OpenAiClient {
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_completion_tokens: u32,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_completion_tokens: u32,
    response_format: ResponseFormat,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: Option<&str>, config: &GenerationConfig) -> Self {
        let timeout = config.call_timeout();
        Self {
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|e| {
                    tracing::error!("Failed to build generative API client, using defaults without timeouts: {}", e);
                    Client::new()
                }),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_completion_tokens: config.max_completion_tokens,
            timeout,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        let key = std::env::var("OPENAI_API_KEY").ok();
        if key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; generation requests will be rejected upstream");
        }
        Self::new(key.as_deref(), config)
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a SystemPrompt,
        messages: &'a [ConversationMessage],
    ) -> ChatRequest<'a> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(Message {
            role: "system",
            content: system_prompt.as_str(),
        });
        wire.extend(messages.iter().map(|m| Message {
            role: m.role.as_str(),
            content: &m.content,
        }));

        ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_completion_tokens: self.max_completion_tokens,
            response_format: ResponseFormat { r#type: "json_object" },
            messages: wire,
        }
    }
}

#[async_trait]
impl GenerativeApi for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &SystemPrompt,
        messages: &[ConversationMessage],
    ) -> Result<String, GenerativeError> {
        let body = self.build_request(system_prompt, messages);

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(header) = &self.cached_auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerativeError::Upstream {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| self.transport_error(e))?;

        // An empty answer is still an answer; the validator decides what to do with it.
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

impl OpenAiClient {
    fn transport_error(&self, e: reqwest::Error) -> GenerativeError {
        if e.is_timeout() {
            GenerativeError::Timeout(self.timeout)
        } else {
            GenerativeError::Transport(e.to_string())
        }
    }
}
