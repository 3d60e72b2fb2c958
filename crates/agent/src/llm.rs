//! Remote text-generation clients.
//!
//! Every client makes a single attempt bounded by the configured timeout.
//! Callers treat any [`RemoteModelError`] as "use the local path instead".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use whispercart_core::config::{LlmConfig, LlmProvider, PolishConfig};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteModelError {
    #[error("remote model is not configured")]
    Disabled,
    #[error("remote model did not answer within {0:?}")]
    Timeout(Duration),
    #[error("remote model transport failure: {0}")]
    Transport(String),
    #[error("remote model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote model is still loading")]
    ModelLoading,
    #[error("remote model response malformed: {0}")]
    MalformedResponse(String),
}

/// Sampling knobs for one completion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub const INTENT: Self = Self { temperature: 0.1, max_tokens: 150 };
    pub const NEGOTIATION: Self = Self { temperature: 0.7, max_tokens: 200 };
    pub const COMPARISON: Self = Self { temperature: 0.3, max_tokens: 400 };
    pub const POLISH: Self = Self { temperature: 0.7, max_tokens: 300 };
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, RemoteModelError>;
}

/// Slice from the first `{` to the last `}`; models like to wrap JSON in prose.
pub fn extract_json_object(raw: &str) -> Result<&str, RemoteModelError> {
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&raw[start..=end]),
        _ => Err(RemoteModelError::MalformedResponse("no JSON object in model output".to_string())),
    }
}

fn http_client(timeout: Duration) -> Result<Client, RemoteModelError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| RemoteModelError::Transport(format!("failed to build HTTP client: {error}")))
}

fn transport_error(error: reqwest::Error, timeout: Duration) -> RemoteModelError {
    if error.is_timeout() {
        RemoteModelError::Timeout(timeout)
    } else {
        RemoteModelError::Transport(error.to_string())
    }
}

fn is_loading(body: &str) -> bool {
    body.contains("currently loading")
}

async fn read_body(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<(StatusCode, String), RemoteModelError> {
    let status = response.status();
    let body = response.text().await.map_err(|error| transport_error(error, timeout))?;
    Ok((status, body))
}

#[derive(Serialize)]
struct HuggingFaceRequest<'a> {
    inputs: &'a str,
    parameters: HuggingFaceParameters,
}

#[derive(Serialize)]
struct HuggingFaceParameters {
    return_full_text: bool,
    max_new_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct HuggingFaceGeneration {
    #[serde(default)]
    generated_text: String,
}

/// Hosted inference API; answers `[{"generated_text": ...}]`.
pub struct HuggingFaceClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    max_new_tokens: u32,
    timeout: Duration,
}

impl HuggingFaceClient {
    pub fn new(config: &LlmConfig) -> Result<Self, RemoteModelError> {
        let api_key = config.api_key.clone().ok_or(RemoteModelError::Disabled)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: config.endpoint(),
            api_key,
            max_new_tokens: config.max_new_tokens,
            timeout,
        })
    }
}

#[async_trait]
impl LlmClient for HuggingFaceClient {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, RemoteModelError> {
        let request = HuggingFaceRequest {
            inputs: prompt,
            parameters: HuggingFaceParameters {
                return_full_text: false,
                max_new_tokens: params.max_tokens.min(self.max_new_tokens),
                temperature: params.temperature,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(|error| transport_error(error, self.timeout))?;
        let (status, body) = read_body(response, self.timeout).await?;

        // The free tier answers 503 with an `error` body while the model warms up.
        if is_loading(&body) {
            return Err(RemoteModelError::ModelLoading);
        }
        if !status.is_success() {
            return Err(RemoteModelError::Status { status: status.as_u16(), body });
        }

        let generations: Vec<HuggingFaceGeneration> = serde_json::from_str(&body)
            .map_err(|error| RemoteModelError::MalformedResponse(error.to_string()))?;
        let text = generations.into_iter().next().map(|generation| generation.generated_text);
        debug!(event_name = "agent.llm.huggingface_response", chars = text.as_ref().map(String::len));

        text.filter(|text| !text.trim().is_empty())
            .ok_or_else(|| RemoteModelError::MalformedResponse("empty generation".to_string()))
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

/// Self-hosted model behind Ollama's `/api/generate`.
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    max_new_tokens: u32,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, RemoteModelError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: config.endpoint(),
            model: config.model.clone(),
            max_new_tokens: config.max_new_tokens,
            timeout,
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, RemoteModelError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                num_predict: params.max_tokens.min(self.max_new_tokens),
                temperature: params.temperature,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| transport_error(error, self.timeout))?;
        let (status, body) = read_body(response, self.timeout).await?;
        if !status.is_success() {
            return Err(RemoteModelError::Status { status: status.as_u16(), body });
        }

        let parsed: OllamaResponse = serde_json::from_str(&body)
            .map_err(|error| RemoteModelError::MalformedResponse(error.to_string()))?;
        if parsed.response.trim().is_empty() {
            return Err(RemoteModelError::MalformedResponse("empty generation".to_string()));
        }
        Ok(parsed.response)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI-compatible `/chat/completions`, used for offer polishing.
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiChatClient {
    pub fn new(config: &PolishConfig) -> Result<Self, RemoteModelError> {
        let api_key = config.api_key.clone().ok_or(RemoteModelError::Disabled)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: config.endpoint(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, RemoteModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatTurn { role: "user", content: prompt }],
            max_tokens: params.max_tokens.min(self.max_tokens),
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(|error| transport_error(error, self.timeout))?;
        let (status, body) = read_body(response, self.timeout).await?;
        if !status.is_success() {
            return Err(RemoteModelError::Status { status: status.as_u16(), body });
        }

        parse_chat_content(&body)
    }
}

fn parse_chat_content(body: &str) -> Result<String, RemoteModelError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|error| RemoteModelError::MalformedResponse(error.to_string()))?;
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| RemoteModelError::MalformedResponse("missing choices[0].message.content".to_string()))
}

/// The configured intent/negotiation model, or `None` when running local-only.
pub fn remote_model_client(
    config: &LlmConfig,
) -> Result<Option<Arc<dyn LlmClient>>, RemoteModelError> {
    if !config.remote_enabled() {
        return Ok(None);
    }
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::HuggingFace => Arc::new(HuggingFaceClient::new(config)?),
        LlmProvider::Ollama => Arc::new(OllamaClient::new(config)?),
    };
    Ok(Some(client))
}

pub fn polish_client(
    config: &PolishConfig,
) -> Result<Option<Arc<dyn LlmClient>>, RemoteModelError> {
    if !config.enabled() {
        return Ok(None);
    }
    Ok(Some(Arc::new(OpenAiChatClient::new(config)?)))
}
