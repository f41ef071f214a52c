//! OpenAI chat-completions adapter.
//!
//! Implements the [`Provider`] trait against the `/v1/chat/completions`
//! endpoint. See: <https://platform.openai.com/docs/api-reference/chat>

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::client::{DeltaStream, Provider};
use crate::config::{Config, HttpOptions, RetryPolicy, SecretString};
use crate::error::{Error, Result};
use crate::http::{add_extra_headers, build_http_client};
use crate::model::{DeltaResponse, Message, Request, Response, Stop, ToolChoice, ToolSpec};
use crate::sse::SseResponseExt;
use crate::validate::{validate_reasoning_effort, validate_request};

const DEFAULT_API_BASE: &str = "https://api.openai.com";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const KEY_PREFIX: &str = "sk-";

/// Adapter for OpenAI's chat-completions API.
///
/// Holds only configuration, never request-scoped state, so one instance is
/// safe to reuse across concurrent calls.
pub struct OpenAiProvider {
    api_key: SecretString,
    base_url: String,
    http: HttpOptions,
    retry: RetryPolicy,
}

impl OpenAiProvider {
    /// Registry prefix served by this adapter.
    pub const PREFIX: &'static str = "openai";

    /// Build the adapter from shared configuration.
    ///
    /// Fails when no API key is configured for the backend or the key does
    /// not match the backend's format.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key(Self::PREFIX).ok_or_else(|| {
            Error::Configuration(format!(
                "no API key configured for backend \"{}\" (set OPENAI_API_KEY or use Config::with_api_key)",
                Self::PREFIX
            ))
        })?;
        if !api_key.expose_secret().starts_with(KEY_PREFIX) {
            return Err(Error::Configuration(format!(
                "API key for backend \"{}\" must start with \"{KEY_PREFIX}\"",
                Self::PREFIX
            )));
        }

        Ok(Self {
            api_key: api_key.clone(),
            base_url: config
                .base_url(Self::PREFIX)
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            http: config.http.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Backend model name with the registry prefix stripped.
    fn backend_model<'a>(&self, model_id: &'a str) -> Result<&'a str> {
        let model = model_id.split_once('/').map_or(model_id, |(_, rest)| rest);
        if model.is_empty() {
            return Err(Error::Validation(
                "model must name a backend model after the provider prefix".into(),
            ));
        }
        Ok(model)
    }

    async fn send(&self, payload: &Value, streaming: bool) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, COMPLETIONS_PATH);
        let client = build_http_client(&self.http)?;

        let mut req = client
            .post(&url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header(CONTENT_TYPE, "application/json")
            .header(
                ACCEPT,
                if streaming {
                    "text/event-stream"
                } else {
                    "application/json"
                },
            );
        req = add_extra_headers(req, &self.http);

        let response = req.json(payload).send().await.map_err(Error::from_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn complete_once(&self, payload: &Value) -> Result<Response> {
        let response = self.send(payload, false).await?;
        let body = response.text().await.map_err(Error::from_transport)?;
        Response::from_json(&body)
    }
}

/// Map a non-success response, preferring the backend's error envelope over
/// the raw body.
fn error_from_response(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());
    Error::from_status(status, message)
}

/// Reasoning-class models take `max_completion_tokens` and accept
/// `reasoning_effort`.
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("o3")
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        Self::PREFIX
    }

    fn validate(&self, request: &Request) -> Result<()> {
        let model = self.backend_model(&request.model)?;
        validate_request(request)?;
        if is_reasoning_model(model) {
            if let Some(effort) = request.reasoning_effort.as_deref() {
                validate_reasoning_effort(effort)?;
            }
        }
        Ok(())
    }

    fn build_payload(&self, request: &Request, stream: bool) -> Result<Value> {
        let model = self.backend_model(&request.model)?;
        let reasoning = is_reasoning_model(model);

        // Reasoning models reject the legacy token-limit field.
        let (max_tokens, max_completion_tokens) = if reasoning {
            (None, request.max_completion_tokens.or(request.max_tokens))
        } else {
            (request.max_tokens, request.max_completion_tokens)
        };

        let payload = Payload {
            model,
            messages: &request.messages,
            stream,
            tools: request.tools.as_deref(),
            tool_choice: request.tool_choice.as_ref(),
            reasoning_effort: if reasoning {
                request.reasoning_effort.as_deref()
            } else {
                None
            },
            metadata: request.metadata.as_ref(),
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
            top_p: request.top_p,
            temperature: request.temperature,
            logit_bias: request.logit_bias.as_ref(),
            logprobs: request.logprobs,
            top_logprobs: request.top_logprobs,
            max_tokens,
            max_completion_tokens,
            stop: request.stop.as_ref(),
        };

        serde_json::to_value(&payload).map_err(|e| Error::decode("request payload", e))
    }

    async fn complete(&self, request: &Request) -> Result<Response> {
        self.validate(request)?;
        let payload = self.build_payload(request, false)?;

        let mut attempt = 0u32;
        loop {
            match self.complete_once(&payload).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let backoff = self.retry.initial_backoff * 2u32.saturating_pow(attempt);
                    tracing::debug!(attempt, error = %err, "retrying completion after backoff");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn complete_stream(&self, request: &Request) -> Result<DeltaStream> {
        self.validate(request)?;
        let payload = self.build_payload(request, true)?;
        let response = self.send(&payload, true).await?;

        let chunks = response
            .sse_data()
            .map(|frame| frame.and_then(|payload| DeltaResponse::from_json(&payload)))
            .scan(false, |failed, item| {
                // A decode error ends the stream instead of skipping the frame.
                if *failed {
                    return futures::future::ready(None);
                }
                *failed = item.is_err();
                futures::future::ready(Some(item))
            });

        Ok(Box::pin(chunks))
    }
}

// --- Wire payload ---

#[derive(Debug, Serialize)]
struct Payload<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logit_bias: Option<&'a HashMap<String, f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_logprobs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a Stop>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: BackendError,
}

#[derive(Debug, Deserialize)]
struct BackendError {
    message: String,
}
