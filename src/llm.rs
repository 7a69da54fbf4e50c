//! OpenAI-compatible chat completions.
//!
//! [`ChatModel`] posts to `{base_url}/chat/completions`. With `stream`
//! enabled it requests server-sent events and assembles the `delta.content`
//! pieces; callers only ever see the final string.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use docqa_core::{ChatMessage, LanguageModel, ModelError};
use futures::StreamExt;
use tracing::debug;

use crate::config::{api_key_from_env, LlmConfig};

#[derive(Clone)]
pub struct ChatModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    stream: bool,
}

impl ChatModel {
    /// Build from config, reading the key from `llm.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(config, api_key_from_env(&config.api_key_env))
    }

    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            stream: config.stream,
        })
    }

    /// Same endpoint and settings, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    fn error(&self, message: impl Into<String>) -> ModelError {
        ModelError::new(&self.model, message)
    }

    async fn read_stream(&self, response: reqwest::Response) -> Result<String, ModelError> {
        let mut assembler = SseAssembler::default();
        let mut body = response.bytes_stream();
        while let Some(piece) = body.next().await {
            let piece = piece.map_err(|e| self.error(e.to_string()))?;
            if assembler.push(&piece).map_err(|m| self.error(m))? {
                break;
            }
        }
        assembler.finish().map_err(|m| self.error(m))
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": self.stream,
        });
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(|e| self.error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(self.error(format!("API error {status}: {body_text}")));
        }

        let text = if self.stream {
            self.read_stream(response).await?
        } else {
            let json: serde_json::Value = response
                .json()
                .await
                .map_err(|e| self.error(e.to_string()))?;
            parse_completion(&json).map_err(|m| self.error(m))?
        };
        debug!(model = %self.model, chars = text.chars().count(), stream = self.stream, "completion");
        Ok(text)
    }
}

/// Extract `choices[0].message.content` from a non-streaming response.
pub fn parse_completion(json: &serde_json::Value) -> Result<String, String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| "invalid response: missing choices[0].message.content".to_string())
}

/// Assembles `data:` events of a chat-completion stream.
///
/// Bytes may arrive split anywhere, so incomplete lines are buffered until
/// their newline shows up.
#[derive(Debug, Default)]
pub struct SseAssembler {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl SseAssembler {
    /// Feed raw bytes. Returns `true` once `data: [DONE]` has been seen.
    pub fn push(&mut self, bytes: &[u8]) -> Result<bool, String> {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8(line).map_err(|e| format!("invalid stream bytes: {e}"))?;
            self.line(line.trim_end_matches(['\r', '\n']))?;
            if self.done {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn line(&mut self, line: &str) -> Result<(), String> {
        let Some(data) = line.strip_prefix("data:") else {
            // Comments, `event:` and blank separator lines carry no content.
            return Ok(());
        };
        let data = data.trim_start();
        if data == "[DONE]" {
            self.done = true;
            return Ok(());
        }
        let event: serde_json::Value =
            serde_json::from_str(data).map_err(|e| format!("invalid stream event: {e}"))?;
        if let Some(message) = event.pointer("/error/message").and_then(|m| m.as_str()) {
            return Err(message.to_string());
        }
        if let Some(piece) = event
            .pointer("/choices/0/delta/content")
            .and_then(|c| c.as_str())
        {
            self.text.push_str(piece);
        }
        Ok(())
    }

    /// The assembled text. A trailing line without newline is flushed.
    pub fn finish(mut self) -> Result<String, String> {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            let rest = String::from_utf8(rest).map_err(|e| format!("invalid stream bytes: {e}"))?;
            self.line(rest.trim_end())?;
        }
        Ok(self.text)
    }
}
