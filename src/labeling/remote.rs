//! Remote labeling backend for OpenAI-compatible chat-completion endpoints.
//!
//! Sends one synchronous request per prompt. The reply is parsed with the
//! tolerant extractor, so fenced or chatty answers still produce labels.
//! Timeouts and unusable replies are returned as errors.

use crate::config::RemoteConfig;
use crate::error::{ChapterizeError, Result};
use crate::labeling::backend::LabelBackend;
use crate::labeling::parse::labels_from_response;
use crate::pipeline::types::LabelSegment;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct RemoteBackend {
    client: Client,
    config: RemoteConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl RemoteBackend {
    /// Build the HTTP client once; it is shared by every chunk worker.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        // The blocking client defaults to 30s; an unset timeout disables it.
        let client = Client::builder()
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| ChapterizeError::BackendRequest {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

impl LabelBackend for RemoteBackend {
    fn label(&self, prompt: &str) -> Result<Vec<LabelSegment>> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let mut call = self.client.post(self.completions_url()).json(&request);
        if let Some(key) = self.config.api_key.as_deref() {
            call = call.bearer_auth(key);
        }

        let response = match call.send() {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(ChapterizeError::BackendTimeout {
                    timeout_secs: self.config.request_timeout_secs.unwrap_or_default(),
                });
            }
            Err(e) => {
                return Err(ChapterizeError::BackendRequest {
                    message: format!("request to {} failed: {e}", self.completions_url()),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChapterizeError::BackendRequest {
                message: format!("endpoint returned {status}: {}", body.trim()),
            });
        }

        let reply: ChatResponse = response.json().map_err(|e| ChapterizeError::BackendRequest {
            message: format!("unexpected completion envelope: {e}"),
        })?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        tracing::debug!(response = %content, "raw remote model response");
        labels_from_response(&self.config.model, &content)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
