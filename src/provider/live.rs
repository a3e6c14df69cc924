use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::AdapterError;
use super::repair::CompletionClient;
use crate::config::{ConfigError, LiveSettings};

const TEMPERATURE: f32 = 0.2;

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatTurn<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(settings: &LiveSettings, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: completions_url(&settings.base_url),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> AdapterError {
        if err.is_timeout() {
            AdapterError::ProviderUnavailable(format!(
                "request timed out after {:.1}s",
                self.timeout.as_secs_f64()
            ))
        } else {
            AdapterError::ProviderUnavailable(format!("request failed: {}", err))
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AdapterError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatTurn {
                    role: "system",
                    content: system_prompt,
                },
                ChatTurn {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::ProviderUnavailable(format!(
                "provider returned HTTP {}",
                status
            )));
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        reply_content(&text)
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

/// Pull `choices[0].message.content` out of a completions response body
fn reply_content(body: &str) -> Result<String, AdapterError> {
    let malformed = |reason: String| AdapterError::MalformedOutput {
        reason,
        raw_output: body.to_string(),
    };

    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| malformed(format!("unexpected completions response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| malformed("completions response has no message content".to_string()))
}
