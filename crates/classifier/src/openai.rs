//! OpenAI-compatible chat completion client.

use crate::chat::ChatModel;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchboard_common::{Result, SwitchboardError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

/// Chat client for any OpenAI-compatible `/chat/completions` endpoint.
///
/// Requests use temperature 0 so routing stays as deterministic as the
/// model allows, and carry a bounded timeout so a stalled classifier
/// surfaces as a classification failure instead of hanging the turn.
pub struct OpenAiChat {
    base_url: String,
    model: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(
        base_url: Option<String>,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            api_key,
            http_client,
        }
    }

    fn build_request_body(&self, system: &str, user: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: 0.0,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(system, user);

        let mut http_req = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| SwitchboardError::Classification(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Classification(format!(
                "API error {status}: {body_text}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            SwitchboardError::Classification(format!("Failed to parse response: {e}"))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SwitchboardError::Classification("No choices in response".into()))?;

        Ok(choice.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
