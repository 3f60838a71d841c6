use crate::config::credentials::ApiCredentials;
use crate::domain::model::VisionRequest;
use crate::domain::ports::VisionModel;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI 相容的 chat-completions 客戶端，一次送出一張卡片影像
pub struct OpenAiClient {
    client: Client,
    settings: ModelSettings,
    credentials: ApiCredentials,
}

impl OpenAiClient {
    pub fn new(settings: ModelSettings, credentials: ApiCredentials) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            settings,
            credentials,
        })
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }
}

#[async_trait]
impl VisionModel for OpenAiClient {
    async fn complete(&self, request: VisionRequest<'_>) -> Result<String> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: request.prompt,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_url(),
                        },
                    },
                ],
            }],
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            "Sending {} ({}) to model {}",
            request.image.name,
            request.image.mime_type,
            self.settings.model
        );

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(self.credentials.api_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Model response status: {}", status);

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err(EtlError::ModelError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EtlError::ModelError {
                status: status.as_u16(),
                message: format!("Reply for {} contained no choices", request.image.name),
            })?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!(
                "⚠️ Reply for {} hit max_tokens ({}), trailing fields may be missing",
                request.image.name,
                request.max_tokens
            );
        }

        choice.message.content.ok_or_else(|| EtlError::ModelError {
            status: status.as_u16(),
            message: format!("Reply for {} contained no message content", request.image.name),
        })
    }
}
