mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;
pub use types::supports_structured_output;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AiError;
use crate::traits::{CompletionClient, CompletionRequest, ResponseFormat};
use client::OpenAiClient;
use types::{ChatRequest, JsonSchemaFormat, WireMessage, WireResponseFormat};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_OUTPUT_TOKENS: u32 = 4096;

// =============================================================================
// OpenAi
// =============================================================================

/// OpenAI chat completions. The HTTP client (and its connection pool) is
/// built once and shared by every call, retries included.
pub struct OpenAi {
    client: OpenAiClient,
    model: String,
    timeout: Duration,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AiError> {
        Self::with_timeout(api_key, model, DEFAULT_TIMEOUT)
    }

    /// Per-request timeout applied to every call made by this client.
    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        Ok(Self {
            client: OpenAiClient::new(&api_key.into(), timeout)?,
            model: model.into(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(&url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut chat = ChatRequest::new(&self.model)
            .message(WireMessage::system(&request.system))
            .message(WireMessage::user(&request.user));

        if types::is_reasoning_model(&self.model) {
            chat = chat.max_completion_tokens(MAX_OUTPUT_TOKENS);
        } else {
            chat = chat
                .max_tokens(MAX_OUTPUT_TOKENS)
                .temperature(request.temperature.unwrap_or(0.0));
        }

        match &request.format {
            ResponseFormat::Text => chat,
            ResponseFormat::JsonObject => chat.response_format(WireResponseFormat::JsonObject),
            ResponseFormat::JsonSchema { .. } if !supports_structured_output(&self.model) => {
                debug!(model = %self.model, "Model lacks structured outputs, using json_object");
                chat.response_format(WireResponseFormat::JsonObject)
            }
            ResponseFormat::JsonSchema { name, schema } => {
                chat.response_format(WireResponseFormat::JsonSchema {
                    json_schema: JsonSchemaFormat {
                        name: name.clone(),
                        strict: true,
                        schema: schema.clone(),
                    },
                })
            }
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAi {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        let chat = self.build_request(request);
        let response = self.client.chat(&chat).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(AiError::EmptyResponse)?;

        if let Some(reason) = choice.finish_reason.as_deref() {
            if reason == "length" {
                debug!(model = %self.model, "Completion truncated at token limit");
            }
        }

        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}
