use async_trait::async_trait;

use crate::error::AiError;
use crate::openai::StructuredOutput;

// =============================================================================
// Request Types
// =============================================================================

/// How the model is asked to shape its reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    Text,
    /// Any syntactically valid JSON object.
    JsonObject,
    /// A JSON object validated against a strict schema.
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}

/// A single system + user completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub format: ResponseFormat,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            format: ResponseFormat::Text,
            temperature: None,
        }
    }

    pub fn json_object(mut self) -> Self {
        self.format = ResponseFormat::JsonObject;
        self
    }

    /// Request output matching the schema of `T`.
    pub fn json_schema<T: StructuredOutput>(mut self) -> Self {
        self.format = ResponseFormat::JsonSchema {
            name: T::type_name(),
            schema: T::openai_schema(),
        };
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// =============================================================================
// CompletionClient Trait
// =============================================================================

/// A chat-completion endpoint. Returns the raw text of the first choice.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError>;
}
