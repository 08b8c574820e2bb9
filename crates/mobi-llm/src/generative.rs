// Provider-neutral interface to the generative model, with its request and
// error types.

use async_trait::async_trait;
use mobi_core::ImageFile;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::LlmEvent;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response contained no {0}")]
    MissingContent(&'static str),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Single-turn text generation, optionally constrained to a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: Option<String>,
    /// When set, the reply is JSON matching this schema.
    pub response_schema: Option<Value>,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_instruction: None,
            response_schema: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Text-to-image generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub number_of_images: u32,
    pub output_mime_type: String,
    pub aspect_ratio: String,
}

/// Edit an existing image according to a text instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEditRequest {
    pub model: String,
    pub image: ImageFile,
    pub instruction: String,
    pub system_instruction: Option<String>,
}

// ---------------------------------------------------------------------------
// GenerativeModel trait
// ---------------------------------------------------------------------------

/// Everything Mobi asks of a generative model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, LlmError>;

    async fn generate_images(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<ImageFile>, LlmError>;

    async fn edit_image(&self, request: &ImageEditRequest) -> Result<ImageFile, LlmError>;

    /// Stream a text reply as `LlmEvent`s over `tx`.
    ///
    /// The default implementation makes one blocking call and emits a single
    /// `Complete` or `Error` event.
    async fn stream_text(&self, request: &TextRequest, tx: mpsc::Sender<LlmEvent>, generation: u64) {
        let event = match self.generate_text(request).await {
            Ok(full_text) => LlmEvent::Complete {
                full_text,
                generation,
            },
            Err(e) => LlmEvent::Error {
                message: e.to_string(),
                generation,
            },
        };
        let _ = tx.send(event).await;
    }
}
