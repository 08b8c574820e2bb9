// Generative-model access for Mobi: the provider-neutral `GenerativeModel`
// trait, the Gemini REST client behind it, streaming events and the prompt
// templates each feature sends.

pub mod client;
pub mod generative;
pub mod prompt;
pub mod protocol;

pub use client::{GeminiClient, LlmClient};
pub use generative::{GenerativeModel, ImageEditRequest, ImageGenerationRequest, LlmError, TextRequest};
pub use protocol::LlmEvent;
