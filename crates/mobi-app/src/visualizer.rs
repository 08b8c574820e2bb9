// Dream visualizer: a text description becomes a photographic interior
// render, optionally posted into the selected lead's conversation.

use std::sync::Arc;

use mobi_core::config::ModelsConfig;
use mobi_core::{LeadId, MobiState, NewMessage, Sender};
use mobi_llm::{prompt, GenerativeModel, ImageGenerationRequest, LlmError};
use thiserror::Error;
use tracing::{info, warn};

const DREAM_MIME_TYPE: &str = "image/jpeg";
const DREAM_ASPECT_RATIO: &str = "16:9";

#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error("Por favor, introduce una descripción.")]
    EmptyPrompt,

    #[error("No se pudo generar la imagen. Inténtalo de nuevo.")]
    Generation(#[source] LlmError),

    #[error("No se pudo generar la imagen. Inténtalo de nuevo.")]
    NoImage,
}

/// A generated image and the lead it was posted to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DreamImage {
    pub data_url: String,
    pub posted_to: Option<LeadId>,
}

pub struct DreamVisualizer {
    model: Arc<dyn GenerativeModel>,
    image_model: String,
}

impl DreamVisualizer {
    pub fn new(model: Arc<dyn GenerativeModel>, models: &ModelsConfig) -> Self {
        Self {
            model,
            image_model: models.dream_image.clone(),
        }
    }

    /// Generate one 16:9 JPEG for `description` and return it as a data URL.
    pub async fn generate(&self, description: &str) -> Result<String, VisualizerError> {
        if description.trim().is_empty() {
            return Err(VisualizerError::EmptyPrompt);
        }

        let request = ImageGenerationRequest {
            model: self.image_model.clone(),
            prompt: prompt::build_dream_prompt(description),
            number_of_images: 1,
            output_mime_type: DREAM_MIME_TYPE.to_string(),
            aspect_ratio: DREAM_ASPECT_RATIO.to_string(),
        };

        let images = self.model.generate_images(&request).await.map_err(|e| {
            warn!(error = %e, "dream image generation failed");
            VisualizerError::Generation(e)
        })?;

        let image = images.into_iter().next().ok_or_else(|| {
            warn!("dream image response contained no images");
            VisualizerError::NoImage
        })?;
        Ok(image.data_url())
    }

    /// Generate and, when a lead is selected, append the image to its
    /// conversation as a Mobi image message.
    pub async fn generate_for_selected(
        &self,
        store: &mut MobiState,
        description: &str,
    ) -> Result<DreamImage, VisualizerError> {
        let data_url = self.generate(description).await?;

        let posted_to = match store.selected_lead_id() {
            Some(lead_id) => {
                let text = format!("Imagen generada para: \"{description}\"\n{data_url}");
                match store.add_message(lead_id, NewMessage::new(Sender::MobiImage, text)) {
                    Ok(_) => {
                        info!(lead_id, "dream image posted to conversation");
                        Some(lead_id)
                    }
                    Err(e) => {
                        warn!(lead_id, error = %e, "selected lead vanished, image not posted");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(DreamImage {
            data_url,
            posted_to,
        })
    }
}
