// Design compositor: room photo + catalog picks + instruction, through a
// prompt-enhancement call and then an image-edit call.

use std::sync::Arc;

use mobi_core::config::ModelsConfig;
use mobi_core::ImageFile;
use mobi_llm::prompt::{self, DesignMode};
use mobi_llm::{GenerativeModel, ImageEditRequest, LlmError, TextRequest};
use thiserror::Error;
use tracing::{info, warn};

use super::catalog::FurnitureSelection;

pub const ANALYZING_MESSAGE: &str = "Analizando tu petición...";
pub const CREATING_MESSAGE: &str = "Creando tu diseño...";

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("Por favor, completa todos los pasos antes de generar.")]
    Incomplete,

    #[error("No se pudo procesar la instrucción.")]
    Enhance(#[source] LlmError),

    #[error("No se pudo generar el diseño final.")]
    Edit(#[source] LlmError),
}

/// What the result panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultState {
    Welcome,
    Loading(String),
    Success(ImageFile),
    Error(String),
}

impl ResultState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResultState::Loading(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DesignInput {
    pub room_image: Option<ImageFile>,
    pub selection: FurnitureSelection,
    pub instruction: String,
}

impl DesignInput {
    /// Photo present, at least one item picked, instruction not blank.
    pub fn is_complete(&self) -> bool {
        self.room_image.is_some() && !self.selection.is_empty() && !self.instruction.trim().is_empty()
    }

    /// The instruction with the picked items' prompts appended.
    pub fn full_instruction(&self) -> String {
        let furniture = self
            .selection
            .items()
            .iter()
            .map(|item| item.prompt.as_str())
            .collect::<Vec<_>>()
            .join(". ");
        format!(
            "{}. Incluye los siguientes elementos en la escena de forma realista: {furniture}",
            self.instruction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedPrompt {
    pub mode: DesignMode,
    pub text: String,
}

pub struct DesignCompositor {
    model: Arc<dyn GenerativeModel>,
    enhancement_model: String,
    edit_model: String,
}

impl DesignCompositor {
    pub fn new(model: Arc<dyn GenerativeModel>, models: &ModelsConfig) -> Self {
        Self {
            model,
            enhancement_model: models.prompt_enhancement.clone(),
            edit_model: models.image_edit.clone(),
        }
    }

    /// Rewrite `instruction` into a detailed edit prompt. The mode comes from
    /// the instruction's wording.
    pub async fn enhance(&self, instruction: &str) -> Result<EnhancedPrompt, DesignError> {
        let mode = DesignMode::detect(instruction);
        let request = TextRequest::new(
            &self.enhancement_model,
            prompt::build_enhancement_prompt(instruction),
        )
        .with_system_instruction(prompt::enhancement_system_instruction(mode));

        let text = self
            .model
            .generate_text(&request)
            .await
            .map_err(DesignError::Enhance)?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(DesignError::Enhance(LlmError::MissingContent("enhanced prompt")));
        }
        Ok(EnhancedPrompt { mode, text })
    }

    /// Apply `instruction` to `room`.
    pub async fn render(&self, room: &ImageFile, instruction: &str) -> Result<ImageFile, DesignError> {
        let request = ImageEditRequest {
            model: self.edit_model.clone(),
            image: room.clone(),
            instruction: instruction.to_string(),
            system_instruction: Some(prompt::IMAGE_EDIT_SYSTEM_INSTRUCTION.to_string()),
        };
        self.model.edit_image(&request).await.map_err(DesignError::Edit)
    }

    /// Run the whole pipeline, reporting each state change to `on_state`.
    ///
    /// An incomplete input is rejected before any state is emitted or any
    /// call is made. Otherwise the last state reported is `Success` or
    /// `Error`.
    pub async fn compose<F>(&self, input: &DesignInput, mut on_state: F) -> Result<ImageFile, DesignError>
    where
        F: FnMut(ResultState),
    {
        let room = match (&input.room_image, input.is_complete()) {
            (Some(room), true) => room,
            _ => return Err(DesignError::Incomplete),
        };

        on_state(ResultState::Loading(ANALYZING_MESSAGE.to_string()));
        let result = self.run_stages(room, input, &mut on_state).await;

        match &result {
            Ok(image) => {
                info!(items = input.selection.len(), mime_type = %image.mime_type, "design composed");
                on_state(ResultState::Success(image.clone()));
            }
            Err(e) => {
                warn!(error = %e, cause = ?std::error::Error::source(e), "design pipeline failed");
                on_state(ResultState::Error(e.to_string()));
            }
        }
        result
    }

    async fn run_stages<F>(
        &self,
        room: &ImageFile,
        input: &DesignInput,
        on_state: &mut F,
    ) -> Result<ImageFile, DesignError>
    where
        F: FnMut(ResultState),
    {
        let enhanced = self.enhance(&input.full_instruction()).await?;
        info!(mode = enhanced.mode.label(), "instruction enhanced");

        on_state(ResultState::Loading(CREATING_MESSAGE.to_string()));
        self.render(room, &enhanced.text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::catalog::FurnitureSelection;
    use crate::testing::ScriptedModel;
    use mobi_core::config::Config;

    fn room() -> ImageFile {
        ImageFile {
            base64: "ROOM".into(),
            mime_type: "image/png".into(),
        }
    }

    fn rendered() -> ImageFile {
        ImageFile {
            base64: "DONE".into(),
            mime_type: "image/png".into(),
        }
    }

    fn input(instruction: &str) -> DesignInput {
        DesignInput {
            room_image: Some(room()),
            selection: FurnitureSelection::from_ids(["table-2", "sofa-1"]).unwrap(),
            instruction: instruction.into(),
        }
    }

    fn compositor(model: ScriptedModel) -> (DesignCompositor, Arc<ScriptedModel>) {
        let model = Arc::new(model);
        (
            DesignCompositor::new(model.clone(), &Config::default().models),
            model,
        )
    }

    #[test]
    fn full_instruction_lists_items_in_family_order() {
        assert_eq!(
            input("Pon los muebles junto a la ventana").full_instruction(),
            "Pon los muebles junto a la ventana. Incluye los siguientes elementos en la escena de \
             forma realista: a modern sofa model S-1. a minimalist coffee table model T-2"
        );
    }

    #[tokio::test]
    async fn happy_path_emits_states_in_order() {
        let (compositor, model) = compositor(
            ScriptedModel::new()
                .with_text("  Coloca un sofá moderno...  ")
                .with_edit(rendered()),
        );
        let mut states = Vec::new();
        let image = compositor
            .compose(&input("Decora la sala"), |s| states.push(s))
            .await
            .unwrap();

        assert_eq!(image, rendered());
        assert_eq!(
            states,
            vec![
                ResultState::Loading(ANALYZING_MESSAGE.into()),
                ResultState::Loading(CREATING_MESSAGE.into()),
                ResultState::Success(rendered()),
            ]
        );

        let text = &model.text_requests().await[0];
        assert_eq!(text.model, "gemini-2.5-flash");
        assert!(text.prompt.starts_with("Instrucción del usuario: \"Decora la sala."));
        assert!(text
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("Modo Actual: Diseñador Creativo."));

        let edit = &model.edit_requests().await[0];
        assert_eq!(edit.model, "gemini-2.5-flash-image");
        assert_eq!(edit.image, room());
        assert_eq!(edit.instruction, "Coloca un sofá moderno...");
        assert_eq!(
            edit.system_instruction.as_deref(),
            Some(prompt::IMAGE_EDIT_SYSTEM_INSTRUCTION)
        );
    }

    #[tokio::test]
    async fn replacement_wording_selects_precise_mode() {
        let (compositor, model) = compositor(ScriptedModel::new().with_text("ok"));
        let enhanced = compositor.enhance("Sustituye la mesa vieja").await.unwrap();
        assert_eq!(enhanced.mode, DesignMode::PreciseReplacement);
        assert!(model.text_requests().await[0]
            .system_instruction
            .as_deref()
            .unwrap()
            .contains("Modo Actual: Reemplazo Preciso."));
    }

    #[tokio::test]
    async fn incomplete_input_makes_no_call_and_no_state() {
        let (compositor, model) = compositor(ScriptedModel::new());
        let cases = [
            DesignInput {
                room_image: None,
                ..input("Decora")
            },
            DesignInput {
                selection: FurnitureSelection::new(),
                ..input("Decora")
            },
            input("   "),
        ];
        for case in cases {
            let mut states = Vec::new();
            let err = compositor.compose(&case, |s| states.push(s)).await.unwrap_err();
            assert_eq!(
                err.to_string(),
                "Por favor, completa todos los pasos antes de generar."
            );
            assert!(states.is_empty());
        }
        assert!(model.text_requests().await.is_empty());
        assert!(model.edit_requests().await.is_empty());
    }

    #[tokio::test]
    async fn enhance_failure_stops_before_edit() {
        let (compositor, model) = compositor(ScriptedModel::new().with_text_error("quota"));
        let mut states = Vec::new();
        let err = compositor
            .compose(&input("Decora"), |s| states.push(s))
            .await
            .unwrap_err();
        assert!(matches!(err, DesignError::Enhance(_)));
        assert_eq!(
            states.last(),
            Some(&ResultState::Error("No se pudo procesar la instrucción.".into()))
        );
        assert_eq!(states.len(), 2);
        assert!(model.edit_requests().await.is_empty());
    }

    #[tokio::test]
    async fn edit_failure_reports_final_design_error() {
        let (compositor, _) = compositor(
            ScriptedModel::new()
                .with_text("prompt detallado")
                .with_edit_error("no image"),
        );
        let mut states = Vec::new();
        let err = compositor
            .compose(&input("Decora"), |s| states.push(s))
            .await
            .unwrap_err();
        assert!(matches!(err, DesignError::Edit(_)));
        assert_eq!(
            states,
            vec![
                ResultState::Loading(ANALYZING_MESSAGE.into()),
                ResultState::Loading(CREATING_MESSAGE.into()),
                ResultState::Error("No se pudo generar el diseño final.".into()),
            ]
        );
    }
}
