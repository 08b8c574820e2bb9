// Scripted in-memory `GenerativeModel` for tests.
//
// Each kind of call pops the next scripted outcome from its own queue and
// records the request it was given. An exhausted queue answers with
// `LlmError::MissingContent`.

use std::collections::VecDeque;

use async_trait::async_trait;
use mobi_core::ImageFile;
use mobi_llm::{GenerativeModel, ImageEditRequest, ImageGenerationRequest, LlmError, TextRequest};
use tokio::sync::Mutex;

type Scripted<T> = Result<T, String>;

#[derive(Default)]
pub struct ScriptedModel {
    text: Mutex<VecDeque<Scripted<String>>>,
    images: Mutex<VecDeque<Scripted<Vec<ImageFile>>>>,
    edits: Mutex<VecDeque<Scripted<ImageFile>>>,
    text_requests: Mutex<Vec<TextRequest>>,
    image_requests: Mutex<Vec<ImageGenerationRequest>>,
    edit_requests: Mutex<Vec<ImageEditRequest>>,
}

fn scripted_error(message: String) -> LlmError {
    LlmError::Status {
        status: 500,
        message,
    }
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, reply: impl Into<String>) -> Self {
        self.text.get_mut().push_back(Ok(reply.into()));
        self
    }

    pub fn with_text_error(mut self, message: impl Into<String>) -> Self {
        self.text.get_mut().push_back(Err(message.into()));
        self
    }

    pub fn with_images(mut self, images: Vec<ImageFile>) -> Self {
        self.images.get_mut().push_back(Ok(images));
        self
    }

    pub fn with_image_error(mut self, message: impl Into<String>) -> Self {
        self.images.get_mut().push_back(Err(message.into()));
        self
    }

    pub fn with_edit(mut self, image: ImageFile) -> Self {
        self.edits.get_mut().push_back(Ok(image));
        self
    }

    pub fn with_edit_error(mut self, message: impl Into<String>) -> Self {
        self.edits.get_mut().push_back(Err(message.into()));
        self
    }

    pub async fn text_requests(&self) -> Vec<TextRequest> {
        self.text_requests.lock().await.clone()
    }

    pub async fn image_requests(&self) -> Vec<ImageGenerationRequest> {
        self.image_requests.lock().await.clone()
    }

    pub async fn edit_requests(&self) -> Vec<ImageEditRequest> {
        self.edit_requests.lock().await.clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, LlmError> {
        self.text_requests.lock().await.push(request.clone());
        match self.text.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(scripted_error(message)),
            None => Err(LlmError::MissingContent("scripted text")),
        }
    }

    async fn generate_images(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<ImageFile>, LlmError> {
        self.image_requests.lock().await.push(request.clone());
        match self.images.lock().await.pop_front() {
            Some(Ok(images)) => Ok(images),
            Some(Err(message)) => Err(scripted_error(message)),
            None => Err(LlmError::MissingContent("scripted images")),
        }
    }

    async fn edit_image(&self, request: &ImageEditRequest) -> Result<ImageFile, LlmError> {
        self.edit_requests.lock().await.push(request.clone());
        match self.edits.lock().await.pop_front() {
            Some(Ok(image)) => Ok(image),
            Some(Err(message)) => Err(scripted_error(message)),
            None => Err(LlmError::MissingContent("scripted edit")),
        }
    }
}
