// Gemini REST client using reqwest and reqwest-eventsource.
//
// Text generation goes to `:generateContent`, streamed text to
// `:streamGenerateContent?alt=sse` (parsed into `LlmEvent`s forwarded over an
// mpsc channel), text-to-image to the Imagen `:predict` endpoint and image
// edits to `:generateContent` with an inline image part.

use async_trait::async_trait;
use futures_util::StreamExt;
use mobi_core::config::Config;
use mobi_core::ImageFile;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::generative::{
    GenerativeModel, ImageEditRequest, ImageGenerationRequest, LlmError, TextRequest,
};
use crate::protocol::LlmEvent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Low-level Gemini API client.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client for the given API key and base URL
    /// (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    fn ensure_key(&self) -> Result<(), LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::NotConfigured);
        }
        Ok(())
    }

    /// POST a JSON body and decode the JSON reply, turning non-2xx statuses
    /// into `LlmError::Status` with the API's own message when present.
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, LlmError> {
        self.ensure_key()?;
        debug!(url, "POST");

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = parse_error_message(&text).unwrap_or_else(|| text.clone());
            warn!(status = status.as_u16(), %message, "Gemini API error");
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Stream a text reply as `LlmEvent`s over `tx`.
    ///
    /// The `generation` counter is threaded through every emitted event. The
    /// method returns when the stream ends, an error occurs, or the receiver
    /// is dropped.
    pub async fn stream_content(
        &self,
        request: &TextRequest,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) {
        if let Err(e) = self.ensure_key() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: e.to_string(),
                    generation,
                })
                .await;
            return;
        }

        let url = format!(
            "{}?alt=sse",
            self.endpoint(&request.model, "streamGenerateContent")
        );
        let builder = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&text_request_body(request));

        let mut es = match builder.eventsource() {
            Ok(es) => es,
            Err(e) => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: format!("Failed to create event source: {e}"),
                        generation,
                    })
                    .await;
                return;
            }
        };

        let mut full_text = String::new();

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => {
                    debug!("SSE connection opened");
                }
                Ok(Event::Message(msg)) => {
                    let Some(text) = parse_stream_chunk_text(&msg.data) else {
                        debug!("ignoring SSE chunk without text");
                        continue;
                    };
                    if text.is_empty() {
                        continue;
                    }
                    full_text.push_str(&text);
                    if tx.send(LlmEvent::Token { text, generation }).await.is_err() {
                        // Receiver dropped.
                        es.close();
                        return;
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("SSE stream ended");
                    es.close();
                    let _ = tx
                        .send(LlmEvent::Complete {
                            full_text,
                            generation,
                        })
                        .await;
                    return;
                }
                Err(err) => {
                    es.close();
                    let message = describe_stream_error(err).await;
                    warn!(%message, "SSE stream error");
                    let _ = tx.send(LlmEvent::Error { message, generation }).await;
                    return;
                }
            }
        }

        if full_text.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "Stream ended unexpectedly without any content".to_string(),
                    generation,
                })
                .await;
        } else {
            let _ = tx
                .send(LlmEvent::Complete {
                    full_text,
                    generation,
                })
                .await;
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, LlmError> {
        let url = self.endpoint(&request.model, "generateContent");
        let response = self.post_json(&url, &text_request_body(request)).await?;
        parse_candidate_text(&response).ok_or(LlmError::MissingContent("text"))
    }

    async fn generate_images(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<ImageFile>, LlmError> {
        let url = self.endpoint(&request.model, "predict");
        let response = self.post_json(&url, &image_generation_body(request)).await?;
        Ok(parse_generated_images(&response, &request.output_mime_type))
    }

    async fn edit_image(&self, request: &ImageEditRequest) -> Result<ImageFile, LlmError> {
        let url = self.endpoint(&request.model, "generateContent");
        let response = self.post_json(&url, &image_edit_body(request)).await?;
        parse_inline_image(&response).ok_or(LlmError::MissingContent("image"))
    }

    async fn stream_text(&self, request: &TextRequest, tx: mpsc::Sender<LlmEvent>, generation: u64) {
        self.stream_content(request, tx, generation).await
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that can be either an active Gemini client or disabled.
pub enum LlmClient {
    /// Gemini API is configured and ready.
    Active(GeminiClient),
    /// Generative features are disabled (no API key configured).
    Disabled,
}

impl LlmClient {
    /// Build an `LlmClient` from the application config.
    ///
    /// Returns `Active` if an API key is present in credentials, otherwise
    /// returns `Disabled`.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.gemini_api_key {
            Some(key) if !key.is_empty() => LlmClient::Active(GeminiClient::new(
                key.clone(),
                config.api.base_url.clone(),
            )),
            _ => LlmClient::Disabled,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }
}

#[async_trait]
impl GenerativeModel for LlmClient {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, LlmError> {
        match self {
            LlmClient::Active(client) => client.generate_text(request).await,
            LlmClient::Disabled => Err(LlmError::NotConfigured),
        }
    }

    async fn generate_images(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<Vec<ImageFile>, LlmError> {
        match self {
            LlmClient::Active(client) => client.generate_images(request).await,
            LlmClient::Disabled => Err(LlmError::NotConfigured),
        }
    }

    async fn edit_image(&self, request: &ImageEditRequest) -> Result<ImageFile, LlmError> {
        match self {
            LlmClient::Active(client) => client.edit_image(request).await,
            LlmClient::Disabled => Err(LlmError::NotConfigured),
        }
    }

    async fn stream_text(&self, request: &TextRequest, tx: mpsc::Sender<LlmEvent>, generation: u64) {
        match self {
            LlmClient::Active(client) => client.stream_content(request, tx, generation).await,
            LlmClient::Disabled => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: LlmError::NotConfigured.to_string(),
                        generation,
                    })
                    .await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

pub(crate) fn text_request_body(request: &TextRequest) -> Value {
    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }]
    });
    if let Some(system) = &request.system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    if let Some(schema) = &request.response_schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema
        });
    }
    body
}

pub(crate) fn image_generation_body(request: &ImageGenerationRequest) -> Value {
    json!({
        "instances": [{ "prompt": request.prompt }],
        "parameters": {
            "sampleCount": request.number_of_images,
            "aspectRatio": request.aspect_ratio,
            "outputOptions": { "mimeType": request.output_mime_type }
        }
    })
}

pub(crate) fn image_edit_body(request: &ImageEditRequest) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "inlineData": { "mimeType": request.image.mime_type, "data": request.image.base64 } },
                { "text": request.instruction }
            ]
        }],
        "generationConfig": { "responseModalities": ["IMAGE"] }
    });
    if let Some(system) = &request.system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

/// Concatenate the text parts of the first candidate.
///
/// Expected shape: `{ "candidates": [{ "content": { "parts": [{ "text": "..." }] } }] }`
pub(crate) fn parse_candidate_text(v: &Value) -> Option<String> {
    let parts = v
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        return None;
    }
    Some(texts.concat())
}

/// Text carried by one streamed chunk (same shape as a full response).
pub(crate) fn parse_stream_chunk_text(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    parse_candidate_text(&v)
}

/// First inline image part of the first candidate.
pub(crate) fn parse_inline_image(v: &Value) -> Option<ImageFile> {
    let parts = v
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    parts.iter().find_map(|p| {
        let inline = p.get("inlineData")?;
        Some(ImageFile {
            base64: inline.get("data")?.as_str()?.to_string(),
            mime_type: inline
                .get("mimeType")
                .and_then(Value::as_str)
                .unwrap_or("image/png")
                .to_string(),
        })
    })
}

/// Images from an Imagen `predict` response.
///
/// Expected shape: `{ "predictions": [{ "bytesBase64Encoded": "...", "mimeType": "image/jpeg" }] }`
pub(crate) fn parse_generated_images(v: &Value, default_mime: &str) -> Vec<ImageFile> {
    let Some(predictions) = v.get("predictions").and_then(Value::as_array) else {
        return Vec::new();
    };
    predictions
        .iter()
        .filter_map(|p| {
            Some(ImageFile {
                base64: p.get("bytesBase64Encoded")?.as_str()?.to_string(),
                mime_type: p
                    .get("mimeType")
                    .and_then(Value::as_str)
                    .unwrap_or(default_mime)
                    .to_string(),
            })
        })
        .collect()
}

/// Extract `error.message` from an API error body.
pub(crate) fn parse_error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Human-readable description of an SSE error.
async fn describe_stream_error(err: reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            match parse_error_message(&body) {
                Some(message) => format!("API returned status {status}: {message}"),
                None => format!("API returned status {status}"),
            }
        }
        reqwest_eventsource::Error::Transport(e) => format!("Network error: {e}"),
        other => format!("Stream error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    // -- Request body tests --

    #[test]
    fn text_body_minimal() {
        let body = text_request_body(&TextRequest::new("m", "Hola"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hola");
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn text_body_with_system_and_schema() {
        let schema = json!({ "type": "OBJECT" });
        let req = TextRequest::new("m", "p")
            .with_system_instruction("Eres Mobi")
            .with_response_schema(schema.clone());
        let body = text_request_body(&req);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Eres Mobi");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
    }

    #[test]
    fn image_generation_body_shape() {
        let body = image_generation_body(&ImageGenerationRequest {
            model: "imagen".into(),
            prompt: "sala".into(),
            number_of_images: 1,
            output_mime_type: "image/jpeg".into(),
            aspect_ratio: "16:9".into(),
        });
        assert_eq!(body["instances"][0]["prompt"], "sala");
        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert_eq!(body["parameters"]["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn image_edit_body_puts_image_before_text() {
        let body = image_edit_body(&ImageEditRequest {
            model: "m".into(),
            image: ImageFile {
                base64: "AAAA".into(),
                mime_type: "image/png".into(),
            },
            instruction: "añade un sofá".into(),
            system_instruction: Some("reglas".into()),
        });
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["text"], "añade un sofá");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "IMAGE");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "reglas");
    }

    // -- Response parsing tests --

    #[test]
    fn candidate_text_concatenates_parts() {
        let v = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hola" }, { "text": ", ¿qué tal?" }] } }]
        });
        assert_eq!(parse_candidate_text(&v), Some("Hola, ¿qué tal?".to_string()));
    }

    #[test]
    fn candidate_text_missing() {
        assert_eq!(parse_candidate_text(&json!({ "candidates": [] })), None);
        assert_eq!(parse_candidate_text(&json!({})), None);
        let only_image = json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "x" } }] } }]
        });
        assert_eq!(parse_candidate_text(&only_image), None);
    }

    #[test]
    fn stream_chunk_invalid_json() {
        assert_eq!(parse_stream_chunk_text("{broken"), None);
    }

    #[test]
    fn inline_image_skips_text_parts() {
        let v = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Aquí tienes" },
                { "inlineData": { "mimeType": "image/png", "data": "iVBOR" } }
            ] } }]
        });
        let image = parse_inline_image(&v).unwrap();
        assert_eq!(image.base64, "iVBOR");
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn inline_image_absent() {
        let v = json!({ "candidates": [{ "content": { "parts": [{ "text": "no" }] } }] });
        assert!(parse_inline_image(&v).is_none());
    }

    #[test]
    fn generated_images_use_default_mime() {
        let v = json!({ "predictions": [
            { "bytesBase64Encoded": "abc" },
            { "bytesBase64Encoded": "def", "mimeType": "image/png" },
            { "raiFilteredReason": "blocked" }
        ] });
        let images = parse_generated_images(&v, "image/jpeg");
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].mime_type, "image/jpeg");
        assert_eq!(images[1].mime_type, "image/png");
        assert!(parse_generated_images(&json!({}), "image/jpeg").is_empty());
    }

    #[test]
    fn error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(parse_error_message(body), Some("API key not valid.".to_string()));
        assert_eq!(parse_error_message("<html>"), None);
    }

    // -- LlmClient::Disabled path --

    #[tokio::test]
    async fn disabled_client_returns_not_configured() {
        let client = LlmClient::Disabled;
        let err = client
            .generate_text(&TextRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }

    #[tokio::test]
    async fn disabled_client_stream_sends_error_event() {
        let client = LlmClient::Disabled;
        let (tx, mut rx) = mpsc::channel(8);

        client.stream_text(&TextRequest::new("m", "p"), tx, 1).await;

        let event = rx.recv().await.expect("should receive an event");
        assert_eq!(
            event,
            LlmEvent::Error {
                message: "LLM not configured".to_string(),
                generation: 1,
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_api_key_is_not_configured() {
        let client = GeminiClient::new(String::new(), "http://127.0.0.1:1".into());
        let err = client
            .generate_text(&TextRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }

    // -- LlmClient::from_config --

    #[test]
    fn from_config_with_api_key_returns_active() {
        let mut config = Config::default();
        config.credentials.gemini_api_key = Some("test-key".into());
        assert!(LlmClient::from_config(&config).is_active());
    }

    #[test]
    fn from_config_without_api_key_returns_disabled() {
        let config = Config::default();
        assert!(matches!(LlmClient::from_config(&config), LlmClient::Disabled));
    }

    #[test]
    fn from_config_with_empty_api_key_returns_disabled() {
        let mut config = Config::default();
        config.credentials.gemini_api_key = Some(String::new());
        assert!(matches!(LlmClient::from_config(&config), LlmClient::Disabled));
    }

    // -- Integration-style tests with a mock TCP server --

    /// Read one HTTP request (headers plus Content-Length body).
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&data[..end]).to_string();
                let len = headers
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        if k.eq_ignore_ascii_case("content-length") {
                            v.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if data.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Serve a single canned response; the handle yields the raw request.
    async fn serve_once(response: String) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            request
        });
        (addr, handle)
    }

    fn json_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn mock_server_generate_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Claro, ¿cuándo?"}]}}]}"#;
        let (addr, server) = serve_once(json_response("200 OK", body)).await;

        let client = GeminiClient::new("k-123".into(), format!("http://{addr}/"));
        let text = client
            .generate_text(&TextRequest::new("gemini-2.5-flash", "Hola"))
            .await
            .unwrap();
        assert_eq!(text, "Claro, ¿cuándo?");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /models/gemini-2.5-flash:generateContent "));
        assert!(request.to_lowercase().contains("x-goog-api-key: k-123"));
        assert!(request.contains("\"text\":\"Hola\""));
    }

    #[tokio::test]
    async fn mock_server_error_status() {
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        let (addr, server) = serve_once(json_response("403 Forbidden", body)).await;

        let client = GeminiClient::new("k".into(), format!("http://{addr}"));
        let err = client
            .generate_text(&TextRequest::new("m", "p"))
            .await
            .unwrap_err();
        match err {
            LlmError::Status { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Permission denied");
            }
            other => panic!("expected Status error, got: {other}"),
        }
        let _ = server.await;
    }

    #[tokio::test]
    async fn mock_server_generate_images() {
        let body = r#"{"predictions":[{"bytesBase64Encoded":"/9j/4AAQ","mimeType":"image/jpeg"}]}"#;
        let (addr, server) = serve_once(json_response("200 OK", body)).await;

        let client = GeminiClient::new("k".into(), format!("http://{addr}"));
        let images = client
            .generate_images(&ImageGenerationRequest {
                model: "imagen-4.0-generate-001".into(),
                prompt: "sala".into(),
                number_of_images: 1,
                output_mime_type: "image/jpeg".into(),
                aspect_ratio: "16:9".into(),
            })
            .await
            .unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].base64, "/9j/4AAQ");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /models/imagen-4.0-generate-001:predict "));
    }

    #[tokio::test]
    async fn mock_server_edit_image_without_image_part() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"No puedo"}]}}]}"#;
        let (addr, server) = serve_once(json_response("200 OK", body)).await;

        let client = GeminiClient::new("k".into(), format!("http://{addr}"));
        let err = client
            .edit_image(&ImageEditRequest {
                model: "gemini-2.5-flash-image".into(),
                image: ImageFile {
                    base64: "AAAA".into(),
                    mime_type: "image/png".into(),
                },
                instruction: "x".into(),
                system_instruction: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingContent("image")));
        let _ = server.await;
    }

    #[tokio::test]
    async fn mock_sse_server_full_flow() {
        let response = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: text/event-stream\r\n",
            "Cache-Control: no-cache\r\n",
            "Connection: close\r\n",
            "\r\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Buena\"}]}}]}\r\n",
            "\r\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\" pregunta\"}]}}]}\r\n",
            "\r\n",
            "data: {\"candidates\":[{\"finishReason\":\"STOP\"}],\"usageMetadata\":{\"totalTokenCount\":12}}\r\n",
            "\r\n",
        );
        let (addr, server) = serve_once(response.to_string()).await;

        let client = GeminiClient::new("k".into(), format!("http://{addr}"));
        let (tx, mut rx) = mpsc::channel(32);
        let gen = 4u64;

        let req = TextRequest::new("gemini-2.5-pro", "¿Cómo cierro?");
        let streamer = tokio::spawn(async move { client.stream_content(&req, tx, gen).await });

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let _ = streamer.await;

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /models/gemini-2.5-pro:streamGenerateContent?alt=sse "));

        assert_eq!(events.len(), 3, "expected 2 tokens + 1 complete: {events:?}");
        assert_eq!(
            events[0],
            LlmEvent::Token {
                text: "Buena".to_string(),
                generation: gen,
            }
        );
        assert_eq!(
            events[1],
            LlmEvent::Token {
                text: " pregunta".to_string(),
                generation: gen,
            }
        );
        assert_eq!(
            events[2],
            LlmEvent::Complete {
                full_text: "Buena pregunta".to_string(),
                generation: gen,
            }
        );
    }

    #[tokio::test]
    async fn mock_sse_server_error_status() {
        let body = r#"{"error":{"code":401,"message":"Invalid API key"}}"#;
        let (addr, server) = serve_once(json_response("401 Unauthorized", body)).await;

        let client = GeminiClient::new("k".into(), format!("http://{addr}"));
        let (tx, mut rx) = mpsc::channel(8);
        client.stream_content(&TextRequest::new("m", "p"), tx, 5).await;

        let event = rx.recv().await.expect("should receive error event");
        match event {
            LlmEvent::Error { message, generation } => {
                assert_eq!(generation, 5);
                assert!(message.contains("401"), "message should mention status: {message}");
            }
            other => panic!("Expected LlmEvent::Error, got: {other:?}"),
        }
        let _ = server.await;
    }
}
