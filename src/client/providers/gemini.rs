//! Gemini (Google) generation client: text, Imagen images, TTS and Veo video.

use crate::client::provider::GenerationClient;
use crate::client::types::{
    AspectRatio, GeneratedVideoEntry, VideoOperation, VideoRef, VideoResponse,
};
use crate::error::{
    parse_retry_after, sanitize_error_message, GenStudioError, Result, ENTITY_NOT_FOUND_MESSAGE,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Veo model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VeoModel {
    /// Veo 3.1 Fast - quicker, cheaper renders.
    #[default]
    Veo31Fast,
    /// Veo 3.1 - highest quality.
    Veo31,
}

impl VeoModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veo31Fast => "veo-3.1-fast-generate-preview",
            Self::Veo31 => "veo-3.1-generate-preview",
        }
    }

    /// Picks the model for a request's quality flag.
    pub fn for_quality(high_quality: bool) -> Self {
        if high_quality {
            Self::Veo31
        } else {
            Self::Veo31Fast
        }
    }
}

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    base_url: String,
    image_model: String,
    speech_model: String,
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
        }
    }
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API host (used by tests and proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the Imagen model used for image generation.
    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Sets the TTS model used for speech generation.
    pub fn speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = model.into();
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                GenStudioError::Auth(
                    "GOOGLE_API_KEY not set and no API key provided".into(),
                )
            })?;

        Ok(GeminiClient {
            client: reqwest::Client::new(),
            api_key,
            base_url: self.base_url,
            image_model: self.image_model,
            speech_model: self.speech_model,
        })
    }
}

/// Generation client backed by the Gemini Developer API.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    image_model: String,
    speech_model: String,
}

impl GeminiClient {
    /// Creates a new [`GeminiClientBuilder`].
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn post_json<B: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        Ok(response.json().await?)
    }

    async fn generate_content(&self, model: &str, body: &ContentRequest) -> Result<ContentResponse> {
        let url = self.model_url(model, "generateContent");
        let response: ContentResponse = self.post_json(&url, body).await?;

        if let Some(ref feedback) = response.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(GenStudioError::ContentBlocked(msg));
            }
        }
        Ok(response)
    }

    async fn start_video(&self, request: &VeoRequest, high_quality: bool) -> Result<VideoOperation> {
        let model = VeoModel::for_quality(high_quality);
        let url = self.model_url(model.as_str(), "predictLongRunning");
        let operation: VeoOperationResponse = self.post_json(&url, request).await?;
        tracing::debug!(operation = %operation.name, model = model.as_str(), "submitted video generation request");
        operation.into_operation()
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_text(&self, prompt: &str, model: &str) -> Result<String> {
        let start = Instant::now();
        let response = self
            .generate_content(model, &ContentRequest::text(prompt))
            .await?;

        let text = response.text();
        if text.trim().is_empty() {
            return Err(GenStudioError::UnexpectedResponse(
                "No text in Gemini response".into(),
            ));
        }
        tracing::debug!(model, duration_ms = start.elapsed().as_millis() as u64, "text generated");
        Ok(text)
    }

    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String> {
        let url = self.model_url(&self.image_model, "predict");
        let body = ImagenRequest::new(prompt, aspect_ratio);
        let response: ImagenResponse = self.post_json(&url, &body).await?;

        response
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
            .ok_or_else(|| {
                GenStudioError::UnexpectedResponse("No image data in Imagen response".into())
            })
    }

    async fn generate_speech(&self, text: &str, voice: Option<&str>) -> Result<Option<String>> {
        let body = ContentRequest::speech(text, voice);
        let response = self.generate_content(&self.speech_model, &body).await?;
        Ok(response.first_inline_data())
    }

    async fn generate_video_from_prompt(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        high_quality: bool,
    ) -> Result<VideoOperation> {
        let request = VeoRequest::new(prompt, None, aspect_ratio);
        self.start_video(&request, high_quality).await
    }

    async fn generate_video_from_image(
        &self,
        prompt: &str,
        image_base64: &str,
        mime_type: &str,
        aspect_ratio: AspectRatio,
        high_quality: bool,
    ) -> Result<VideoOperation> {
        let image = VeoMediaData::new(image_base64, mime_type);
        let request = VeoRequest::new(prompt, Some(image), aspect_ratio);
        self.start_video(&request, high_quality).await
    }

    async fn poll_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation> {
        let url = format!("{}/v1beta/{}", self.base_url, operation.name);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let wire: VeoOperationResponse = response.json().await?;
        wire.into_operation()
    }

    async fn download_video(&self, uri: &str) -> Result<Vec<u8>> {
        if uri.starts_with("gs://") {
            return Err(GenStudioError::UnexpectedResponse(format!(
                "Veo returned a Google Cloud Storage URI ({}) which cannot be downloaded directly",
                uri
            )));
        }

        // The file endpoint wants the key as a query parameter as well
        let url = if uri.contains('?') {
            format!("{}&key={}", uri, self.api_key)
        } else {
            format!("{}?key={}", uri, self.api_key)
        };

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> GenStudioError {
    let text = sanitize_error_message(text);
    if text.contains(ENTITY_NOT_FOUND_MESSAGE) {
        return GenStudioError::EntityNotFound(text);
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return GenStudioError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return GenStudioError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return GenStudioError::ContentBlocked(text);
    }
    if status == 400 {
        return GenStudioError::InvalidRequest(text);
    }
    GenStudioError::Api {
        status,
        message: text,
    }
}

// ── generateContent wire format (text + speech) ─────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

impl ContentRequest {
    fn text(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: None,
        }
    }

    fn speech(text: &str, voice: Option<&str>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: text.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: voice.map(|name| SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: name.to_string(),
                        },
                    },
                }),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl ContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .take(1)
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    fn first_inline_data(&self) -> Option<String> {
        self.parts()
            .find_map(|p| p.inline_data.as_ref())
            .map(|d| d.data.clone())
            .filter(|d| !d.is_empty())
    }
}

// ── Imagen wire format ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Debug, Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
    aspect_ratio: String,
}

impl ImagenRequest {
    fn new(prompt: &str, aspect_ratio: AspectRatio) -> Self {
        Self {
            instances: vec![ImagenInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.as_str().to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
}

// ── Veo wire format ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Serialize)]
struct VeoInstance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<VeoMediaData>,
}

/// Inline media payload (`{"inlineData": {"mimeType": "...", "data": "..."}}`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoMediaData {
    inline_data: VeoInlineData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInlineData {
    mime_type: String,
    data: String,
}

impl VeoMediaData {
    fn new(b64: &str, mime: &str) -> Self {
        Self {
            inline_data: VeoInlineData {
                mime_type: mime.to_string(),
                data: b64.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: String,
    number_of_videos: u32,
}

impl VeoRequest {
    fn new(prompt: &str, image: Option<VeoMediaData>, aspect_ratio: AspectRatio) -> Self {
        Self {
            instances: vec![VeoInstance {
                prompt: prompt.to_string(),
                image,
            }],
            parameters: VeoParameters {
                aspect_ratio: aspect_ratio.for_video().as_str().to_string(),
                number_of_videos: 1,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct VeoOperationResponse {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<VeoVideoResponse>,
    #[serde(default)]
    error: Option<VeoError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoVideoResponse {
    #[serde(default)]
    generate_video_response: Option<VeoGenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VeoGenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<VeoGeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VeoGeneratedSample {
    #[serde(default)]
    video: Option<VeoVideo>,
}

#[derive(Debug, Deserialize)]
struct VeoVideo {
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VeoError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

impl VeoOperationResponse {
    /// Maps the REST operation onto the client-neutral handle.
    fn into_operation(self) -> Result<VideoOperation> {
        if let Some(err) = self.error {
            let message = err.message.unwrap_or_else(|| "Unknown error".into());
            let status = err.code.unwrap_or(500);
            return Err(if message.contains(ENTITY_NOT_FOUND_MESSAGE) {
                GenStudioError::EntityNotFound(message)
            } else {
                GenStudioError::Api { status, message }
            });
        }

        let done = self.done.unwrap_or(false);
        let generated = self.response.and_then(|r| r.generate_video_response);

        let response = match generated {
            Some(gen_resp) => {
                let samples = gen_resp.generated_samples.unwrap_or_default();
                if done && samples.is_empty() && gen_resp.rai_media_filtered_count.unwrap_or(0) > 0 {
                    return Err(GenStudioError::ContentBlocked(
                        "Video was filtered by Veo safety filters".into(),
                    ));
                }
                Some(VideoResponse {
                    generated_videos: samples
                        .into_iter()
                        .map(|s| GeneratedVideoEntry {
                            video: s.video.map(|v| VideoRef { uri: v.uri }),
                        })
                        .collect(),
                })
            }
            None => None,
        };

        Ok(VideoOperation {
            name: self.name,
            done,
            response,
        })
    }
}
