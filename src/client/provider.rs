//! Generation client trait.

use crate::client::types::{AspectRatio, VideoOperation};
use crate::error::Result;
use async_trait::async_trait;

/// The hosted generation service as seen by the job orchestrator.
///
/// Binary payloads cross this boundary base64-encoded, the way the service
/// returns them. Any method may fail with an error for which
/// [`GenStudioError::is_entity_not_found`](crate::GenStudioError::is_entity_not_found)
/// holds; callers treat that as a credential problem.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generates text for a prompt with the given model.
    async fn generate_text(&self, prompt: &str, model: &str) -> Result<String>;

    /// Generates an image and returns it base64-encoded.
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String>;

    /// Synthesizes speech and returns base64 16-bit PCM.
    ///
    /// `Ok(None)` means the service answered without audio. That is not an error here.
    async fn generate_speech(&self, text: &str, voice: Option<&str>) -> Result<Option<String>>;

    /// Starts a text-to-video operation.
    async fn generate_video_from_prompt(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        high_quality: bool,
    ) -> Result<VideoOperation>;

    /// Starts an image-to-video operation using the image as first frame.
    async fn generate_video_from_image(
        &self,
        prompt: &str,
        image_base64: &str,
        mime_type: &str,
        aspect_ratio: AspectRatio,
        high_quality: bool,
    ) -> Result<VideoOperation>;

    /// Re-queries an operation and returns its updated state.
    async fn poll_video_operation(&self, operation: &VideoOperation) -> Result<VideoOperation>;

    /// Downloads the bytes of a finished video.
    async fn download_video(&self, uri: &str) -> Result<Vec<u8>>;
}
