//! Share payloads handed to an external share handler.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of content being shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareContentType {
    /// A generated image.
    Image,
    /// A generated video.
    Video,
    /// Generated text.
    Text,
}

/// Payload emitted to a share handler once a job completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    /// Address of the shared media, for image and video content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    /// Text body, for text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    /// What is being shared.
    pub content_type: ShareContentType,
}

impl SharePayload {
    /// Payload for a media resource.
    pub fn media(url: impl Into<String>, content_type: ShareContentType) -> Self {
        Self {
            content_url: Some(url.into()),
            content_text: None,
            content_type,
        }
    }

    /// Payload for text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_url: None,
            content_text: Some(text.into()),
            content_type: ShareContentType::Text,
        }
    }
}

/// External collaborator that publishes share payloads.
#[async_trait]
pub trait ShareHandler: Send + Sync {
    /// Shares the payload.
    async fn share(&self, payload: SharePayload) -> crate::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = SharePayload::media("blob:genstudio/1", ShareContentType::Video);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["contentUrl"], "blob:genstudio/1");
        assert_eq!(json["contentType"], "video");
        assert!(json.get("contentText").is_none());

        let json = serde_json::to_value(SharePayload::text("la la la")).unwrap();
        assert_eq!(json["contentText"], "la la la");
        assert_eq!(json["contentType"], "text");
        assert!(json.get("contentUrl").is_none());
    }
}
