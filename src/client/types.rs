//! Request and response shapes shared by every generation client.

use serde::{Deserialize, Serialize};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Aspect ratios accepted by the image and video endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square.
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape.
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard landscape.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait.
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }

    /// Video models only render landscape or portrait; everything else maps to the nearer one.
    pub fn for_video(&self) -> Self {
        match self {
            Self::Portrait | Self::StandardPortrait => Self::Portrait,
            _ => Self::Landscape,
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle to an in-flight asynchronous video generation.
///
/// The `name` is opaque and is re-submitted on every poll. Once `done` is
/// set, `response` carries the generated videos, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOperation {
    /// Operation token issued by the service.
    pub name: String,
    /// Whether the service has finished the operation.
    #[serde(default)]
    pub done: bool,
    /// Generated output, present once `done` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<VideoResponse>,
}

impl VideoOperation {
    /// Creates a pending operation handle.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            response: None,
        }
    }

    /// Creates a finished operation handle with the given video URI.
    pub fn finished(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            response: Some(VideoResponse {
                generated_videos: vec![GeneratedVideoEntry {
                    video: Some(VideoRef {
                        uri: Some(uri.into()),
                    }),
                }],
            }),
        }
    }

    /// Creates a finished operation handle that carries no output.
    pub fn finished_empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            response: None,
        }
    }

    /// Returns the URI of the first generated video, if any.
    pub fn result_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generated_videos
            .iter()
            .find_map(|entry| entry.video.as_ref()?.uri.as_deref())
    }
}

/// Output of a finished video operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    /// Generated videos, first one wins.
    #[serde(default)]
    pub generated_videos: Vec<GeneratedVideoEntry>,
}

/// One generated video.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneratedVideoEntry {
    /// Reference to the video file.
    #[serde(default)]
    pub video: Option<VideoRef>,
}

/// Location of a generated video file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoRef {
    /// Download URI.
    #[serde(default)]
    pub uri: Option<String>,
}
