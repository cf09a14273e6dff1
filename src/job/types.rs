//! Job, stage and artifact types.

use crate::client::AspectRatio;
use crate::job::error::JobError;
use crate::media::MediaHandle;
use crate::share::{ShareContentType, SharePayload};
use serde::Serialize;
use std::sync::Arc;

/// A named step of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    /// Script translated into the target language.
    Translation,
    /// Stand-up material written for the set.
    Joke,
    /// Song concept (title, lyrics, arrangement notes).
    Concept,
    /// Character portrait.
    Avatar,
    /// Cover art.
    Cover,
    /// Synthesized speech.
    Audio,
    /// Rendered video.
    Video,
}

impl StageName {
    /// Lowercase identifier used in logs and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Joke => "joke",
            Self::Concept => "concept",
            Self::Avatar => "avatar",
            Self::Cover => "cover",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "lowercase")]
pub enum JobState {
    /// Nothing submitted yet, or the job was torn down.
    #[default]
    Idle,
    /// The given stage is executing.
    Running(StageName),
    /// Every stage produced its artifact.
    Done,
    /// The job stopped on an error.
    Error,
}

impl JobState {
    /// True for `Done` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// The running stage, if any.
    pub fn stage(&self) -> Option<StageName> {
        match self {
            Self::Running(stage) => Some(*stage),
            _ => None,
        }
    }
}

/// Output of a completed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Artifact {
    /// Generated text.
    Text {
        /// The text.
        text: String,
    },
    /// Generated image, kept base64-encoded for follow-up image-to-video calls.
    Image {
        /// Image bytes as returned by the service, shared between snapshots.
        #[serde(skip)]
        base64: Arc<str>,
        /// Detected MIME type.
        mime_type: String,
        /// Local media handle.
        media: MediaHandle,
    },
    /// Speech packaged as WAV.
    Audio {
        /// Local media handle.
        media: MediaHandle,
    },
    /// Downloaded video.
    Video {
        /// Local media handle.
        media: MediaHandle,
    },
}

impl Artifact {
    /// The media handle for binary artifacts.
    pub fn media(&self) -> Option<&MediaHandle> {
        match self {
            Self::Text { .. } => None,
            Self::Image { media, .. } | Self::Audio { media } | Self::Video { media } => {
                Some(media)
            }
        }
    }

    /// The text for text artifacts.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Artifacts of one job in stage order. Entries are never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Artifacts {
    entries: Vec<(StageName, Artifact)>,
}

impl Artifacts {
    /// Returns the artifact a stage produced.
    pub fn get(&self, stage: StageName) -> Option<&Artifact> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, a)| a)
    }

    /// Returns the text a stage produced.
    pub fn text(&self, stage: StageName) -> Option<&str> {
        self.get(stage).and_then(Artifact::text)
    }

    /// Returns `(base64, mime_type)` of an image stage.
    pub fn image(&self, stage: StageName) -> Option<(&str, &str)> {
        match self.get(stage)? {
            Artifact::Image {
                base64, mime_type, ..
            } => Some((&**base64, mime_type.as_str())),
            _ => None,
        }
    }

    /// True when `stage` already has an artifact.
    pub fn contains(&self, stage: StageName) -> bool {
        self.get(stage).is_some()
    }

    /// Iterates artifacts in the order they were produced.
    pub fn iter(&self) -> impl Iterator<Item = (StageName, &Artifact)> {
        self.entries.iter().map(|(s, a)| (*s, a))
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no artifact is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores an artifact. Returns false (and stores nothing) if the stage already has one.
    pub(crate) fn insert(&mut self, stage: StageName, artifact: Artifact) -> bool {
        if self.contains(stage) {
            return false;
        }
        self.entries.push((stage, artifact));
        true
    }

    /// Empties the map, returning the media handles it owned.
    pub(crate) fn drain_media(&mut self) -> Vec<MediaHandle> {
        self.entries
            .drain(..)
            .filter_map(|(_, a)| a.media().cloned())
            .collect()
    }
}

/// One user-initiated generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationJob {
    /// Monotonic submission counter; later jobs have larger values.
    pub generation: u64,
    /// Workflow that produced the job.
    pub workflow: &'static str,
    /// Declared stages, executed strictly in order.
    pub stages: Vec<StageName>,
    /// Current lifecycle state.
    pub state: JobState,
    /// Stored stage outputs.
    pub artifacts: Artifacts,
    /// Terminal error, if the job failed.
    pub error: Option<JobError>,
}

/// Read-only view of the current job handed to presentation code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    /// The job.
    pub job: GenerationJob,
    /// Cosmetic message shown while a video renders.
    pub loading_message: Option<String>,
}

impl JobSnapshot {
    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        self.job.state
    }

    /// Terminal error, if any.
    pub fn error(&self) -> Option<&JobError> {
        self.job.error.as_ref()
    }

    /// Stored artifacts.
    pub fn artifacts(&self) -> &Artifacts {
        &self.job.artifacts
    }

    /// Share payload for the job's primary artifact (video, then image, then text).
    ///
    /// Only finished jobs are shareable.
    pub fn share_payload(&self) -> Option<SharePayload> {
        if self.job.state != JobState::Done {
            return None;
        }
        let artifacts = self.artifacts();

        if let Some(Artifact::Video { media }) = last_matching(artifacts, |a| matches!(a, Artifact::Video { .. })) {
            return Some(SharePayload::media(media.url(), ShareContentType::Video));
        }
        if let Some(Artifact::Image { media, .. }) = last_matching(artifacts, |a| matches!(a, Artifact::Image { .. })) {
            return Some(SharePayload::media(media.url(), ShareContentType::Image));
        }
        last_matching(artifacts, |a| matches!(a, Artifact::Text { .. }))
            .and_then(Artifact::text)
            .map(SharePayload::text)
    }
}

fn last_matching(artifacts: &Artifacts, want: fn(&Artifact) -> bool) -> Option<&Artifact> {
    artifacts.iter().map(|(_, a)| a).filter(|a| want(a)).last()
}

/// The adapter request a stage issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageCall {
    /// Text generation.
    Text {
        /// Prompt.
        prompt: String,
        /// Model identifier.
        model: String,
    },
    /// Image generation.
    Image {
        /// Prompt.
        prompt: String,
        /// Output aspect ratio.
        aspect_ratio: AspectRatio,
    },
    /// Speech synthesis.
    Speech {
        /// Text to speak.
        text: String,
        /// Prebuilt voice name.
        voice: Option<String>,
    },
    /// Text-to-video.
    VideoFromPrompt {
        /// Prompt.
        prompt: String,
        /// Output aspect ratio.
        aspect_ratio: AspectRatio,
        /// Use the high quality model.
        high_quality: bool,
    },
    /// Image-to-video.
    VideoFromImage {
        /// Prompt.
        prompt: String,
        /// First frame, base64.
        image_base64: String,
        /// MIME type of the first frame.
        mime_type: String,
        /// Output aspect ratio.
        aspect_ratio: AspectRatio,
        /// Use the high quality model.
        high_quality: bool,
    },
}

impl StageCall {
    /// True for calls answered with a pollable operation.
    pub fn is_video(&self) -> bool {
        matches!(self, Self::VideoFromPrompt { .. } | Self::VideoFromImage { .. })
    }
}
