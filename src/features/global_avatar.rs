//! Talking-head avatars that speak a script in a chosen language.
//!
//! Non-English scripts are translated first; the avatar image then drives the
//! final image-to-video stage with the synthesized speech alongside.

use crate::client::AspectRatio;
use crate::features::{check_voice, require, resolve_voice, unexpected_stage, TEXT_MODEL};
use crate::job::{missing_input, Artifacts, JobError, StageCall, StageName, Workflow};
use crate::prompt::PromptComposer;

const SOURCE_LANGUAGE: &str = "English";

/// A talking-head video of a generated avatar speaking a script, optionally
/// translated first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAvatar {
    /// Who the avatar is.
    pub description: String,
    /// What the avatar says, in English.
    pub script: String,
    /// Spoken language.
    pub language: String,
    /// Prebuilt voice, or `None` for a random one.
    pub voice: Option<String>,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Render with the high quality video model.
    pub high_quality: bool,
}

impl Default for GlobalAvatar {
    fn default() -> Self {
        Self {
            description: String::new(),
            script: String::new(),
            language: SOURCE_LANGUAGE.to_string(),
            voice: None,
            aspect_ratio: AspectRatio::Landscape,
            high_quality: false,
        }
    }
}

impl GlobalAvatar {
    /// An English talking head.
    pub fn new(description: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            script: script.into(),
            ..Self::default()
        }
    }

    /// Sets the spoken language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// True when the script is spoken in a language other than English.
    pub fn needs_translation(&self) -> bool {
        let language = self.language.trim();
        !language.is_empty() && !language.eq_ignore_ascii_case(SOURCE_LANGUAGE)
    }

    /// Translation prompt.
    pub fn translation_prompt(&self) -> String {
        format!(
            "Translate the following text into {}. Reply with the translation only, \
             without quotes or commentary.\n\n{}",
            self.language.trim(),
            self.script.trim()
        )
    }

    /// Portrait prompt.
    pub fn avatar_prompt(&self) -> String {
        PromptComposer::new(format!(
            "A photorealistic head-and-shoulders portrait of {}",
            self.description.trim()
        ))
        .clause("facing the camera with a friendly expression")
        .clause("soft studio lighting, plain background")
        .build()
    }

    /// Video prompt for the words actually spoken.
    pub fn video_prompt(&self, spoken: &str) -> String {
        format!(
            "The person in the image talks directly to the camera with natural lip movement \
             and subtle head motion, saying: \"{}\"",
            spoken.trim()
        )
    }

    fn spoken_text<'a>(&'a self, artifacts: &'a Artifacts, stage: StageName) -> Result<&'a str, JobError> {
        if !self.needs_translation() {
            return Ok(self.script.trim());
        }
        artifacts
            .text(StageName::Translation)
            .ok_or_else(|| missing_input(stage, StageName::Translation))
    }
}

impl Workflow for GlobalAvatar {
    fn name(&self) -> &'static str {
        "global_avatar"
    }

    fn validate(&self) -> Result<(), JobError> {
        require(&self.description, "Please describe your avatar.")?;
        require(&self.script, "Please enter a script.")?;
        check_voice(self.voice.as_deref())
    }

    fn stages(&self) -> Vec<StageName> {
        let mut stages = Vec::with_capacity(4);
        if self.needs_translation() {
            stages.push(StageName::Translation);
        }
        stages.extend([StageName::Avatar, StageName::Audio, StageName::Video]);
        stages
    }

    fn stage_call(&self, stage: StageName, artifacts: &Artifacts) -> Result<StageCall, JobError> {
        match stage {
            StageName::Translation => Ok(StageCall::Text {
                prompt: self.translation_prompt(),
                model: TEXT_MODEL.to_string(),
            }),
            StageName::Avatar => Ok(StageCall::Image {
                prompt: self.avatar_prompt(),
                aspect_ratio: self.aspect_ratio,
            }),
            StageName::Audio => Ok(StageCall::Speech {
                text: self.spoken_text(artifacts, stage)?.to_string(),
                voice: Some(resolve_voice(self.voice.as_deref())),
            }),
            StageName::Video => {
                let (image, mime_type) = artifacts
                    .image(StageName::Avatar)
                    .ok_or_else(|| missing_input(stage, StageName::Avatar))?;
                Ok(StageCall::VideoFromImage {
                    prompt: self.video_prompt(self.spoken_text(artifacts, stage)?),
                    image_base64: image.to_string(),
                    mime_type: mime_type.to_string(),
                    aspect_ratio: self.aspect_ratio,
                    high_quality: self.high_quality,
                })
            }
            other => Err(unexpected_stage(self.name(), other)),
        }
    }
}
