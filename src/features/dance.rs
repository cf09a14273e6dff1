//! Dance clips generated directly from a text prompt.

use crate::client::AspectRatio;
use crate::features::{require, unexpected_stage};
use crate::job::{Artifacts, JobError, StageCall, StageName, Workflow};
use crate::prompt::PromptComposer;

/// A short dance clip generated straight from a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dance {
    /// Who is dancing.
    pub performer: String,
    /// Dance style, or "Any".
    pub dance_style: String,
    /// Music genre the moves follow, or "Any".
    pub music_genre: String,
    /// Location, or "Any".
    pub setting: String,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Render with the high quality video model.
    pub high_quality: bool,
}

impl Dance {
    /// A dance video of `performer` with no further preferences.
    pub fn new(performer: impl Into<String>) -> Self {
        Self {
            performer: performer.into(),
            aspect_ratio: AspectRatio::Portrait,
            ..Self::default()
        }
    }

    /// Sets the dance style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.dance_style = style.into();
        self
    }

    /// Sets the music genre.
    pub fn with_music(mut self, genre: impl Into<String>) -> Self {
        self.music_genre = genre.into();
        self
    }

    /// Sets the location.
    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = setting.into();
        self
    }

    /// Video prompt.
    pub fn build_prompt(&self) -> String {
        PromptComposer::new(format!("{} dancing energetically", self.performer.trim()))
            .option(&self.dance_style, |s| format!("performing {s} moves"))
            .option(&self.music_genre, |g| format!("in rhythm with {g} music"))
            .option(&self.setting, |s| format!("in {s}"))
            .clause("full body shot, dynamic camera, smooth motion")
            .build()
    }
}

impl Workflow for Dance {
    fn name(&self) -> &'static str {
        "dance"
    }

    fn validate(&self) -> Result<(), JobError> {
        require(&self.performer, "Please describe who is dancing.")
    }

    fn stages(&self) -> Vec<StageName> {
        vec![StageName::Video]
    }

    fn stage_call(&self, stage: StageName, _artifacts: &Artifacts) -> Result<StageCall, JobError> {
        match stage {
            StageName::Video => Ok(StageCall::VideoFromPrompt {
                prompt: self.build_prompt(),
                aspect_ratio: self.aspect_ratio,
                high_quality: self.high_quality,
            }),
            other => Err(unexpected_stage(self.name(), other)),
        }
    }
}
