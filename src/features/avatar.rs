//! Single-image avatar generation.

use crate::client::AspectRatio;
use crate::features::{require, unexpected_stage};
use crate::job::{Artifacts, JobError, StageCall, StageName, Workflow};
use crate::prompt::PromptComposer;

/// Character portrait from a free-form description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Avatar {
    /// Who or what to draw.
    pub description: String,
    /// Art style, or "Any".
    pub style: String,
    /// Background, or "Any".
    pub background: String,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
}

impl Avatar {
    /// An avatar with no style preferences.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            aspect_ratio: AspectRatio::Square,
            ..Self::default()
        }
    }

    /// Sets the art style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Sets the background.
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Image prompt.
    pub fn build_prompt(&self) -> String {
        PromptComposer::new(format!("A character portrait of {}", self.description.trim()))
            .option(&self.style, |s| format!("in {s} style"))
            .option(&self.background, |b| format!("with a {b} background"))
            .clause("centered composition, highly detailed")
            .build()
    }
}

impl Workflow for Avatar {
    fn name(&self) -> &'static str {
        "avatar"
    }

    fn validate(&self) -> Result<(), JobError> {
        require(&self.description, "Please describe your avatar.")
    }

    fn stages(&self) -> Vec<StageName> {
        vec![StageName::Avatar]
    }

    fn stage_call(&self, stage: StageName, _artifacts: &Artifacts) -> Result<StageCall, JobError> {
        match stage {
            StageName::Avatar => Ok(StageCall::Image {
                prompt: self.build_prompt(),
                aspect_ratio: self.aspect_ratio,
            }),
            other => Err(unexpected_stage(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobErrorKind;

    #[test]
    fn test_prompt_skips_any() {
        let avatar = Avatar::new("a red fox wizard").with_style("Any");
        assert_eq!(
            avatar.build_prompt(),
            "A character portrait of a red fox wizard, centered composition, highly detailed"
        );
    }

    #[test]
    fn test_prompt_with_options() {
        let avatar = Avatar::new("a red fox wizard")
            .with_style("pixel art")
            .with_background("starry night");
        let prompt = avatar.build_prompt();
        assert!(prompt.contains("in pixel art style"));
        assert!(prompt.contains("with a starry night background"));
    }

    #[test]
    fn test_validation() {
        let err = Avatar::new("   ").validate().unwrap_err();
        assert_eq!(err.kind, JobErrorKind::Validation);
        assert!(Avatar::new("a robot").validate().is_ok());
    }

    #[test]
    fn test_single_image_stage() {
        let avatar = Avatar::new("a robot");
        assert_eq!(avatar.stages(), vec![StageName::Avatar]);
        let call = avatar.stage_call(StageName::Avatar, &Artifacts::default()).unwrap();
        assert!(matches!(call, StageCall::Image { aspect_ratio: AspectRatio::Square, .. }));
        assert!(avatar.stage_call(StageName::Video, &Artifacts::default()).is_err());
    }
}
