//! Stand-up bits: a written joke, a comedian portrait, the joke spoken aloud
//! and a performance video.

use crate::client::AspectRatio;
use crate::features::{check_voice, require, resolve_voice, unexpected_stage, TEXT_MODEL};
use crate::job::{missing_input, Artifacts, JobError, StageCall, StageName, Workflow};
use crate::prompt::PromptComposer;

/// A generated comedian performing a generated bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandUp {
    /// What the bit is about.
    pub topic: String,
    /// What the comedian looks like.
    pub comedian: String,
    /// Comedy style, or "Any".
    pub style: String,
    /// Prebuilt voice, or `None` for a random one.
    pub voice: Option<String>,
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Render with the high quality video model.
    pub high_quality: bool,
}

impl Default for StandUp {
    fn default() -> Self {
        Self {
            topic: String::new(),
            comedian: String::new(),
            style: String::new(),
            voice: None,
            aspect_ratio: AspectRatio::Landscape,
            high_quality: false,
        }
    }
}

impl StandUp {
    /// A set about `topic` performed by `comedian`.
    pub fn new(topic: impl Into<String>, comedian: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            comedian: comedian.into(),
            ..Self::default()
        }
    }

    /// Sets the comedy style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Sets the voice.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Joke-writing prompt.
    pub fn joke_prompt(&self) -> String {
        let base = PromptComposer::new(format!(
            "Write a short stand-up comedy bit about {}",
            self.topic.trim()
        ))
        .option(&self.style, |s| format!("in a {s} style"))
        .clause("about 60 words long")
        .build();
        format!("{base}. Reply with the spoken lines only, no stage directions.")
    }

    /// Comedian portrait prompt.
    pub fn avatar_prompt(&self) -> String {
        PromptComposer::new(format!(
            "A stand-up comedian on a comedy club stage, {}",
            self.comedian.trim()
        ))
        .clause("holding a microphone under a spotlight")
        .clause("brick wall background, photorealistic")
        .build()
    }

    /// Performance prompt.
    pub fn video_prompt(&self, joke: &str) -> String {
        format!(
            "The comedian in the image performs on stage with expressive gestures and \
             comic timing, delivering: \"{}\"",
            joke.trim()
        )
    }

    fn joke<'a>(&self, artifacts: &'a Artifacts, stage: StageName) -> Result<&'a str, JobError> {
        artifacts
            .text(StageName::Joke)
            .ok_or_else(|| missing_input(stage, StageName::Joke))
    }
}

impl Workflow for StandUp {
    fn name(&self) -> &'static str {
        "standup"
    }

    fn validate(&self) -> Result<(), JobError> {
        require(&self.topic, "Please enter a topic for the set.")?;
        require(&self.comedian, "Please describe the comedian.")?;
        check_voice(self.voice.as_deref())
    }

    fn stages(&self) -> Vec<StageName> {
        vec![
            StageName::Joke,
            StageName::Avatar,
            StageName::Audio,
            StageName::Video,
        ]
    }

    fn stage_call(&self, stage: StageName, artifacts: &Artifacts) -> Result<StageCall, JobError> {
        match stage {
            StageName::Joke => Ok(StageCall::Text {
                prompt: self.joke_prompt(),
                model: TEXT_MODEL.to_string(),
            }),
            StageName::Avatar => Ok(StageCall::Image {
                prompt: self.avatar_prompt(),
                aspect_ratio: self.aspect_ratio,
            }),
            StageName::Audio => Ok(StageCall::Speech {
                text: self.joke(artifacts, stage)?.to_string(),
                voice: Some(resolve_voice(self.voice.as_deref())),
            }),
            StageName::Video => {
                let (image, mime_type) = artifacts
                    .image(StageName::Avatar)
                    .ok_or_else(|| missing_input(stage, StageName::Avatar))?;
                Ok(StageCall::VideoFromImage {
                    prompt: self.video_prompt(self.joke(artifacts, stage)?),
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
