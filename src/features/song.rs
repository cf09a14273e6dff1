//! Song concepts: lyrics and title from the text model, then cover art.

use crate::client::AspectRatio;
use crate::features::{require, unexpected_stage, TEXT_MODEL};
use crate::job::{missing_input, Artifacts, JobError, StageCall, StageName, Workflow};
use crate::prompt::PromptComposer;

/// A song concept (title, lyrics, arrangement notes) plus cover art.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongConcept {
    /// What the song is about.
    pub theme: String,
    /// Genre, or "Any".
    pub genre: String,
    /// Mood, or "Any".
    pub mood: String,
}

impl SongConcept {
    /// A concept for `theme` with no genre or mood preference.
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            ..Self::default()
        }
    }

    /// Sets the genre.
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    /// Sets the mood.
    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = mood.into();
        self
    }

    /// Concept prompt.
    pub fn concept_prompt(&self) -> String {
        let base = PromptComposer::new(format!("Write a song about {}", self.theme.trim()))
            .option(&self.genre, |g| format!("in the {g} genre"))
            .option(&self.mood, |m| format!("with a {m} mood"))
            .build();
        format!(
            "{base}. Start with the title on its own line, then the lyrics with verse and \
             chorus labels, then two sentences of arrangement notes."
        )
    }

    /// Cover art prompt for a finished concept.
    pub fn cover_prompt(&self, concept: &str) -> String {
        PromptComposer::new(format!(
            "Album cover art for a song titled \"{}\"",
            song_title(concept)
        ))
        .clause(format!("about {}", self.theme.trim()))
        .option(&self.genre, |g| format!("{g} aesthetic"))
        .option(&self.mood, |m| format!("{m} atmosphere"))
        .clause("no text or lettering")
        .build()
    }
}

/// First non-empty line of a concept, without markdown or a "Title:" label.
fn song_title(concept: &str) -> &str {
    let line = concept
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("Untitled");
    let line = line.trim_matches(|c| c == '#' || c == '*' || c == '"').trim();
    line.strip_prefix("Title:")
        .map(str::trim)
        .unwrap_or(line)
}

impl Workflow for SongConcept {
    fn name(&self) -> &'static str {
        "song"
    }

    fn validate(&self) -> Result<(), JobError> {
        require(&self.theme, "Please enter a theme for your song.")
    }

    fn stages(&self) -> Vec<StageName> {
        vec![StageName::Concept, StageName::Cover]
    }

    fn stage_call(&self, stage: StageName, artifacts: &Artifacts) -> Result<StageCall, JobError> {
        match stage {
            StageName::Concept => Ok(StageCall::Text {
                prompt: self.concept_prompt(),
                model: TEXT_MODEL.to_string(),
            }),
            StageName::Cover => {
                let concept = artifacts
                    .text(StageName::Concept)
                    .ok_or_else(|| missing_input(stage, StageName::Concept))?;
                Ok(StageCall::Image {
                    prompt: self.cover_prompt(concept),
                    aspect_ratio: AspectRatio::Square,
                })
            }
            other => Err(unexpected_stage(self.name(), other)),
        }
    }
}
