//! Presentation helpers.
//!
//! Turns snapshots into the strings a front end shows. Nothing here owns a
//! timer or a media handle.

use crate::job::{Artifact, JobError, JobErrorKind, JobSnapshot, JobState, StageName};
use std::fmt::Write as _;

/// Loading label for a running stage.
pub fn running_label(stage: StageName) -> &'static str {
    match stage {
        StageName::Translation => "Translating your script...",
        StageName::Joke => "Writing your jokes...",
        StageName::Concept => "Composing your song...",
        StageName::Avatar => "Creating your avatar...",
        StageName::Cover => "Designing the cover art...",
        StageName::Audio => "Recording the voice...",
        StageName::Video => "Generating the video. This can take a few minutes...",
    }
}

/// Human-readable label for any job state.
pub fn stage_label(state: &JobState) -> &'static str {
    match state {
        JobState::Idle => "Ready",
        JobState::Running(stage) => running_label(*stage),
        JobState::Done => "Done!",
        JobState::Error => "Something went wrong",
    }
}

/// User-facing text for a job error.
pub fn error_message(error: &JobError) -> String {
    match error.kind {
        JobErrorKind::Validation => error.message.clone(),
        JobErrorKind::Credential => "Your API key was not accepted. Please select a key \
             from a project with billing enabled and try again."
            .to_string(),
        JobErrorKind::Transport => "The generation service failed. Please try again.".to_string(),
        JobErrorKind::EmptyResult => {
            "Generation finished but produced no output. Please try again.".to_string()
        }
    }
}

/// Multi-line status text for a snapshot.
pub fn render(snapshot: &JobSnapshot) -> String {
    let mut out = String::new();
    let state = snapshot.state();
    let _ = writeln!(out, "{}", stage_label(&state));

    if let Some(message) = &snapshot.loading_message {
        let _ = writeln!(out, "  {message}");
    }
    if let Some(error) = snapshot.error() {
        let _ = writeln!(out, "  {}", error_message(error));
    }
    if state == JobState::Done {
        for (stage, artifact) in snapshot.artifacts().iter() {
            let _ = match artifact {
                Artifact::Text { text } => writeln!(out, "  [{stage}] {}", first_line(text)),
                other => match other.media() {
                    Some(media) => writeln!(
                        out,
                        "  [{stage}] {} ({}, {} bytes)",
                        media.url(),
                        media.mime_type(),
                        media.size()
                    ),
                    None => Ok(()),
                },
            };
        }
    }
    out
}

fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}
