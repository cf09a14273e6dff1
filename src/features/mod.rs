//! Feature workflows.
//!
//! Each feature is a form struct that validates itself, builds its prompts and
//! declares its stages by implementing [`Workflow`](crate::job::Workflow).

mod avatar;
mod dance;
mod global_avatar;
mod song;
mod standup;

pub use avatar::Avatar;
pub use dance::Dance;
pub use global_avatar::GlobalAvatar;
pub use song::SongConcept;
pub use standup::StandUp;

use crate::job::{JobError, JobErrorKind, StageName};
use crate::prompt::is_set;
use rand::seq::SliceRandom;

/// Model used for text stages.
pub const TEXT_MODEL: &str = "gemini-2.5-flash";

/// Prebuilt speech voices.
pub const VOICES: &[&str] = &["Kore", "Puck", "Charon", "Fenrir", "Zephyr"];

/// A uniformly random voice from [`VOICES`].
pub fn random_voice() -> &'static str {
    VOICES.choose(&mut rand::thread_rng()).copied().unwrap_or("Kore")
}

fn known_voice(name: &str) -> Option<&'static str> {
    VOICES
        .iter()
        .copied()
        .find(|v| v.eq_ignore_ascii_case(name.trim()))
}

/// The requested voice spelled as in [`VOICES`], or a random one when none was requested.
pub(crate) fn resolve_voice(requested: Option<&str>) -> String {
    match requested.filter(|v| is_set(v)) {
        Some(voice) => known_voice(voice).unwrap_or(voice.trim()).to_string(),
        None => random_voice().to_string(),
    }
}

pub(crate) fn require(value: &str, message: &str) -> Result<(), JobError> {
    if value.trim().is_empty() {
        Err(JobError::validation(message))
    } else {
        Ok(())
    }
}

pub(crate) fn check_voice(requested: Option<&str>) -> Result<(), JobError> {
    match requested.filter(|v| is_set(v)) {
        Some(voice) if known_voice(voice).is_none() => Err(
            JobError::validation(format!("Unknown voice \"{}\".", voice.trim())),
        ),
        _ => Ok(()),
    }
}

pub(crate) fn unexpected_stage(workflow: &str, stage: StageName) -> JobError {
    JobError::new(
        JobErrorKind::Transport,
        format!("{workflow} workflow has no {stage} stage"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_voice_is_from_list() {
        for _ in 0..50 {
            assert!(VOICES.contains(&random_voice()));
        }
    }

    #[test]
    fn test_resolve_voice() {
        assert_eq!(resolve_voice(Some("Puck")), "Puck");
        assert_eq!(resolve_voice(Some(" zephyr ")), "Zephyr");
        assert!(VOICES.contains(&resolve_voice(Some("Any")).as_str()));
        assert!(VOICES.contains(&resolve_voice(None).as_str()));
    }

    #[test]
    fn test_check_voice() {
        assert!(check_voice(None).is_ok());
        assert!(check_voice(Some("zephyr")).is_ok());
        let err = check_voice(Some("Bob")).unwrap_err();
        assert_eq!(err.kind, JobErrorKind::Validation);
    }
}
