//! Classified job failures.

use crate::error::GenStudioError;
use serde::Serialize;

/// Why a job stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// A required field was missing. Raised before any service call.
    Validation,
    /// The service did not accept the API key (unknown or unbilled project).
    Credential,
    /// Any other service or network failure.
    Transport,
    /// A stage finished without producing anything usable.
    EmptyResult,
}

/// Terminal error of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct JobError {
    /// Classification.
    pub kind: JobErrorKind,
    /// Diagnostic detail.
    pub message: String,
}

impl JobError {
    /// Creates an error of the given kind.
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A missing or invalid form field.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Validation, message)
    }

    /// A stage that completed without output.
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::EmptyResult, message)
    }

    /// A generic service failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Transport, message)
    }

    /// Classifies a service error: "entity not found" is a credential problem,
    /// everything else is transport.
    pub fn classify(err: &GenStudioError) -> Self {
        let kind = if err.is_entity_not_found() {
            JobErrorKind::Credential
        } else {
            JobErrorKind::Transport
        };
        Self::new(kind, err.to_string())
    }
}

impl From<GenStudioError> for JobError {
    fn from(err: GenStudioError) -> Self {
        Self::classify(&err)
    }
}
