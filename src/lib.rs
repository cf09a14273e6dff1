#![warn(missing_docs)]
//! GenStudio - multi-stage generative media jobs (text, image, speech, video).
//!
//! Feature workflows compose calls to a hosted generation service into jobs.
//! The [`JobOrchestrator`] runs a job's stages strictly in order, polls video
//! operations, cycles loading messages and releases every timer and media
//! handle when the job completes, fails, is superseded or is torn down.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use genstudio::{features::GlobalAvatar, GeminiClient, JobOrchestrator, JobState};
//!
//! #[tokio::main]
//! async fn main() -> genstudio::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let orchestrator = JobOrchestrator::builder(Arc::new(client)).build();
//!     let mut updates = orchestrator.subscribe();
//!
//!     orchestrator
//!         .submit(GlobalAvatar::new("a friendly robot", "hello").with_language("Spanish"))
//!         .await;
//!     let state = updates
//!         .wait_for(|s| s.state().is_terminal())
//!         .await
//!         .map(|s| s.state());
//!     assert_eq!(state.ok(), Some(JobState::Done));
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini` (default): HTTP client for the Gemini, Imagen and Veo endpoints
//! - `cli`: Command-line interface

mod error;

pub mod client;
pub mod config;
pub mod credential;
pub mod features;
pub mod job;
pub mod media;
pub mod prompt;
pub mod share;
pub mod shell;

// Re-export error types at crate root
pub use error::{GenStudioError, Result};

pub use client::{AspectRatio, GenerationClient, ImageFormat, VideoOperation};
pub use config::OrchestratorConfig;
pub use credential::CredentialGate;
pub use job::{
    Artifact, Artifacts, JobError, JobErrorKind, JobOrchestrator, JobSnapshot, JobState, StageName,
    Workflow,
};
pub use media::{InMemoryMediaRegistry, MediaHandle, MediaRegistry};
pub use share::{ShareContentType, ShareHandler, SharePayload};

#[cfg(feature = "gemini")]
pub use client::providers::{GeminiClient, GeminiClientBuilder, VeoModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::GenerationClient;
    pub use crate::error::{GenStudioError, Result};
    pub use crate::features::{Avatar, Dance, GlobalAvatar, SongConcept, StandUp};
    pub use crate::job::{JobOrchestrator, JobSnapshot, JobState, Workflow};
    pub use crate::media::{InMemoryMediaRegistry, MediaRegistry};

    #[cfg(feature = "gemini")]
    pub use crate::client::providers::GeminiClient;
}
