//! Generation jobs and the orchestrator that drives them.
//!
//! A job is an ordered list of stages declared by a [`Workflow`]. The
//! [`JobOrchestrator`] runs them one at a time against a
//! [`GenerationClient`](crate::client::GenerationClient), polls video
//! operations on a fixed period and publishes a [`JobSnapshot`] after every
//! state change.

mod error;
mod messages;
mod orchestrator;
mod task;
mod types;
mod workflow;

pub use error::{JobError, JobErrorKind};
pub use messages::LoadingMessageCycle;
pub use orchestrator::{JobOrchestrator, JobOrchestratorBuilder};
pub use task::ScheduledTask;
pub use types::{Artifact, Artifacts, GenerationJob, JobSnapshot, JobState, StageCall, StageName};
pub use workflow::Workflow;

pub(crate) use workflow::missing_input;
