//! Workflow trait: what a feature plugs into the orchestrator.

use crate::job::error::JobError;
use crate::job::types::{Artifacts, StageCall, StageName};

/// A feature's stage plan.
///
/// The orchestrator validates the workflow, then for each declared stage asks
/// for the adapter call to make, handing over the artifacts of the earlier
/// stages. Implementations are pure: no I/O, no clocks.
pub trait Workflow: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Checks required fields. Runs before any stage.
    fn validate(&self) -> Result<(), JobError>;

    /// Stages in execution order.
    fn stages(&self) -> Vec<StageName>;

    /// The adapter call for `stage`, given the artifacts stored so far.
    fn stage_call(&self, stage: StageName, artifacts: &Artifacts) -> Result<StageCall, JobError>;
}

/// Error for a stage whose input artifact is missing.
pub(crate) fn missing_input(stage: StageName, needs: StageName) -> JobError {
    JobError::empty_result(format!("{stage} stage needs the {needs} output, which is missing"))
}
