//! API key readiness gate supplied by the host environment.

use async_trait::async_trait;

/// Host capability for checking and (re)selecting the API key.
///
/// Optional: an orchestrator built without a gate assumes a key is ready.
#[async_trait]
pub trait CredentialGate: Send + Sync {
    /// Returns true when the host already has a key selected.
    async fn has_selected_api_key(&self) -> bool;

    /// Opens the host's key selection flow.
    async fn open_select_key(&self);
}
