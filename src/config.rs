//! Orchestrator timing configuration.

use std::time::Duration;

/// Default period between video status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Default period between loading message changes.
pub const DEFAULT_MESSAGE_INTERVAL: Duration = Duration::from_secs(3);

/// Messages cycled while a video renders.
pub const DEFAULT_LOADING_MESSAGES: &[&str] = &[
    "Warming up the digital director...",
    "Setting up the virtual cameras...",
    "Rehearsing the performance...",
    "Rendering the first frames...",
    "Adding lighting and color...",
    "Syncing motion to audio...",
    "Polishing the final cut...",
    "Almost there, adding the finishing touches...",
];

/// Timing knobs for [`JobOrchestrator`](crate::job::JobOrchestrator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Period of the video status poll timer.
    pub poll_interval: Duration,
    /// Period of the loading message timer.
    pub message_interval: Duration,
    /// Upper bound on status polls per video stage. `None` polls until the service finishes.
    pub max_poll_attempts: Option<u32>,
    /// Messages shown while a video renders.
    pub loading_messages: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            message_interval: DEFAULT_MESSAGE_INTERVAL,
            max_poll_attempts: None,
            loading_messages: DEFAULT_LOADING_MESSAGES
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl OrchestratorConfig {
    /// Creates a new [`OrchestratorConfigBuilder`].
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }
}

/// Builder for [`OrchestratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfigBuilder {
    poll_interval: Option<Duration>,
    message_interval: Option<Duration>,
    max_poll_attempts: Option<u32>,
    loading_messages: Option<Vec<String>>,
}

impl OrchestratorConfigBuilder {
    /// Sets the poll period. Falls back to `GENSTUDIO_POLL_INTERVAL_SECS`, then 10 s.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the loading message period (default 3 s).
    pub fn message_interval(mut self, interval: Duration) -> Self {
        self.message_interval = Some(interval);
        self
    }

    /// Caps the number of status polls. Falls back to `GENSTUDIO_MAX_POLL_ATTEMPTS`.
    /// Zero means no limit.
    pub fn max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = Some(attempts);
        self
    }

    /// Replaces the loading messages.
    pub fn loading_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loading_messages = Some(messages.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the config, applying environment overrides for unset fields.
    pub fn build(self) -> OrchestratorConfig {
        let defaults = OrchestratorConfig::default();

        let poll_interval = self
            .poll_interval
            .or_else(|| env_u64("GENSTUDIO_POLL_INTERVAL_SECS").map(Duration::from_secs))
            .filter(|d| !d.is_zero())
            .unwrap_or(defaults.poll_interval);

        let message_interval = self
            .message_interval
            .filter(|d| !d.is_zero())
            .unwrap_or(defaults.message_interval);

        let max_poll_attempts = self.max_poll_attempts.or_else(|| {
            env_u64("GENSTUDIO_MAX_POLL_ATTEMPTS").and_then(|n| u32::try_from(n).ok())
        })
        .filter(|&n| n > 0);

        let loading_messages = self
            .loading_messages
            .filter(|m| !m.is_empty())
            .unwrap_or(defaults.loading_messages);

        OrchestratorConfig {
            poll_interval,
            message_interval,
            max_poll_attempts,
            loading_messages,
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(name, value = %raw, "ignoring non-numeric environment override");
            None
        }
    }
}
