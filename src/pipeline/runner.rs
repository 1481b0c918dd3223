//! Run wrapper: prompt validation and the single rate-limit retry.
//!
//! The runner is the pipeline's public entry point. It rejects blank
//! prompts before any stage runs, and applies the retry policy: on a
//! rate-limit signal, wait a fixed delay and re-execute the whole pipeline
//! exactly once. The second attempt starts from scratch (files written by
//! the first attempt are overwritten where paths coincide) and a second
//! rate-limit propagates to the caller. No backoff, no further retries.

use crate::agents::{AgentError, AgentResult, PipelineOrchestrator, RunReport};
use crate::workspace::Workspace;

/// Wraps a [`PipelineOrchestrator`] run with the retry-once policy.
pub struct PipelineRunner {
    orchestrator: PipelineOrchestrator,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl PipelineRunner {
    /// Creates a runner around an orchestrator.
    pub fn new(orchestrator: PipelineOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Returns the workspace runs write into.
    pub fn workspace(&self) -> &Workspace {
        self.orchestrator.workspace()
    }

    /// Runs the pipeline for one prompt, retrying once on rate limiting.
    pub async fn run(&self, user_prompt: &str) -> AgentResult<RunReport> {
        if user_prompt.trim().is_empty() {
            return Err(AgentError::EmptyPrompt);
        }

        match self.orchestrator.run(user_prompt).await {
            Err(e) if e.is_rate_limit() => {
                let delay = self.orchestrator.config().retry_delay;
                tracing::warn!(
                    delay_ms = delay.as_millis() as u64,
                    "rate limit hit; retrying the full run once"
                );
                tokio::time::sleep(delay).await;
                self.orchestrator.run(user_prompt).await
            }
            other => other,
        }
    }
}
