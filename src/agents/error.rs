//! Error types for the agent pipeline.
//!
//! Structural stage failures (planning, architecture), the step budget, and
//! wrapped provider/workspace errors all surface through [`AgentError`].

use thiserror::Error;

use crate::error::{LlmError, WorkspaceError};

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The planner produced an empty or malformed task list.
    #[error("Planning failed: {0}")]
    Planning(String),

    /// The architect produced no file paths, or a path that cannot be
    /// accepted without silently rewriting it.
    #[error("Architecture failed: {0}")]
    Architecture(String),

    /// A blank or whitespace-only prompt reached the pipeline entry point.
    #[error("Prompt is empty; nothing to build")]
    EmptyPrompt,

    /// The run used up its allotted stage transitions.
    #[error("Step budget of {budget} exceeded after {steps} steps")]
    StepBudgetExceeded { budget: u32, steps: u32 },

    /// A model response could not be parsed into the expected structure.
    #[error("Failed to parse LLM response: {0}")]
    ResponseParse(String),

    /// Error from the LLM provider.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Error from the workspace tool layer.
    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Returns true if the underlying cause is the provider's throttling
    /// signal. The pipeline runner uses this to decide whether a failed run
    /// qualifies for its single retry.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AgentError::Llm(e) if e.is_rate_limit())
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_probe() {
        let err = AgentError::Llm(LlmError::RateLimited("429".to_string()));
        assert!(err.is_rate_limit());

        let err = AgentError::Llm(LlmError::RequestFailed("conn refused".to_string()));
        assert!(!err.is_rate_limit());

        let err = AgentError::Planning("empty task list".to_string());
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_workspace_error_converts() {
        fn fails() -> AgentResult<()> {
            Err(WorkspaceError::SandboxViolation("../x".to_string()))?;
            Ok(())
        }
        let err = fails().expect_err("converted");
        assert!(matches!(err, AgentError::Workspace(_)));
    }
}
