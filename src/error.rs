//! Error types for appforge operations.
//!
//! Defines error types for the two leaf subsystems:
//! - LLM provider interactions
//! - Workspace (sandboxed project root) operations
//!
//! Agent- and pipeline-level errors live in [`crate::agents::error`].

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: LITELLM_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LlmError {
    /// Returns true if this error is the provider's throttling signal.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited(_))
    }
}

/// Errors that can occur during workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The requested file does not exist under the project root.
    #[error("File not found in workspace: {0}")]
    NotFound(PathBuf),

    /// The path would resolve outside the project root. Nothing is
    /// read or written when this is raised.
    #[error("Path escapes the project root: {0}")]
    SandboxViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
