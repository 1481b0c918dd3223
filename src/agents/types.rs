//! Shared types for the agent pipeline.
//!
//! [`RunState`] is the single mutable record threaded through the stages;
//! [`RunReport`] is what a finished (or failed) run hands back to the caller.
//! Neither carries file content: the workspace on disk is the source of
//! truth, and callers re-read it to inspect results.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One architect-emitted entry: a relative file path and a short description
/// of that file's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePlan {
    /// Relative path within the workspace. Unique within an architecture.
    pub path: String,
    /// What this file is responsible for.
    pub description: String,
}

impl FilePlan {
    /// Creates a new file plan entry.
    pub fn new(path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
        }
    }
}

/// Phase of a pipeline run. `Failed` is terminal and reachable from any
/// other phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Init,
    Planned,
    Architected,
    Coding,
    Done,
    Failed,
}

/// The mutable state threaded through one pipeline run.
///
/// Created when a run starts, passed by reference through every stage, and
/// dropped when the run returns; only its side effect, the files written to
/// the workspace, outlives it.
#[derive(Debug, Clone)]
pub struct RunState {
    /// The user's request, set once and never mutated.
    pub user_prompt: String,
    /// Ordered implementation tasks from the planner.
    pub plan: Vec<String>,
    /// Ordered, path-unique file layout from the architect.
    pub architecture: Vec<FilePlan>,
    /// Paths successfully written so far. Grows monotonically.
    pub generated_files: BTreeSet<String>,
    /// Paths whose generation failed, with the reason. The run continues
    /// past these.
    pub failed_files: BTreeMap<String, String>,
    /// Stage transitions consumed so far.
    pub step_count: u32,
    /// Current phase of the state machine.
    pub phase: RunPhase,
}

impl RunState {
    /// Creates the state for a fresh run.
    pub fn new(user_prompt: impl Into<String>) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            plan: Vec::new(),
            architecture: Vec::new(),
            generated_files: BTreeSet::new(),
            failed_files: BTreeMap::new(),
            step_count: 0,
            phase: RunPhase::Init,
        }
    }

    /// Records a successful write.
    pub fn record_written(&mut self, path: impl Into<String>) {
        self.generated_files.insert(path.into());
    }

    /// Records a scoped per-file failure.
    pub fn record_failed(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.failed_files.insert(path.into(), reason.into());
    }
}

/// Why a run ended without full success. Carried in [`RunReport::error`];
/// provider transport failures are not represented here because they
/// propagate as errors instead of completing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum RunFailure {
    /// Planner output was empty or malformed.
    Planning(String),
    /// Architect output was empty, or a path could not be accepted.
    Architecture(String),
    /// A path would have resolved outside the project root.
    SandboxViolation(String),
    /// The step budget ran out before all files were written.
    StepBudgetExceeded { budget: u32 },
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::Planning(msg) => write!(f, "planning failed: {}", msg),
            RunFailure::Architecture(msg) => write!(f, "architecture failed: {}", msg),
            RunFailure::SandboxViolation(path) => {
                write!(f, "path escapes the project root: {}", path)
            }
            RunFailure::StepBudgetExceeded { budget } => {
                write!(f, "step budget of {} exceeded", budget)
            }
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// True when every stage completed and no structural failure occurred.
    /// Scoped per-file failures do not clear this flag; see `failed_files`.
    pub success: bool,
    /// Relative paths written to the workspace during this run. Files from
    /// a partial run remain on disk even when `success` is false.
    pub files_written: BTreeSet<String>,
    /// Per-file failures, path to reason.
    pub failed_files: BTreeMap<String, String>,
    /// Stage transitions consumed.
    pub steps_used: u32,
    /// The structural failure that ended the run, if any.
    pub error: Option<RunFailure>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl RunReport {
    /// Builds a report from final run state.
    pub fn from_state(
        run_id: Uuid,
        state: &RunState,
        error: Option<RunFailure>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            run_id,
            success: error.is_none(),
            files_written: state.generated_files.clone(),
            failed_files: state.failed_files.clone(),
            steps_used: state.step_count,
            error,
            started_at,
            duration_ms,
        }
    }

    /// Number of files written.
    pub fn file_count(&self) -> usize {
        self.files_written.len()
    }
}
