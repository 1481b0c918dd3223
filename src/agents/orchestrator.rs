//! Pipeline orchestrator: the state machine that drives a run.
//!
//! A run moves through `Init → Planned → Architected → Coding → Done`, with
//! `Failed` reachable from any phase. Every stage transition and every file
//! write consumes one step against the configured budget; running out of
//! steps ends the run early with the files already on disk retained.
//!
//! Error routing, in one place because it is the contract:
//! - empty/malformed planner or architect output completes the run with
//!   `success = false` and a [`RunFailure`] kind;
//! - a write-time sandbox violation is fatal the same way, and the offending
//!   write never happens;
//! - a coder failure for one file is recorded and the run continues;
//! - provider transport failures (rate limit included) return `Err` so the
//!   retry wrapper can observe them.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use super::architect::ArchitectAgent;
use super::coder::CoderAgent;
use super::error::{AgentError, AgentResult};
use super::planner::PlannerAgent;
use super::types::{RunFailure, RunPhase, RunReport, RunState};
use crate::error::WorkspaceError;
use crate::llm::LlmProvider;
use crate::pipeline::PipelineConfig;
use crate::workspace::Workspace;

/// Orchestrator that sequences Planner → Architect → Coder over a workspace.
pub struct PipelineOrchestrator {
    planner: PlannerAgent,
    architect: ArchitectAgent,
    coder: CoderAgent,
    workspace: Workspace,
    config: PipelineConfig,
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("workspace", &self.workspace)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PipelineOrchestrator {
    /// Creates a new orchestrator from a provider, workspace and config.
    pub fn new(llm_client: Arc<dyn LlmProvider>, workspace: Workspace, config: PipelineConfig) -> Self {
        let planner = PlannerAgent::new(Arc::clone(&llm_client), config.planner.clone());
        let architect = ArchitectAgent::new(Arc::clone(&llm_client), config.architect.clone());
        let coder = CoderAgent::new(llm_client, config.coder.clone());

        Self {
            planner,
            architect,
            coder,
            workspace,
            config,
        }
    }

    /// Returns the workspace this orchestrator writes into.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Returns the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full pipeline for one prompt.
    ///
    /// Returns `Ok` with a report for every run that completes, including
    /// structurally failed ones, and `Err` only for provider transport
    /// failures, which the retry wrapper may recover.
    pub async fn run(&self, user_prompt: &str) -> AgentResult<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = RunState::new(user_prompt);

        self.workspace.init_root()?;
        tracing::info!(%run_id, budget = self.config.step_budget, "run started");

        let failure = self.advance(&mut state).await?;
        if failure.is_some() {
            state.phase = RunPhase::Failed;
        }

        let report = RunReport::from_state(
            run_id,
            &state,
            failure,
            started_at,
            start.elapsed().as_millis() as u64,
        );
        tracing::info!(
            %run_id,
            success = report.success,
            files = report.file_count(),
            failed = report.failed_files.len(),
            steps = report.steps_used,
            "run finished"
        );
        Ok(report)
    }

    /// Drives the state machine to `Done` or to the first structural failure.
    async fn advance(&self, state: &mut RunState) -> AgentResult<Option<RunFailure>> {
        // Init → Planned
        if let Some(failure) = self.take_step(state) {
            return Ok(Some(failure));
        }
        match self.planner.plan(&state.user_prompt).await {
            Ok(plan) => {
                state.plan = plan;
                state.phase = RunPhase::Planned;
            }
            Err(AgentError::Planning(msg)) => return Ok(Some(RunFailure::Planning(msg))),
            Err(e) => return Err(e),
        }

        // Planned → Architected
        if let Some(failure) = self.take_step(state) {
            return Ok(Some(failure));
        }
        match self.architect.design(&state.plan).await {
            Ok(architecture) => {
                state.architecture = architecture;
                state.phase = RunPhase::Architected;
            }
            Err(AgentError::Architecture(msg)) => return Ok(Some(RunFailure::Architecture(msg))),
            Err(e) => return Err(e),
        }

        // Architected → Coding → Done
        state.phase = RunPhase::Coding;
        let architecture = state.architecture.clone();
        for file in &architecture {
            if let Some(failure) = self.take_step(state) {
                return Ok(Some(failure));
            }

            let content = match self
                .coder
                .generate(file, &architecture, &state.user_prompt)
                .await
            {
                Ok(content) => content,
                Err(e) if e.is_rate_limit() => return Err(e),
                Err(e) => {
                    tracing::warn!(path = %file.path, error = %e, "file generation failed; continuing");
                    state.record_failed(file.path.as_str(), e.to_string());
                    continue;
                }
            };

            match self.workspace.write_file(&file.path, &content) {
                Ok(()) => state.record_written(file.path.as_str()),
                Err(WorkspaceError::SandboxViolation(path)) => {
                    return Ok(Some(RunFailure::SandboxViolation(path)));
                }
                Err(e) => {
                    tracing::warn!(path = %file.path, error = %e, "file write failed; continuing");
                    state.record_failed(file.path.as_str(), e.to_string());
                }
            }
        }

        state.phase = RunPhase::Done;
        Ok(None)
    }

    /// Consumes one step, reporting budget exhaustion instead of proceeding.
    fn take_step(&self, state: &mut RunState) -> Option<RunFailure> {
        if state.step_count >= self.config.step_budget {
            tracing::warn!(
                steps = state.step_count,
                budget = self.config.step_budget,
                "step budget exhausted"
            );
            return Some(RunFailure::StepBudgetExceeded {
                budget: self.config.step_budget,
            });
        }
        state.step_count += 1;
        None
    }
}
