//! Configuration for pipeline runs.

use std::time::Duration;

use crate::agents::{ArchitectConfig, CoderConfig, PlannerConfig};

/// Default maximum number of stage transitions per run.
pub const DEFAULT_STEP_BUDGET: u32 = 100;

/// Default wait before the single rate-limit retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum stage transitions (plan, architecture, one per file write)
    /// before the run is aborted with a budget failure.
    pub step_budget: u32,
    /// Fixed delay before the single retry after a rate-limit signal.
    pub retry_delay: Duration,
    /// Planner stage tuning.
    pub planner: PlannerConfig,
    /// Architect stage tuning.
    pub architect: ArchitectConfig,
    /// Coder stage tuning.
    pub coder: CoderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            retry_delay: DEFAULT_RETRY_DELAY,
            planner: PlannerConfig::default(),
            architect: ArchitectConfig::default(),
            coder: CoderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step budget.
    pub fn with_step_budget(mut self, step_budget: u32) -> Self {
        self.step_budget = step_budget;
        self
    }

    /// Sets the retry delay.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sets the same model identifier on all three stages.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.planner.model = model.clone();
        self.architect.model = model.clone();
        self.coder.model = model;
        self
    }

    /// Sets the planner stage configuration.
    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    /// Sets the architect stage configuration.
    pub fn with_architect(mut self, architect: ArchitectConfig) -> Self {
        self.architect = architect;
        self
    }

    /// Sets the coder stage configuration.
    pub fn with_coder(mut self, coder: CoderConfig) -> Self {
        self.coder = coder;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.step_budget, 100);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert!(config.planner.model.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new()
            .with_step_budget(10)
            .with_retry_delay(Duration::from_millis(50))
            .with_model("test/model");

        assert_eq!(config.step_budget, 10);
        assert_eq!(config.retry_delay, Duration::from_millis(50));
        assert_eq!(config.planner.model, "test/model");
        assert_eq!(config.architect.model, "test/model");
        assert_eq!(config.coder.model, "test/model");
    }
}
