//! Planner agent: turns a free-text request into an ordered task list.
//!
//! The planner is the first model-backed stage. Its output is structure
//! only; no partial or best-effort task list is accepted: if the response
//! cannot be parsed into a non-empty list, the stage fails with
//! [`AgentError::Planning`] and the run ends.

use std::sync::Arc;

use serde::Deserialize;

use super::error::{AgentError, AgentResult};
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::utils::json_extraction::try_extract_json;

/// System prompt for the planning stage.
const PLANNER_SYSTEM_PROMPT: &str = r#"You are a software project planner.

Given a description of an application, break the work into a short ordered
list of discrete implementation tasks. Each task is one concrete piece of
work (e.g. "create HTML structure", "add button styling").

Rules:
1. Tasks must be ordered: earlier tasks are prerequisites of later ones
2. Keep the list small and concrete (typically 3-8 tasks)
3. Do not include deployment, documentation or testing-process tasks
4. Respond with ONLY valid JSON in this exact format:
{"tasks": ["first task", "second task"]}"#;

/// Configuration for the planner agent.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Model identifier; empty string means the provider default.
    pub model: String,
    /// Temperature for LLM generation.
    pub temperature: f64,
    /// Maximum tokens for the response.
    pub max_tokens: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

impl PlannerConfig {
    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// Planner agent that derives an ordered task list from the user prompt.
pub struct PlannerAgent {
    llm_client: Arc<dyn LlmProvider>,
    config: PlannerConfig,
}

impl std::fmt::Debug for PlannerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Expected response payload.
#[derive(Debug, Deserialize)]
struct PlanResponse {
    tasks: Vec<String>,
}

impl PlannerAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "planner";

    /// Creates a new planner agent.
    pub fn new(llm_client: Arc<dyn LlmProvider>, config: PlannerConfig) -> Self {
        Self { llm_client, config }
    }

    /// Derives the ordered task list for a user prompt.
    ///
    /// The prompt is guaranteed non-blank by the pipeline entry point.
    pub async fn plan(&self, user_prompt: &str) -> AgentResult<Vec<String>> {
        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![
                Message::system(PLANNER_SYSTEM_PROMPT),
                Message::user(format!("Application to build:\n{}", user_prompt)),
            ],
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.llm_client.generate(request).await?;
        let content = response
            .first_content()
            .ok_or_else(|| AgentError::Planning("empty LLM response".to_string()))?;

        let tasks = self.parse_response(content)?;
        tracing::info!(agent = Self::AGENT_NAME, tasks = tasks.len(), "plan ready");
        Ok(tasks)
    }

    /// Parses the model response into a non-empty task list.
    fn parse_response(&self, content: &str) -> AgentResult<Vec<String>> {
        let extraction = try_extract_json(content);
        let json = match &extraction {
            crate::utils::json_extraction::JsonExtraction::Success(json) => json.clone(),
            other => return Err(AgentError::Planning(other.describe_failure(content))),
        };

        let parsed: PlanResponse = serde_json::from_str(&json)
            .map_err(|e| AgentError::Planning(format!("invalid plan JSON: {}", e)))?;

        let tasks: Vec<String> = parsed
            .tasks
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if tasks.is_empty() {
            return Err(AgentError::Planning("model produced no tasks".to_string()));
        }

        Ok(tasks)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;

    struct MockLlmProvider {
        response: Result<String, String>,
    }

    impl MockLlmProvider {
        fn replying(content: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(content.to_string()),
            })
        }

        fn rate_limited() -> Arc<Self> {
            Arc::new(Self {
                response: Err("throttled".to_string()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            match &self.response {
                Ok(content) => Ok(GenerationResponse {
                    id: "mock".to_string(),
                    model: "mock-model".to_string(),
                    choices: vec![Choice {
                        index: 0,
                        message: Message::assistant(content.clone()),
                        finish_reason: "stop".to_string(),
                    }],
                    usage: Usage::default(),
                }),
                Err(msg) => Err(LlmError::RateLimited(msg.clone())),
            }
        }
    }

    #[tokio::test]
    async fn test_plan_parses_task_list() {
        let provider = MockLlmProvider::replying(
            r#"{"tasks": ["create HTML structure", "add button styling", "add click handler"]}"#,
        );
        let planner = PlannerAgent::new(provider, PlannerConfig::default());

        let tasks = planner.plan("build a page with a button").await.expect("plan");
        assert_eq!(
            tasks,
            vec![
                "create HTML structure",
                "add button styling",
                "add click handler"
            ]
        );
    }

    #[tokio::test]
    async fn test_plan_accepts_fenced_json() {
        let provider =
            MockLlmProvider::replying("Here you go:\n```json\n{\"tasks\": [\"only task\"]}\n```");
        let planner = PlannerAgent::new(provider, PlannerConfig::default());

        let tasks = planner.plan("tiny app").await.expect("plan");
        assert_eq!(tasks, vec!["only task"]);
    }

    #[tokio::test]
    async fn test_empty_task_list_is_planning_error() {
        let provider = MockLlmProvider::replying(r#"{"tasks": []}"#);
        let planner = PlannerAgent::new(provider, PlannerConfig::default());

        let err = planner.plan("anything").await.expect_err("must fail");
        assert!(matches!(err, AgentError::Planning(_)));
    }

    #[tokio::test]
    async fn test_whitespace_tasks_are_dropped_not_kept() {
        let provider = MockLlmProvider::replying(r#"{"tasks": ["  ", "real task"]}"#);
        let planner = PlannerAgent::new(provider, PlannerConfig::default());

        let tasks = planner.plan("anything").await.expect("plan");
        assert_eq!(tasks, vec!["real task"]);
    }

    #[tokio::test]
    async fn test_malformed_response_is_planning_error() {
        let provider = MockLlmProvider::replying("I would suggest starting with the HTML.");
        let planner = PlannerAgent::new(provider, PlannerConfig::default());

        let err = planner.plan("anything").await.expect_err("must fail");
        assert!(matches!(err, AgentError::Planning(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_propagates_not_wrapped() {
        let provider = MockLlmProvider::rate_limited();
        let planner = PlannerAgent::new(provider, PlannerConfig::default());

        let err = planner.plan("anything").await.expect_err("must fail");
        assert!(err.is_rate_limit());
    }
}
