//! Architect agent: turns a task list into a concrete file layout.
//!
//! Output is an ordered mapping from relative file path to a short
//! responsibility description. Two rules the rest of the pipeline relies on:
//! paths are unique (a later duplicate proposal wins, keeping the position of
//! the first occurrence, matching the workspace's overwrite semantics), and
//! every path is normalized before the coder sees it. A path that can only be
//! made safe by rewriting it (absolute, `..` traversal, backslash
//! separators) is rejected with [`AgentError::Architecture`], never
//! corrected.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::error::{AgentError, AgentResult};
use super::types::FilePlan;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::utils::json_extraction::try_extract_json;

/// System prompt for the architecture stage.
const ARCHITECT_SYSTEM_PROMPT: &str = r#"You are a software architect.

Given an ordered list of implementation tasks, decide the concrete files the
project needs. For each file give a relative path and a one-line description
of what that file is responsible for.

Rules:
1. Paths are relative to the project root: no leading slash, no ".."
2. Use forward slashes for nested paths (e.g. "css/style.css")
3. List files in the order they should be generated
4. Respond with ONLY valid JSON in this exact format:
{"files": [{"path": "index.html", "description": "main page markup"}]}"#;

/// Configuration for the architect agent.
#[derive(Debug, Clone)]
pub struct ArchitectConfig {
    /// Model identifier; empty string means the provider default.
    pub model: String,
    /// Temperature for LLM generation.
    pub temperature: f64,
    /// Maximum tokens for the response.
    pub max_tokens: u32,
}

impl Default for ArchitectConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.2,
            max_tokens: 2048,
        }
    }
}

impl ArchitectConfig {
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

/// Architect agent that maps a task list to a file layout.
pub struct ArchitectAgent {
    llm_client: Arc<dyn LlmProvider>,
    config: ArchitectConfig,
}

impl std::fmt::Debug for ArchitectAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchitectAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Expected response payload.
#[derive(Debug, Deserialize)]
struct ArchitectureResponse {
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    path: String,
    description: String,
}

impl ArchitectAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "architect";

    /// Creates a new architect agent.
    pub fn new(llm_client: Arc<dyn LlmProvider>, config: ArchitectConfig) -> Self {
        Self { llm_client, config }
    }

    /// Designs the file layout for an ordered task list.
    pub async fn design(&self, plan: &[String]) -> AgentResult<Vec<FilePlan>> {
        let tasks = plan
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, t))
            .collect::<Vec<_>>()
            .join("\n");

        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![
                Message::system(ARCHITECT_SYSTEM_PROMPT),
                Message::user(format!("Implementation tasks:\n{}", tasks)),
            ],
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.llm_client.generate(request).await?;
        let content = response
            .first_content()
            .ok_or_else(|| AgentError::Architecture("empty LLM response".to_string()))?;

        let architecture = self.parse_response(content)?;
        tracing::info!(
            agent = Self::AGENT_NAME,
            files = architecture.len(),
            "architecture ready"
        );
        Ok(architecture)
    }

    /// Parses and normalizes the model response into an ordered,
    /// path-unique layout.
    fn parse_response(&self, content: &str) -> AgentResult<Vec<FilePlan>> {
        let extraction = try_extract_json(content);
        let json = match &extraction {
            crate::utils::json_extraction::JsonExtraction::Success(json) => json.clone(),
            other => return Err(AgentError::Architecture(other.describe_failure(content))),
        };

        let parsed: ArchitectureResponse = serde_json::from_str(&json)
            .map_err(|e| AgentError::Architecture(format!("invalid architecture JSON: {}", e)))?;

        if parsed.files.is_empty() {
            return Err(AgentError::Architecture(
                "model produced no file paths".to_string(),
            ));
        }

        // Dedup with last-wins descriptions, keeping first-occurrence order.
        let mut ordered: Vec<FilePlan> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for entry in parsed.files {
            let path = normalize_path(&entry.path)?;
            let description = entry.description.trim().to_string();
            match index_of.get(&path) {
                Some(&i) => ordered[i].description = description,
                None => {
                    index_of.insert(path.clone(), ordered.len());
                    ordered.push(FilePlan::new(path, description));
                }
            }
        }

        Ok(ordered)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ArchitectConfig {
        &self.config
    }
}

/// Normalizes a proposed path: strips `.` segments and empty segments, and
/// rejects anything whose meaning would change under correction.
fn normalize_path(raw: &str) -> AgentResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AgentError::Architecture("empty file path".to_string()));
    }
    if trimmed.contains('\\') {
        return Err(AgentError::Architecture(format!(
            "path uses backslash separators: '{}'",
            trimmed
        )));
    }
    if trimmed.starts_with('/') {
        return Err(AgentError::Architecture(format!(
            "absolute path not allowed: '{}'",
            trimmed
        )));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(AgentError::Architecture(format!(
                    "parent traversal not allowed: '{}'",
                    trimmed
                )))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(AgentError::Architecture(format!(
            "path has no file component: '{}'",
            trimmed
        )));
    }

    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;

    struct MockLlmProvider {
        content: String,
    }

    impl MockLlmProvider {
        fn replying(content: &str) -> Arc<Self> {
            Arc::new(Self {
                content: content.to_string(),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse {
                id: "mock".to_string(),
                model: "mock-model".to_string(),
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant(self.content.clone()),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage::default(),
            })
        }
    }

    fn plan() -> Vec<String> {
        vec!["create HTML structure".to_string(), "style it".to_string()]
    }

    #[tokio::test]
    async fn test_design_preserves_emission_order() {
        let provider = MockLlmProvider::replying(
            r#"{"files": [
                {"path": "index.html", "description": "markup"},
                {"path": "css/style.css", "description": "styling"},
                {"path": "script.js", "description": "behavior"}
            ]}"#,
        );
        let architect = ArchitectAgent::new(provider, ArchitectConfig::default());

        let layout = architect.design(&plan()).await.expect("design");
        let paths: Vec<&str> = layout.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["index.html", "css/style.css", "script.js"]);
    }

    #[tokio::test]
    async fn test_duplicate_path_later_description_wins() {
        let provider = MockLlmProvider::replying(
            r#"{"files": [
                {"path": "index.html", "description": "first idea"},
                {"path": "style.css", "description": "styling"},
                {"path": "index.html", "description": "revised idea"}
            ]}"#,
        );
        let architect = ArchitectAgent::new(provider, ArchitectConfig::default());

        let layout = architect.design(&plan()).await.expect("design");
        assert_eq!(layout.len(), 2);
        assert_eq!(layout[0].path, "index.html");
        assert_eq!(layout[0].description, "revised idea");
        assert_eq!(layout[1].path, "style.css");
    }

    #[tokio::test]
    async fn test_empty_layout_is_architecture_error() {
        let provider = MockLlmProvider::replying(r#"{"files": []}"#);
        let architect = ArchitectAgent::new(provider, ArchitectConfig::default());

        let err = architect.design(&plan()).await.expect_err("must fail");
        assert!(matches!(err, AgentError::Architecture(_)));
    }

    #[tokio::test]
    async fn test_parent_traversal_rejected_not_corrected() {
        let provider = MockLlmProvider::replying(
            r#"{"files": [{"path": "../outside.html", "description": "nope"}]}"#,
        );
        let architect = ArchitectAgent::new(provider, ArchitectConfig::default());

        let err = architect.design(&plan()).await.expect_err("must fail");
        assert!(matches!(err, AgentError::Architecture(_)));
    }

    #[tokio::test]
    async fn test_absolute_path_rejected() {
        let provider = MockLlmProvider::replying(
            r#"{"files": [{"path": "/etc/index.html", "description": "nope"}]}"#,
        );
        let architect = ArchitectAgent::new(provider, ArchitectConfig::default());

        let err = architect.design(&plan()).await.expect_err("must fail");
        assert!(matches!(err, AgentError::Architecture(_)));
    }

    #[test]
    fn test_normalize_strips_dot_segments() {
        assert_eq!(normalize_path("./src/./app.js").expect("ok"), "src/app.js");
        assert_eq!(normalize_path("a//b.txt").expect("ok"), "a/b.txt");
    }

    #[test]
    fn test_normalize_rejects_escapes() {
        assert!(normalize_path("..").is_err());
        assert!(normalize_path("a/../b").is_err());
        assert!(normalize_path("/abs").is_err());
        assert!(normalize_path("a\\b").is_err());
        assert!(normalize_path("   ").is_err());
        assert!(normalize_path("./").is_err());
    }
}
