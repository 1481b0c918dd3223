//! Coder agent: produces the content of one planned file.
//!
//! Each invocation covers exactly one `(path, description)` entry and is
//! given the full architecture for cross-file context (so a script can
//! reference ids from the markup file, a stylesheet the right class names).
//! The agent returns raw text; persisting it is the orchestrator's job.

use std::sync::Arc;

use super::error::{AgentError, AgentResult};
use super::types::FilePlan;
use crate::llm::{GenerationRequest, LlmProvider, Message};

/// System prompt for the coding stage.
const CODER_SYSTEM_PROMPT: &str = r#"You are an expert software developer writing ONE complete file of a project.

Rules:
1. Output ONLY the raw content of the requested file
2. No markdown fences, no commentary, no explanations before or after
3. The file must be complete: no placeholders, no "..." ellipsis, no TODOs
4. Stay consistent with the other files listed in the project layout
   (reference their names, ids and classes where appropriate)"#;

/// User prompt template for the coding stage.
const CODER_USER_TEMPLATE: &str = r#"Project request:
{user_prompt}

Project layout:
{layout}

Write the complete content of: {path}
Responsibility of this file: {description}"#;

/// Configuration for the coder agent.
#[derive(Debug, Clone)]
pub struct CoderConfig {
    /// Model identifier; empty string means the provider default.
    pub model: String,
    /// Temperature for LLM generation.
    pub temperature: f64,
    /// Maximum tokens for the response.
    pub max_tokens: u32,
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.3,
            max_tokens: 8192,
        }
    }
}

impl CoderConfig {
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

/// Coder agent that generates file content.
pub struct CoderAgent {
    llm_client: Arc<dyn LlmProvider>,
    config: CoderConfig,
}

impl std::fmt::Debug for CoderAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoderAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CoderAgent {
    /// Agent name constant for identification.
    pub const AGENT_NAME: &'static str = "coder";

    /// Creates a new coder agent.
    pub fn new(llm_client: Arc<dyn LlmProvider>, config: CoderConfig) -> Self {
        Self { llm_client, config }
    }

    /// Generates the content for one planned file.
    pub async fn generate(
        &self,
        file: &FilePlan,
        architecture: &[FilePlan],
        user_prompt: &str,
    ) -> AgentResult<String> {
        let layout = architecture
            .iter()
            .map(|f| format!("- {}: {}", f.path, f.description))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = CODER_USER_TEMPLATE
            .replace("{user_prompt}", user_prompt)
            .replace("{layout}", &layout)
            .replace("{path}", &file.path)
            .replace("{description}", &file.description);

        let request = GenerationRequest::new(
            self.config.model.clone(),
            vec![Message::system(CODER_SYSTEM_PROMPT), Message::user(prompt)],
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens);

        let response = self.llm_client.generate(request).await?;
        let content = response.first_content().ok_or_else(|| {
            AgentError::ResponseParse(format!("empty LLM response for '{}'", file.path))
        })?;

        let content = strip_code_fence(content);
        if content.trim().is_empty() {
            return Err(AgentError::ResponseParse(format!(
                "model produced no content for '{}'",
                file.path
            )));
        }

        tracing::debug!(
            agent = Self::AGENT_NAME,
            path = %file.path,
            bytes = content.len(),
            "file content generated"
        );
        Ok(content)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CoderConfig {
        &self.config
    }
}

/// Removes one wrapping markdown fence if the model ignored the no-fence
/// rule. Interior fences (e.g. a README that legitimately contains ```)
/// are only stripped when the whole response is a single fenced block.
fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return trimmed.to_string();
    }

    let Some(first_newline) = trimmed.find('\n') else {
        return trimmed.to_string();
    };
    let body = &trimmed[first_newline + 1..trimmed.len() - 3];
    // An interior fence means the trailing ``` was not the wrapper's close.
    if body.contains("```") {
        return trimmed.to_string();
    }
    body.trim_end_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockLlmProvider {
        content: String,
        last_prompt: Mutex<String>,
    }

    impl MockLlmProvider {
        fn replying(content: &str) -> Arc<Self> {
            Arc::new(Self {
                content: content.to_string(),
                last_prompt: Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            *self.last_prompt.lock().expect("lock not poisoned") =
                request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
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

    fn architecture() -> Vec<FilePlan> {
        vec![
            FilePlan::new("index.html", "main page markup"),
            FilePlan::new("style.css", "button styling"),
        ]
    }

    #[tokio::test]
    async fn test_generate_returns_raw_content() {
        let provider = MockLlmProvider::replying("<html><body></body></html>");
        let coder = CoderAgent::new(provider, CoderConfig::default());

        let content = coder
            .generate(&architecture()[0], &architecture(), "a page")
            .await
            .expect("generate");
        assert_eq!(content, "<html><body></body></html>");
    }

    #[tokio::test]
    async fn test_generate_includes_cross_file_context() {
        let provider = MockLlmProvider::replying("body {}");
        let coder = CoderAgent::new(Arc::clone(&provider) as Arc<dyn LlmProvider>, CoderConfig::default());

        coder
            .generate(&architecture()[1], &architecture(), "a page")
            .await
            .expect("generate");

        let prompt = provider.last_prompt.lock().expect("lock not poisoned").clone();
        assert!(prompt.contains("index.html"));
        assert!(prompt.contains("style.css"));
        assert!(prompt.contains("a page"));
    }

    #[tokio::test]
    async fn test_fenced_response_is_unwrapped() {
        let provider = MockLlmProvider::replying("```html\n<html></html>\n```");
        let coder = CoderAgent::new(provider, CoderConfig::default());

        let content = coder
            .generate(&architecture()[0], &architecture(), "a page")
            .await
            .expect("generate");
        assert_eq!(content, "<html></html>");
    }

    #[tokio::test]
    async fn test_empty_response_is_parse_error() {
        let provider = MockLlmProvider::replying("   ");
        let coder = CoderAgent::new(provider, CoderConfig::default());

        let err = coder
            .generate(&architecture()[0], &architecture(), "a page")
            .await
            .expect_err("must fail");
        assert!(matches!(err, AgentError::ResponseParse(_)));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("plain"), "plain");
        assert_eq!(strip_code_fence("```\ncode\n```"), "code");
        assert_eq!(strip_code_fence("```js\nlet x = 1;\n```"), "let x = 1;");
        // Interior fences: left alone.
        let mixed = "```md\nuse ``` for code\n```";
        assert_eq!(strip_code_fence(mixed), mixed);
    }
}
