//! LLM integration for appforge.
//!
//! The pipeline treats the model as an opaque text-completion service behind
//! the [`LlmProvider`] trait. The one contract-relevant signal beyond plain
//! success/failure is throttling: HTTP 429 surfaces as
//! [`crate::error::LlmError::RateLimited`] so the pipeline runner can apply
//! its single-retry policy.

pub mod client;

pub use client::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, OpenAiCompatClient, Usage,
};
