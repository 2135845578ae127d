//! Quorum LLM - LLM Provider Abstraction
//!
//! This crate provides LLM integration for Quorum:
//! - Provider: the `LlmProvider` trait every backend implements
//! - OpenAI: OpenAI-compatible chat completions (OpenAI or Azure OpenAI deployments)
//! - Mock: scripted provider for tests and offline runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat;
pub mod error;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod redact;

pub use chat::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};
pub use error::{Error, Result};
pub use mock::{MockProvider, MockReply};
pub use openai::{AzureSettings, OpenAiConfig, OpenAiProvider};
pub use provider::LlmProvider;
