//! AI strategist for negotiation sessions.
//!
//! This crate supplies the [`Strategist`](dealcraft_core::Strategist)
//! collaborator that the core workflows call:
//! - Builds strategist-persona prompts for quotes, counter-offer analysis and chat
//! - Sends them through a pluggable [`llm::LlmClient`]
//! - Parses and validates the structured replies into domain types
//!
//! # Key Types
//!
//! - `LlmClient` - single-attempt completion seam (see `llm` module)
//! - `HttpLlmClient` - reqwest client for OpenAI, Anthropic, Ollama and Gemini
//! - `LlmStrategist` - `Strategist` implementation on top of any `LlmClient`
//!
//! # Failure Principle
//!
//! Every failure, whether transport, HTTP status or malformed output, is
//! reported as a `CollaboratorError`. Nothing is retried here.

pub mod llm;
pub mod prompts;
pub mod providers;
pub mod strategist;

pub use llm::{LlmClient, LlmPrompt, PromptRole, PromptTurn};
pub use providers::HttpLlmClient;
pub use strategist::LlmStrategist;
