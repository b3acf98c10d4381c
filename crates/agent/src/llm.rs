use anyhow::Result;
use async_trait::async_trait;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTurn {
    pub role: PromptRole,
    pub content: String,
}

impl PromptTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: PromptRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: PromptRole::Assistant, content: content.into() }
    }
}

/// One completion request: a system instruction plus the conversation so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmPrompt {
    pub system: String,
    pub turns: Vec<PromptTurn>,
    /// Ask the provider for a JSON object when it supports a JSON mode.
    pub expect_json: bool,
}

impl LlmPrompt {
    pub fn new(system: impl Into<String>) -> Self {
        Self { system: system.into(), turns: Vec::new(), expect_json: false }
    }

    pub fn with_turn(mut self, turn: PromptTurn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn expecting_json(mut self) -> Self {
        self.expect_json = true;
        self
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &LlmPrompt) -> Result<String>;
}
