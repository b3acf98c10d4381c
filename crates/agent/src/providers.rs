use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use dealcraft_core::config::{LlmConfig, LlmProvider};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use crate::llm::{LlmClient, LlmPrompt, PromptRole};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// Completion client for the hosted and local providers named in `llm.provider`.
#[derive(Clone)]
pub struct HttpLlmClient {
    http: Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for HttpLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLlmClient")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| config.provider.default_base_url().to_string());

        Ok(Self {
            http,
            provider: config.provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn endpoint(&self) -> String {
        match self.provider {
            LlmProvider::OpenAi => format!("{}/chat/completions", self.base_url),
            LlmProvider::Anthropic => format!("{}/messages", self.base_url),
            LlmProvider::Ollama => format!("{}/api/chat", self.base_url),
            LlmProvider::Gemini => {
                format!("{}/models/{}:generateContent", self.base_url, self.model)
            }
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(key) = self.api_key.as_ref().map(|key| key.expose_secret().to_string()) else {
            return request;
        };
        match self.provider {
            LlmProvider::OpenAi | LlmProvider::Ollama => request.bearer_auth(key),
            LlmProvider::Anthropic => {
                request.header("x-api-key", key).header("anthropic-version", ANTHROPIC_VERSION)
            }
            LlmProvider::Gemini => request.header("x-goog-api-key", key),
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &LlmPrompt) -> Result<String> {
        let body = request_body(self.provider, &self.model, prompt);
        debug!(
            provider = self.provider.as_str(),
            model = %self.model,
            turns = prompt.turns.len(),
            expect_json = prompt.expect_json,
            "sending llm completion request"
        );

        let response = self
            .authorize(self.http.post(self.endpoint()))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.provider.as_str()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!(
                "{} returned HTTP {}: {}",
                self.provider.as_str(),
                status.as_u16(),
                truncate(&detail, 300)
            );
        }

        let payload: Value = response
            .json()
            .await
            .with_context(|| format!("{} returned a non-JSON body", self.provider.as_str()))?;
        extract_text(self.provider, &payload)
    }
}

fn role_name(provider: LlmProvider, role: PromptRole) -> &'static str {
    match (provider, role) {
        (_, PromptRole::User) => "user",
        (LlmProvider::Gemini, PromptRole::Assistant) => "model",
        (_, PromptRole::Assistant) => "assistant",
    }
}

/// Builds the provider-specific request payload for `prompt`.
pub fn request_body(provider: LlmProvider, model: &str, prompt: &LlmPrompt) -> Value {
    match provider {
        LlmProvider::OpenAi | LlmProvider::Ollama => {
            let mut messages = vec![json!({ "role": "system", "content": prompt.system })];
            messages.extend(prompt.turns.iter().map(|turn| {
                json!({ "role": role_name(provider, turn.role), "content": turn.content })
            }));
            let mut body = json!({ "model": model, "messages": messages });
            if provider == LlmProvider::Ollama {
                body["stream"] = json!(false);
                if prompt.expect_json {
                    body["format"] = json!("json");
                }
            } else if prompt.expect_json {
                body["response_format"] = json!({ "type": "json_object" });
            }
            body
        }
        LlmProvider::Anthropic => {
            let messages: Vec<Value> = prompt
                .turns
                .iter()
                .map(|turn| {
                    json!({ "role": role_name(provider, turn.role), "content": turn.content })
                })
                .collect();
            json!({
                "model": model,
                "max_tokens": ANTHROPIC_MAX_TOKENS,
                "system": prompt.system,
                "messages": messages,
            })
        }
        LlmProvider::Gemini => {
            let contents: Vec<Value> = prompt
                .turns
                .iter()
                .map(|turn| {
                    json!({
                        "role": role_name(provider, turn.role),
                        "parts": [{ "text": turn.content }],
                    })
                })
                .collect();
            let mut body = json!({
                "systemInstruction": { "parts": [{ "text": prompt.system }] },
                "contents": contents,
            });
            if prompt.expect_json {
                body["generationConfig"] = json!({ "responseMimeType": "application/json" });
            }
            body
        }
    }
}

/// Pulls the completion text out of a provider response payload.
pub fn extract_text(provider: LlmProvider, payload: &Value) -> Result<String> {
    let pointer = match provider {
        LlmProvider::OpenAi => "/choices/0/message/content",
        LlmProvider::Anthropic => "/content/0/text",
        LlmProvider::Ollama => "/message/content",
        LlmProvider::Gemini => "/candidates/0/content/parts/0/text",
    };
    let text = payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("{} response is missing `{pointer}`", provider.as_str()))?;
    if text.trim().is_empty() {
        bail!("{} returned an empty completion", provider.as_str());
    }
    Ok(text.to_string())
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
