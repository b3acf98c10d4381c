use std::env;
use std::fs;
use std::path::Path;

use dealcraft_core::config::{default_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = default_config_path();
    let sources = Sources {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path.as_deref(),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(sources.line("llm.provider", config.llm.provider.as_str(), &["DEALCRAFT_LLM_PROVIDER"]));
    lines.push(sources.line("llm.model", &config.llm.model, &["DEALCRAFT_LLM_MODEL"]));
    let effective_base_url = config
        .llm
        .base_url
        .clone()
        .unwrap_or_else(|| format!("{} (provider default)", config.llm.provider.default_base_url()));
    lines.push(sources.line("llm.base_url", &effective_base_url, &["DEALCRAFT_LLM_BASE_URL"]));
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(sources.line("llm.api_key", &api_key, &["DEALCRAFT_LLM_API_KEY"]));
    lines.push(sources.line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        &["DEALCRAFT_LLM_TIMEOUT_SECS"],
    ));

    lines.push(sources.line(
        "server.bind_address",
        &config.server.bind_address,
        &["DEALCRAFT_SERVER_BIND_ADDRESS"],
    ));
    lines.push(sources.line("server.port", &config.server.port.to_string(), &["DEALCRAFT_SERVER_PORT"]));
    lines.push(sources.line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        &["DEALCRAFT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
    ));

    lines.push(sources.line(
        "documents.output_dir",
        &config.documents.output_dir.display().to_string(),
        &["DEALCRAFT_DOCUMENTS_OUTPUT_DIR"],
    ));
    let template_dir = config
        .documents
        .template_dir
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<embedded>".to_string());
    lines.push(sources.line(
        "documents.template_dir",
        &template_dir,
        &["DEALCRAFT_DOCUMENTS_TEMPLATE_DIR"],
    ));
    lines.push(sources.line(
        "documents.company_name",
        &config.documents.company_name,
        &["DEALCRAFT_DOCUMENTS_COMPANY_NAME"],
    ));

    lines.push(sources.line(
        "negotiation.locale",
        config.negotiation.locale.tag(),
        &["DEALCRAFT_NEGOTIATION_LOCALE"],
    ));

    lines.push(sources.line(
        "logging.level",
        &config.logging.level,
        &["DEALCRAFT_LOGGING_LEVEL", "DEALCRAFT_LOG_LEVEL"],
    ));
    lines.push(sources.line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        &["DEALCRAFT_LOGGING_FORMAT", "DEALCRAFT_LOG_FORMAT"],
    ));

    lines.join("\n")
}

struct Sources<'a> {
    doc: Option<Value>,
    path: Option<&'a Path>,
}

impl Sources<'_> {
    fn line(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        format!("- {key_path} = {value} (source: {})", self.source(key_path, env_keys))
    }

    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps a recognizable key prefix such as `sk-` and hides the rest.
pub fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        if prefix.len() <= 8 {
            return format!("{prefix}-***");
        }
    }

    "<redacted>".to_string()
}
