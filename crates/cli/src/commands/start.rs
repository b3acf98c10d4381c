use dealcraft_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG_INVALID};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum StartStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
struct StartReport {
    command: &'static str,
    status: StartStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'static str>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    listen_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<&'static str>,
}

/// Startup preflight: the config the server would boot with must load and validate.
pub fn run() -> CommandResult {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            let listen_address = format!("{}:{}", config.server.bind_address, config.server.port);
            let report = StartReport {
                command: "start",
                status: StartStatus::Ok,
                error_class: None,
                message: format!(
                    "preflight passed: {} ({}) on {listen_address}, proposals in `{}`",
                    config.llm.provider.as_str(),
                    config.llm.model,
                    config.documents.output_dir.display()
                ),
                provider: Some(config.llm.provider.as_str()),
                model: Some(config.llm.model.clone()),
                listen_address: Some(listen_address),
                locale: Some(config.negotiation.locale.tag()),
            };
            CommandResult::json(0, &report)
        }
        Err(error) => {
            let report = StartReport {
                command: "start",
                status: StartStatus::Error,
                error_class: Some("config_validation"),
                message: error.to_string(),
                provider: None,
                model: None,
                listen_address: None,
                locale: None,
            };
            CommandResult::json(EXIT_CONFIG_INVALID, &report)
        }
    }
}
