use std::sync::Arc;

use dealcraft_agent::{HttpLlmClient, LlmStrategist};
use dealcraft_core::audit::TracingAuditSink;
use dealcraft_core::config::{AppConfig, ConfigError};
use dealcraft_core::{Negotiator, SessionMessages};
use thiserror::Error;
use tracing::info;

use crate::document::{DocumentError, ProposalRenderer};

pub type AppNegotiator = Negotiator<LlmStrategist<HttpLlmClient>, ProposalRenderer>;

pub struct Application {
    pub config: AppConfig,
    pub negotiator: Arc<AppNegotiator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client setup failed: {0:#}")]
    Llm(#[source] anyhow::Error),
    #[error("document renderer setup failed: {0}")]
    Documents(#[source] DocumentError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        quote_id = "none",
        "starting application bootstrap"
    );

    let locale = config.negotiation.locale;
    let client = HttpLlmClient::from_config(&config.llm).map_err(BootstrapError::Llm)?;
    info!(
        event_name = "system.bootstrap.llm_ready",
        correlation_id = "bootstrap",
        quote_id = "none",
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        "llm client configured"
    );

    let renderer =
        ProposalRenderer::from_config(&config.documents, locale).map_err(BootstrapError::Documents)?;
    info!(
        event_name = "system.bootstrap.documents_ready",
        correlation_id = "bootstrap",
        quote_id = "none",
        output_dir = %config.documents.output_dir.display(),
        "proposal renderer configured"
    );

    let negotiator = Negotiator::new(LlmStrategist::new(client).with_locale(locale), renderer)
        .with_messages(SessionMessages::for_locale(locale))
        .with_audit_sink(Arc::new(TracingAuditSink));

    Ok(Application { config, negotiator: Arc::new(negotiator) })
}
