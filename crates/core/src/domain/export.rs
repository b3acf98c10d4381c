use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::quote::Quote;

/// Exporter-supplied details printed on the proposal document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetadata {
    pub company_name: String,
    pub prepared_by: String,
    pub client_name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub validity_days: Option<u32>,
    #[serde(default)]
    pub closing_notes: Option<String>,
}

/// A quote frozen at the moment export was requested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub quote: Quote,
    pub captured_at: DateTime<Utc>,
}

impl ExportSnapshot {
    pub fn capture(quote: Quote) -> Self {
        Self { quote, captured_at: Utc::now() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Html,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
}
