//! Proposal document rendering.
//!
//! Renders the captured quote through a Tera template and converts it to PDF
//! with `wkhtmltopdf` when that binary is on PATH. Without it, or when the
//! conversion fails, the rendered HTML is written instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dealcraft_core::collaborators::DocumentGenerator;
use dealcraft_core::config::DocumentsConfig;
use dealcraft_core::domain::export::{DocumentFormat, GeneratedDocument, ProposalMetadata};
use dealcraft_core::domain::quote::Quote;
use dealcraft_core::errors::CollaboratorError;
use dealcraft_core::messages::Locale;
use rust_decimal::Decimal;
use serde::Serialize;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};
use uuid::Uuid;

const TEMPLATE_NAME: &str = "proposal.html.tera";

/// Register custom Tera filters used by proposal templates and escape HTML output.
///
/// - `money`: two-decimal rendering of a number or decimal string, e.g. `amount | money`
pub fn register_template_filters(tera: &mut Tera) {
    tera.autoescape_on(vec![".html.tera", ".html"]);
    tera.register_filter("money", tera_money_filter);
}

fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::String(raw) => Decimal::from_str(raw.trim())
            .map_err(|_| tera::Error::msg(format!("money filter cannot parse `{raw}`")))?,
        tera::Value::Number(number) => number
            .as_f64()
            .and_then(|float| Decimal::from_str(&float.to_string()).ok())
            .unwrap_or_default(),
        _ => Decimal::ZERO,
    };
    Ok(tera::Value::String(format!("{:.2}", amount.round_dp(2))))
}

/// Fixed proposal captions in the negotiation locale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProposalLabels {
    pub proposal: &'static str,
    pub issued: &'static str,
    pub valid_until: &'static str,
    pub prepared_for: &'static str,
    pub item: &'static str,
    pub hours: &'static str,
    pub amount: &'static str,
    pub total: &'static str,
    pub timeline: &'static str,
    pub payment_terms: &'static str,
}

impl ProposalLabels {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::English => Self {
                proposal: "Proposal",
                issued: "Issued",
                valid_until: "Valid until",
                prepared_for: "Prepared for",
                item: "Item",
                hours: "Hours",
                amount: "Amount",
                total: "Total",
                timeline: "Timeline",
                payment_terms: "Payment terms",
            },
            Locale::BrazilianPortuguese => Self {
                proposal: "Proposta",
                issued: "Emitida em",
                valid_until: "Válida até",
                prepared_for: "Preparada para",
                item: "Item",
                hours: "Horas",
                amount: "Valor",
                total: "Total",
                timeline: "Prazo",
                payment_terms: "Condições de pagamento",
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DocumentError> for CollaboratorError {
    fn from(value: DocumentError) -> Self {
        CollaboratorError::Rendering(value.to_string())
    }
}

/// [`DocumentGenerator`] that writes proposal files under `documents.output_dir`.
#[derive(Clone, Debug)]
pub struct ProposalRenderer {
    tera: Tera,
    output_dir: PathBuf,
    company_name: String,
    locale: Locale,
    wkhtmltopdf_path: Option<PathBuf>,
}

impl ProposalRenderer {
    pub fn from_config(config: &DocumentsConfig, locale: Locale) -> Result<Self, DocumentError> {
        let tera = match &config.template_dir {
            Some(dir) => load_template_dir(dir)?,
            None => embedded_templates()?,
        };

        let wkhtmltopdf_path = which::which("wkhtmltopdf").ok();
        match &wkhtmltopdf_path {
            Some(path) => info!(path = %path.display(), "wkhtmltopdf found"),
            None => warn!("wkhtmltopdf not found in PATH - proposals will be written as HTML"),
        }

        Ok(Self {
            tera,
            output_dir: config.output_dir.clone(),
            company_name: config.company_name.clone(),
            locale,
            wkhtmltopdf_path,
        })
    }

    /// Always writes HTML, even when `wkhtmltopdf` is installed.
    pub fn html_only(mut self) -> Self {
        self.wkhtmltopdf_path = None;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn render_html(
        &self,
        metadata: &ProposalMetadata,
        quote: &Quote,
    ) -> Result<String, DocumentError> {
        let company_name = if metadata.company_name.trim().is_empty() {
            self.company_name.as_str()
        } else {
            metadata.company_name.as_str()
        };
        let issued_on = Utc::now();
        let valid_until = metadata
            .validity_days
            .map(|days| (issued_on + Duration::days(i64::from(days))).format("%Y-%m-%d").to_string());

        let mut context = Context::new();
        context.insert("quote", quote);
        context.insert("metadata", metadata);
        context.insert("company_name", company_name);
        context.insert("lang", self.locale.tag());
        context.insert("labels", &ProposalLabels::for_locale(self.locale));
        context.insert("issued_on", &issued_on.format("%Y-%m-%d").to_string());
        context.insert("valid_until", &valid_until);

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|error| DocumentError::Template(format!("{error:?}")))
    }

    async fn convert_html_to_pdf(
        &self,
        html_path: &Path,
        pdf_path: &Path,
        wkhtmltopdf_path: &Path,
    ) -> Result<(), DocumentError> {
        let output = Command::new(wkhtmltopdf_path)
            .args(["--page-size", "A4"])
            .args(["--margin-top", "10mm", "--margin-bottom", "10mm"])
            .args(["--margin-left", "10mm", "--margin-right", "10mm"])
            .args(["--encoding", "utf-8"])
            .arg("--enable-local-file-access")
            .arg(html_path)
            .arg(pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, "wkhtmltopdf failed");
            return Err(DocumentError::Conversion(stderr.to_string()));
        }
        Ok(())
    }

    async fn write_document(
        &self,
        metadata: &ProposalMetadata,
        quote: &Quote,
    ) -> Result<GeneratedDocument, DocumentError> {
        let html = self.render_html(metadata, quote)?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let stem = format!(
            "proposal-{}-{}-{}",
            quote.id.0,
            Utc::now().format("%Y%m%d%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let html_path = self.output_dir.join(format!("{stem}.html"));
        tokio::fs::write(&html_path, &html).await?;

        let Some(wkhtmltopdf) = self.wkhtmltopdf_path.as_deref() else {
            return Ok(GeneratedDocument { path: html_path, format: DocumentFormat::Html });
        };

        let pdf_path = self.output_dir.join(format!("{stem}.pdf"));
        match self.convert_html_to_pdf(&html_path, &pdf_path, wkhtmltopdf).await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&html_path).await;
                Ok(GeneratedDocument { path: pdf_path, format: DocumentFormat::Pdf })
            }
            Err(error) => {
                warn!(error = %error, "PDF conversion failed, falling back to HTML");
                Ok(GeneratedDocument { path: html_path, format: DocumentFormat::Html })
            }
        }
    }
}

fn embedded_templates() -> Result<Tera, DocumentError> {
    let mut tera = Tera::default();
    register_template_filters(&mut tera);
    tera.add_raw_template(TEMPLATE_NAME, include_str!("../templates/proposal.html.tera"))
        .map_err(|error| DocumentError::Template(error.to_string()))?;
    Ok(tera)
}

fn load_template_dir(dir: &Path) -> Result<Tera, DocumentError> {
    let pattern = format!("{}/**/*.tera", dir.display());
    let mut tera =
        Tera::new(&pattern).map_err(|error| DocumentError::Template(error.to_string()))?;
    register_template_filters(&mut tera);
    if !tera.get_template_names().any(|name| name == TEMPLATE_NAME) {
        return Err(DocumentError::Template(format!(
            "template directory `{}` has no `{TEMPLATE_NAME}`",
            dir.display()
        )));
    }
    Ok(tera)
}

#[async_trait]
impl DocumentGenerator for ProposalRenderer {
    async fn generate_document(
        &self,
        metadata: &ProposalMetadata,
        quote: &Quote,
    ) -> Result<GeneratedDocument, CollaboratorError> {
        Ok(self.write_document(metadata, quote).await?)
    }
}
