use async_trait::async_trait;
use chrono::Utc;
use dealcraft_core::collaborators::Strategist;
use dealcraft_core::domain::chat::ChatMessage;
use dealcraft_core::domain::counter_offer::{ClientCounterOffer, CounterOfferAnalysis};
use dealcraft_core::domain::project::ProjectDescription;
use dealcraft_core::domain::quote::{Quote, QuoteId, QuoteLineItem};
use dealcraft_core::errors::CollaboratorError;
use dealcraft_core::messages::Locale;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::llm::{LlmClient, LlmPrompt};
use crate::prompts;

/// [`Strategist`] backed by a language model.
pub struct LlmStrategist<C> {
    client: C,
    locale: Locale,
}

impl<C> LlmStrategist<C>
where
    C: LlmClient,
{
    pub fn new(client: C) -> Self {
        Self { client, locale: Locale::default() }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    async fn complete(&self, prompt: &LlmPrompt) -> Result<String, CollaboratorError> {
        self.client
            .complete(prompt)
            .await
            .map_err(|error| CollaboratorError::Transport(format!("{error:#}")))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteDraft {
    #[serde(default)]
    line_items: Vec<LineItemDraft>,
    #[serde(default)]
    total: Option<Decimal>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    estimated_timeline: Option<String>,
    #[serde(default)]
    payment_terms: Option<String>,
    #[serde(default)]
    narrative: String,
}

#[derive(Debug, Deserialize)]
struct LineItemDraft {
    description: String,
    #[serde(default)]
    hours: Option<Decimal>,
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct AnalysisDraft {
    recommendation: String,
    #[serde(default)]
    suggested_price: Option<Decimal>,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    risks: Vec<String>,
    #[serde(default)]
    talking_points: Vec<String>,
}

/// Removes a surrounding markdown code fence and any prose around the JSON object.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = match trimmed.strip_prefix("```") {
        Some(rest) => {
            let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
            body.trim_end().strip_suffix("```").unwrap_or(body).trim()
        }
        None => trimmed,
    };
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T, CollaboratorError> {
    serde_json::from_str(strip_code_fences(raw)).map_err(|error| {
        CollaboratorError::InvalidResponse(format!("{what} is not valid JSON: {error}"))
    })
}

pub fn parse_quote(
    raw: &str,
    description: &ProjectDescription,
) -> Result<Quote, CollaboratorError> {
    let draft: QuoteDraft = parse_json(raw, "quote")?;
    let line_items: Vec<QuoteLineItem> = draft
        .line_items
        .into_iter()
        .map(|item| QuoteLineItem {
            description: item.description,
            hours: item.hours,
            amount: item.amount,
        })
        .collect();
    let currency = draft
        .currency
        .filter(|currency| !currency.trim().is_empty())
        .unwrap_or_else(|| description.currency.clone());

    let mut quote = Quote {
        id: QuoteId::generate(),
        line_items,
        total: Decimal::ZERO,
        currency,
        estimated_timeline: draft.estimated_timeline,
        payment_terms: draft.payment_terms,
        narrative: draft.narrative.trim().to_string(),
        created_at: Utc::now(),
    };
    quote.total = draft.total.unwrap_or_else(|| quote.line_items_total());
    quote.validate()?;
    Ok(quote)
}

pub fn parse_analysis(raw: &str) -> Result<CounterOfferAnalysis, CollaboratorError> {
    let draft: AnalysisDraft = parse_json(raw, "counter-offer analysis")?;
    let recommendation =
        draft.recommendation.parse().map_err(CollaboratorError::InvalidResponse)?;
    if draft.rationale.trim().is_empty() {
        return Err(CollaboratorError::InvalidResponse(
            "counter-offer analysis has an empty rationale".to_string(),
        ));
    }
    if draft.suggested_price.is_some_and(|price| price.is_sign_negative()) {
        return Err(CollaboratorError::InvalidResponse(
            "counter-offer analysis suggests a negative price".to_string(),
        ));
    }

    Ok(CounterOfferAnalysis {
        recommendation,
        suggested_price: draft.suggested_price,
        rationale: draft.rationale.trim().to_string(),
        risks: draft.risks,
        talking_points: draft.talking_points,
    })
}

#[async_trait]
impl<C> Strategist for LlmStrategist<C>
where
    C: LlmClient,
{
    async fn generate_quote(
        &self,
        description: &ProjectDescription,
    ) -> Result<Quote, CollaboratorError> {
        let raw = self.complete(&prompts::quote_prompt(description, self.locale)).await?;
        let quote = parse_quote(&raw, description)?;
        debug!(quote_id = %quote.id.0, line_items = quote.line_items.len(), "parsed llm quote");
        Ok(quote)
    }

    async fn analyze_counter_offer(
        &self,
        description: &ProjectDescription,
        quote: &Quote,
        offer: &ClientCounterOffer,
    ) -> Result<CounterOfferAnalysis, CollaboratorError> {
        let prompt = prompts::counter_offer_prompt(description, quote, offer, self.locale);
        let raw = self.complete(&prompt).await?;
        parse_analysis(&raw)
    }

    async fn chat_response(
        &self,
        description: &ProjectDescription,
        quote: &Quote,
        transcript: &[ChatMessage],
    ) -> Result<String, CollaboratorError> {
        let prompt = prompts::chat_prompt(description, quote, transcript, self.locale);
        let reply = self.complete(&prompt).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(CollaboratorError::InvalidResponse("empty chat reply".to_string()));
        }
        Ok(reply.to_string())
    }
}
