use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn generate() -> Self {
        Self(format!("Q-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub description: String,
    #[serde(default)]
    pub hours: Option<Decimal>,
    pub amount: Decimal,
}

/// A priced proposal produced by the strategist for one project brief.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub line_items: Vec<QuoteLineItem>,
    pub total: Decimal,
    pub currency: String,
    #[serde(default)]
    pub estimated_timeline: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    pub narrative: String,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn line_items_total(&self) -> Decimal {
        self.line_items.iter().map(|item| item.amount).sum()
    }

    /// Structural checks applied to strategist output before it enters a session.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.narrative.trim().is_empty() {
            return Err(DomainError::InvariantViolation("quote narrative is empty".to_string()));
        }
        if self.line_items.is_empty() {
            return Err(DomainError::InvariantViolation(
                "quote must contain at least one line item".to_string(),
            ));
        }
        if let Some(item) = self.line_items.iter().find(|item| item.amount.is_sign_negative()) {
            return Err(DomainError::InvariantViolation(format!(
                "line item `{}` has a negative amount",
                item.description
            )));
        }
        if self.total.is_sign_negative() {
            return Err(DomainError::InvariantViolation("quote total is negative".to_string()));
        }
        Ok(())
    }
}
