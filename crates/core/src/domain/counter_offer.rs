use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The client's pushback on a quote. Supplied per analysis request and never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCounterOffer {
    pub proposed_price: Decimal,
    #[serde(default)]
    pub proposed_terms: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl ClientCounterOffer {
    pub fn new(proposed_price: Decimal) -> Self {
        Self { proposed_price, proposed_terms: None, remarks: None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    Counter,
    Decline,
}

impl std::str::FromStr for Recommendation {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "counter" | "counter_offer" | "negotiate" => Ok(Self::Counter),
            "decline" | "reject" => Ok(Self::Decline),
            other => Err(format!("unknown recommendation `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOfferAnalysis {
    pub recommendation: Recommendation,
    #[serde(default)]
    pub suggested_price: Option<Decimal>,
    pub rationale: String,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub talking_points: Vec<String>,
}
