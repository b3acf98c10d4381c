use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
}

/// The brief a user submits to obtain a quote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescription {
    #[serde(default)]
    pub title: String,
    pub scope: String,
    #[serde(default)]
    pub client: ClientProfile,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub budget_hint: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl ProjectDescription {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into(), currency: default_currency(), ..Self::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_client(mut self, name: impl Into<String>, industry: Option<String>) -> Self {
        self.client = ClientProfile { name: name.into(), industry };
        self
    }

    pub fn with_deliverable(mut self, deliverable: impl Into<String>) -> Self {
        self.deliverables.push(deliverable.into());
        self
    }

    pub fn with_budget_hint(mut self, budget: Decimal) -> Self {
        self.budget_hint = Some(budget);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}
