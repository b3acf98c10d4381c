use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMessage;
use crate::domain::counter_offer::CounterOfferAnalysis;
use crate::domain::project::ProjectDescription;
use crate::domain::quote::Quote;
use crate::session::phase::SessionPhase;

/// Every slot a presentation layer can observe. `Default` is the initial state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub project: Option<ProjectDescription>,
    pub quote: Option<Quote>,
    pub analysis: Option<CounterOfferAnalysis>,
    pub transcript: Vec<ChatMessage>,
    pub quote_loading: bool,
    pub analysis_loading: bool,
    pub chat_loading: bool,
    pub error: Option<String>,
    pub chat_open: bool,
    pub export_open: bool,
}

impl SessionState {
    /// Analysis and chat require both a brief and a quote.
    pub fn negotiation_context(&self) -> Option<(ProjectDescription, Quote)> {
        match (&self.project, &self.quote) {
            (Some(project), Some(quote)) => Some((project.clone(), quote.clone())),
            _ => None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_any_loading(&self) -> bool {
        self.quote_loading || self.analysis_loading || self.chat_loading
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::of(self)
    }
}
