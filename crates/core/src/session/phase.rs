use serde::{Deserialize, Serialize};

use crate::session::state::SessionState;

/// Dominant session phase, derived from the state slots.
///
/// `Error` is not a phase: a failed quote request leaves the session `Empty`
/// with the error slot set. Export is a side excursion from `QuoteReady`, so
/// it ranks below the loading phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Empty,
    QuoteLoading,
    QuoteReady,
    AnalysisLoading,
    ChatLoading,
    ExportOpen,
}

impl SessionPhase {
    pub fn of(state: &SessionState) -> Self {
        if state.quote_loading {
            return Self::QuoteLoading;
        }
        if state.quote.is_none() {
            return Self::Empty;
        }
        if state.analysis_loading {
            Self::AnalysisLoading
        } else if state.chat_loading {
            Self::ChatLoading
        } else if state.export_open {
            Self::ExportOpen
        } else {
            Self::QuoteReady
        }
    }

    pub fn has_quote(&self) -> bool {
        !matches!(self, Self::Empty | Self::QuoteLoading)
    }
}
