//! Negotiation-session orchestrator.
//!
//! [`Negotiator`] owns one [`SessionStore`] and drives it through the quote,
//! negotiation and export workflows. Each workflow operation raises its
//! loading flag, awaits exactly one collaborator call with the session lock
//! released, then settles: the flag is always lowered, and the result is
//! discarded if the session was reset or re-quoted in the meantime.

pub mod export;
pub mod negotiation;
pub mod quote;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, NoopAuditSink};
use crate::domain::quote::QuoteId;
use crate::messages::SessionMessages;
use crate::session::{SessionState, SessionStore};

/// How a workflow operation ended, from the caller's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// The collaborator answered and the session was updated.
    Completed,
    /// The collaborator failed; the session now carries the fallback.
    Failed,
    /// Preconditions were not met; nothing changed.
    Skipped,
    /// The session moved on while the call was pending; the result was dropped.
    Discarded,
}

impl WorkflowOutcome {
    fn audit_outcome(&self) -> AuditOutcome {
        match self {
            Self::Completed => AuditOutcome::Success,
            Self::Failed => AuditOutcome::Failed,
            Self::Skipped => AuditOutcome::Skipped,
            Self::Discarded => AuditOutcome::Discarded,
        }
    }
}

pub struct Negotiator<S, D> {
    store: SessionStore,
    strategist: S,
    documents: D,
    messages: SessionMessages,
    audit: Arc<dyn AuditSink>,
}

impl<S, D> Negotiator<S, D> {
    pub fn new(strategist: S, documents: D) -> Self {
        Self {
            store: SessionStore::new(),
            strategist,
            documents,
            messages: SessionMessages::default(),
            audit: Arc::new(NoopAuditSink),
        }
    }

    pub fn with_messages(mut self, messages: SessionMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    pub fn snapshot(&self) -> SessionState {
        self.store.snapshot()
    }

    pub fn messages(&self) -> &SessionMessages {
        &self.messages
    }

    pub fn reset(&self) {
        let quote_id = self.store.quote().map(|quote| quote.id);
        self.store.reset();
        info!(
            event_name = "session.reset",
            quote_id = quote_id.as_ref().map(|id| id.0.as_str()).unwrap_or("none"),
            "negotiation session reset"
        );
        self.audit.emit(AuditEvent::new(
            quote_id,
            "session",
            "session.reset",
            AuditCategory::Session,
            AuditOutcome::Success,
        ));
    }

    pub fn open_chat(&self) {
        self.store.set_chat_open(true);
    }

    pub fn close_chat(&self) {
        self.store.set_chat_open(false);
    }

    fn record(
        &self,
        quote_id: Option<QuoteId>,
        correlation_id: impl Into<String>,
        event_type: &str,
        category: AuditCategory,
        outcome: WorkflowOutcome,
    ) -> AuditEvent {
        AuditEvent::new(quote_id, correlation_id, event_type, category, outcome.audit_outcome())
    }
}
