use tracing::{debug, info, warn};

use crate::audit::AuditCategory;
use crate::collaborators::Strategist;
use crate::domain::chat::ChatMessage;
use crate::domain::counter_offer::ClientCounterOffer;
use crate::session::LoadingKind;
use crate::workflows::{Negotiator, WorkflowOutcome};

impl<S, D> Negotiator<S, D>
where
    S: Strategist,
{
    /// Asks the strategist to assess a client counter-offer against the
    /// current quote. A no-op unless both a brief and a quote are present.
    pub async fn analyze_counter_offer(&self, offer: ClientCounterOffer) -> WorkflowOutcome {
        let started = self.store.begin_if(LoadingKind::Analysis, |state| {
            let context = state.negotiation_context()?;
            state.error = None;
            state.analysis = None;
            Some(context)
        });
        let Some((pending, (project, quote))) = started else {
            debug!(
                event_name = "analysis.skipped",
                "counter-offer analysis requested without an active quote"
            );
            self.audit.emit(self.record(
                None,
                "session",
                "analysis.skipped",
                AuditCategory::Analysis,
                WorkflowOutcome::Skipped,
            ));
            return WorkflowOutcome::Skipped;
        };
        info!(
            event_name = "analysis.requested",
            correlation_id = %pending.ticket,
            quote_id = %quote.id.0,
            proposed_price = %offer.proposed_price,
            "analyzing client counter-offer"
        );

        let result = self.strategist.analyze_counter_offer(&project, &quote, &offer).await;

        let (fresh, failure_class) = match result {
            Ok(analysis) => {
                (self.store.settle(&pending, |state| state.analysis = Some(analysis)), None)
            }
            Err(error) => {
                warn!(
                    event_name = "analysis.failed",
                    correlation_id = %pending.ticket,
                    quote_id = %quote.id.0,
                    error_class = error.class(),
                    error = %error,
                    "counter-offer analysis failed"
                );
                let message = self.messages.analysis_failed.clone();
                (self.store.settle(&pending, |state| state.error = Some(message)), Some(error.class()))
            }
        };
        let outcome = match (fresh, failure_class) {
            (false, _) => WorkflowOutcome::Discarded,
            (true, None) => WorkflowOutcome::Completed,
            (true, Some(_)) => WorkflowOutcome::Failed,
        };

        let mut event = self.record(
            Some(quote.id.clone()),
            pending.ticket.to_string(),
            "analysis.settled",
            AuditCategory::Analysis,
            outcome,
        );
        if let Some(class) = failure_class {
            event = event.with_metadata("error_class", class);
        }
        self.audit.emit(event);
        outcome
    }

    /// Appends the user's message, then the strategist's reply.
    ///
    /// A no-op unless both a brief and a quote are present. The user message
    /// is visible before the call is made; a failed call appends the fixed
    /// apology instead of touching the session error.
    pub async fn send_chat_message(&self, text: impl Into<String>) -> WorkflowOutcome {
        let text = text.into();
        let started = self.store.begin_if(LoadingKind::Chat, |state| {
            let (project, quote) = state.negotiation_context()?;
            state.transcript.push(ChatMessage::user(text.clone()));
            Some((project, quote, state.transcript.clone()))
        });
        let Some((pending, (project, quote, transcript))) = started else {
            debug!(event_name = "chat.skipped", "chat message sent without an active quote");
            self.audit.emit(self.record(
                None,
                "session",
                "chat.skipped",
                AuditCategory::Chat,
                WorkflowOutcome::Skipped,
            ));
            return WorkflowOutcome::Skipped;
        };
        info!(
            event_name = "chat.requested",
            correlation_id = %pending.ticket,
            quote_id = %quote.id.0,
            transcript_len = transcript.len(),
            "requesting strategist reply"
        );

        let (reply, failure_class) =
            match self.strategist.chat_response(&project, &quote, &transcript).await {
                Ok(reply) => (reply, None),
                Err(error) => {
                    warn!(
                        event_name = "chat.failed",
                        correlation_id = %pending.ticket,
                        quote_id = %quote.id.0,
                        error_class = error.class(),
                        error = %error,
                        "strategist reply failed; appending apology"
                    );
                    (self.messages.chat_apology.clone(), Some(error.class()))
                }
            };

        let fresh = self
            .store
            .settle(&pending, |state| state.transcript.push(ChatMessage::assistant(reply)));
        let outcome = match (fresh, failure_class) {
            (false, _) => WorkflowOutcome::Discarded,
            (true, None) => WorkflowOutcome::Completed,
            (true, Some(_)) => WorkflowOutcome::Failed,
        };

        let mut event = self
            .record(
                Some(quote.id.clone()),
                pending.ticket.to_string(),
                "chat.settled",
                AuditCategory::Chat,
                outcome,
            )
            .with_metadata("transcript_len", transcript.len().to_string());
        if let Some(class) = failure_class {
            event = event.with_metadata("error_class", class);
        }
        self.audit.emit(event);
        outcome
    }
}
