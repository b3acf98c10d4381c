use tracing::{info, warn};

use crate::audit::AuditCategory;
use crate::collaborators::Strategist;
use crate::domain::chat::ChatMessage;
use crate::domain::project::ProjectDescription;
use crate::session::LoadingKind;
use crate::workflows::{Negotiator, WorkflowOutcome};

impl<S, D> Negotiator<S, D>
where
    S: Strategist,
{
    /// Replaces the session with a fresh quote for `description`.
    ///
    /// Always allowed. The prior quote, analysis and transcript are cleared
    /// before the strategist is called, and the brief is stored even if the
    /// request later fails.
    pub async fn request_quote(&self, description: ProjectDescription) -> WorkflowOutcome {
        let pending = self.store.begin(LoadingKind::Quote, |state| {
            state.error = None;
            state.quote = None;
            state.analysis = None;
            state.project = Some(description.clone());
            state.transcript.clear();
        });
        info!(
            event_name = "quote.requested",
            correlation_id = %pending.ticket,
            scope = %description.scope,
            "requesting quote from strategist"
        );

        let result = self.strategist.generate_quote(&description).await;

        let (outcome, quote_id, failure_class) = match result {
            Ok(quote) => {
                let quote_id = quote.id.clone();
                let greeting = self.messages.quote_greeting.clone();
                let fresh = self.store.settle(&pending, |state| {
                    state.quote = Some(quote);
                    state.transcript.push(ChatMessage::assistant(greeting));
                });
                let outcome =
                    if fresh { WorkflowOutcome::Completed } else { WorkflowOutcome::Discarded };
                (outcome, Some(quote_id), None)
            }
            Err(error) => {
                warn!(
                    event_name = "quote.failed",
                    correlation_id = %pending.ticket,
                    error_class = error.class(),
                    error = %error,
                    "quote generation failed"
                );
                let message = self.messages.quote_failed.clone();
                let fresh = self.store.settle(&pending, |state| state.error = Some(message));
                let outcome = if fresh { WorkflowOutcome::Failed } else { WorkflowOutcome::Discarded };
                (outcome, None, Some(error.class()))
            }
        };

        if outcome == WorkflowOutcome::Discarded {
            info!(
                event_name = "quote.discarded",
                correlation_id = %pending.ticket,
                "quote completion arrived after the session moved on"
            );
        }

        let mut event = self.record(
            quote_id,
            pending.ticket.to_string(),
            "quote.settled",
            AuditCategory::Quote,
            outcome,
        );
        if let Some(class) = failure_class {
            event = event.with_metadata("error_class", class);
        }
        self.audit.emit(event);
        outcome
    }
}
