use tracing::{info, warn};

use crate::audit::AuditCategory;
use crate::collaborators::DocumentGenerator;
use crate::domain::export::{ExportSnapshot, GeneratedDocument, ProposalMetadata};
use crate::domain::quote::Quote;
use crate::errors::CollaboratorError;
use crate::workflows::{Negotiator, WorkflowOutcome};

impl<S, D> Negotiator<S, D> {
    /// Opens the export dialog over a copy of `quote`.
    ///
    /// The copy is frozen: re-quoting afterwards does not change what gets
    /// exported.
    pub fn open_export(&self, quote: Quote) {
        let quote_id = quote.id.clone();
        let ticket = self.store.capture_export(ExportSnapshot::capture(quote));
        info!(
            event_name = "export.opened",
            correlation_id = %ticket,
            quote_id = %quote_id.0,
            "export dialog opened"
        );
        self.audit.emit(self.record(
            Some(quote_id),
            ticket.to_string(),
            "export.opened",
            AuditCategory::Export,
            WorkflowOutcome::Completed,
        ));
    }

    /// Closes the export dialog and drops the captured quote.
    pub fn close_export(&self) {
        self.store.close_export();
    }
}

impl<S, D> Negotiator<S, D>
where
    D: DocumentGenerator,
{
    /// Renders the captured quote with `metadata` and closes the dialog.
    ///
    /// Returns `Ok(None)` when no export is open. The snapshot is consumed, so
    /// a second call without reopening does nothing. Rendering failures are
    /// returned to the caller and do not touch the session error.
    pub async fn complete_export(
        &self,
        metadata: ProposalMetadata,
    ) -> Result<Option<GeneratedDocument>, CollaboratorError> {
        let Some((ticket, snapshot)) = self.store.take_export() else {
            self.store.finish_export(None);
            return Ok(None);
        };
        let quote_id = snapshot.quote.id.clone();

        let result = self.documents.generate_document(&metadata, &snapshot.quote).await;
        self.store.finish_export(Some(ticket));

        let outcome = match &result {
            Ok(document) => {
                info!(
                    event_name = "export.generated",
                    correlation_id = %ticket,
                    quote_id = %quote_id.0,
                    path = %document.path.display(),
                    format = document.format.extension(),
                    "proposal document generated"
                );
                WorkflowOutcome::Completed
            }
            Err(error) => {
                warn!(
                    event_name = "export.failed",
                    correlation_id = %ticket,
                    quote_id = %quote_id.0,
                    error_class = error.class(),
                    error = %error,
                    "proposal document generation failed"
                );
                WorkflowOutcome::Failed
            }
        };

        let mut event = self.record(
            Some(quote_id),
            ticket.to_string(),
            "export.settled",
            AuditCategory::Export,
            outcome,
        );
        match &result {
            Ok(document) => event = event.with_metadata("format", document.format.extension()),
            Err(error) => event = event.with_metadata("error_class", error.class()),
        }
        self.audit.emit(event);

        result.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use crate::audit::{AuditOutcome, InMemoryAuditSink};
    use crate::domain::counter_offer::ClientCounterOffer;
    use crate::domain::export::ProposalMetadata;
    use crate::domain::project::ProjectDescription;
    use crate::errors::CollaboratorError;
    use crate::session::SessionPhase;
    use crate::workflows::testing::{sample_quote, Gate, RecordingDocuments, ScriptedStrategist};
    use crate::workflows::{Negotiator, WorkflowOutcome};

    fn metadata() -> ProposalMetadata {
        ProposalMetadata {
            company_name: "Northwind Studio".to_string(),
            client_name: "Acme".to_string(),
            ..ProposalMetadata::default()
        }
    }

    #[tokio::test]
    async fn export_renders_snapshot_and_closes_dialog() {
        let documents = RecordingDocuments::default();
        let negotiator = Negotiator::new(ScriptedStrategist::default(), documents.clone());
        let quote = sample_quote("website");

        negotiator.open_export(quote.clone());
        assert_eq!(negotiator.session().phase(), SessionPhase::Empty);
        assert!(negotiator.session().is_export_open());

        let document = negotiator.complete_export(metadata()).await.expect("export succeeds");

        assert!(document.is_some());
        assert!(!negotiator.session().is_export_open());
        let generated = documents.generated();
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].1, quote);
        assert_eq!(generated[0].0.company_name, "Northwind Studio");
    }

    #[tokio::test]
    async fn requote_after_opening_does_not_change_exported_quote() {
        let strategist = ScriptedStrategist::default();
        let first = sample_quote("website");
        strategist.push_quote(Ok(first.clone()));
        strategist.push_quote(Ok(sample_quote("mobile app")));
        let documents = RecordingDocuments::default();
        let negotiator = Negotiator::new(strategist, documents.clone());

        negotiator.request_quote(ProjectDescription::new("website")).await;
        negotiator.open_export(negotiator.session().quote().expect("quote ready"));
        negotiator.request_quote(ProjectDescription::new("mobile app")).await;

        assert_eq!(
            negotiator.session().export_snapshot().map(|snapshot| snapshot.quote),
            Some(first.clone())
        );
        negotiator.complete_export(metadata()).await.expect("export succeeds");
        assert_eq!(documents.generated()[0].1, first);
    }

    #[tokio::test]
    async fn snapshot_is_consumed_once() {
        let documents = RecordingDocuments::default();
        let negotiator = Negotiator::new(ScriptedStrategist::default(), documents.clone());
        negotiator.open_export(sample_quote("website"));

        assert!(negotiator.complete_export(metadata()).await.expect("first").is_some());
        assert!(negotiator.complete_export(metadata()).await.expect("second").is_none());
        assert_eq!(documents.generated().len(), 1);
    }

    #[tokio::test]
    async fn closing_drops_the_snapshot() {
        let documents = RecordingDocuments::default();
        let negotiator = Negotiator::new(ScriptedStrategist::default(), documents.clone());
        negotiator.open_export(sample_quote("website"));

        negotiator.close_export();

        assert!(!negotiator.session().is_export_open());
        assert!(negotiator.session().export_snapshot().is_none());
        assert!(negotiator.complete_export(metadata()).await.expect("noop").is_none());
        assert!(documents.generated().is_empty());
    }

    #[tokio::test]
    async fn rendering_failure_is_returned_without_session_error() {
        let sink = InMemoryAuditSink::default();
        let documents = RecordingDocuments::failing(CollaboratorError::Rendering(
            "wkhtmltopdf exited with 1".to_string(),
        ));
        let negotiator = Negotiator::new(ScriptedStrategist::default(), documents)
            .with_audit_sink(Arc::new(sink.clone()));
        negotiator.open_export(sample_quote("website"));

        let error = negotiator.complete_export(metadata()).await.expect_err("rendering fails");

        assert_eq!(error.class(), "rendering");
        assert!(negotiator.session().error().is_none());
        assert!(!negotiator.session().is_export_open());
        let settled = sink.events().into_iter().find(|event| event.event_type == "export.settled");
        assert_eq!(settled.map(|event| event.outcome), Some(AuditOutcome::Failed));
    }

    #[tokio::test]
    async fn export_reopened_while_rendering_stays_open() {
        let gate = Gate::new();
        let documents = RecordingDocuments::default().with_gate(gate.clone());
        let negotiator = Negotiator::new(ScriptedStrategist::default(), documents.clone());
        negotiator.open_export(sample_quote("website"));

        let reopen = async {
            gate.entered().await;
            negotiator.open_export(sample_quote("mobile app"));
            gate.release();
        };
        let (first, ()) = tokio::join!(negotiator.complete_export(metadata()), reopen);

        assert!(first.expect("first export").is_some());
        assert!(negotiator.session().is_export_open());
        let pending = negotiator.session().export_snapshot().expect("second snapshot");
        assert!(pending.quote.narrative.contains("mobile app"));
    }

    #[tokio::test]
    async fn website_scenario_keeps_transcript_through_failed_analysis() {
        let strategist = ScriptedStrategist::default();
        strategist.push_quote(Ok(sample_quote("website")));
        strategist.push_reply(Ok("Anchor on the discovery phase.".to_string()));
        strategist.push_analysis(Err(CollaboratorError::Transport("timeout".to_string())));
        let negotiator = Negotiator::new(strategist, RecordingDocuments::default());

        let description: ProjectDescription =
            serde_json::from_str(r#"{"scope":"website"}"#).expect("brief parses");
        assert_eq!(negotiator.request_quote(description).await, WorkflowOutcome::Completed);
        assert_eq!(negotiator.session().transcript().len(), 1);

        assert_eq!(
            negotiator.send_chat_message("how do I justify the price?").await,
            WorkflowOutcome::Completed
        );
        assert_eq!(negotiator.session().transcript().len(), 3);

        assert_eq!(
            negotiator.analyze_counter_offer(ClientCounterOffer::new(Decimal::new(2_500, 0))).await,
            WorkflowOutcome::Failed
        );
        let state = negotiator.snapshot();
        assert_eq!(state.transcript.len(), 3);
        assert!(state.analysis.is_none());
        assert_eq!(state.error.as_deref(), Some(negotiator.messages().analysis_failed.as_str()));
        assert!(state.quote.is_some());
    }
}
