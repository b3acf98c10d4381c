//! HTTP surface over a single negotiation session.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use dealcraft_core::{
    ApplicationError, ClientCounterOffer, DocumentGenerator, DomainError, GeneratedDocument,
    InterfaceError, Negotiator, ProjectDescription, ProposalMetadata, SessionPhase, SessionState,
    Strategist, WorkflowOutcome,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

pub type SharedNegotiator<S, D> = Arc<Negotiator<S, D>>;

#[derive(Clone, Debug, Serialize)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<WorkflowOutcome>,
    pub phase: SessionPhase,
    pub session: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<GeneratedDocument>,
}

impl SessionResponse {
    fn of<S, D>(negotiator: &Negotiator<S, D>, outcome: Option<WorkflowOutcome>) -> Self {
        let session = negotiator.snapshot();
        Self { outcome, phase: session.phase(), session, document: None }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub kind: &'static str,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    fn from_application(error: ApplicationError) -> Self {
        Self(error.into_interface(format!("req-{}", Uuid::new_v4().simple())))
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self(InterfaceError::Conflict {
            message: message.into(),
            correlation_id: format!("req-{}", Uuid::new_v4().simple()),
        })
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Detail stays in the log; the body only carries fixed strings.
        warn!(
            event_name = "api.request_failed",
            correlation_id = %self.0.correlation_id(),
            status = status.as_u16(),
            error = %self.0,
            "request failed"
        );
        let body = ErrorBody {
            error: self.0.user_message(),
            kind: self.0.kind(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<SessionResponse>, ApiError>;

pub fn router<S, D>(negotiator: SharedNegotiator<S, D>) -> Router
where
    S: Strategist + 'static,
    D: DocumentGenerator + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/session", get(session::<S, D>))
        .route("/api/v1/session/quote", post(request_quote::<S, D>))
        .route("/api/v1/session/counter-offer", post(analyze_counter_offer::<S, D>))
        .route("/api/v1/session/chat", post(send_chat_message::<S, D>))
        .route("/api/v1/session/chat/open", post(open_chat::<S, D>))
        .route("/api/v1/session/chat/close", post(close_chat::<S, D>))
        .route("/api/v1/session/export/open", post(open_export::<S, D>))
        .route("/api/v1/session/export/complete", post(complete_export::<S, D>))
        .route("/api/v1/session/export/close", post(close_export::<S, D>))
        .route("/api/v1/session/reset", post(reset::<S, D>))
        .with_state(negotiator)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checked_at: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ready", checked_at: Utc::now().to_rfc3339() })
}

pub async fn session<S, D>(State(negotiator): State<SharedNegotiator<S, D>>) -> Json<SessionResponse>
where
    S: Send + Sync,
    D: Send + Sync,
{
    Json(SessionResponse::of(&negotiator, None))
}

pub async fn request_quote<S, D>(
    State(negotiator): State<SharedNegotiator<S, D>>,
    Json(description): Json<ProjectDescription>,
) -> ApiResult
where
    S: Strategist,
    D: Send + Sync,
{
    if description.scope.trim().is_empty() {
        return Err(ApiError::from_application(ApplicationError::Domain(
            DomainError::InvariantViolation("project scope is empty".to_string()),
        )));
    }
    let outcome = negotiator.request_quote(description).await;
    Ok(Json(SessionResponse::of(&negotiator, Some(outcome))))
}

pub async fn analyze_counter_offer<S, D>(
    State(negotiator): State<SharedNegotiator<S, D>>,
    Json(offer): Json<ClientCounterOffer>,
) -> ApiResult
where
    S: Strategist,
    D: Send + Sync,
{
    if offer.proposed_price.is_sign_negative() {
        return Err(ApiError::from_application(ApplicationError::Domain(
            DomainError::InvariantViolation("proposed price is negative".to_string()),
        )));
    }
    let outcome = negotiator.analyze_counter_offer(offer).await;
    Ok(Json(SessionResponse::of(&negotiator, Some(outcome))))
}

pub async fn send_chat_message<S, D>(
    State(negotiator): State<SharedNegotiator<S, D>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult
where
    S: Strategist,
    D: Send + Sync,
{
    if request.message.trim().is_empty() {
        return Err(ApiError::from_application(ApplicationError::Domain(
            DomainError::InvariantViolation("chat message is empty".to_string()),
        )));
    }
    let outcome = negotiator.send_chat_message(request.message).await;
    Ok(Json(SessionResponse::of(&negotiator, Some(outcome))))
}

pub async fn open_chat<S, D>(State(negotiator): State<SharedNegotiator<S, D>>) -> Json<SessionResponse>
where
    S: Send + Sync,
    D: Send + Sync,
{
    negotiator.open_chat();
    Json(SessionResponse::of(&negotiator, None))
}

pub async fn close_chat<S, D>(
    State(negotiator): State<SharedNegotiator<S, D>>,
) -> Json<SessionResponse>
where
    S: Send + Sync,
    D: Send + Sync,
{
    negotiator.close_chat();
    Json(SessionResponse::of(&negotiator, None))
}

/// Opens the export dialog over the session's current quote.
pub async fn open_export<S, D>(State(negotiator): State<SharedNegotiator<S, D>>) -> ApiResult
where
    S: Send + Sync,
    D: Send + Sync,
{
    let Some(quote) = negotiator.session().quote() else {
        return Err(ApiError::conflict("no quote to export"));
    };
    negotiator.open_export(quote);
    Ok(Json(SessionResponse::of(&negotiator, None)))
}

pub async fn complete_export<S, D>(
    State(negotiator): State<SharedNegotiator<S, D>>,
    Json(metadata): Json<ProposalMetadata>,
) -> ApiResult
where
    S: Send + Sync,
    D: DocumentGenerator,
{
    match negotiator.complete_export(metadata).await {
        Ok(Some(document)) => {
            let mut response = SessionResponse::of(&negotiator, Some(WorkflowOutcome::Completed));
            response.document = Some(document);
            Ok(Json(response))
        }
        Ok(None) => Err(ApiError::from_application(ApplicationError::NoPendingExport)),
        Err(error) => Err(ApiError::from_application(ApplicationError::Collaborator(error))),
    }
}

pub async fn close_export<S, D>(
    State(negotiator): State<SharedNegotiator<S, D>>,
) -> Json<SessionResponse>
where
    S: Send + Sync,
    D: Send + Sync,
{
    negotiator.close_export();
    Json(SessionResponse::of(&negotiator, None))
}

pub async fn reset<S, D>(State(negotiator): State<SharedNegotiator<S, D>>) -> Json<SessionResponse>
where
    S: Send + Sync,
    D: Send + Sync,
{
    negotiator.reset();
    Json(SessionResponse::of(&negotiator, None))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        response::IntoResponse,
        Json,
    };
    use chrono::Utc;
    use dealcraft_core::{
        ChatMessage, ClientCounterOffer, CollaboratorError, CounterOfferAnalysis, DocumentFormat,
        DocumentGenerator, GeneratedDocument, Negotiator, ProjectDescription, ProposalMetadata,
        Quote, QuoteId, QuoteLineItem, Recommendation, SessionPhase, Strategist, WorkflowOutcome,
    };
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use super::{
        analyze_counter_offer, complete_export, open_export, request_quote, reset,
        send_chat_message, ChatRequest, SharedNegotiator,
    };

    #[derive(Default)]
    struct StubStrategist {
        fail_chat: bool,
    }

    #[async_trait]
    impl Strategist for StubStrategist {
        async fn generate_quote(
            &self,
            description: &ProjectDescription,
        ) -> Result<Quote, CollaboratorError> {
            Ok(Quote {
                id: QuoteId("Q-API-0001".to_string()),
                line_items: vec![QuoteLineItem {
                    description: description.scope.clone(),
                    hours: None,
                    amount: Decimal::new(2_500, 0),
                }],
                total: Decimal::new(2_500, 0),
                currency: description.currency.clone(),
                estimated_timeline: None,
                payment_terms: None,
                narrative: "Fixed-price build.".to_string(),
                created_at: Utc::now(),
            })
        }

        async fn analyze_counter_offer(
            &self,
            _description: &ProjectDescription,
            _quote: &Quote,
            offer: &ClientCounterOffer,
        ) -> Result<CounterOfferAnalysis, CollaboratorError> {
            Ok(CounterOfferAnalysis {
                recommendation: Recommendation::Counter,
                suggested_price: Some(offer.proposed_price + Decimal::new(300, 0)),
                rationale: "Meet in the middle.".to_string(),
                risks: Vec::new(),
                talking_points: vec!["Scope stays intact.".to_string()],
            })
        }

        async fn chat_response(
            &self,
            _description: &ProjectDescription,
            _quote: &Quote,
            _transcript: &[ChatMessage],
        ) -> Result<String, CollaboratorError> {
            if self.fail_chat {
                return Err(CollaboratorError::Transport("connection reset".to_string()));
            }
            Ok("Hold the price and trade scope.".to_string())
        }
    }

    #[derive(Clone, Default)]
    struct StubDocuments {
        fail: bool,
        rendered: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DocumentGenerator for StubDocuments {
        async fn generate_document(
            &self,
            metadata: &ProposalMetadata,
            quote: &Quote,
        ) -> Result<GeneratedDocument, CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::Rendering("template missing".to_string()));
            }
            if let Ok(mut rendered) = self.rendered.lock() {
                rendered.push(metadata.client_name.clone());
            }
            Ok(GeneratedDocument {
                path: PathBuf::from(format!("proposal-{}.html", quote.id.0)),
                format: DocumentFormat::Html,
            })
        }
    }

    fn negotiator(
        strategist: StubStrategist,
        documents: StubDocuments,
    ) -> SharedNegotiator<StubStrategist, StubDocuments> {
        Arc::new(Negotiator::new(strategist, documents))
    }

    async fn quoted(
        negotiator: &SharedNegotiator<StubStrategist, StubDocuments>,
    ) -> WorkflowOutcome {
        let Json(response) = request_quote(
            State(negotiator.clone()),
            Json(ProjectDescription::new("marketing site")),
        )
        .await
        .expect("quote request accepted");
        response.outcome.expect("outcome present")
    }

    fn metadata() -> ProposalMetadata {
        ProposalMetadata {
            company_name: "Northwind Studio".to_string(),
            prepared_by: "Ana Lima".to_string(),
            client_name: "Acme Corp".to_string(),
            ..ProposalMetadata::default()
        }
    }

    #[tokio::test]
    async fn quote_request_returns_ready_session() {
        let negotiator = negotiator(StubStrategist::default(), StubDocuments::default());

        let Json(response) = request_quote(
            State(negotiator.clone()),
            Json(ProjectDescription::new("marketing site")),
        )
        .await
        .expect("quote request accepted");

        assert_eq!(response.outcome, Some(WorkflowOutcome::Completed));
        assert_eq!(response.phase, SessionPhase::QuoteReady);
        assert_eq!(response.session.transcript.len(), 1);
        assert!(!response.session.quote_loading);
    }

    #[tokio::test]
    async fn blank_scope_is_rejected_before_reaching_the_session() {
        let negotiator = negotiator(StubStrategist::default(), StubDocuments::default());

        let error = request_quote(State(negotiator.clone()), Json(ProjectDescription::new("  ")))
            .await
            .expect_err("blank scope rejected");

        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(negotiator.snapshot().project.is_none());
    }

    #[tokio::test]
    async fn counter_offer_without_quote_is_skipped() {
        let negotiator = negotiator(StubStrategist::default(), StubDocuments::default());

        let Json(response) = analyze_counter_offer(
            State(negotiator),
            Json(ClientCounterOffer::new(Decimal::new(1_800, 0))),
        )
        .await
        .expect("request accepted");

        assert_eq!(response.outcome, Some(WorkflowOutcome::Skipped));
        assert_eq!(response.phase, SessionPhase::Empty);
        assert!(response.session.analysis.is_none());
    }

    #[tokio::test]
    async fn counter_offer_analysis_is_stored() {
        let negotiator = negotiator(StubStrategist::default(), StubDocuments::default());
        assert_eq!(quoted(&negotiator).await, WorkflowOutcome::Completed);

        let Json(response) = analyze_counter_offer(
            State(negotiator),
            Json(ClientCounterOffer::new(Decimal::new(1_800, 0))),
        )
        .await
        .expect("request accepted");

        assert_eq!(response.outcome, Some(WorkflowOutcome::Completed));
        let analysis = response.session.analysis.expect("analysis stored");
        assert_eq!(analysis.suggested_price, Some(Decimal::new(2_100, 0)));
    }

    #[tokio::test]
    async fn chat_failure_appends_apology_without_session_error() {
        let negotiator =
            negotiator(StubStrategist { fail_chat: true }, StubDocuments::default());
        quoted(&negotiator).await;

        let Json(response) = send_chat_message(
            State(negotiator),
            Json(ChatRequest { message: "Can we go lower?".to_string() }),
        )
        .await
        .expect("request accepted");

        assert_eq!(response.outcome, Some(WorkflowOutcome::Failed));
        assert!(response.session.error.is_none());
        assert_eq!(response.session.transcript.len(), 3);
        assert!(!response.session.chat_loading);
    }

    #[tokio::test]
    async fn export_without_quote_conflicts() {
        let negotiator = negotiator(StubStrategist::default(), StubDocuments::default());

        let error = open_export(State(negotiator)).await.expect_err("nothing to export");

        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn export_round_trip_renders_once() {
        let documents = StubDocuments::default();
        let negotiator = negotiator(StubStrategist::default(), documents.clone());
        quoted(&negotiator).await;

        let Json(opened) = open_export(State(negotiator.clone())).await.expect("export opens");
        assert_eq!(opened.phase, SessionPhase::ExportOpen);

        let Json(completed) = complete_export(State(negotiator.clone()), Json(metadata()))
            .await
            .expect("document generated");
        let document = completed.document.expect("document returned");
        assert_eq!(document.path, PathBuf::from("proposal-Q-API-0001.html"));
        assert!(!completed.session.export_open);

        let again = complete_export(State(negotiator), Json(metadata()))
            .await
            .expect_err("snapshot consumed");
        assert_eq!(again.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(documents.rendered.lock().map(|r| r.len()).unwrap_or(0), 1);
    }

    #[tokio::test]
    async fn rendering_failure_maps_to_service_unavailable() {
        let negotiator =
            negotiator(StubStrategist::default(), StubDocuments { fail: true, ..StubDocuments::default() });
        quoted(&negotiator).await;
        open_export(State(negotiator.clone())).await.expect("export opens");

        let error = complete_export(State(negotiator.clone()), Json(metadata()))
            .await
            .expect_err("rendering fails");

        assert_eq!(error.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(negotiator.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn rendering_failure_body_hides_collaborator_detail() {
        let negotiator =
            negotiator(StubStrategist::default(), StubDocuments { fail: true, ..StubDocuments::default() });
        quoted(&negotiator).await;
        open_export(State(negotiator.clone())).await.expect("export opens");

        let error = complete_export(State(negotiator), Json(metadata()))
            .await
            .expect_err("rendering fails");
        let response = error.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8_lossy(&body);

        assert!(!text.contains("template missing"));
        assert!(!text.contains("document rendering failed"));
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["kind"], "service_unavailable");
        assert_eq!(
            payload["error"],
            "The service is temporarily unavailable. Please retry shortly."
        );
        assert!(payload["correlation_id"].as_str().unwrap_or_default().starts_with("req-"));
        assert!(payload.get("detail").is_none());
    }

    #[tokio::test]
    async fn reset_returns_initial_state() {
        let negotiator = negotiator(StubStrategist::default(), StubDocuments::default());
        quoted(&negotiator).await;

        let Json(response) = reset(State(negotiator)).await;

        assert_eq!(response.phase, SessionPhase::Empty);
        assert!(response.session.quote.is_none());
        assert!(response.session.transcript.is_empty());
    }

    #[tokio::test]
    async fn router_serves_session_snapshot() {
        let app = super::router(negotiator(StubStrategist::default(), StubDocuments::default()));

        let response = app
            .oneshot(Request::builder().uri("/api/v1/session").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["phase"], "Empty");
        assert!(payload.get("outcome").is_none());
    }

    #[tokio::test]
    async fn router_posts_quote_and_reports_health() {
        let app = super::router(negotiator(StubStrategist::default(), StubDocuments::default()));

        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(health.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/session/quote")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"scope":"booking app","currency":"EUR"}"#))
                    .expect("request"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["outcome"], "completed");
        assert_eq!(payload["session"]["quote"]["currency"], "EUR");
    }
}
