//! Scripted collaborators for workflow tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::collaborators::{DocumentGenerator, Strategist};
use crate::domain::chat::ChatMessage;
use crate::domain::counter_offer::{ClientCounterOffer, CounterOfferAnalysis, Recommendation};
use crate::domain::export::{DocumentFormat, GeneratedDocument, ProposalMetadata};
use crate::domain::project::ProjectDescription;
use crate::domain::quote::{Quote, QuoteId, QuoteLineItem};
use crate::errors::CollaboratorError;

pub(crate) fn sample_quote(scope: &str) -> Quote {
    Quote {
        id: QuoteId::generate(),
        line_items: vec![
            QuoteLineItem {
                description: format!("{scope} discovery"),
                hours: Some(Decimal::new(10, 0)),
                amount: Decimal::new(800, 0),
            },
            QuoteLineItem {
                description: format!("{scope} build"),
                hours: Some(Decimal::new(40, 0)),
                amount: Decimal::new(3_200, 0),
            },
        ],
        total: Decimal::new(4_000, 0),
        currency: "USD".to_string(),
        estimated_timeline: Some("5 weeks".to_string()),
        payment_terms: Some("50% upfront".to_string()),
        narrative: format!("A phased {scope} engagement."),
        created_at: Utc::now(),
    }
}

pub(crate) fn sample_analysis() -> CounterOfferAnalysis {
    CounterOfferAnalysis {
        recommendation: Recommendation::Counter,
        suggested_price: Some(Decimal::new(3_600, 0)),
        rationale: "The offer undercuts delivery cost.".to_string(),
        risks: vec!["Scope creep".to_string()],
        talking_points: vec!["Trade price for a shorter scope".to_string()],
    }
}

/// Lets a test observe the session while a collaborator call is pending.
#[derive(Clone, Default)]
pub(crate) struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CallKind {
    Quote,
    Analysis,
    Chat,
}

#[derive(Default)]
struct Script {
    quotes: VecDeque<Result<Quote, CollaboratorError>>,
    analyses: VecDeque<Result<CounterOfferAnalysis, CollaboratorError>>,
    replies: VecDeque<Result<String, CollaboratorError>>,
    seen_transcripts: Vec<Vec<ChatMessage>>,
    calls: usize,
    gate: Option<(CallKind, Gate)>,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedStrategist {
    script: Arc<Mutex<Script>>,
}

fn exhausted<T>() -> Result<T, CollaboratorError> {
    Err(CollaboratorError::Transport("script exhausted".to_string()))
}

impl ScriptedStrategist {
    /// Holds the first call of `kind` until the gate is released.
    pub(crate) fn with_gate(self, kind: CallKind, gate: Gate) -> Self {
        self.script.lock().expect("script lock").gate = Some((kind, gate));
        self
    }

    pub(crate) fn push_quote(&self, result: Result<Quote, CollaboratorError>) {
        self.script.lock().expect("script lock").quotes.push_back(result);
    }

    pub(crate) fn push_quote_front(&self, result: Result<Quote, CollaboratorError>) {
        self.script.lock().expect("script lock").quotes.push_front(result);
    }

    pub(crate) fn push_analysis(&self, result: Result<CounterOfferAnalysis, CollaboratorError>) {
        self.script.lock().expect("script lock").analyses.push_back(result);
    }

    pub(crate) fn push_reply(&self, result: Result<String, CollaboratorError>) {
        self.script.lock().expect("script lock").replies.push_back(result);
    }

    pub(crate) fn calls(&self) -> usize {
        self.script.lock().expect("script lock").calls
    }

    pub(crate) fn seen_transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.script.lock().expect("script lock").seen_transcripts.clone()
    }

    async fn enter(&self, kind: CallKind) {
        let gate = {
            let mut script = self.script.lock().expect("script lock");
            script.calls += 1;
            match script.gate.take() {
                Some((gated, gate)) if gated == kind => Some(gate),
                other => {
                    script.gate = other;
                    None
                }
            }
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }
}

#[async_trait]
impl Strategist for ScriptedStrategist {
    async fn generate_quote(
        &self,
        _description: &ProjectDescription,
    ) -> Result<Quote, CollaboratorError> {
        self.enter(CallKind::Quote).await;
        let next = self.script.lock().expect("script lock").quotes.pop_front();
        next.unwrap_or_else(exhausted)
    }

    async fn analyze_counter_offer(
        &self,
        _description: &ProjectDescription,
        _quote: &Quote,
        _offer: &ClientCounterOffer,
    ) -> Result<CounterOfferAnalysis, CollaboratorError> {
        self.enter(CallKind::Analysis).await;
        let next = self.script.lock().expect("script lock").analyses.pop_front();
        next.unwrap_or_else(exhausted)
    }

    async fn chat_response(
        &self,
        _description: &ProjectDescription,
        _quote: &Quote,
        transcript: &[ChatMessage],
    ) -> Result<String, CollaboratorError> {
        self.enter(CallKind::Chat).await;
        let mut script = self.script.lock().expect("script lock");
        script.seen_transcripts.push(transcript.to_vec());
        script.replies.pop_front().unwrap_or_else(exhausted)
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingDocuments {
    generated: Arc<Mutex<Vec<(ProposalMetadata, Quote)>>>,
    fail_with: Arc<Mutex<Option<CollaboratorError>>>,
    gate: Arc<Mutex<Option<Gate>>>,
}

impl RecordingDocuments {
    pub(crate) fn failing(error: CollaboratorError) -> Self {
        let documents = Self::default();
        *documents.fail_with.lock().expect("documents lock") = Some(error);
        documents
    }

    pub(crate) fn with_gate(self, gate: Gate) -> Self {
        *self.gate.lock().expect("documents lock") = Some(gate);
        self
    }

    pub(crate) fn generated(&self) -> Vec<(ProposalMetadata, Quote)> {
        self.generated.lock().expect("documents lock").clone()
    }
}

#[async_trait]
impl DocumentGenerator for RecordingDocuments {
    async fn generate_document(
        &self,
        metadata: &ProposalMetadata,
        quote: &Quote,
    ) -> Result<GeneratedDocument, CollaboratorError> {
        let gate = self.gate.lock().expect("documents lock").take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.generated.lock().expect("documents lock").push((metadata.clone(), quote.clone()));
        if let Some(error) = self.fail_with.lock().expect("documents lock").clone() {
            return Err(error);
        }
        Ok(GeneratedDocument {
            path: PathBuf::from(format!("proposal-{}.html", quote.id.0)),
            format: DocumentFormat::Html,
        })
    }
}
