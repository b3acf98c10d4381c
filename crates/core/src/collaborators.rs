//! Contracts for the remote calls a negotiation session depends on.
//!
//! Every method is a single attempt. Implementations report any failure as a
//! [`CollaboratorError`]; the workflows decide how it reaches the user.

use async_trait::async_trait;

use crate::domain::chat::ChatMessage;
use crate::domain::counter_offer::{ClientCounterOffer, CounterOfferAnalysis};
use crate::domain::export::{GeneratedDocument, ProposalMetadata};
use crate::domain::project::ProjectDescription;
use crate::domain::quote::Quote;
use crate::errors::CollaboratorError;

#[async_trait]
pub trait Strategist: Send + Sync {
    async fn generate_quote(
        &self,
        description: &ProjectDescription,
    ) -> Result<Quote, CollaboratorError>;

    async fn analyze_counter_offer(
        &self,
        description: &ProjectDescription,
        quote: &Quote,
        offer: &ClientCounterOffer,
    ) -> Result<CounterOfferAnalysis, CollaboratorError>;

    /// `transcript` always ends with the user message being answered.
    async fn chat_response(
        &self,
        description: &ProjectDescription,
        quote: &Quote,
        transcript: &[ChatMessage],
    ) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait DocumentGenerator: Send + Sync {
    async fn generate_document(
        &self,
        metadata: &ProposalMetadata,
        quote: &Quote,
    ) -> Result<GeneratedDocument, CollaboratorError>;
}
