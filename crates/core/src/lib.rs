pub mod audit;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod errors;
pub mod messages;
pub mod session;
pub mod workflows;

pub use collaborators::{DocumentGenerator, Strategist};
pub use domain::chat::ChatMessage;
pub use domain::counter_offer::{ClientCounterOffer, CounterOfferAnalysis, Recommendation};
pub use domain::export::{DocumentFormat, ExportSnapshot, GeneratedDocument, ProposalMetadata};
pub use domain::project::{ClientProfile, ProjectDescription};
pub use domain::quote::{Quote, QuoteId, QuoteLineItem};
pub use errors::{ApplicationError, CollaboratorError, DomainError, InterfaceError};
pub use messages::{Locale, SessionMessages};
pub use session::{SessionPhase, SessionState, SessionStore};
pub use workflows::{Negotiator, WorkflowOutcome};
