pub mod phase;
pub mod state;
pub mod store;

pub use phase::SessionPhase;
pub use state::SessionState;
pub use store::{LoadingKind, OperationTicket, Pending, SessionStore};
