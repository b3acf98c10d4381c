use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::domain::chat::ChatMessage;
use crate::domain::counter_offer::CounterOfferAnalysis;
use crate::domain::export::ExportSnapshot;
use crate::domain::project::ProjectDescription;
use crate::domain::quote::Quote;
use crate::session::phase::SessionPhase;
use crate::session::state::SessionState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationTicket(pub u64);

impl std::fmt::Display for OperationTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadingKind {
    Quote,
    Analysis,
    Chat,
}

impl LoadingKind {
    /// A quote request replaces the whole session, so it invalidates every
    /// completion still in flight.
    fn supersedes_session(&self) -> bool {
        matches!(self, Self::Quote)
    }

    fn index(&self) -> usize {
        match self {
            Self::Quote => 0,
            Self::Analysis => 1,
            Self::Chat => 2,
        }
    }

    fn flag<'a>(&self, state: &'a mut SessionState) -> &'a mut bool {
        match self {
            Self::Quote => &mut state.quote_loading,
            Self::Analysis => &mut state.analysis_loading,
            Self::Chat => &mut state.chat_loading,
        }
    }
}

/// An operation that raised a loading flag and has not settled yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    pub kind: LoadingKind,
    pub ticket: OperationTicket,
    epoch: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    state: SessionState,
    epoch: u64,
    next_ticket: u64,
    loading_owners: [Option<OperationTicket>; 3],
    export: Option<(OperationTicket, ExportSnapshot)>,
}

impl StoreInner {
    fn issue_ticket(&mut self) -> OperationTicket {
        self.next_ticket += 1;
        OperationTicket(self.next_ticket)
    }

    fn raise(&mut self, kind: LoadingKind) -> Pending {
        if kind.supersedes_session() {
            self.epoch += 1;
        }
        let ticket = self.issue_ticket();
        *kind.flag(&mut self.state) = true;
        self.loading_owners[kind.index()] = Some(ticket);
        Pending { kind, ticket, epoch: self.epoch }
    }
}

/// In-memory holder of one negotiation session.
///
/// The lock is only held for synchronous slot mutation, never across a
/// collaborator call, so loading flags stay observable while a call is pending.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<StoreInner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().state.phase()
    }

    pub fn project(&self) -> Option<ProjectDescription> {
        self.lock().state.project.clone()
    }

    pub fn quote(&self) -> Option<Quote> {
        self.lock().state.quote.clone()
    }

    pub fn analysis(&self) -> Option<CounterOfferAnalysis> {
        self.lock().state.analysis.clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().state.transcript.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().state.error.clone()
    }

    pub fn is_loading(&self, kind: LoadingKind) -> bool {
        let inner = self.lock();
        match kind {
            LoadingKind::Quote => inner.state.quote_loading,
            LoadingKind::Analysis => inner.state.analysis_loading,
            LoadingKind::Chat => inner.state.chat_loading,
        }
    }

    pub fn is_chat_open(&self) -> bool {
        self.lock().state.chat_open
    }

    pub fn is_export_open(&self) -> bool {
        self.lock().state.export_open
    }

    pub fn export_snapshot(&self) -> Option<ExportSnapshot> {
        self.lock().export.as_ref().map(|(_, snapshot)| snapshot.clone())
    }

    pub fn replace_project(&self, project: Option<ProjectDescription>) {
        self.lock().state.project = project;
    }

    pub fn replace_quote(&self, quote: Option<Quote>) {
        self.lock().state.quote = quote;
    }

    pub fn replace_analysis(&self, analysis: Option<CounterOfferAnalysis>) {
        self.lock().state.analysis = analysis;
    }

    pub fn replace_transcript(&self, transcript: Vec<ChatMessage>) {
        self.lock().state.transcript = transcript;
    }

    pub fn replace_error(&self, error: Option<String>) {
        self.lock().state.error = error;
    }

    pub fn set_chat_open(&self, open: bool) {
        self.lock().state.chat_open = open;
    }

    /// Clears every slot back to the initial state, drops any captured export
    /// and invalidates completions still in flight.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.state = SessionState::default();
        inner.loading_owners = [None; 3];
        inner.export = None;
    }

    /// Raises the loading flag for `kind` after running `prepare` in the same
    /// critical section.
    pub fn begin(&self, kind: LoadingKind, prepare: impl FnOnce(&mut SessionState)) -> Pending {
        let mut inner = self.lock();
        prepare(&mut inner.state);
        inner.raise(kind)
    }

    /// Like [`SessionStore::begin`], but when `prepare` returns `None` the
    /// session is left untouched and no flag is raised.
    pub fn begin_if<T>(
        &self,
        kind: LoadingKind,
        prepare: impl FnOnce(&mut SessionState) -> Option<T>,
    ) -> Option<(Pending, T)> {
        let mut inner = self.lock();
        let mut candidate = inner.state.clone();
        let context = prepare(&mut candidate)?;
        inner.state = candidate;
        Some((inner.raise(kind), context))
    }

    /// Applies a completion and lowers the operation's loading flag.
    ///
    /// Returns `false` (and skips `apply`) when the session was reset or
    /// replaced by a newer quote request after the operation began. The flag
    /// is only lowered while this operation still owns it.
    pub fn settle(&self, pending: &Pending, apply: impl FnOnce(&mut SessionState)) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let fresh = inner.epoch == pending.epoch;
        if fresh {
            apply(&mut inner.state);
        }
        let owner = &mut inner.loading_owners[pending.kind.index()];
        if *owner == Some(pending.ticket) {
            *owner = None;
            *pending.kind.flag(&mut inner.state) = false;
        }
        fresh
    }

    pub fn capture_export(&self, snapshot: ExportSnapshot) -> OperationTicket {
        let mut inner = self.lock();
        let ticket = inner.issue_ticket();
        inner.export = Some((ticket, snapshot));
        inner.state.export_open = true;
        ticket
    }

    /// Removes the captured snapshot so it is consumed at most once.
    pub fn take_export(&self) -> Option<(OperationTicket, ExportSnapshot)> {
        self.lock().export.take()
    }

    /// Closes the export dialog unless a newer export was opened meanwhile.
    pub fn finish_export(&self, ticket: Option<OperationTicket>) {
        let mut inner = self.lock();
        let superseded = matches!(
            (&inner.export, ticket),
            (Some((current, _)), Some(taken)) if *current != taken
        );
        if !superseded {
            inner.state.export_open = false;
        }
    }

    pub fn close_export(&self) {
        let mut inner = self.lock();
        inner.export = None;
        inner.state.export_open = false;
    }
}
