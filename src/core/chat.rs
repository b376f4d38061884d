//! Chat engine
//!
//! The ChatEngine owns the session and the history for the lifetime of the
//! client. It:
//! 1. Routes input by mode (lookup in chat mode, title filter in search mode)
//! 2. Records the user message before any network call
//! 3. Hands the cycle to the orchestrator
//! 4. Handles conversation switching, deletion and clearing
//!
//! Only one cycle runs at a time. Any operation attempted while one is in
//! flight fails with [`ChatError::Busy`].

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::conversation::Role;
use crate::render::PresentationSink;
use crate::storage::StorageError;

use super::history::{HistoryEntry, HistoryStore};
use super::orchestrator::{CycleOutcome, Orchestrator};
use super::session::{Mode, Session};

pub const GREETING: &str = "Hi! Enter a pump model and I'll extract its specifications.";

/// Errors from the chat engine
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("A request is already in progress")]
    Busy,

    #[error("Unknown conversation: {0}")]
    UnknownConversation(Uuid),

    #[error("No conversation at position {0}")]
    UnknownPosition(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Blank input; nothing happened
    Ignored,
    Completed(CycleOutcome),
    Searched(Vec<HistoryEntry>),
}

struct EngineState {
    session: Session,
    history: HistoryStore,
}

pub struct ChatEngine {
    orchestrator: Orchestrator,
    sink: Arc<dyn PresentationSink>,
    state: Mutex<EngineState>,
}

impl ChatEngine {
    pub fn new(
        orchestrator: Orchestrator,
        history: HistoryStore,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            orchestrator,
            sink,
            state: Mutex::new(EngineState {
                session: Session::new(),
                history,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState>, ChatError> {
        self.state.try_lock().map_err(|_| ChatError::Busy)
    }

    /// Load persisted history and greet
    pub async fn start(&self) -> Result<usize, ChatError> {
        let mut state = self.lock()?;
        let count = state.history.load_all().await.len();
        tracing::info!("Loaded {} conversation(s) from history", count);

        self.sink.append_bubble(Role::Assistant, GREETING);
        Ok(count)
    }

    /// Dispatch a line of user input according to the current mode
    pub async fn handle_input(&self, text: &str) -> Result<InputOutcome, ChatError> {
        let mode = self.lock()?.session.mode();
        match mode {
            Mode::Chat => self.submit(text).await,
            Mode::Search => self.search(text),
        }
    }

    /// Run a lookup cycle for `text` in the active conversation
    pub async fn submit(&self, text: &str) -> Result<InputOutcome, ChatError> {
        let query = text.trim();
        if query.is_empty() {
            tracing::debug!("Ignoring blank input");
            return Ok(InputOutcome::Ignored);
        }

        let mut state = self.lock()?;
        let EngineState { session, history } = &mut *state;

        session.cancel_reveal();
        self.sink.append_bubble(Role::User, query);
        let record = session.submit(query);

        let exchange = self.orchestrator.run(record, history, query).await;
        if let Some(reveal) = exchange.reveal {
            session.track_reveal(reveal);
        }

        Ok(InputOutcome::Completed(exchange.outcome))
    }

    /// Wait for the cycle in flight and let its reveal finish. Called before
    /// the client exits so nothing submitted is lost.
    pub async fn finish(&self) {
        let reveal = self.state.lock().await.session.take_reveal();
        if let Some(reveal) = reveal {
            reveal.wait().await;
        }
    }

    /// Save whatever is open, then start over with a clean chat
    pub async fn new_conversation(&self) -> Result<(), ChatError> {
        let mut state = self.lock()?;
        let EngineState { session, history } = &mut *state;

        if let Some(previous) = session.reset() {
            if let Err(e) = history.save(&previous).await {
                tracing::warn!("Failed to save conversation {}: {}", previous.id(), e);
            }
        }
        session.set_mode(Mode::Chat);

        self.sink.clear_chat();
        self.sink.append_bubble(Role::Assistant, GREETING);
        Ok(())
    }

    /// Make a stored conversation active and replay it
    pub async fn open_conversation(&self, id: Uuid) -> Result<(), ChatError> {
        let mut state = self.lock()?;
        let EngineState { session, history } = &mut *state;

        let record = history
            .get(id)
            .cloned()
            .ok_or(ChatError::UnknownConversation(id))?;

        self.sink.clear_chat();
        for message in record.messages() {
            self.sink.append_bubble(message.role, &message.text);
        }

        session.select(record);
        session.set_mode(Mode::Chat);
        Ok(())
    }

    pub async fn delete_conversation(&self, id: Uuid) -> Result<bool, ChatError> {
        let mut state = self.lock()?;
        Ok(state.history.remove(id).await?)
    }

    /// Forget every stored conversation and the open one
    pub async fn clear_history(&self) -> Result<(), ChatError> {
        let mut state = self.lock()?;
        state.history.clear_all().await?;
        state.session.reset();
        Ok(())
    }

    pub fn enter_search_mode(&self) -> Result<(), ChatError> {
        self.lock()?.session.set_mode(Mode::Search);
        Ok(())
    }

    pub fn search(&self, term: &str) -> Result<InputOutcome, ChatError> {
        let matches = self.lock()?.history.search(term);
        self.sink.search_results(term.trim(), &matches);
        Ok(InputOutcome::Searched(matches))
    }

    /// Id of the conversation at `position` in the list `/history` prints
    pub fn conversation_at(&self, position: usize) -> Result<Uuid, ChatError> {
        self.lock()?
            .history
            .entries()
            .get(position)
            .map(|e| e.id)
            .ok_or(ChatError::UnknownPosition(position))
    }

    /// Every stored conversation, most recent first
    pub fn history_entries(&self) -> Result<Vec<HistoryEntry>, ChatError> {
        Ok(self.lock()?.history.entries())
    }
}
