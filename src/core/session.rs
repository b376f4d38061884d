//! The in-memory conversation the user is currently working in

use crate::conversation::ConversationRecord;
use crate::render::RevealHandle;

/// What plain input means right now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Input is a pump lookup or question
    #[default]
    Chat,
    /// Input filters the history list
    Search,
}

/// Idle when `active` is `None`, otherwise one conversation is open
#[derive(Default)]
pub struct Session {
    active: Option<ConversationRecord>,
    mode: Mode,
    reveal: Option<RevealHandle>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ConversationRecord> {
        self.active.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Record a user message, opening a conversation titled after it when idle
    pub fn submit(&mut self, text: &str) -> &mut ConversationRecord {
        let record = self.active.get_or_insert_with(|| {
            let record = ConversationRecord::new(text);
            tracing::info!("Started conversation {}", record.id());
            record
        });
        record.add_user(text);
        record
    }

    /// Switch to `record` as stored. Unsaved changes to the previous
    /// conversation are dropped.
    pub fn select(&mut self, record: ConversationRecord) {
        self.cancel_reveal();
        tracing::info!("Switched to conversation {}", record.id());
        self.active = Some(record);
    }

    /// Back to idle, handing back whatever was open
    pub fn reset(&mut self) -> Option<ConversationRecord> {
        self.cancel_reveal();
        self.active.take()
    }

    pub fn track_reveal(&mut self, handle: RevealHandle) {
        self.cancel_reveal();
        self.reveal = Some(handle);
    }

    /// Hand over the running reveal, if any, without cancelling it
    pub fn take_reveal(&mut self) -> Option<RevealHandle> {
        self.reveal.take()
    }

    pub fn cancel_reveal(&mut self) {
        if let Some(handle) = self.reveal.take() {
            if !handle.is_finished() {
                handle.cancel();
            }
        }
    }
}
