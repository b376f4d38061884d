//! Core client components
//!
//! Session state, history, and the request cycle that ties them to the
//! lookup service.

mod chat;
mod history;
mod orchestrator;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatEngine, ChatError};
pub use history::{HistoryEntry, HistoryGroup, HistoryStore};
pub use orchestrator::Orchestrator;
