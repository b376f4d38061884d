//! Plain terminal rendering for the interactive client

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::conversation::Role;
use crate::core::{HistoryEntry, HistoryGroup};

use super::{Indicator, PresentationSink, ResultCard};

/// Erase the current line and return the cursor to column 0
const CLEAR_LINE: &str = "\r\x1b[2K";

#[derive(Default)]
pub struct TerminalSink {
    loading: Mutex<HashSet<Indicator>>,
    history: Mutex<Vec<HistoryGroup>>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the most recent history view
    pub fn print_history(&self) {
        let groups = self.history.lock().unwrap_or_else(|p| p.into_inner());
        if groups.is_empty() {
            emit("(no recent conversations)\n");
            return;
        }

        let mut out = String::new();
        for group in groups.iter() {
            out.push_str(&format!("{}\n", group.label.title()));
            for entry in &group.entries {
                out.push_str(&format!("  [{}] {}\n", entry.position, entry.title));
            }
        }
        emit(&out);
    }
}

fn emit(text: &str) {
    let mut stdout = io::stdout().lock();
    // A closed stdout leaves nothing useful to do
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

impl PresentationSink for TerminalSink {
    fn append_bubble(&self, role: Role, text: &str) {
        match role {
            Role::User => emit(&format!("you > {}\n", text)),
            Role::Assistant => emit(&format!("neuralflow > {}\n", text)),
        }
    }

    fn append_result_card(&self, card: &ResultCard) {
        let mut out = format!(
            "┌ Web Search Result {}\n│ Flow Rate:        {}\n│ Head:             {}\n│ Electrical Phase: {}\n",
            card.product_code, card.flow, card.head, card.phase
        );
        if let Some(ref confidence) = card.confidence {
            out.push_str(&format!("│ Confidence: {}\n", confidence));
        }
        out.push_str(&format!("└ Web Search | {}\n", card.elapsed_text()));
        emit(&out);
    }

    fn show_loading(&self, indicator: Indicator) {
        self.loading
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(indicator);
        emit(&format!("{}...", indicator.label()));
    }

    fn hide_loading(&self, indicator: Indicator) {
        let was_visible = self
            .loading
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&indicator);
        if was_visible {
            emit(CLEAR_LINE);
        }
    }

    fn reveal_started(&self, _text: &str) {
        emit("neuralflow > ");
    }

    fn reveal_char(&self, ch: char) {
        let mut buf = [0u8; 4];
        emit(ch.encode_utf8(&mut buf));
    }

    fn reveal_finished(&self, completed: bool) {
        emit(if completed { "\n" } else { " …\n" });
    }

    fn clear_chat(&self) {
        emit(&format!("{}\n", "─".repeat(48)));
    }

    fn history_changed(&self, groups: &[HistoryGroup]) {
        *self.history.lock().unwrap_or_else(|p| p.into_inner()) = groups.to_vec();
    }

    fn search_results(&self, term: &str, matches: &[HistoryEntry]) {
        if matches.is_empty() {
            emit(&format!("No conversations match '{}'\n", term));
            return;
        }

        let mut out = String::new();
        for entry in matches {
            out.push_str(&format!("  [{}] {}\n", entry.position, entry.title));
        }
        emit(&out);
    }
}
