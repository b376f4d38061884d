//! Presentation surface
//!
//! The core never draws anything itself. It issues commands to a
//! [`PresentationSink`], which the terminal client implements and tests
//! replace with a recorder.

mod reveal;
mod terminal;

use std::time::Duration;

use crate::conversation::Role;
use crate::core::{HistoryEntry, HistoryGroup};
use crate::providers::LookupResult;

pub use reveal::{RevealHandle, Typewriter, FALLBACK_REVEAL_DELAY_MS, REVEAL_DELAY_MS};
pub use terminal::TerminalSink;

/// Loading markers; each phase has its own so they never collide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Searching,
    Generating,
}

impl Indicator {
    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Searching => "Searching for pump specifications",
            Indicator::Generating => "Generating AI answer",
        }
    }
}

/// Display-ready lookup result
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub product_code: String,
    pub flow: String,
    pub head: String,
    pub phase: String,
    pub confidence: Option<String>,
    pub elapsed: Duration,
}

impl ResultCard {
    pub fn new(result: &LookupResult, elapsed: Duration) -> Self {
        Self {
            product_code: result.product.clone().unwrap_or_default(),
            flow: result.flow_display(),
            head: result.head_display(),
            phase: result.phase_display(),
            confidence: result.confidence.as_ref().map(|c| c.to_string()),
            elapsed,
        }
    }

    /// Elapsed time as shown in the card footer, e.g. "1.3s"
    pub fn elapsed_text(&self) -> String {
        format!("{:.1}s", self.elapsed.as_secs_f64())
    }
}

pub trait PresentationSink: Send + Sync {
    /// Add a finished chat bubble
    fn append_bubble(&self, role: Role, text: &str);

    fn append_result_card(&self, card: &ResultCard);

    fn show_loading(&self, indicator: Indicator);

    /// May be called for an indicator that is already hidden
    fn hide_loading(&self, indicator: Indicator);

    /// Open an empty assistant bubble that `reveal_char` fills in
    fn reveal_started(&self, text: &str);

    fn reveal_char(&self, ch: char);

    /// `completed` is false when the reveal was cut short
    fn reveal_finished(&self, completed: bool);

    /// Wipe the chat surface
    fn clear_chat(&self);

    /// Redraw the history sidebar
    fn history_changed(&self, groups: &[HistoryGroup]);

    fn search_results(&self, term: &str, matches: &[HistoryEntry]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Confidence, SpecValue};

    #[test]
    fn test_result_card() {
        let result = LookupResult {
            manufacturer: Some("TACO".into()),
            product: Some("0014-SF1".into()),
            flow: SpecValue::Number(50.0),
            head: SpecValue::Unknown,
            phase: SpecValue::Number(1.0),
            confidence: Some(Confidence {
                label: "medium".into(),
                score: 0.5,
            }),
            is_question: false,
        };

        let card = ResultCard::new(&result, Duration::from_millis(1300));
        assert_eq!(card.product_code, "0014-SF1");
        assert_eq!(card.flow, "50 m3/h");
        assert_eq!(card.head, "N/A");
        assert_eq!(card.phase, "1-Phase");
        assert_eq!(card.confidence.as_deref(), Some("medium (50%)"));
        assert_eq!(card.elapsed_text(), "1.3s");
    }
}
