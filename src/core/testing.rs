//! Test doubles for the presentation sink and the lookup service

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::conversation::Role;
use crate::providers::{
    Confidence, ExplainRequest, LookupApi, LookupResult, ProviderError, SpecValue,
};
use crate::render::{Indicator, PresentationSink, ResultCard};

use super::history::{HistoryEntry, HistoryGroup};

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Bubble(Role, String),
    ResultCard(ResultCard),
    ShowLoading(Indicator),
    HideLoading(Indicator),
    RevealStarted(String),
    RevealChar(char),
    RevealFinished { completed: bool },
    ClearChat,
    HistoryChanged(Vec<HistoryGroup>),
    SearchResults(String, Vec<HistoryEntry>),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub fn revealed_text(&self) -> String {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::RevealChar(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn result_cards(&self) -> Vec<ResultCard> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::ResultCard(card) => Some(card.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn bubbles(&self) -> Vec<(Role, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Bubble(role, text) => Some((*role, text.clone())),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn append_bubble(&self, role: Role, text: &str) {
        self.push(SinkEvent::Bubble(role, text.to_string()));
    }

    fn append_result_card(&self, card: &ResultCard) {
        self.push(SinkEvent::ResultCard(card.clone()));
    }

    fn show_loading(&self, indicator: Indicator) {
        self.push(SinkEvent::ShowLoading(indicator));
    }

    fn hide_loading(&self, indicator: Indicator) {
        self.push(SinkEvent::HideLoading(indicator));
    }

    fn reveal_started(&self, text: &str) {
        self.push(SinkEvent::RevealStarted(text.to_string()));
    }

    fn reveal_char(&self, ch: char) {
        self.push(SinkEvent::RevealChar(ch));
    }

    fn reveal_finished(&self, completed: bool) {
        self.push(SinkEvent::RevealFinished { completed });
    }

    fn clear_chat(&self) {
        self.push(SinkEvent::ClearChat);
    }

    fn history_changed(&self, groups: &[HistoryGroup]) {
        self.push(SinkEvent::HistoryChanged(groups.to_vec()));
    }

    fn search_results(&self, term: &str, matches: &[HistoryEntry]) {
        self.push(SinkEvent::SearchResults(term.to_string(), matches.to_vec()));
    }
}

pub enum LookupScript {
    Ok(LookupResult),
    /// Resolves after a short delay
    Slow(LookupResult),
    Fail,
    Hang,
}

pub enum ExplainScript {
    Answer(&'static str),
    NoAnswer,
    Fail,
    Hang,
}

/// Lookup service that replays a fixed script and counts calls
pub struct ScriptedApi {
    lookup: LookupScript,
    explain: ExplainScript,
    lookup_calls: AtomicUsize,
    explain_calls: AtomicUsize,
    last_explain: Mutex<Option<ExplainRequest>>,
}

impl ScriptedApi {
    pub fn new(lookup: LookupScript, explain: ExplainScript) -> Self {
        Self {
            lookup,
            explain,
            lookup_calls: AtomicUsize::new(0),
            explain_calls: AtomicUsize::new(0),
            last_explain: Mutex::new(None),
        }
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn explain_calls(&self) -> usize {
        self.explain_calls.load(Ordering::SeqCst)
    }

    pub fn last_explain_request(&self) -> Option<ExplainRequest> {
        self.last_explain.lock().unwrap().clone()
    }
}

#[async_trait]
impl LookupApi for ScriptedApi {
    async fn lookup(&self, _query: &str) -> Result<LookupResult, ProviderError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        match &self.lookup {
            LookupScript::Ok(result) => Ok(result.clone()),
            LookupScript::Slow(result) => {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(result.clone())
            }
            LookupScript::Fail => Err(ProviderError::InvalidResponse(
                "503 Service Unavailable".to_string(),
            )),
            LookupScript::Hang => std::future::pending().await,
        }
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<Option<String>, ProviderError> {
        self.explain_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_explain.lock().unwrap() = Some(request.clone());
        match &self.explain {
            ExplainScript::Answer(text) => Ok(Some(text.to_string())),
            ExplainScript::NoAnswer => Ok(None),
            ExplainScript::Fail => Err(ProviderError::InvalidResponse(
                "500 Internal Server Error".to_string(),
            )),
            ExplainScript::Hang => std::future::pending().await,
        }
    }
}

/// A lookup that found flow 50, head 12, phase 3
pub fn sample_result(product: Option<(&str, &str)>, is_question: bool) -> LookupResult {
    LookupResult {
        manufacturer: product.map(|(m, _)| m.to_string()),
        product: product.map(|(_, p)| p.to_string()),
        flow: SpecValue::Number(50.0),
        head: SpecValue::Number(12.0),
        phase: SpecValue::Number(3.0),
        confidence: Some(Confidence {
            label: "high".to_string(),
            score: 0.9,
        }),
        is_question,
    }
}
