//! Two-phase request cycle
//!
//! 1. Look the input up and render the result card
//! 2. If the service flagged the input as a question, ask for an explanation
//!    and reveal it character by character
//!
//! Either phase can fail without ending the session. The conversation is
//! saved once the cycle ends, whichever branch it took.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::conversation::{ConversationRecord, Role};
use crate::providers::{ExplainRequest, LookupApi, LookupResult, ProviderError};
use crate::render::{
    Indicator, PresentationSink, ResultCard, RevealHandle, Typewriter, FALLBACK_REVEAL_DELAY_MS,
    REVEAL_DELAY_MS,
};

use super::history::HistoryStore;

pub const LOOKUP_FALLBACK: &str = "Backend not connected. Please start the server.";
pub const NO_EXPLANATION: &str = "Could not generate explanation.";
pub const EXPLANATION_FAILED: &str = "Failed to generate AI answer.";

/// How the explanation phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Explanation {
    /// The lookup did not ask for one
    Skipped,
    Answered,
    /// The service replied without an answer
    Empty,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    LookupFailed,
    Completed(Explanation),
}

/// Result of one cycle plus the reveal it left running, if any
pub struct Exchange {
    pub outcome: CycleOutcome,
    pub reveal: Option<RevealHandle>,
}

/// Loading marker that is hidden exactly once, at the latest when dropped
struct LoadingGuard<'a> {
    sink: &'a dyn PresentationSink,
    indicator: Indicator,
    visible: bool,
}

impl<'a> LoadingGuard<'a> {
    fn show(sink: &'a dyn PresentationSink, indicator: Indicator) -> Self {
        sink.show_loading(indicator);
        Self {
            sink,
            indicator,
            visible: true,
        }
    }

    fn hide(&mut self) {
        if self.visible {
            self.visible = false;
            self.sink.hide_loading(self.indicator);
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.hide();
    }
}

pub struct Orchestrator {
    api: Arc<dyn LookupApi>,
    sink: Arc<dyn PresentationSink>,
    typewriter: Typewriter,
    fallback_typewriter: Typewriter,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        api: Arc<dyn LookupApi>,
        sink: Arc<dyn PresentationSink>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            api,
            sink,
            typewriter: Typewriter::new(Duration::from_millis(REVEAL_DELAY_MS)),
            fallback_typewriter: Typewriter::new(Duration::from_millis(FALLBACK_REVEAL_DELAY_MS)),
            request_timeout,
        }
    }

    /// Per-character delays for explanations and for the offline fallback
    pub fn with_reveal_delays(mut self, explanation: Duration, fallback: Duration) -> Self {
        self.typewriter = Typewriter::new(explanation);
        self.fallback_typewriter = Typewriter::new(fallback);
        self
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.request_timeout)),
        }
    }

    /// Run one cycle for `query`. The user message must already be on `record`.
    pub async fn run(
        &self,
        record: &mut ConversationRecord,
        history: &mut HistoryStore,
        query: &str,
    ) -> Exchange {
        let exchange = match self.lookup(record, query).await {
            Ok(result) if result.is_question => self.explain(record, &result, query).await,
            Ok(_) => Exchange {
                outcome: CycleOutcome::Completed(Explanation::Skipped),
                reveal: None,
            },
            Err(reveal) => Exchange {
                outcome: CycleOutcome::LookupFailed,
                reveal: Some(reveal),
            },
        };

        if let Err(e) = history.save(record).await {
            tracing::warn!("Failed to save conversation {}: {}", record.id(), e);
        }
        exchange
    }

    /// Phase 1. On failure the fallback reveal is handed back as the error.
    async fn lookup(
        &self,
        record: &mut ConversationRecord,
        query: &str,
    ) -> Result<LookupResult, RevealHandle> {
        let started = Instant::now();
        let mut loading = LoadingGuard::show(&*self.sink, Indicator::Searching);
        let response = self.bounded(self.api.lookup(query)).await;
        loading.hide();

        match response {
            Ok(result) => {
                let elapsed = started.elapsed();
                tracing::info!("Lookup for '{}' resolved in {:.1}s", query, elapsed.as_secs_f64());

                self.sink.append_result_card(&ResultCard::new(&result, elapsed));
                record.add_assistant(&result.summary());
                if let Some(title) = result.product_title() {
                    record.retitle(title);
                }
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Lookup for '{}' failed: {}", query, e);
                let reveal = self
                    .fallback_typewriter
                    .spawn(self.sink.clone(), LOOKUP_FALLBACK.to_string());
                record.add_assistant(LOOKUP_FALLBACK);
                Err(reveal)
            }
        }
    }

    /// Phase 2
    async fn explain(
        &self,
        record: &mut ConversationRecord,
        result: &LookupResult,
        query: &str,
    ) -> Exchange {
        let request = ExplainRequest::for_result(result, query);

        let mut loading = LoadingGuard::show(&*self.sink, Indicator::Generating);
        let response = self.bounded(self.api.explain(&request)).await;
        loading.hide();

        match response {
            Ok(Some(answer)) if !answer.trim().is_empty() => {
                tracing::debug!("Explanation received ({} chars)", answer.chars().count());
                record.add_assistant(&answer);
                let reveal = self.typewriter.spawn(self.sink.clone(), answer);
                Exchange {
                    outcome: CycleOutcome::Completed(Explanation::Answered),
                    reveal: Some(reveal),
                }
            }
            Ok(_) => {
                tracing::info!("Explanation service returned no answer");
                self.sink.append_bubble(Role::Assistant, NO_EXPLANATION);
                Exchange {
                    outcome: CycleOutcome::Completed(Explanation::Empty),
                    reveal: None,
                }
            }
            Err(e) => {
                tracing::warn!("Explanation failed: {}", e);
                self.sink.append_bubble(Role::Assistant, EXPLANATION_FAILED);
                Exchange {
                    outcome: CycleOutcome::Completed(Explanation::Failed),
                    reveal: None,
                }
            }
        }
    }
}
