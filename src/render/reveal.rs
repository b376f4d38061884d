//! Character-by-character text reveal

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::PresentationSink;

/// Default per-character delay for explanations, in milliseconds
pub const REVEAL_DELAY_MS: u64 = 15;
/// Default per-character delay for the offline fallback, in milliseconds
pub const FALLBACK_REVEAL_DELAY_MS: u64 = 18;

/// Reveals text one character per tick at a fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Typewriter {
    delay: Duration,
}

impl Typewriter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Start revealing `text`. The sink sees `reveal_started` before this
    /// returns; the characters follow on a background task.
    pub fn spawn(&self, sink: Arc<dyn PresentationSink>, text: String) -> RevealHandle {
        sink.reveal_started(&text);

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let delay = self.delay;

        let task = tokio::spawn(async move {
            for ch in text.chars() {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        tracing::debug!("Reveal cancelled");
                        sink.reveal_finished(false);
                        return;
                    }
                    _ = tokio::time::sleep(delay) => sink.reveal_char(ch),
                }
            }
            sink.reveal_finished(true);
        });

        RevealHandle { token, task }
    }
}

/// A running reveal. Dropping the handle lets it run to completion.
pub struct RevealHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the reveal completes or acknowledges cancellation
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::warn!("Reveal task failed: {}", e);
        }
    }
}
