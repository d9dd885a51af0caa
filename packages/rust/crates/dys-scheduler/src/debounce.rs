//! Debounced filter input.
//!
//! Keystrokes are pushed as full text snapshots; a value is emitted once no new input
//! arrived for the debounce window. Dropping the debouncer aborts any pending timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Debounce window used for free-text prefix input.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Handle feeding text into a debounce task.
pub struct FilterDebouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl FilterDebouncer {
    /// Spawn the debounce task. Settled values arrive on the returned receiver.
    #[must_use]
    pub fn spawn(window: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (input, mut input_rx) = mpsc::unbounded_channel::<String>();
        let (output, output_rx) = mpsc::unbounded_channel::<String>();
        let task = tokio::spawn(async move {
            let mut last_emitted: Option<String> = None;
            while let Some(first) = input_rx.recv().await {
                let mut latest = first;
                let mut deadline = Instant::now() + window;
                loop {
                    tokio::select! {
                        next = input_rx.recv() => {
                            let Some(next) = next else {
                                return;
                            };
                            latest = next;
                            deadline = Instant::now() + window;
                        }
                        () = tokio::time::sleep_until(deadline) => break,
                    }
                }
                if last_emitted.as_deref() == Some(latest.as_str()) {
                    continue;
                }
                tracing::debug!(
                    event = "dys.filter.settled",
                    prefix = %latest,
                    "debounced filter input settled"
                );
                if output.send(latest.clone()).is_err() {
                    return;
                }
                last_emitted = Some(latest);
            }
        });
        (Self { input, task }, output_rx)
    }

    /// Record the current input text; restarts the debounce window.
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.input.send(text.into());
    }

    /// Stop the debounce task, discarding any pending value.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for FilterDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
