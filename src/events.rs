// Event bus bridging the worker's I/O context into the controller's queue.

use serde::Serialize;
use tokio::sync::broadcast;

/// Which of the worker's output streams a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of worker console output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputEvent {
    pub stream: OutputStream,
    pub line: String,
}

/// Broadcast bus carrying worker output lines from the relay tasks into the
/// controller's queue. Single publisher per stream, many subscribers;
/// per-stream order is preserved, cross-stream order is arrival order.
pub struct EventBus {
    tx: broadcast::Sender<OutputEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Sender handle for relay tasks. Publishing with no live subscriber is
    /// not an error; the line is simply dropped.
    pub fn sender(&self) -> broadcast::Sender<OutputEvent> {
        self.tx.clone()
    }

    pub fn publish(&self, event: OutputEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// Handle to a bus subscription. Dropping it releases the subscription;
/// drop runs at most once, so teardown is safe even when the bus and the
/// subscriber are torn down concurrently.
pub struct Subscription {
    rx: broadcast::Receiver<OutputEvent>,
}

impl Subscription {
    /// Receive the next output event, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Output subscription lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
