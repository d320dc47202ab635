// Output relay: turns the worker's raw stdout/stderr into line events.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::{OutputEvent, OutputStream};

/// Whether a captured line is worth relaying. Blank lines and bare carriage
/// returns (a CRLF remnant with nothing in front of it) are suppressed.
pub fn is_relayable(line: &str) -> bool {
    !line.is_empty() && line != "\r" && line != "\r\n"
}

/// Spawn a task that reads `source` line by line and publishes one event per
/// surviving line, tagged with `stream`, in write order. The task ends when
/// the pipe closes; it is never cancelled mid-line, so output already in
/// flight from a dying worker still arrives.
pub fn spawn_stream_reader<R>(
    source: R,
    stream: OutputStream,
    tx: broadcast::Sender<OutputEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(source).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if !is_relayable(&line) {
                continue;
            }
            if tx.send(OutputEvent { stream, line }).is_err() {
                // No subscriber left; keep draining so the worker cannot
                // block on a full pipe.
                continue;
            }
        }
        tracing::debug!("Relay for {:?} ended", stream);
    })
}
