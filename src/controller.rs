// Controller: single owner of the connection status and the visible log.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::api::ApiClient;
use crate::commands;
use crate::events::OutputEvent;
use crate::logs::LogBuffer;
use crate::supervisor::SidecarSupervisor;

/// Whether the controller holds an API-level handshake with the worker.
///
/// Independent of the worker's process state: a freshly started worker is
/// still disconnected until `connect` succeeds, and a successful shutdown
/// always forces disconnect regardless of prior value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub info: String,
}

/// Mediates the supervisor, the API client, and the event bus. All methods
/// take `&mut self` and are driven from one task, so status and log never
/// see concurrent mutation.
pub struct Controller {
    api: ApiClient,
    supervisor: Arc<SidecarSupervisor>,
    status: ConnectionStatus,
    log: LogBuffer,
}

impl Controller {
    pub fn new(api: ApiClient, supervisor: Arc<SidecarSupervisor>) -> Self {
        let mut log = LogBuffer::new();
        log.append("[ui] Listening for sidecar & network logs...");
        Self {
            api,
            supervisor,
            status: ConnectionStatus::default(),
            log,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Append one relayed output line to the visible log.
    pub fn handle_output(&mut self, event: &OutputEvent) {
        self.log.append(event.line.clone());
    }

    /// Issue an API call, logging the server's reply when it carries a
    /// message. API failures become a single visible log line and an absent
    /// result; they never escape this boundary.
    pub async fn api_action(
        &mut self,
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
    ) -> Option<Value> {
        match self.api.invoke(endpoint, method, payload).await {
            Ok(json) => {
                if let Some(message) = json.get("message").and_then(Value::as_str) {
                    self.log.append(format!("[server-response] {}", message));
                }
                Some(json)
            }
            Err(err) => {
                self.log.append(format!("[server-response] {}", err));
                None
            }
        }
    }

    /// Establish the API-level handshake and record the connection summary.
    /// On any failure the status is left untouched.
    pub async fn connect(&mut self) {
        match self.api.connect().await {
            Ok((info, message)) => {
                if let Some(message) = message {
                    self.log.append(format!("[server-response] {}", message));
                }
                self.status = ConnectionStatus {
                    connected: true,
                    info: format!(
                        "Host: {}\nProcess id: {}\nDocs: {}/docs",
                        info.host, info.pid, info.host
                    ),
                };
            }
            Err(err) => {
                self.log.append(format!("[server-response] {}", err));
                tracing::error!("Failed to connect to api server. {}", err);
            }
        }
    }

    /// Ask the host environment to spawn the worker. Invocation failures go
    /// to the diagnostic channel only, never to the visible log.
    pub async fn start_sidecar(&mut self) {
        if let Err(err) = commands::start_sidecar(&self.supervisor).await {
            tracing::error!("Failed to start sidecar. {}", err);
        }
    }

    /// Force-stop the worker. A truthy result always clears the connection,
    /// whatever it was before.
    pub async fn stop_sidecar(&mut self) {
        match commands::shutdown_sidecar(&self.supervisor).await {
            Ok(true) => {
                self.status = ConnectionStatus::default();
            }
            Ok(false) => {}
            Err(err) => {
                tracing::error!("Failed to shutdown sidecar. {}", err);
            }
        }
    }

    /// Send a task message to the worker. Whitespace-only input is ignored
    /// entirely: no request is made and the log is untouched. Returns true
    /// when the caller should clear its pending input.
    pub async fn send_task(&mut self, message: &str) -> bool {
        if message.trim().is_empty() {
            return false;
        }
        match self.api.start_task(message).await {
            Ok(reply) => {
                let line = reply.unwrap_or_else(|| "Task started".to_string());
                self.log.append(format!("[server-response] {}", line));
                true
            }
            Err(err) => {
                self.log.append(format!("[server-response] {}", err));
                false
            }
        }
    }

    /// Exercise the example completion endpoint.
    pub async fn mock_api_call(&mut self) {
        self.api_action(
            "v1/completions",
            Method::POST,
            Some(serde_json::json!({ "prompt": "An example query." })),
        )
        .await;
    }
}
