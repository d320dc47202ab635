// Worker process lifecycle: spawn, wire output to the bus, force-terminate.

use std::process::Stdio;

use serde::Serialize;
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::HostConfig;
use crate::error::{HostError, Result};
use crate::events::{OutputEvent, OutputStream};
use crate::relay;

/// Worker process state as seen by the supervisor.
///
/// There is no exit watcher: a worker that dies on its own stays `Running`
/// here until the next start/stop call, and the first visible symptom is a
/// failing API call. Known limitation, kept deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Stopped,
    Running,
}

pub struct SidecarSupervisor {
    config: HostConfig,
    state: RwLock<WorkerState>,
    /// Serializes start/stop transitions to prevent duplicate spawns.
    lifecycle_lock: Mutex<()>,
    process: Mutex<Option<Child>>,
    relay_tasks: Mutex<Vec<JoinHandle<()>>>,
    events_tx: broadcast::Sender<OutputEvent>,
}

impl SidecarSupervisor {
    pub fn new(config: HostConfig, events_tx: broadcast::Sender<OutputEvent>) -> Self {
        Self {
            config,
            state: RwLock::new(WorkerState::Stopped),
            lifecycle_lock: Mutex::new(()),
            process: Mutex::new(None),
            relay_tasks: Mutex::new(Vec::new()),
            events_tx,
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Spawn the worker process and wire its output streams to the bus.
    /// Starting while a worker is already running is rejected. Returns the
    /// spawned pid.
    pub async fn start(&self) -> Result<u32> {
        let _lifecycle_guard = self.lifecycle_lock.lock().await;

        {
            let state = self.state.read().await;
            if *state == WorkerState::Running {
                return Err(HostError::Sidecar("Worker already running".to_string()));
            }
        }

        tracing::info!("Starting sidecar worker: {}", self.config.worker_program);

        let mut child = Command::new(&self.config.worker_program)
            .args(&self.config.worker_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HostError::Sidecar(format!("Failed to spawn worker: {}", e)))?;

        let pid = child.id().unwrap_or(0);

        let mut tasks = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            tasks.push(relay::spawn_stream_reader(
                stdout,
                OutputStream::Stdout,
                self.events_tx.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            tasks.push(relay::spawn_stream_reader(
                stderr,
                OutputStream::Stderr,
                self.events_tx.clone(),
            ));
        }

        {
            let mut process_guard = self.process.lock().await;
            *process_guard = Some(child);
        }
        {
            let mut tasks_guard = self.relay_tasks.lock().await;
            *tasks_guard = tasks;
        }
        {
            let mut state = self.state.write().await;
            *state = WorkerState::Running;
        }

        tracing::info!("Sidecar worker started (pid {})", pid);
        Ok(pid)
    }

    /// Force-terminate the worker and reap it. Returns true on success;
    /// stopping an already-stopped supervisor succeeds without error. The
    /// relay tasks are left to drain on their own, so output events already
    /// in flight from the dying process are still delivered.
    pub async fn stop(&self) -> Result<bool> {
        let _lifecycle_guard = self.lifecycle_lock.lock().await;

        let child = {
            let mut process_guard = self.process.lock().await;
            process_guard.take()
        };

        if let Some(mut child) = child {
            child
                .kill()
                .await
                .map_err(|e| HostError::Sidecar(format!("Failed to kill worker: {}", e)))?;
            tracing::info!("Sidecar worker stopped");
        }

        // Dropping the join handles detaches the relay tasks; they finish
        // when the pipes hit EOF.
        {
            let mut tasks_guard = self.relay_tasks.lock().await;
            tasks_guard.clear();
        }
        {
            let mut state = self.state.write().await;
            *state = WorkerState::Stopped;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use std::time::Duration;
    use tokio::time::timeout;

    fn shell_config(script: &str) -> HostConfig {
        let mut config = HostConfig::default();
        config.worker_program = "sh".to_string();
        config.worker_args = vec!["-c".to_string(), script.to_string()];
        config
    }

    #[tokio::test]
    async fn relays_stdout_lines_in_order_and_skips_blanks() {
        let bus = EventBus::new(64);
        let mut sub = bus.subscribe();
        let supervisor = SidecarSupervisor::new(
            shell_config("printf 'one\\ntwo\\n\\nthree\\n'"),
            bus.sender(),
        );

        let pid = supervisor.start().await.expect("start");
        assert!(pid > 0);
        assert_eq!(supervisor.state().await, WorkerState::Running);

        for expected in ["one", "two", "three"] {
            let event = timeout(Duration::from_secs(10), sub.recv())
                .await
                .expect("timed out")
                .expect("event");
            assert_eq!(event.stream, OutputStream::Stdout);
            assert_eq!(event.line, expected);
        }

        assert!(supervisor.stop().await.expect("stop"));
        assert_eq!(supervisor.state().await, WorkerState::Stopped);
    }

    #[tokio::test]
    async fn stderr_lines_are_tagged_stderr() {
        let bus = EventBus::new(64);
        let mut sub = bus.subscribe();
        let supervisor =
            SidecarSupervisor::new(shell_config("echo oops 1>&2"), bus.sender());

        supervisor.start().await.expect("start");
        let event = timeout(Duration::from_secs(10), sub.recv())
            .await
            .expect("timed out")
            .expect("event");
        assert_eq!(event.stream, OutputStream::Stderr);
        assert_eq!(event.line, "oops");

        supervisor.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn duplicate_start_is_rejected() {
        let bus = EventBus::new(16);
        let supervisor = SidecarSupervisor::new(shell_config("sleep 30"), bus.sender());

        supervisor.start().await.expect("first start");
        let second = supervisor.start().await;
        assert!(matches!(second, Err(HostError::Sidecar(_))));
        assert_eq!(supervisor.state().await, WorkerState::Running);

        supervisor.stop().await.expect("stop");
    }

    #[tokio::test]
    async fn stop_without_running_worker_succeeds() {
        let bus = EventBus::new(16);
        let supervisor = SidecarSupervisor::new(HostConfig::default(), bus.sender());
        assert!(supervisor.stop().await.expect("stop"));
        assert_eq!(supervisor.state().await, WorkerState::Stopped);
    }

    #[tokio::test]
    async fn stop_does_not_suppress_in_flight_output() {
        let bus = EventBus::new(64);
        let mut sub = bus.subscribe();
        let supervisor = SidecarSupervisor::new(
            shell_config("printf 'a\\nb\\nc\\n'; sleep 30"),
            bus.sender(),
        );

        supervisor.start().await.expect("start");
        // Give the relay tasks time to publish, then kill before reading.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(supervisor.stop().await.expect("stop"));

        for expected in ["a", "b", "c"] {
            let event = timeout(Duration::from_secs(10), sub.recv())
                .await
                .expect("timed out")
                .expect("event");
            assert_eq!(event.line, expected);
        }
    }

    #[tokio::test]
    async fn worker_death_is_not_observed() {
        let bus = EventBus::new(16);
        let supervisor = SidecarSupervisor::new(shell_config("true"), bus.sender());

        supervisor.start().await.expect("start");
        tokio::time::sleep(Duration::from_millis(200)).await;
        // The process has exited, but no supervision signal exists.
        assert_eq!(supervisor.state().await, WorkerState::Running);

        supervisor.stop().await.expect("stop");
    }
}
