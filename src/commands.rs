// Host-level command layer: the invocation channel between the front end
// and the environment that manages the worker process. Decoupled from the
// worker's own HTTP API.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::Result;
use crate::supervisor::SidecarSupervisor;

/// Commands the front end can issue over the invocation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    StartSidecar,
    ShutdownSidecar,
    ToggleFullscreen,
}

impl HostCommand {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "start" => Some(Self::StartSidecar),
            "stop" => Some(Self::ShutdownSidecar),
            "full" => Some(Self::ToggleFullscreen),
            _ => None,
        }
    }
}

/// Seam for the window side command. The headless front end only records the
/// state; a windowed host would flip its real window here.
pub trait WindowControl: Send + Sync {
    fn is_fullscreen(&self) -> bool;
    fn set_fullscreen(&self, fullscreen: bool);
}

#[derive(Debug, Default)]
pub struct HeadlessWindow {
    fullscreen: AtomicBool,
}

impl WindowControl for HeadlessWindow {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::Relaxed)
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::Relaxed);
        tracing::debug!("Fullscreen set to {}", fullscreen);
    }
}

/// Spawn the worker process. Returns the pid.
pub async fn start_sidecar(supervisor: &SidecarSupervisor) -> Result<u32> {
    supervisor.start().await
}

/// Force-terminate the worker process. Truthy on success.
pub async fn shutdown_sidecar(supervisor: &SidecarSupervisor) -> Result<bool> {
    supervisor.stop().await
}

/// Window side command sharing the invocation channel; triggered by a
/// reserved key in the front end, never by worker lifecycle logic. The
/// return value is not consumed by callers.
pub fn toggle_fullscreen(window: &dyn WindowControl) -> bool {
    let next = !window.is_fullscreen();
    window.set_fullscreen(next);
    next
}
