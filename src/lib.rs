// Sidecar host - supervises a local worker process ("sidecar"), relays its
// console output as a live log, and talks to its local HTTP API.

pub mod api;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod logs;
pub mod relay;
pub mod supervisor;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{HeadlessWindow, HostCommand};

/// Initialize tracing for logging (console + file). This is the diagnostic
/// channel: command-invocation failures land here, never in the visible log.
fn init_tracing() {
    use tracing_appender::rolling;

    let logs_dir = dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sidecar-host")
        .join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    // Daily rotation; files are named sidecar-host.YYYY-MM-DD.log
    let file_appender = rolling::daily(&logs_dir, "sidecar-host");

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    // Console diagnostics go to stderr so they stay out of the log view.
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sidecar_host=info".into()),
        )
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized (logs directory: {:?})", logs_dir);
}

fn print_help() {
    println!("commands: connect | start | stop | send <message> | mock | full | quit");
}

/// Wire the subsystem together and drive it from a line-oriented front end.
/// The single loop below is the one execution context that ever touches the
/// controller; relay tasks only reach it through the bus subscription.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    let config = config::HostConfig::from_env();
    tracing::info!(
        "Sidecar host starting (api {}, worker {})",
        config.base_url(),
        config.worker_program
    );

    let bus = events::EventBus::new(2048);
    let supervisor = Arc::new(supervisor::SidecarSupervisor::new(
        config.clone(),
        bus.sender(),
    ));
    let api = api::ApiClient::new(config.base_url());
    let mut controller = controller::Controller::new(api, supervisor.clone());
    let window = HeadlessWindow::default();

    // Output subscription lives for the whole controller lifetime; dropping
    // it at the end of this function releases it exactly once.
    let mut output = bus.subscribe();

    for line in controller.log().snapshot(usize::MAX) {
        println!("{}", line.text);
    }
    print_help();

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = output.recv() => {
                let Some(event) = event else { break };
                controller.handle_output(&event);
                if let Some(line) = controller.log().last() {
                    println!("{}", line.text);
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                let (word, rest) = match line.split_once(' ') {
                    Some((word, rest)) => (word, rest.trim()),
                    None => (line, ""),
                };
                match word {
                    "" => {}
                    "connect" => {
                        controller.connect().await;
                        if controller.status().connected {
                            println!("{}", controller.status().info);
                        } else if let Some(line) = controller.log().last() {
                            println!("{}", line.text);
                        }
                    }
                    "send" => {
                        if controller.send_task(rest).await {
                            if let Some(line) = controller.log().last() {
                                println!("{}", line.text);
                            }
                        }
                    }
                    "mock" => {
                        controller.mock_api_call().await;
                        if let Some(line) = controller.log().last() {
                            println!("{}", line.text);
                        }
                    }
                    "quit" | "exit" => break,
                    other => match HostCommand::parse(other) {
                        Some(HostCommand::StartSidecar) => controller.start_sidecar().await,
                        Some(HostCommand::ShutdownSidecar) => {
                            controller.stop_sidecar().await;
                            println!("disconnected");
                        }
                        Some(HostCommand::ToggleFullscreen) => {
                            commands::toggle_fullscreen(&window);
                        }
                        None => {
                            println!("unknown command: {}", other);
                            print_help();
                        }
                    },
                }
            }
        }
    }

    // Best-effort worker shutdown on exit.
    if let Err(err) = supervisor.stop().await {
        tracing::error!("Failed to stop sidecar on exit. {}", err);
    }
    Ok(())
}
