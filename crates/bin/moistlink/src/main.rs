//! # moistlink — terminal client for the moisture sensor
//!
//! Composition root that wires the BLE transport, the event bus and the
//! terminal alert sink into a [`ConnectionSession`], then drives it from
//! stdin.
//!
//! ## Responsibilities
//! - Load configuration (`moistlink.toml`, env vars)
//! - Initialize logging
//! - Construct the transport adapter and the session
//! - Print session events as they are published
//! - Run the command loop, interleaving user commands with link events
//! - Release the sensor on quit, EOF or Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod alerts;
mod command;
mod config;
mod display;

use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use moistlink_adapter_ble::BleTransport;
use moistlink_app::event_bus::InProcessEventBus;
use moistlink_app::session::ConnectionSession;
use moistlink_domain::event::SessionEvent;
use moistlink_domain::time::now;

use crate::alerts::TerminalAlertSink;
use crate::command::{Command, HELP};
use crate::config::Config;
use crate::display::Renderer;

const EVENT_BUS_CAPACITY: usize = 256;

type Session = ConnectionSession<BleTransport, Arc<InProcessEventBus>, TerminalAlertSink>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let renderer = Renderer::new(config.display.unit, config.display.format);

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));
    let printer = tokio::spawn(print_events(event_bus.subscribe(), renderer));

    // Session
    let transport = BleTransport::new(config.ble.clone());
    let sink = TerminalAlertSink::new(config.alerts.system_notifications);
    let mut session = ConnectionSession::new(
        transport,
        Arc::clone(&event_bus),
        sink,
        config.history.capacity,
    );

    tracing::info!(
        device_name = %config.ble.device_name,
        history_capacity = config.history.capacity,
        "moistlink ready"
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = session.next_link_event() => session.handle_link_event(event).await,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    tracing::debug!("stdin closed");
                    break;
                };
                match Command::parse(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => {
                        if run_command(&mut session, command, renderer, ctrl_c.as_mut())
                            .await
                            .is_break()
                        {
                            tracing::info!("interrupted");
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("unknown command {:?}, type ? for help", line.trim()),
                }
            }
            result = &mut ctrl_c => {
                if let Err(err) = result {
                    tracing::warn!(%err, "failed to listen for Ctrl-C");
                }
                tracing::info!("interrupted");
                break;
            }
        }
    }

    session.dispose().await;

    // Closing the bus lets the printer drain the final events and exit.
    drop(event_bus);
    if let Err(err) = printer.await {
        tracing::warn!(%err, "event printer failed");
    }
    Ok(())
}

/// Runs one user command. Returns `Break` when `interrupt` fired while the
/// command was pending.
async fn run_command<I>(
    session: &mut Session,
    command: Command,
    renderer: Renderer,
    interrupt: Pin<&mut I>,
) -> ControlFlow<()>
where
    I: Future,
{
    match command {
        Command::Connect => {
            // Scanning can take the whole discovery timeout, so Ctrl-C must
            // not wait for it. The abandoned attempt is closed by `dispose`.
            tokio::select! {
                result = session.connect() => {
                    if let Err(err) = result {
                        println!("connect failed: {:#}", anyhow::Error::from(err));
                    }
                }
                _ = interrupt => return ControlFlow::Break(()),
            }
        }
        Command::ToggleMode => match session.toggle_mode().await {
            Ok(mode) => println!("switched to {mode} mode"),
            Err(err) => println!("mode change failed: {:#}", anyhow::Error::from(err)),
        },
        Command::Disconnect => {
            if let Err(err) = session.disconnect().await {
                println!("disconnect failed: {:#}", anyhow::Error::from(err));
            }
        }
        Command::Status => {
            let status = session.status();
            let stats = session.history().stats();
            println!(
                "{}",
                renderer.status(&status, &stats, session.next_update_in(now()))
            );
        }
        Command::History => {
            let readings = session.history().snapshot();
            if readings.is_empty() {
                println!("no readings yet");
            }
            for reading in &readings {
                println!("{}", renderer.reading(reading));
            }
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    ControlFlow::Continue(())
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>, renderer: Renderer) {
    loop {
        match events.recv().await {
            Ok(event) => println!("{}", renderer.event(&event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event printer lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
