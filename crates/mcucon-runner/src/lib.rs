//! # mcucon-runner
//!
//! Hosts a board console on a workstation. The ambient channels are TCP
//! ports, the board is a [`SimulatedBoard`], and boards with WiFi also get
//! the HTTP surface.
//!
//! Threads:
//! - a tokio runtime carrying the channel listeners and the HTTP server
//! - the calling thread, running the [`PollLoop`] until Ctrl-C

pub mod channel_server;
pub mod config;
pub mod detect;
pub mod error;
pub mod http;
pub mod poll;
pub mod telemetry;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use mcucon_board::SimulatedBoard;
use mcucon_core::Console;
use mcucon_protocol::ChannelId;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

pub use channel_server::ChannelServer;
pub use config::{Overrides, RunnerConfig};
pub use error::{RunnerError, RunnerResult};
pub use poll::{PollLoop, SharedConsole};

/// Create the console described by `config`.
pub fn build_console(config: &RunnerConfig) -> SharedConsole {
    let board = SimulatedBoard::new(config.board, config.simulation.clone());
    Arc::new(Mutex::new(Console::new(board, config.console.clone())))
}

/// Ambient channels and their ports for `config`.
pub fn channel_ports(config: &RunnerConfig) -> Vec<(ChannelId, u16)> {
    let mut channels = vec![(ChannelId::Serial, config.serial_port)];
    if config.bluetooth_enabled() {
        channels.push((ChannelId::Bluetooth, config.bluetooth_port));
    }
    channels
}

/// Run the console until Ctrl-C.
pub fn run(config: RunnerConfig) -> RunnerResult<()> {
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    {
        let _guard = runtime.enter();
        telemetry::install_metrics(&config.metrics)?;
    }

    let profile = config.board.profile();
    info!("Starting {} console", profile.name);

    let console = build_console(&config);
    let server = ChannelServer::start(
        runtime.handle(),
        profile.kind.as_str(),
        "127.0.0.1",
        &channel_ports(&config),
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let http_task = if config.http_enabled() {
        let state = http::AppState::new(
            console.clone(),
            Duration::from_millis(config.http.frame_interval_ms),
        );
        let listen = config.http.listen.clone();
        Some(runtime.spawn(async move {
            if let Err(e) = http::serve(&listen, state, shutdown_rx).await {
                warn!("{}", e);
            }
        }))
    } else {
        None
    };

    let mut poll = PollLoop::new(
        console,
        server,
        Duration::from_millis(config.poll_interval_ms),
    );
    let stop = poll.shutdown_flag();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::Relaxed);
    })
    .map_err(|e| RunnerError::Config(format!("cannot install Ctrl-C handler: {e}")))?;

    poll.run();

    let _ = shutdown_tx.send(true);
    if let Some(task) = http_task {
        let _ = runtime.block_on(task);
    }
    runtime.shutdown_timeout(Duration::from_secs(1));
    info!("Shutdown complete");
    Ok(())
}
