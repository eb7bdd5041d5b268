//! The cooperative polling loop.
//!
//! One thread owns the [`ChannelServer`] receivers and repeatedly drains each
//! ambient channel into the console. The console lock is taken per chunk, so
//! HTTP handlers interleave with channel traffic between chunks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mcucon_board::SimulatedBoard;
use mcucon_core::Console;
use mcucon_protocol::ChannelId;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::channel_server::ChannelServer;

/// Console shared between the poll loop and the HTTP server.
pub type SharedConsole = Arc<Mutex<Console<SimulatedBoard>>>;

/// Drives the console from the ambient channel transports.
pub struct PollLoop {
    console: SharedConsole,
    server: ChannelServer,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    /// Client presence seen on the previous round, per ambient channel.
    attached: [bool; 2],
}

impl PollLoop {
    pub fn new(console: SharedConsole, server: ChannelServer, interval: Duration) -> Self {
        PollLoop {
            console,
            server,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            attached: [false; 2],
        }
    }

    /// Flag that stops [`run`](Self::run) once set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn server(&self) -> &ChannelServer {
        &self.server
    }

    /// One polling round. Returns the number of lines processed.
    pub fn poll_once(&mut self) -> usize {
        self.track_clients();
        // Restarts requested over HTTP are announced here
        self.console.lock().flush_greeting(&mut self.server);

        let mut processed = 0;
        for channel in self.server.channels() {
            while let Some(data) = self.server.try_recv(channel) {
                let mut console = self.console.lock();
                processed += console.feed(channel, &data, &mut self.server);
            }
        }
        processed
    }

    /// Run until the shutdown flag is set.
    pub fn run(&mut self) {
        info!("Poll loop started ({:?} interval)", self.interval);
        while !self.shutdown.load(Ordering::Relaxed) {
            if self.poll_once() == 0 {
                std::thread::sleep(self.interval);
            }
        }
        info!("Poll loop stopped");
    }

    /// Mirror client presence into the board and greet newly attached
    /// clients on the active channel.
    fn track_clients(&mut self) {
        for (slot, channel) in ChannelId::AMBIENT.into_iter().enumerate() {
            let now = self.server.is_client_connected(channel);
            if now == self.attached[slot] {
                continue;
            }
            self.attached[slot] = now;
            debug!("{} client {}", channel, if now { "attached" } else { "detached" });

            let mut console = self.console.lock();
            if channel == ChannelId::Bluetooth {
                console.board_mut().set_bluetooth_client(now);
            }
            if now && console.active_channel() == channel {
                console.greet(&mut self.server);
            }
        }
    }
}
