//! TCP transports for the ambient channels.
//!
//! Each ambient channel (wired serial, Bluetooth serial) is exposed as a TCP
//! port so a terminal such as `nc` or `telnet` can play the operator. One
//! client per channel is served at a time. Listener tasks run on the tokio
//! runtime; the synchronous poll loop talks to them through bounded mpsc
//! queues and never blocks on the network.

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use mcucon_core::OutputSink;
use mcucon_metrics::{metric_defs, ConsoleLabels};
use mcucon_protocol::ChannelId;
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Channels with a client attached.
type ConnectedClients = Arc<RwLock<HashSet<ChannelId>>>;

/// Queue depth between a listener task and the poll loop.
const QUEUE_DEPTH: usize = 256;

// ============================================================================
// Types
// ============================================================================

/// Poll-side ends of one channel's queues.
struct ChannelQueues {
    /// Console output -> TCP client.
    tx: mpsc::Sender<Vec<u8>>,
    /// TCP client -> console input.
    rx: mpsc::Receiver<Vec<u8>>,
    local_addr: SocketAddr,
}

/// TCP listeners for the ambient channels.
pub struct ChannelServer {
    board: &'static str,
    queues: HashMap<ChannelId, ChannelQueues>,
    connected_clients: ConnectedClients,
}

impl ChannelServer {
    /// Bind one listener per `(channel, port)` and spawn its task on `runtime`.
    ///
    /// Port 0 binds an ephemeral port; see [`local_addr`](Self::local_addr).
    pub fn start(
        runtime: &Handle,
        board: &'static str,
        bind_ip: &str,
        channels: &[(ChannelId, u16)],
    ) -> io::Result<Self> {
        let connected_clients: ConnectedClients = Arc::new(RwLock::new(HashSet::new()));
        let mut queues = HashMap::new();

        for &(channel, port) in channels {
            let addr = format!("{}:{}", bind_ip, port);
            let listener = runtime.block_on(TcpListener::bind(&addr))?;
            let local_addr = listener.local_addr()?;

            let (tx_sender, tx_receiver) = mpsc::channel::<Vec<u8>>(QUEUE_DEPTH);
            let (rx_sender, rx_receiver) = mpsc::channel::<Vec<u8>>(QUEUE_DEPTH);
            queues.insert(
                channel,
                ChannelQueues {
                    tx: tx_sender,
                    rx: rx_receiver,
                    local_addr,
                },
            );

            info!("{} channel listening on {}", channel, local_addr);
            let clients = connected_clients.clone();
            runtime.spawn(async move {
                if let Err(e) =
                    run_listener(listener, channel, board, tx_receiver, rx_sender, clients).await
                {
                    warn!("{} listener stopped: {}", channel, e);
                }
            });
        }

        Ok(ChannelServer {
            board,
            queues,
            connected_clients,
        })
    }

    /// Channels this server carries.
    pub fn channels(&self) -> Vec<ChannelId> {
        ChannelId::AMBIENT
            .iter()
            .copied()
            .filter(|c| self.queues.contains_key(c))
            .collect()
    }

    /// Bound address of a channel's listener.
    pub fn local_addr(&self, channel: ChannelId) -> Option<SocketAddr> {
        self.queues.get(&channel).map(|q| q.local_addr)
    }

    /// Take the next chunk received on `channel`, if any.
    pub fn try_recv(&mut self, channel: ChannelId) -> Option<Vec<u8>> {
        let data = self.queues.get_mut(&channel)?.rx.try_recv().ok()?;
        let labels = ConsoleLabels::new(self.board, channel.as_str());
        metrics::counter!(metric_defs::CHANNEL_RX_BYTES.name, &labels.to_labels())
            .increment(data.len() as u64);
        Some(data)
    }

    /// Check if a client is attached to `channel`.
    pub fn is_client_connected(&self, channel: ChannelId) -> bool {
        self.connected_clients.read().contains(&channel)
    }

    /// Queue bytes for `channel`'s client. Dropped when nobody is attached or
    /// the client is not keeping up.
    pub fn send(&self, channel: ChannelId, data: &[u8]) {
        if !self.is_client_connected(channel) {
            return;
        }
        let Some(queues) = self.queues.get(&channel) else {
            return;
        };
        if let Err(e) = queues.tx.try_send(data.to_vec()) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("{} TX queue full, dropping {} bytes", channel, data.len());
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!("{} channel closed", channel);
                }
            }
        }
    }
}

impl OutputSink for ChannelServer {
    fn write_channel(&mut self, channel: ChannelId, text: &str) {
        self.send(channel, text.as_bytes());
    }
}

/// Accept clients on one channel, one at a time.
async fn run_listener(
    listener: TcpListener,
    channel: ChannelId,
    board: &'static str,
    mut tx_receiver: mpsc::Receiver<Vec<u8>>,
    rx_sender: mpsc::Sender<Vec<u8>>,
    connected_clients: ConnectedClients,
) -> io::Result<()> {
    let labels = ConsoleLabels::new(board, channel.as_str()).to_labels();
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("{} client connected from {}", channel, peer);

        // Output queued while nobody was attached is stale
        while tx_receiver.try_recv().is_ok() {}

        connected_clients.write().insert(channel);
        metrics::gauge!(metric_defs::CHANNEL_CLIENTS.name, &labels).set(1.0);

        let result = handle_connection(stream, &mut tx_receiver, &rx_sender).await;

        connected_clients.write().remove(&channel);
        metrics::gauge!(metric_defs::CHANNEL_CLIENTS.name, &labels).set(0.0);

        match result {
            Ok(()) => info!("{} client {} disconnected", channel, peer),
            Err(e) => warn!("{} connection error: {}", channel, e),
        }
    }
}

/// Shuttle bytes between one TCP client and the channel queues.
async fn handle_connection(
    mut stream: TcpStream,
    tx_receiver: &mut mpsc::Receiver<Vec<u8>>,
    rx_sender: &mpsc::Sender<Vec<u8>>,
) -> io::Result<()> {
    let (mut reader, mut writer) = stream.split();
    let mut read_buf = [0u8; 1024];

    loop {
        tokio::select! {
            // TCP client -> console
            result = reader.read(&mut read_buf) => {
                match result? {
                    0 => return Ok(()),
                    n => {
                        if rx_sender.send(read_buf[..n].to_vec()).await.is_err() {
                            debug!("poll loop gone, closing connection");
                            return Ok(());
                        }
                    }
                }
            }

            // Console -> TCP client
            Some(data) = tx_receiver.recv() => {
                writer.write_all(&data).await?;
                writer.flush().await?;
            }
        }
    }
}
