//! HTTP surface for boards with WiFi.
//!
//! Uses axum to expose the console's request/response path plus a few
//! structured endpoints. Every handler locks the shared console for the
//! duration of one operation only.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use mcucon_board::{Board, NetworkInfo, SimulatedBoard};
use mcucon_core::{encode_part, Console, ConsoleError, FrameStream, StatusSnapshot, STREAM_CONTENT_TYPE};
use mcucon_protocol::Verb;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{RunnerError, RunnerResult};
use crate::poll::SharedConsole;

/// Frames buffered between the stream producer and a client.
const STREAM_QUEUE_DEPTH: usize = 2;

/// Shared state for HTTP handlers.
pub struct AppState {
    console: SharedConsole,
    frame_interval: Duration,
}

impl AppState {
    pub fn new(console: SharedConsole, frame_interval: Duration) -> Arc<Self> {
        Arc::new(AppState {
            console,
            frame_interval,
        })
    }
}

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/command", post(command_handler))
        .route("/capture", get(capture_handler))
        .route("/stream", get(stream_handler))
        .route("/wifi/scan", get(wifi_scan_handler))
        .route("/wifi/connect", post(wifi_connect_handler))
        .route("/gpio/{pin}", get(gpio_read_handler).post(gpio_write_handler))
        .with_state(state)
}

/// Serve until `shutdown` turns true.
pub async fn serve(
    listen_addr: &str,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> RunnerResult<()> {
    let addr: SocketAddr = listen_addr
        .parse()
        .map_err(|e| RunnerError::Http(format!("invalid listen address {listen_addr:?}: {e}")))?;

    info!(addr = %addr, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RunnerError::Http(format!("failed to bind {addr}: {e}")))?;

    let mut shutdown = shutdown;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|&v| v).await;
        })
        .await
        .map_err(|e| RunnerError::Http(format!("HTTP server error: {e}")))
}

// ============================================================================
// Errors
// ============================================================================

/// Handler failure, rendered as plain text.
enum ApiError {
    Console(ConsoleError),
    Internal(String),
}

impl From<ConsoleError> for ApiError {
    fn from(err: ConsoleError) -> Self {
        ApiError::Console(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Console(err) => {
                let status = match &err {
                    ConsoleError::Unavailable(_) | ConsoleError::ConnectFailed { .. } => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    ConsoleError::Board(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string()).into_response()
            }
            ApiError::Internal(msg) => {
                warn!("HTTP handler failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}

/// Run `f` against the console on the blocking pool.
async fn with_console<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Console<SimulatedBoard>) -> T + Send + 'static,
    T: Send + 'static,
{
    let console = state.console.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = console.lock();
        f(&mut guard)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("console task failed: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct StatusBody {
    #[serde(flatten)]
    snapshot: StatusSnapshot,
    boot_time: String,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusBody>, ApiError> {
    let snapshot = with_console(&state, |console| console.status_snapshot()).await?;
    // Tracks restarts, since uptime resets with the board
    let boot = Utc::now() - chrono::Duration::milliseconds(snapshot.uptime_ms as i64);
    Ok(Json(StatusBody {
        snapshot,
        boot_time: boot.to_rfc3339(),
    }))
}

async fn command_handler(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<String, ApiError> {
    debug!("HTTP command: {:?}", body);
    with_console(&state, move |console| console.execute_request(&body)).await
}

async fn capture_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let frame = with_console(&state, |console| console.capture_frame()).await??;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], frame.data).into_response())
}

async fn stream_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let stream = with_console(&state, |console| {
        let ready =
            console.table().supports(Verb::Capture) && console.board().camera_status().initialized;
        ready.then(|| FrameStream::start(&*console))
    })
    .await?;
    let Some(mut stream) = stream else {
        return Err(ConsoleError::Unavailable("Camera not initialized").into());
    };

    // The console lock can be held across a slow command; keep the producer
    // off the runtime workers.
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(STREAM_QUEUE_DEPTH);
    let console = state.console.clone();
    let interval = state.frame_interval;
    tokio::task::spawn_blocking(move || loop {
        let next = {
            let mut guard = console.lock();
            stream.next_frame(&mut *guard)
        };
        let Ok(frame) = next else {
            break;
        };
        if tx.blocking_send(encode_part(&frame)).is_err() {
            debug!("Stream client went away after {} frame(s)", stream.frames());
            break;
        }
        std::thread::sleep(interval);
    });

    let body_stream = async_stream::stream! {
        while let Some(part) = rx.recv().await {
            yield Ok::<_, std::io::Error>(part);
        }
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to build streaming response",
            )
                .into_response()
        }))
}

async fn wifi_scan_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<NetworkInfo>>, ApiError> {
    let networks = with_console(&state, |console| console.wifi_networks()).await??;
    Ok(Json(networks))
}

#[derive(Deserialize)]
struct ConnectRequest {
    ssid: String,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConnectResponse {
    connected: bool,
    ip: Option<String>,
    message: String,
}

async fn wifi_connect_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let ssid = request.ssid.clone();
    let result = with_console(&state, move |console| {
        console.wifi_connect(&request.ssid, request.password.as_deref())
    })
    .await?;

    match result {
        Ok(status) => Ok(Json(ConnectResponse {
            connected: true,
            ip: status.ip,
            message: format!("Connected to {}", ssid),
        })),
        Err(err @ ConsoleError::ConnectFailed { .. }) => Ok(Json(ConnectResponse {
            connected: false,
            ip: None,
            message: err.to_string(),
        })),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Serialize)]
struct PinValue {
    pin: i64,
    value: u8,
}

#[derive(Deserialize)]
struct PinWrite {
    value: i64,
}

async fn gpio_read_handler(
    State(state): State<Arc<AppState>>,
    Path(pin): Path<i64>,
) -> Result<Json<PinValue>, ApiError> {
    let high = with_console(&state, move |console| console.gpio_read(pin)).await??;
    Ok(Json(PinValue {
        pin,
        value: u8::from(high),
    }))
}

async fn gpio_write_handler(
    State(state): State<Arc<AppState>>,
    Path(pin): Path<i64>,
    Json(body): Json<PinWrite>,
) -> Result<Json<PinValue>, ApiError> {
    with_console(&state, move |console| console.gpio_write(pin, body.value)).await??;
    Ok(Json(PinValue {
        pin,
        value: u8::from(body.value != 0),
    }))
}
