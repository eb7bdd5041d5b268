//! HTTP surface tests, driven through the router without a socket.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use mcucon_board::{BoardKind, SimulatedNetwork};
use mcucon_protocol::ChannelId;
use mcucon_runner::http::{router, AppState};
use mcucon_runner::{build_console, RunnerConfig, SharedConsole};
use serde_json::Value;
use tower::ServiceExt;

/// Esp32 console on virtual time with one secured network.
fn esp32_config() -> RunnerConfig {
    let mut config = RunnerConfig {
        board: BoardKind::Esp32Cam,
        ..Default::default()
    };
    config.simulation.realtime = false;
    config.simulation.networks = vec![SimulatedNetwork {
        ssid: "LabNet".to_string(),
        rssi: -50,
        password: Some("secret".to_string()),
    }];
    config
}

fn app(config: &RunnerConfig) -> (Router, SharedConsole) {
    let console = build_console(config);
    let state = AppState::new(console.clone(), Duration::from_millis(1));
    (router(state), console)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_text(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ============================================================================
// Status and Commands
// ============================================================================

#[tokio::test]
async fn test_status_reports_board_state() {
    let (app, _) = app(&esp32_config());
    let response = app.oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["uptime_ms"], 0);
    assert_eq!(json["camera"]["initialized"], true);
    assert_eq!(json["wifi"]["connected"], false);
    assert_eq!(json["bluetooth"]["enabled"], true);
    assert_eq!(json["bluetooth"]["connected"], false);
    assert_eq!(json["active_channel"], "serial");
    assert!(json["boot_time"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_command_returns_bare_text() {
    let (app, console) = app(&esp32_config());
    let response = app
        .oneshot(post("/command", "text/plain", "eeprom write 7 99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "EEPROM[7] <- 99");

    // Request/response traffic never moves the ambient selection
    assert_eq!(console.lock().active_channel(), ChannelId::Serial);
    assert_eq!(console.lock().execute_request("eeprom read 7"), "EEPROM[7] = 99");
}

#[tokio::test]
async fn test_command_unknown_is_text_not_error() {
    let (app, _) = app(&esp32_config());
    let response = app
        .oneshot(post("/command", "text/plain", "frobnicate"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "Unknown command: frobnicate\nType 'help' for available commands"
    );
}

// ============================================================================
// Camera
// ============================================================================

#[tokio::test]
async fn test_capture_returns_jpeg() {
    let (app, _) = app(&esp32_config());
    let response = app.oneshot(get("/capture")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

    let data = body_bytes(response).await;
    assert_eq!(&data[..2], &[0xFFu8, 0xD8]);
    assert_eq!(&data[data.len() - 2..], &[0xFFu8, 0xD9]);
}

#[tokio::test]
async fn test_capture_without_camera_is_503() {
    let mut config = esp32_config();
    config.simulation.camera.present = false;
    let (app, _) = app(&config);
    let response = app.oneshot(get("/capture")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_text(response).await, "Camera not initialized");
}

#[tokio::test]
async fn test_stream_content_type() {
    let (app, _) = app(&esp32_config());
    let response = app.oneshot(get("/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );
}

#[tokio::test]
async fn test_stream_without_camera_is_503() {
    let mut config = esp32_config();
    config.simulation.camera.present = false;
    let (app, _) = app(&config);
    let response = app.oneshot(get("/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_stream_waits_for_busy_console_off_runtime() {
    let (app, console) = app(&esp32_config());

    // Stand in for a slow command holding the console
    let (locked_tx, locked_rx) = std::sync::mpsc::channel();
    let holder = std::thread::spawn(move || {
        let _guard = console.lock();
        locked_tx.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(400));
    });
    locked_rx.recv().unwrap();

    let request = tokio::spawn(app.oneshot(get("/stream")));
    tokio::time::sleep(Duration::from_millis(20)).await;

    // The only worker must still be free to run other tasks
    let other = tokio::time::timeout(Duration::from_millis(200), tokio::spawn(async { 7 }))
        .await
        .expect("runtime worker was parked on the console lock")
        .unwrap();
    assert_eq!(other, 7);

    let response = tokio::time::timeout(Duration::from_secs(5), request)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    holder.join().unwrap();
}

#[tokio::test]
async fn test_capture_on_uno_is_503() {
    let mut config = esp32_config();
    config.board = BoardKind::Uno;
    let (app, _) = app(&config);
    let response = app.oneshot(get("/capture")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ============================================================================
// WiFi
// ============================================================================

#[tokio::test]
async fn test_wifi_scan_lists_networks() {
    let (app, _) = app(&esp32_config());
    let response = app.oneshot(get("/wifi/scan")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json[0]["ssid"], "LabNet");
    assert_eq!(json[0]["secured"], true);
}

#[tokio::test]
async fn test_wifi_connect_success_and_failure() {
    let (app, _) = app(&esp32_config());

    let response = app
        .clone()
        .oneshot(post(
            "/wifi/connect",
            "application/json",
            r#"{"ssid":"LabNet","password":"secret"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["connected"], true);
    assert_eq!(json["ip"], "192.168.4.100");

    let response = app
        .oneshot(post(
            "/wifi/connect",
            "application/json",
            r#"{"ssid":"LabNet","password":"wrong"}"#,
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["connected"], false);
    assert_eq!(json["message"], "Failed to connect to LabNet");
}

// ============================================================================
// GPIO
// ============================================================================

#[tokio::test]
async fn test_gpio_write_then_read() {
    let (app, _) = app(&esp32_config());

    let response = app
        .clone()
        .oneshot(post("/gpio/12", "application/json", r#"{"value":1}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/gpio/12")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["pin"], 12);
    assert_eq!(json["value"], 1);
}

#[tokio::test]
async fn test_gpio_rejects_pin_outside_allow_list() {
    let (app, console) = app(&esp32_config());

    let response = app
        .clone()
        .oneshot(post("/gpio/5", "application/json", r#"{"value":1}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_text(response).await,
        "Invalid GPIO pin. Use: 2, 4, 12, 13, 14, 15, 16"
    );
    assert_eq!(console.lock().board().hardware_writes(), 0);

    let response = app.oneshot(get("/gpio/5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_state_is_shared() {
    let config = esp32_config();
    let console = build_console(&config);
    let app = router(AppState::new(console.clone(), Duration::from_millis(1)));
    console.lock().execute_request("led on");

    let response = app
        .oneshot(post("/command", "text/plain", "led"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "LED is ON");
}
