//! End-to-end console tests.
//!
//! These drive the full feed -> parse -> dispatch -> route cycle against a
//! simulated board, checking what an operator sees on each channel.

use mcucon_board::{Board, BoardKind, SimulatedBoard, SimulatedBoardConfig};
use mcucon_core::{BufferedSink, Console, ConsoleConfig};
use mcucon_protocol::{ChannelId, LineAccumulator, LineEvent, PROMPT};

/// Helper to create a console on a default simulated board.
fn console(kind: BoardKind) -> Console<SimulatedBoard> {
    console_with(kind, SimulatedBoardConfig::default())
}

fn console_with(kind: BoardKind, config: SimulatedBoardConfig) -> Console<SimulatedBoard> {
    Console::new(SimulatedBoard::new(kind, config), ConsoleConfig::default())
}

/// Send one line on `channel` and return what that channel received.
fn send(
    console: &mut Console<SimulatedBoard>,
    sink: &mut BufferedSink,
    channel: ChannelId,
    line: &str,
) -> String {
    let mut bytes = line.as_bytes().to_vec();
    bytes.push(b'\n');
    console.feed(channel, &bytes, sink);
    sink.take(channel)
}

// ============================================================================
// Line Accumulation
// ============================================================================

#[test]
fn test_every_terminated_sequence_yields_one_line() {
    let bodies = ["help", "pwm 9 128", "  led on  ", "x", "eeprom write 1023 255"];
    for body in bodies {
        for terminator in [b'\n', b'\r'] {
            let mut lines = LineAccumulator::new();
            let mut bytes = body.as_bytes().to_vec();
            bytes.push(terminator);
            let events = lines.push(ChannelId::Serial, &bytes);
            assert_eq!(events, vec![LineEvent::Line(body.to_string())]);

            // A second terminator right after is absorbed
            assert_eq!(lines.feed(ChannelId::Serial, terminator), None);
        }
    }
}

#[test]
fn test_crlf_produces_single_prompt() {
    let mut console = console(BoardKind::Uno);
    let mut sink = BufferedSink::new();
    console.feed(ChannelId::Serial, b"uptime\r\n", &mut sink);
    let out = sink.take(ChannelId::Serial);
    assert_eq!(out.matches(PROMPT).count(), 1);
    assert!(out.starts_with("Uptime: 0 seconds"));
}

#[test]
fn test_channels_do_not_interleave() {
    let mut console = console(BoardKind::UnoBluetooth);
    let mut sink = BufferedSink::new();
    console.feed(ChannelId::Serial, b"led ", &mut sink);
    console.feed(ChannelId::Bluetooth, b"blu", &mut sink);
    console.feed(ChannelId::Serial, b"on\n", &mut sink);
    console.feed(ChannelId::Bluetooth, b"etooth\n", &mut sink);

    assert_eq!(sink.take(ChannelId::Serial), "LED ON\r\n> ");
    assert!(sink
        .take(ChannelId::Bluetooth)
        .starts_with("Bluetooth: enabled\r\n"));
}

// ============================================================================
// Unknown Commands
// ============================================================================

#[test]
fn test_unknown_command_echoes_text_and_is_idempotent() {
    let mut console = console(BoardKind::Uno);
    let mut sink = BufferedSink::new();
    for text in ["frobnicate", "Led Sideways", "pwmx 1 2", "wifi"] {
        let first = send(&mut console, &mut sink, ChannelId::Serial, text);
        let second = send(&mut console, &mut sink, ChannelId::Serial, text);
        assert_eq!(first, second);
        assert!(first.contains("Unknown command"));
        assert!(first.contains(text));
    }
}

#[test]
fn test_verbs_are_case_insensitive() {
    let mut console = console(BoardKind::Uno);
    let mut sink = BufferedSink::new();
    assert_eq!(
        send(&mut console, &mut sink, ChannelId::Serial, "LED ON"),
        "LED ON\r\n> "
    );
}

// ============================================================================
// PWM Validation
// ============================================================================

#[test]
fn test_pwm_pin_rejection_ignores_value() {
    let mut console = console(BoardKind::Uno);
    let allowed = [3, 5, 6, 9, 10, 11];
    let mut messages = Vec::new();
    for pin in -2..=20 {
        if allowed.contains(&pin) {
            continue;
        }
        for value in [-5, 0, 128, 255, 256, 1000] {
            messages.push(console.execute_request(&format!("pwm {} {}", pin, value)));
        }
    }
    messages.dedup();
    assert_eq!(messages, vec!["Invalid PWM pin. Use: 3, 5, 6, 9, 10, 11".to_string()]);
    assert_eq!(console.board().hardware_writes(), 0);
}

#[test]
fn test_pwm_value_range_on_valid_pins() {
    let mut console = console(BoardKind::Uno);
    for pin in [3, 5, 6, 9, 10, 11] {
        for value in [-1, 256, 1000] {
            let text = console.execute_request(&format!("pwm {} {}", pin, value));
            assert_eq!(text, "Value must be between 0 and 255");
        }
        let text = console.execute_request(&format!("pwm {} 0", pin));
        assert_eq!(text, format!("PWM pin {} set to 0", pin));
    }
}

#[test]
fn test_pwm_wrong_token_count() {
    let mut console = console(BoardKind::Uno);
    assert_eq!(console.execute_request("pwm"), "Usage: pwm <pin> <value>");
    assert_eq!(console.execute_request("pwm 9 1 2"), "Usage: pwm <pin> <value>");
}

// ============================================================================
// EEPROM
// ============================================================================

#[test]
fn test_eeprom_round_trip_across_capacity() {
    for (kind, capacity) in [(BoardKind::Uno, 1024usize), (BoardKind::Esp32Cam, 512)] {
        let mut console = console(kind);
        for addr in (0..capacity).step_by(37).chain([capacity - 1]) {
            let value = (addr * 7) % 256;
            assert_eq!(
                console.execute_request(&format!("eeprom write {} {}", addr, value)),
                format!("EEPROM[{}] <- {}", addr, value)
            );
            assert_eq!(
                console.execute_request(&format!("eeprom read {}", addr)),
                format!("EEPROM[{}] = {}", addr, value)
            );
        }
    }
}

#[test]
fn test_eeprom_edge_values() {
    let mut console = console(BoardKind::Uno);
    for value in [0, 1, 254, 255] {
        console.execute_request(&format!("eeprom write 0 {}", value));
        assert_eq!(console.execute_request("eeprom read 0"), format!("EEPROM[0] = {}", value));
    }
}

#[test]
fn test_eeprom_out_of_range_touches_nothing() {
    let mut console = console(BoardKind::Esp32Cam);
    for addr in [512, 1000, -1] {
        assert_eq!(
            console.execute_request(&format!("eeprom write {} 1", addr)),
            "Address out of range (0-511)"
        );
        assert_eq!(
            console.execute_request(&format!("eeprom read {}", addr)),
            "Address out of range (0-511)"
        );
    }
    assert_eq!(console.board().hardware_writes(), 0);
    assert_eq!(console.board().eeprom_commits(), 0);
}

#[test]
fn test_bare_eeprom_is_usage() {
    let mut console = console(BoardKind::Uno);
    assert_eq!(
        console.execute_request("eeprom"),
        "Usage: eeprom read <addr> | eeprom write <addr> <value>"
    );
    assert_eq!(
        console.execute_request("eeprom erase 5"),
        "Usage: eeprom read <addr> | eeprom write <addr> <value>"
    );
}

// ============================================================================
// Uptime and I2C
// ============================================================================

#[test]
fn test_uptime_formatting() {
    let mut console = console(BoardKind::Uno);
    console.board_mut().advance_ms(3_725_000);
    assert_eq!(console.execute_request("uptime"), "Uptime: 1 hours, 2 minutes, 5 seconds");

    let mut console2 = self::console(BoardKind::Uno);
    console2.board_mut().advance_ms(90_000);
    assert_eq!(console2.execute_request("uptime"), "Uptime: 1 minutes, 30 seconds");
}

#[test]
fn test_empty_bus_reports_no_devices() {
    let mut console = console(BoardKind::Uno);
    let text = console.execute_request("scan");
    assert!(text.contains("No I2C devices found"));
    assert!(!text.contains("Found 0 device(s)"));
}

#[test]
fn test_scan_reports_count() {
    let config = SimulatedBoardConfig {
        i2c_devices: vec![0x27],
        ..Default::default()
    };
    let mut console = console_with(BoardKind::Uno, config);
    let text = console.execute_request("scan");
    assert!(text.contains("I2C device found at address 0x27"));
    assert!(text.contains("Found 1 device(s)"));
}

// ============================================================================
// Channel Routing
// ============================================================================

#[test]
fn test_reply_on_channel_heard_from() {
    let mut console = console(BoardKind::UnoBluetooth);
    let mut sink = BufferedSink::new();

    send(&mut console, &mut sink, ChannelId::Bluetooth, "led on");
    assert_eq!(console.active_channel(), ChannelId::Bluetooth);
    assert_eq!(sink.output(ChannelId::Serial), "");

    let out = send(&mut console, &mut sink, ChannelId::Serial, "led off");
    assert_eq!(out, "LED OFF\r\n> ");
    assert_eq!(sink.output(ChannelId::Bluetooth), "");
}

#[test]
fn test_web_request_does_not_change_ambient_selection() {
    let mut console = console(BoardKind::Esp32Cam);
    let mut sink = BufferedSink::new();

    send(&mut console, &mut sink, ChannelId::Bluetooth, "status");
    assert_eq!(console.active_channel(), ChannelId::Bluetooth);

    let web = console.execute_request("led on");
    assert_eq!(web, "LED ON");
    assert_eq!(console.active_channel(), ChannelId::Bluetooth);

    let out = send(&mut console, &mut sink, ChannelId::Bluetooth, "led");
    assert_eq!(out, "LED is ON\r\n> ");
    assert!(sink.is_empty());
}

#[test]
fn test_web_request_has_no_prompt_or_crlf() {
    let mut console = console(BoardKind::Esp32Cam);
    let text = console.execute_request("memory");
    assert!(!text.contains('\r'));
    assert!(!text.ends_with(PROMPT));
    assert!(text.contains('\n'));
}

// ============================================================================
// Board Specific Commands
// ============================================================================

#[test]
fn test_camera_not_initialized() {
    let mut config = SimulatedBoardConfig::default();
    config.camera.present = false;
    let mut console = console_with(BoardKind::Esp32Cam, config);
    assert_eq!(console.execute_request("capture"), "Camera not initialized");
    assert_eq!(console.execute_request("camera"), "Camera not initialized");
}

#[test]
fn test_wifi_connect_preserves_case() {
    let config = SimulatedBoardConfig {
        networks: vec![mcucon_board::SimulatedNetwork {
            ssid: "LabNet".to_string(),
            rssi: -40,
            password: Some("PassWord".to_string()),
        }],
        ..Default::default()
    };
    let mut console = console_with(BoardKind::Esp32Cam, config);
    assert_eq!(console.execute_request("wifi"), "WiFi not connected");
    assert_eq!(
        console.execute_request("WIFI CONNECT LabNet PassWord"),
        "Connected to LabNet\nIP: 192.168.4.100"
    );
    assert!(console.board().wifi_status().connected);
}

#[test]
fn test_gpio_bare_lists_pins() {
    let mut console = console(BoardKind::Uno);
    assert!(console.execute_request("gpio").starts_with("Digital pins:"));
    assert_eq!(console.execute_request("gpio 12 1"), "D12 set to HIGH");
    assert_eq!(
        console.execute_request("gpio 13 1"),
        "Invalid GPIO pin. Use: 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12"
    );
}

#[test]
fn test_non_numeric_argument_is_zero() {
    let mut console = console(BoardKind::Uno);
    assert_eq!(console.execute_request("pwm 9 abc"), "PWM pin 9 set to 0");
}
