//! LED, digital, analog, PWM, tone and GPIO commands.

use mcucon_board::Board;

use super::{allowed_pin, in_range, level_name, unreserved_pin};
use crate::config::ConsoleConfig;
use crate::error::ConsoleResult;

/// Lowest frequency the tone generator produces.
pub const TONE_MIN_HZ: i64 = 31;
/// Highest frequency the tone generator produces.
pub const TONE_MAX_HZ: i64 = 65_535;

// ============================================================================
// LED
// ============================================================================

pub fn led_set<B: Board + ?Sized>(board: &mut B, on: bool) -> String {
    let pin = board.profile().led_pin;
    board.digital_write(pin, on);
    format!("LED {}", if on { "ON" } else { "OFF" })
}

pub fn led_state<B: Board + ?Sized>(board: &mut B) -> String {
    let pin = board.profile().led_pin;
    format!("LED is {}", if board.digital_read(pin) { "ON" } else { "OFF" })
}

/// Toggle the LED `blink_count` times; the LED ends off.
pub fn blink<B: Board + ?Sized>(board: &mut B, config: &ConsoleConfig) -> String {
    let pin = board.profile().led_pin;
    for _ in 0..config.blink_count {
        board.digital_write(pin, true);
        board.delay_ms(config.blink_interval_ms);
        board.digital_write(pin, false);
        board.delay_ms(config.blink_interval_ms);
    }
    format!("LED blinked {} times", config.blink_count)
}

// ============================================================================
// Reads
// ============================================================================

/// Levels of every listed digital pin. Reserved pins are named, not read.
pub fn pins<B: Board + ?Sized>(board: &mut B) -> String {
    let profile = board.profile();
    let mut lines = vec!["Digital pins:".to_string()];
    for &pin in profile.digital_pins {
        let label = profile.pin_label(pin);
        let line = match profile.reservation(pin) {
            Some(reserved) => format!("  {}: reserved ({})", label, reserved.purpose),
            None => format!("  {}: {}", label, level_name(board.digital_read(pin))),
        };
        lines.push(line);
    }
    lines.join("\n")
}

pub fn analog<B: Board + ?Sized>(board: &mut B) -> String {
    let profile = board.profile();
    let mut lines = vec!["Analog inputs:".to_string()];
    for input in profile.analog_inputs {
        let raw = board.analog_read(input.pin);
        lines.push(format!(
            "  {}: {} ({:.2} V)",
            input.label,
            raw,
            profile.adc_to_volts(raw)
        ));
    }
    lines.join("\n")
}

pub fn temp<B: Board + ?Sized>(board: &mut B) -> String {
    match board.temperature_c() {
        Some(celsius) => format!("Temperature: {:.1} C", celsius),
        None => "Temperature sensor not available".to_string(),
    }
}

// ============================================================================
// Writes
// ============================================================================

pub fn pwm<B: Board + ?Sized>(board: &mut B, pin: i64, value: i64) -> ConsoleResult<String> {
    let pin = allowed_pin(pin, &board.profile().pwm_allow_list(), "PWM")?;
    let value = in_range(value, "Value", 0, 255)? as u8;
    board.pwm_write(pin, value);
    Ok(format!("PWM pin {} set to {}", pin, value))
}

pub fn tone<B: Board + ?Sized>(board: &mut B, pin: i64, freq: i64) -> ConsoleResult<String> {
    let pin = unreserved_pin(board.profile(), pin)?;
    let freq = in_range(freq, "Frequency", TONE_MIN_HZ, TONE_MAX_HZ)? as u16;
    board.tone(pin, freq);
    Ok(format!("Playing {} Hz on pin {}", freq, pin))
}

pub fn no_tone<B: Board + ?Sized>(board: &mut B, pin: i64) -> ConsoleResult<String> {
    let pin = unreserved_pin(board.profile(), pin)?;
    board.no_tone(pin);
    Ok(format!("Tone stopped on pin {}", pin))
}

/// Drive an output pin; 0 is LOW, any other value HIGH.
pub fn gpio_write<B: Board + ?Sized>(board: &mut B, pin: i64, value: i64) -> ConsoleResult<String> {
    let pin = allowed_pin(pin, &board.profile().gpio_allow_list(), "GPIO")?;
    let high = value != 0;
    board.digital_write(pin, high);
    Ok(format!(
        "{} set to {}",
        board.profile().pin_label(pin),
        level_name(high)
    ))
}

/// Read one output pin, enforcing the same allow-list as writes.
pub fn gpio_read<B: Board + ?Sized>(board: &mut B, pin: i64) -> ConsoleResult<bool> {
    let pin = allowed_pin(pin, &board.profile().gpio_allow_list(), "GPIO")?;
    Ok(board.digital_read(pin))
}
