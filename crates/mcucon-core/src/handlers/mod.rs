//! Peripheral handlers, one module per command family.
//!
//! A handler validates every argument before its first hardware call, so a
//! rejected command never leaves the board partially changed. Each returns
//! the rendered response text or the error to show instead.

pub mod bus;
pub mod camera;
pub mod pins;
pub mod storage;
pub mod system;
pub mod wireless;

use mcucon_board::BoardProfile;

use crate::error::{ConsoleError, ConsoleResult};

/// Render an allow-list for an error message.
fn join_pins(pins: &[u8]) -> String {
    pins.iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accept `pin` only if it is in `allowed`.
fn allowed_pin(pin: i64, allowed: &[u8], family: &'static str) -> ConsoleResult<u8> {
    allowed
        .iter()
        .copied()
        .find(|&p| i64::from(p) == pin)
        .ok_or_else(|| ConsoleError::PinNotAllowed {
            family,
            allowed: join_pins(allowed),
        })
}

/// Accept any addressable pin that no transport occupies.
fn unreserved_pin(profile: &BoardProfile, pin: i64) -> ConsoleResult<u8> {
    let pin = u8::try_from(pin).map_err(|_| ConsoleError::OutOfRange {
        what: "Pin",
        min: 0,
        max: i64::from(u8::MAX),
    })?;
    match profile.reservation(pin) {
        Some(reserved) => Err(ConsoleError::ReservedPin {
            pin,
            purpose: reserved.purpose,
        }),
        None => Ok(pin),
    }
}

/// Require `value` to lie in `[min, max]`.
fn in_range(value: i64, what: &'static str, min: i64, max: i64) -> ConsoleResult<i64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConsoleError::OutOfRange { what, min, max })
    }
}

fn level_name(high: bool) -> &'static str {
    if high {
        "HIGH"
    } else {
        "LOW"
    }
}
