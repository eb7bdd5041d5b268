//! I2C bus scan.

use std::ops::Range;

use mcucon_board::{Board, ProbeResult};
use mcucon_protocol::format_i2c_address;

/// Addresses swept by `scan`; reserved addresses at both ends are skipped.
pub const SCAN_RANGE: Range<u8> = 0x03..0x77;

pub fn scan<B: Board + ?Sized>(board: &mut B) -> String {
    let mut lines = vec!["Scanning I2C bus...".to_string()];
    let mut found = 0usize;

    for addr in SCAN_RANGE {
        match board.i2c_probe(addr) {
            ProbeResult::Ack => {
                found += 1;
                lines.push(format!("I2C device found at address {}", format_i2c_address(addr)));
            }
            ProbeResult::Error => {
                lines.push(format!("Unknown error at address {}", format_i2c_address(addr)));
            }
            ProbeResult::Nack => {}
        }
    }

    if found == 0 {
        lines.push("No I2C devices found".to_string());
    } else {
        lines.push(format!("Found {} device(s)", found));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcucon_board::{BoardKind, SimulatedBoard, SimulatedBoardConfig};

    #[test]
    fn test_scan_reports_devices() {
        let config = SimulatedBoardConfig {
            i2c_devices: vec![0x3C, 0x68],
            ..Default::default()
        };
        let mut board = SimulatedBoard::new(BoardKind::Uno, config);
        let text = scan(&mut board);
        assert!(text.contains("I2C device found at address 0x3C"));
        assert!(text.contains("I2C device found at address 0x68"));
        assert!(text.ends_with("Found 2 device(s)"));
    }

    #[test]
    fn test_scan_range_edges() {
        // 0x02 and 0x77 are outside the sweep
        let config = SimulatedBoardConfig {
            i2c_devices: vec![0x02, 0x03, 0x76, 0x77],
            ..Default::default()
        };
        let mut board = SimulatedBoard::new(BoardKind::Uno, config);
        let text = scan(&mut board);
        assert!(text.contains("0x03"));
        assert!(text.contains("0x76"));
        assert!(!text.contains("0x77"));
        assert!(text.ends_with("Found 2 device(s)"));
    }

    #[test]
    fn test_empty_bus() {
        let mut board = SimulatedBoard::new(BoardKind::Uno, SimulatedBoardConfig::default());
        let text = scan(&mut board);
        assert!(text.ends_with("No I2C devices found"));
        assert!(!text.contains("Found 0"));
    }

    #[test]
    fn test_bus_fault_is_not_counted() {
        let config = SimulatedBoardConfig {
            i2c_faults: vec![0x50],
            ..Default::default()
        };
        let mut board = SimulatedBoard::new(BoardKind::Uno, config);
        let text = scan(&mut board);
        assert!(text.contains("Unknown error at address 0x50"));
        assert!(text.ends_with("No I2C devices found"));
    }
}
