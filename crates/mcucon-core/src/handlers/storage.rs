//! Byte-addressed non-volatile store.

use mcucon_board::Board;

use super::in_range;
use crate::error::{ConsoleError, ConsoleResult};

/// Bounds-check an address against the board's store capacity.
fn address<B: Board + ?Sized>(board: &B, addr: i64) -> ConsoleResult<usize> {
    let size = board.profile().eeprom_size;
    usize::try_from(addr)
        .ok()
        .filter(|&a| a < size)
        .ok_or(ConsoleError::AddressOutOfRange {
            max: size.saturating_sub(1),
        })
}

pub fn read<B: Board + ?Sized>(board: &mut B, addr: i64) -> ConsoleResult<String> {
    let addr = address(board, addr)?;
    let value = board.eeprom_read(addr)?;
    Ok(format!("EEPROM[{}] = {}", addr, value))
}

/// Write one byte, committing on boards whose store needs it.
pub fn write<B: Board + ?Sized>(board: &mut B, addr: i64, value: i64) -> ConsoleResult<String> {
    let addr = address(board, addr)?;
    let value = in_range(value, "Value", 0, 255)? as u8;
    board.eeprom_write(addr, value)?;
    if board.profile().eeprom_needs_commit {
        board.eeprom_commit()?;
    }
    Ok(format!("EEPROM[{}] <- {}", addr, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcucon_board::{BoardKind, SimulatedBoard, SimulatedBoardConfig};

    #[test]
    fn test_bounds_are_checked_before_storage() {
        let mut board = SimulatedBoard::new(BoardKind::Uno, SimulatedBoardConfig::default());
        assert_eq!(
            write(&mut board, 1024, 1),
            Err(ConsoleError::AddressOutOfRange { max: 1023 })
        );
        assert!(read(&mut board, -1).is_err());
        assert_eq!(board.hardware_writes(), 0);
    }

    #[test]
    fn test_value_checked_after_address() {
        let mut board = SimulatedBoard::new(BoardKind::Uno, SimulatedBoardConfig::default());
        assert!(matches!(
            write(&mut board, 5000, 999),
            Err(ConsoleError::AddressOutOfRange { .. })
        ));
        assert!(matches!(
            write(&mut board, 5, 999),
            Err(ConsoleError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_commit_only_where_needed() {
        let mut uno = SimulatedBoard::new(BoardKind::Uno, SimulatedBoardConfig::default());
        write(&mut uno, 1, 2).unwrap();
        assert_eq!(uno.eeprom_commits(), 0);

        let mut cam = SimulatedBoard::new(BoardKind::Esp32Cam, SimulatedBoardConfig::default());
        assert_eq!(write(&mut cam, 511, 7).unwrap(), "EEPROM[511] <- 7");
        assert_eq!(cam.eeprom_commits(), 1);
        cam.restart();
        assert_eq!(read(&mut cam, 511).unwrap(), "EEPROM[511] = 7");
    }
}
