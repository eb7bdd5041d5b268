//! Camera status and single-frame capture.

use mcucon_board::{Board, BoardError, Frame};

use crate::error::{ConsoleError, ConsoleResult};

pub const CAMERA_NOT_INITIALIZED: &str = "Camera not initialized";

fn require_camera<B: Board + ?Sized>(board: &B) -> ConsoleResult<()> {
    if board.camera_status().initialized {
        Ok(())
    } else {
        Err(ConsoleError::Unavailable(CAMERA_NOT_INITIALIZED))
    }
}

pub fn status<B: Board + ?Sized>(board: &B) -> ConsoleResult<String> {
    require_camera(board)?;
    let cam = board.camera_status();
    Ok(format!(
        "Camera: {}\nResolution: {}x{}\nQuality: {}",
        cam.sensor, cam.width, cam.height, cam.quality
    ))
}

/// Grab one frame, or fail without side effects if the sensor is down.
pub fn grab<B: Board + ?Sized>(board: &mut B) -> ConsoleResult<Frame> {
    require_camera(board)?;
    let frame = board.camera_capture()?;
    if frame.is_empty() {
        return Err(ConsoleError::Board(BoardError::CaptureFailed));
    }
    Ok(frame)
}

pub fn capture<B: Board + ?Sized>(board: &mut B) -> ConsoleResult<String> {
    let frame = grab(board)?;
    Ok(format!(
        "Captured {}x{} frame ({} bytes)",
        frame.width,
        frame.height,
        frame.len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcucon_board::{BoardKind, SimulatedBoard, SimulatedBoardConfig};

    #[test]
    fn test_capture() {
        let mut board = SimulatedBoard::new(BoardKind::Esp32Cam, SimulatedBoardConfig::default());
        assert_eq!(capture(&mut board).unwrap(), "Captured 800x600 frame (4102 bytes)");
        assert!(status(&board).unwrap().starts_with("Camera: OV2640"));
    }

    #[test]
    fn test_uninitialized_camera_is_single_error() {
        let mut config = SimulatedBoardConfig::default();
        config.camera.present = false;
        let mut board = SimulatedBoard::new(BoardKind::Esp32Cam, config);
        assert_eq!(
            capture(&mut board),
            Err(ConsoleError::Unavailable(CAMERA_NOT_INITIALIZED))
        );
        assert_eq!(board.frames_captured(), 0);
    }
}
