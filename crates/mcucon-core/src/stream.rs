//! Camera frame streaming.
//!
//! A [`FrameStream`] is a long-lived producer kept apart from per-line
//! dispatch. It pulls one frame at a time from the console and stops when the
//! consumer goes away or a frame cannot be fetched. Its state is only
//! meaningful at the edges: `Ready` when started, `Degraded` if it ended on a
//! fetch failure.

use mcucon_board::{Board, Frame};
use mcucon_metrics::metric_defs;
use tracing::{debug, warn};

use crate::console::Console;
use crate::error::ConsoleError;

/// Multipart boundary used by the stream endpoint.
pub const STREAM_BOUNDARY: &str = "frame";

/// Content type of a multipart frame stream.
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

/// Health reported by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Ready,
    Degraded,
}

/// Why a stream stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEnd {
    /// The consumer went away.
    Disconnected,
    /// A frame fetch failed.
    Failed(ConsoleError),
}

/// Producer of consecutive camera frames.
#[derive(Debug)]
pub struct FrameStream {
    board: &'static str,
    state: StreamState,
    frames: u64,
}

impl FrameStream {
    /// Start a stream for `console`'s board.
    pub fn start<B: Board>(console: &Console<B>) -> Self {
        let board = console.board().profile().kind.as_str();
        debug!("Frame stream started on {}", board);
        FrameStream {
            board,
            state: StreamState::Ready,
            frames: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Fetch the next frame. A failure degrades the stream.
    pub fn next_frame<B: Board>(&mut self, console: &mut Console<B>) -> Result<Frame, ConsoleError> {
        match console.capture_frame() {
            Ok(frame) => {
                self.frames += 1;
                metrics::counter!(metric_defs::STREAM_FRAMES.name, "board" => self.board)
                    .increment(1);
                metrics::histogram!(metric_defs::STREAM_FRAME_SIZE.name, "board" => self.board)
                    .record(frame.len() as f64);
                Ok(frame)
            }
            Err(err) => {
                warn!("Frame stream degraded after {} frame(s): {}", self.frames, err);
                self.state = StreamState::Degraded;
                metrics::counter!(metric_defs::STREAM_DEGRADED.name, "board" => self.board)
                    .increment(1);
                Err(err)
            }
        }
    }

    /// Run synchronously, handing each frame to `deliver` until it returns
    /// false (consumer gone) or a fetch fails.
    pub fn run<B, F>(&mut self, console: &mut Console<B>, mut deliver: F) -> StreamEnd
    where
        B: Board,
        F: FnMut(&Frame) -> bool,
    {
        loop {
            let frame = match self.next_frame(console) {
                Ok(frame) => frame,
                Err(err) => return StreamEnd::Failed(err),
            };
            if !deliver(&frame) {
                debug!("Frame stream consumer disconnected after {} frame(s)", self.frames);
                return StreamEnd::Disconnected;
            }
        }
    }
}

/// Encode one frame as a multipart part.
pub fn encode_part(frame: &Frame) -> Vec<u8> {
    let header = format!(
        "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        STREAM_BOUNDARY,
        frame.len()
    );
    let mut part = Vec::with_capacity(header.len() + frame.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(&frame.data);
    part.extend_from_slice(b"\r\n");
    part
}
