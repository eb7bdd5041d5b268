//! The command dispatcher.
//!
//! [`Console`] owns the board handle, the per-channel line accumulator, the
//! board's command table and the output router. Ambient channels feed raw
//! bytes through [`Console::feed`]; each completed line is parsed once,
//! dispatched once, and answered on the selected ambient channel followed by
//! the prompt. The request/response path, [`Console::execute_request`], returns
//! the bare text instead and leaves the ambient selection alone.

use std::time::Instant;

use mcucon_board::{Board, Frame, NetworkInfo, WifiStatus};
use mcucon_metrics::{metric_defs, ConsoleLabels};
use mcucon_protocol::{unknown_command, ChannelId, Command, LineAccumulator, LineEvent, Verb};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::handlers::{bus, camera, pins, storage, system, wireless};
use crate::registry::CommandTable;
use crate::router::{OutputRouter, OutputSink};

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Rendered text with `\n` line endings.
    pub text: String,
    /// The operator asked for a reboot, to be performed after `text` is sent.
    pub restart: bool,
}

impl Reply {
    fn text(text: String) -> Self {
        Reply {
            text,
            restart: false,
        }
    }
}

/// Board state served by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub board: &'static str,
    pub uptime_ms: u64,
    pub uptime: String,
    pub free_heap: u32,
    pub chip: String,
    pub camera: mcucon_board::CameraStatus,
    pub wifi: WifiStatus,
    pub bluetooth: mcucon_board::BluetoothStatus,
    pub active_channel: ChannelId,
}

/// A command console bound to one board.
pub struct Console<B: Board> {
    board: B,
    config: ConsoleConfig,
    table: CommandTable,
    lines: LineAccumulator,
    router: OutputRouter,
    /// A reboot happened and the boot banner has not gone out yet.
    greet_pending: bool,
}

impl<B: Board> Console<B> {
    /// Create a console with the board's full command table.
    pub fn new(board: B, config: ConsoleConfig) -> Self {
        let table = CommandTable::for_profile(board.profile());
        let lines = LineAccumulator::with_max_len(config.max_line_length);
        Console {
            board,
            config,
            table,
            lines,
            router: OutputRouter::new(),
            greet_pending: false,
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// The ambient channel currently receiving output.
    pub fn active_channel(&self) -> ChannelId {
        self.router.active()
    }

    fn board_label(&self) -> &'static str {
        self.board.profile().kind.as_str()
    }

    /// Write the boot banner and first prompt to the active channel.
    pub fn greet<S: OutputSink + ?Sized>(&self, sink: &mut S) {
        let profile = self.board.profile();
        let banner = format!(
            "{} command console ready\n{}",
            profile.name,
            mcucon_protocol::HELP_HINT
        );
        self.router.emit(sink, &banner);
        self.router.prompt(sink);
    }

    /// Greet the active channel if a reboot has not been announced yet.
    ///
    /// Returns whether a banner was written.
    pub fn flush_greeting<S: OutputSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if !self.greet_pending {
            return false;
        }
        self.greet_pending = false;
        self.greet(sink);
        true
    }

    // ========================================================================
    // Ambient Path
    // ========================================================================

    /// Feed bytes received on `channel`, answering every completed line.
    ///
    /// Returns the number of lines processed.
    pub fn feed<S: OutputSink + ?Sized>(
        &mut self,
        channel: ChannelId,
        bytes: &[u8],
        sink: &mut S,
    ) -> usize {
        let mut processed = 0;
        for &byte in bytes {
            if let Some(event) = self.lines.feed(channel, byte) {
                processed += 1;
                self.process_event(channel, event, sink);
            }
        }
        processed
    }

    fn process_event<S: OutputSink + ?Sized>(
        &mut self,
        channel: ChannelId,
        event: LineEvent,
        sink: &mut S,
    ) {
        if !channel.is_ambient() {
            let text = match event {
                LineEvent::Line(line) => self.execute_request(&line),
                LineEvent::Overflow { max } => ConsoleError::LineTooLong { max }.to_string(),
            };
            sink.write_channel(channel, &text);
            return;
        }

        if self.router.heard_from(channel) {
            metrics::gauge!(metric_defs::ACTIVE_CHANNEL.name, "board" => self.board_label())
                .set(channel_index(channel));
        }

        let reply = match event {
            LineEvent::Line(line) => self.execute(channel, &line),
            LineEvent::Overflow { max } => {
                let labels = ConsoleLabels::new(self.board_label(), channel.as_str());
                metrics::counter!(metric_defs::LINE_OVERFLOW.name, &labels.to_labels())
                    .increment(1);
                Reply::text(ConsoleError::LineTooLong { max }.to_string())
            }
        };

        self.router.emit(sink, &reply.text);
        if reply.restart {
            self.reboot();
            self.flush_greeting(sink);
        } else {
            self.router.prompt(sink);
        }
    }

    /// Reboot the board and forget per-boot console state. The banner is
    /// left pending for [`flush_greeting`](Self::flush_greeting).
    fn reboot(&mut self) {
        info!("Restart requested");
        self.board.restart();
        self.router.reset();
        for channel in ChannelId::AMBIENT {
            self.lines.clear(channel);
        }
        self.greet_pending = true;
    }

    // ========================================================================
    // Request/Response Path
    // ========================================================================

    /// Run one command line and return its bare output.
    ///
    /// The ambient channel selection is neither read nor changed, except that
    /// a restart resets it and queues the boot banner for the ambient side.
    pub fn execute_request(&mut self, line: &str) -> String {
        let trimmed = line.trim();
        if trimmed.len() > self.config.max_line_length {
            return ConsoleError::LineTooLong {
                max: self.config.max_line_length,
            }
            .to_string();
        }
        let reply = self.execute(ChannelId::Web, trimmed);
        if reply.restart {
            self.reboot();
        }
        reply.text
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Parse and dispatch one line without emitting anything.
    pub fn execute(&mut self, channel: ChannelId, line: &str) -> Reply {
        let command = Command::parse(line);
        let labels = ConsoleLabels::new(self.board_label(), channel.as_str());

        let verb = match command.verb() {
            Some(verb) if self.table.supports(verb) => verb,
            _ => {
                debug!("[{}] unknown command: {:?}", channel, line.trim());
                metrics::counter!(metric_defs::UNKNOWN.name, &labels.to_labels()).increment(1);
                return Reply::text(unknown_command(line.trim()));
            }
        };

        debug!("[{}] dispatch {:?}", channel, command);
        let started = Instant::now();
        let result = self.dispatch(&command);
        let verb_label = [("verb", verb.as_str().to_string())];
        metrics::histogram!(metric_defs::DISPATCH_TIME.name, &labels.with(&verb_label))
            .record(started.elapsed().as_secs_f64() * 1e6);
        metrics::counter!(metric_defs::COMMANDS.name, &labels.with(&verb_label)).increment(1);

        match result {
            Ok(reply) => reply,
            Err(err) => {
                debug!("[{}] {} rejected: {}", channel, verb, err);
                metrics::counter!(
                    metric_defs::REJECTED.name,
                    &labels.with(&[("reason", err.reason().to_string())])
                )
                .increment(1);
                Reply::text(err.to_string())
            }
        }
    }

    fn dispatch(&mut self, command: &Command) -> ConsoleResult<Reply> {
        let board = &mut self.board;
        let config = &self.config;
        let text = match command {
            Command::Help => self.table.help_text(config.blink_count),
            Command::Status => system::status(board, self.router.active()),
            Command::Info => system::info(board),
            Command::Memory => system::memory(board),
            Command::Uptime => system::uptime(board),
            Command::Restart => {
                return Ok(Reply {
                    text: system::RESTARTING.to_string(),
                    restart: true,
                })
            }
            Command::LedOn => pins::led_set(board, true),
            Command::LedOff => pins::led_set(board, false),
            Command::LedState => pins::led_state(board),
            Command::Blink => pins::blink(board, config),
            Command::Pins => pins::pins(board),
            Command::Analog => pins::analog(board),
            Command::Temp => pins::temp(board),
            Command::Pwm { pin, value } => pins::pwm(board, *pin, *value)?,
            Command::Tone { pin, freq } => pins::tone(board, *pin, *freq)?,
            Command::NoTone { pin } => pins::no_tone(board, *pin)?,
            Command::GpioWrite { pin, value } => pins::gpio_write(board, *pin, *value)?,
            Command::EepromRead { addr } => storage::read(board, *addr)?,
            Command::EepromWrite { addr, value } => storage::write(board, *addr, *value)?,
            Command::Scan => bus::scan(board),
            Command::Wifi => wireless::wifi_status(board)?,
            Command::WifiScan => wireless::wifi_scan(board)?,
            Command::WifiConnect { ssid, password } => {
                wireless::wifi_connect(board, config, ssid, password.as_deref())?
            }
            Command::Camera => camera::status(board)?,
            Command::Capture => camera::capture(board)?,
            Command::Bluetooth => wireless::bluetooth(board),
            Command::Usage(usage) => return Err(ConsoleError::Usage(*usage)),
            Command::Unknown(text) => unknown_command(text),
        };
        Ok(Reply::text(text))
    }

    // ========================================================================
    // Structured Access (HTTP)
    // ========================================================================

    /// Board state for the status endpoint.
    pub fn status_snapshot(&self) -> StatusSnapshot {
        let millis = self.board.millis();
        let chip = self.board.chip();
        StatusSnapshot {
            board: self.board.profile().name,
            uptime_ms: millis,
            uptime: mcucon_protocol::format_uptime(millis),
            free_heap: self.board.memory().free,
            chip: chip.model,
            camera: self.board.camera_status(),
            wifi: self.board.wifi_status(),
            bluetooth: self.board.bluetooth_status(),
            active_channel: self.router.active(),
        }
    }

    /// Grab one camera frame.
    pub fn capture_frame(&mut self) -> ConsoleResult<Frame> {
        self.require(Verb::Capture)?;
        camera::grab(&mut self.board)
    }

    /// Read an allow-listed GPIO pin.
    pub fn gpio_read(&mut self, pin: i64) -> ConsoleResult<bool> {
        pins::gpio_read(&mut self.board, pin)
    }

    /// Drive an allow-listed GPIO pin.
    pub fn gpio_write(&mut self, pin: i64, value: i64) -> ConsoleResult<String> {
        pins::gpio_write(&mut self.board, pin, value)
    }

    /// Scan for networks.
    pub fn wifi_networks(&mut self) -> ConsoleResult<Vec<NetworkInfo>> {
        self.require(Verb::Wifi)?;
        Ok(self.board.wifi_scan()?)
    }

    /// Associate with a network using the bounded poll loop.
    pub fn wifi_connect(&mut self, ssid: &str, password: Option<&str>) -> ConsoleResult<WifiStatus> {
        self.require(Verb::Wifi)?;
        wireless::associate(&mut self.board, &self.config, ssid, password)
    }

    fn require(&self, verb: Verb) -> ConsoleResult<()> {
        if self.table.supports(verb) {
            Ok(())
        } else {
            Err(ConsoleError::Unavailable(match verb {
                Verb::Camera | Verb::Capture => "Camera not available on this board",
                Verb::Wifi => "WiFi not available on this board",
                _ => "Not available on this board",
            }))
        }
    }
}

/// Gauge value for the active channel.
fn channel_index(channel: ChannelId) -> f64 {
    match channel {
        ChannelId::Serial => 0.0,
        ChannelId::Bluetooth => 1.0,
        ChannelId::Web => 2.0,
    }
}
