//! Metrics declarations for the board command console.
//!
//! Every metric the console records is declared once here as a [`Metric`]
//! constant carrying its name, kind, unit and label keys, so call sites never
//! spell metric names by hand. The `metrics` crate is re-exported for
//! convenience.
//!
//! # Example
//!
//! ```rust
//! use mcucon_metrics::{metric_defs, ConsoleLabels};
//!
//! let labels = ConsoleLabels::new("uno", "serial");
//! metrics::counter!(
//!     metric_defs::COMMANDS.name,
//!     &labels.with(&[("verb", "pwm".to_string())])
//! )
//! .increment(1);
//! ```
//!
//! # Metric Type
//!
//! ```rust
//! use mcucon_metrics::{Metric, MetricKind};
//! use metrics::Unit;
//!
//! const MY_COUNTER: Metric = Metric::counter("my.counter")
//!     .with_description("A counter metric")
//!     .with_unit(Unit::Count)
//!     .with_labels(&["board", "channel"]);
//!
//! assert_eq!(MY_COUNTER.kind, MetricKind::Counter);
//! MY_COUNTER.describe();
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// Counter, gauge or histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// One declared metric.
///
/// All builders are `const fn`, so declarations are plain `const` items.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted name, e.g. `mcucon.console.commands`.
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Label keys callers are expected to attach.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Label keys, in the order call sites pass them.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Hand the description and unit to the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the console.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Standard Label Keys
    // ========================================================================

    /// Labels present on every console metric.
    pub const STANDARD_LABELS: &[&str] = &["board", "channel"];

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Lines dispatched to a handler.
    ///
    /// Labels: board, channel, verb
    pub const COMMANDS: Metric = Metric::counter("mcucon.console.commands")
        .with_description("Command lines dispatched to a handler")
        .with_unit(Unit::Count)
        .with_labels(&["board", "channel", "verb"]);

    /// Commands refused before touching hardware.
    ///
    /// Labels: board, channel, reason
    pub const REJECTED: Metric = Metric::counter("mcucon.console.rejected")
        .with_description("Commands rejected by validation or an unavailable resource")
        .with_unit(Unit::Count)
        .with_labels(&["board", "channel", "reason"]);

    /// Lines that matched no grammar phrase.
    pub const UNKNOWN: Metric = Metric::counter("mcucon.console.unknown")
        .with_description("Lines that matched no command")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Lines discarded for exceeding the line bound.
    pub const LINE_OVERFLOW: Metric = Metric::counter("mcucon.console.line_overflow")
        .with_description("Input lines discarded for exceeding the length bound")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Time spent inside a handler.
    pub const DISPATCH_TIME: Metric = Metric::histogram("mcucon.console.dispatch_time_us")
        .with_description("Wall time spent dispatching one command")
        .with_unit(Unit::Microseconds)
        .with_labels(&["board", "channel", "verb"]);

    /// Which ambient channel currently receives output (0 serial, 1 bluetooth).
    pub const ACTIVE_CHANNEL: Metric = Metric::gauge("mcucon.console.active_channel")
        .with_description("Ambient channel selected for output (0 serial, 1 bluetooth)")
        .with_labels(&["board"]);

    // ========================================================================
    // Camera Stream
    // ========================================================================

    /// Frames delivered to stream consumers.
    pub const STREAM_FRAMES: Metric = Metric::counter("mcucon.stream.frames")
        .with_description("Frames delivered by camera streams")
        .with_unit(Unit::Count)
        .with_labels(&["board"]);

    /// Encoded frame size.
    pub const STREAM_FRAME_SIZE: Metric = Metric::histogram("mcucon.stream.frame_size_bytes")
        .with_description("Encoded size of streamed frames")
        .with_unit(Unit::Bytes)
        .with_labels(&["board"]);

    /// Streams that ended on a frame fetch failure.
    pub const STREAM_DEGRADED: Metric = Metric::counter("mcucon.stream.degraded")
        .with_description("Camera streams stopped by a frame fetch failure")
        .with_unit(Unit::Count)
        .with_labels(&["board"]);

    // ========================================================================
    // Transports
    // ========================================================================

    /// Bytes received per ambient channel.
    pub const CHANNEL_RX_BYTES: Metric = Metric::counter("mcucon.channel.rx_bytes")
        .with_description("Bytes received on an ambient channel")
        .with_unit(Unit::Bytes)
        .with_labels(STANDARD_LABELS);

    /// Connected clients per ambient channel.
    pub const CHANNEL_CLIENTS: Metric = Metric::gauge("mcucon.channel.clients")
        .with_description("Clients attached to an ambient channel")
        .with_unit(Unit::Count)
        .with_labels(STANDARD_LABELS);

    /// Every metric, for [`describe_metrics`](crate::describe_metrics).
    pub const ALL: &[&Metric] = &[
        &COMMANDS,
        &REJECTED,
        &UNKNOWN,
        &LINE_OVERFLOW,
        &DISPATCH_TIME,
        &ACTIVE_CHANNEL,
        &STREAM_FRAMES,
        &STREAM_FRAME_SIZE,
        &STREAM_DEGRADED,
        &CHANNEL_RX_BYTES,
        &CHANNEL_CLIENTS,
    ];
}

/// Labels identifying the board and channel a metric belongs to.
///
/// # Example
///
/// ```rust
/// use mcucon_metrics::ConsoleLabels;
///
/// let labels = ConsoleLabels::new("esp32-cam", "web");
/// let extended = labels.with(&[("verb", "capture".to_string())]);
/// assert_eq!(extended.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLabels {
    /// Board variant name.
    pub board: String,
    /// Channel name.
    pub channel: String,
}

impl ConsoleLabels {
    pub fn new(board: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            channel: channel.into(),
        }
    }

    /// `(key, value)` pairs for the `metrics` macros.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("board", self.board.clone()),
            ("channel", self.channel.clone()),
        ]
    }

    /// The standard pairs followed by `extra`.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describe every console metric. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Install a Prometheus recorder scraped at `addr`.
///
/// The exporter's HTTP listener is spawned on the current tokio runtime.
#[cfg(feature = "prometheus")]
pub fn install_prometheus(
    addr: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
}
