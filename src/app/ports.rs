//! Port traits: the hexagonal boundary between control logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (operator panel, actuators, telemetry link, event
//! sinks, config storage) implement these traits.  The
//! [`ControlLoop`](super::service::ControlLoop) consumes them via
//! generics, so the control core never touches hardware directly.  The
//! simulated panel and the `embedded-hal` panel are interchangeable
//! implementations chosen at construction time.
//!
//! ## Safety notes
//!
//! - **ActuatorPort** writes report failure; the loop treats a failed
//!   write while running as an ESD trip.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::config::SystemConfig;
use crate::drivers::button::PinLevel;
use crate::error::{ActuatorError, InputError, TelemetryError};
use crate::telemetry::TelemetryRecord;

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: operator panel → domain)
// ───────────────────────────────────────────────────────────────

/// One raw sample of the operator panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSample {
    /// Absolute quadrature count; the loop differentiates it per tick.
    pub encoder_position: i32,
    /// Encoder push-button (mode toggle), active-low.
    pub mode_button: PinLevel,
    /// Emergency-stop button, active-low.
    pub esd_button: PinLevel,
}

impl InputSample {
    /// Both buttons released, encoder at zero.
    pub const IDLE: Self = Self {
        encoder_position: 0,
        mode_button: PinLevel::High,
        esd_button: PinLevel::High,
    };
}

/// Read-side port: the domain calls this once per tick.
pub trait InputPort {
    /// Sample every input.  An error makes the loop hold the previous
    /// sample for this tick.
    fn sample(&mut self) -> Result<InputSample, InputError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
/// Percentages arrive already clamped to `[0, 100]`.
pub trait ActuatorPort {
    /// Modulating valve opening (%).
    fn set_valve(&mut self, percent: f32) -> Result<(), ActuatorError>;

    /// Superheater power (%).
    fn set_heater(&mut self, percent: f32) -> Result<(), ActuatorError>;

    /// Pressure-relief valve.
    fn set_relief(&mut self, open: bool) -> Result<(), ActuatorError>;

    /// Purge system.
    fn set_purge(&mut self, open: bool) -> Result<(), ActuatorError>;

    /// Flow-regime indicator.
    fn set_flow_indicator(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Laser / alert indicator.
    fn set_laser(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// RGB status indicator.
    fn set_status_colour(&mut self, r: u8, g: u8, b: u8) -> Result<(), ActuatorError>;

    /// Drive every output to its safe idle level (channels 0 %, outputs
    /// off, indicator dark).
    fn all_off(&mut self) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink port (driven adapter: domain → serial link)
// ───────────────────────────────────────────────────────────────

/// Accepts telemetry records.  Implementations must not block.
pub trait TelemetrySink {
    /// One encoded line, without terminator.  The sink appends the newline.
    fn send_line(&mut self, line: &str) -> Result<(), TelemetryError>;

    /// Publish a record.  The default encodes it in the line grammar;
    /// structured sinks override this.
    fn publish(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        let line = record.encode()?;
        self.send_line(&line)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  The loop samples it exactly once per tick.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

impl<T: ClockPort + ?Sized> ClockPort for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting and
/// after loading.  Invalid ranges are rejected with
/// [`ConfigError::ValidationFailed`], never silently clamped: a trip
/// limit below nominal would leave the plant permanently in ESD.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
