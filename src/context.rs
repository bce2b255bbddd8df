//! Shared mutable context threaded through every control component.
//!
//! `ControlContext` is the single aggregate that the safety, setpoint,
//! ESD and classification steps read from and write to.  It is owned by
//! the [`ControlLoop`](crate::app::service::ControlLoop) and lent out by
//! `&mut` for the duration of one tick; no component keeps its own copy
//! of these fields.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::esd::{EsdCorrection, EsdState};
use crate::flow::FlowReading;
use crate::process::ProcessState;
use crate::status::SystemStatus;

// ---------------------------------------------------------------------------
// Control mode
// ---------------------------------------------------------------------------

/// Which channel the rotary encoder adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Encoder drives the modulating valve.
    #[default]
    Pressure,
    /// Encoder drives the superheater.
    Temperature,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Pressure => Self::Temperature,
            Self::Temperature => Self::Pressure,
        }
    }

    /// Label used on the telemetry line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pressure => "PRESION",
            Self::Temperature => "TEMPERATURA",
        }
    }
}

// ---------------------------------------------------------------------------
// Override latches
// ---------------------------------------------------------------------------

/// Hysteresis latches owned by the safety override step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverrideLatches {
    /// Low-pressure recovery: valve forced closed.
    pub pressure_recovery: bool,
    /// Low-temperature preheat: heater forced to full power.
    pub preheat: bool,
}

impl OverrideLatches {
    pub fn any(self) -> bool {
        self.pressure_recovery || self.preheat
    }
}

// ---------------------------------------------------------------------------
// Per-tick outputs
// ---------------------------------------------------------------------------

/// Boolean and colour commands computed each tick.  The channel
/// percentages live in [`ProcessState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorCommands {
    pub relief_open: bool,
    pub purge_open: bool,
    pub flow_indicator: bool,
    pub laser: bool,
    /// Status LED colour (R, G, B), each 0..=255.
    pub status_rgb: (u8, u8, u8),
}

/// Everything a tick produces for the actuator and telemetry steps.
/// Reset to explicit defaults at the start of every tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickOutputs {
    pub commands: ActuatorCommands,
    pub flow: FlowReading,
    pub status: SystemStatus,
    /// Corrections applied by the ESD control law this tick, if it ran.
    pub esd_correction: Option<EsdCorrection>,
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

pub struct ControlContext {
    // -- Timing --
    /// The single time sample for this tick (ms since the loop's epoch).
    pub now_ms: u64,
    /// Scaled elapsed time since the previous tick (seconds).
    pub dt_secs: f32,

    // -- Persistent state --
    pub process: ProcessState,
    pub mode: Mode,
    pub overrides: OverrideLatches,
    pub esd: EsdState,

    // -- Per-tick outputs --
    pub outputs: TickOutputs,

    // -- Configuration --
    pub config: SystemConfig,
}

impl ControlContext {
    /// Fresh context at nominal values, pressure mode, no overrides, ESD running.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            dt_secs: 0.0,
            process: ProcessState::nominal(&config),
            mode: Mode::Pressure,
            overrides: OverrideLatches::default(),
            esd: EsdState::Running,
            outputs: TickOutputs::default(),
            config,
        }
    }

    /// Begin a tick: latch the time sample and reset every per-tick output.
    pub fn begin_tick(&mut self, now_ms: u64, dt_secs: f32) {
        self.now_ms = now_ms;
        self.dt_secs = dt_secs;
        self.outputs = TickOutputs::default();
    }

    /// True while the ESD owns both channels.
    pub fn esd_engaged(&self) -> bool {
        self.esd != EsdState::Running
    }
}
