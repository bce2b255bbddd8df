//! Telemetry record and line encoder.
//!
//! Wire format, one ASCII record per line:
//!
//! ```text
//! P:<f1>,T:<f1>,MV:<f1>,SH:<f1>,F:<A|B|None>,M:<PRESION|TEMPERATURA>,
//! ESD:<Activado|Desactivado>,ESTADO:<status>,RELIEF:<Si|No>,PURGE:<Si|No>
//! ```
//!
//! (Shown wrapped; the record is a single line.)  The encoder writes into
//! a fixed-capacity buffer and never allocates; the sink appends the
//! newline.

use core::fmt::Write;

use serde::Serialize;

use crate::context::{ControlContext, Mode};
use crate::error::TelemetryError;
use crate::flow::FlowRegime;

/// Encoded-line capacity.  The longest status label with 7-digit
/// readings still fits.
pub const LINE_CAPACITY: usize = 192;

pub type TelemetryLine = heapless::String<LINE_CAPACITY>;

/// Immutable snapshot of one tick, taken after the actuator step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub pressure: f32,
    pub temperature: f32,
    pub valve_percent: f32,
    pub heater_percent: f32,
    pub flow: FlowRegime,
    pub mode: Mode,
    pub esd_active: bool,
    pub status: &'static str,
    pub relief: bool,
    pub purge: bool,
}

impl TelemetryRecord {
    pub fn capture(ctx: &ControlContext) -> Self {
        Self {
            pressure: ctx.process.pressure,
            temperature: ctx.process.temperature,
            valve_percent: ctx.process.valve_percent,
            heater_percent: ctx.process.heater_percent,
            flow: ctx.outputs.flow.regime,
            mode: ctx.mode,
            esd_active: ctx.esd_engaged(),
            status: ctx.outputs.status.label(),
            relief: ctx.outputs.commands.relief_open,
            purge: ctx.outputs.commands.purge_open,
        }
    }

    /// Render the record in the line grammar, without terminator.
    pub fn encode(&self) -> Result<TelemetryLine, TelemetryError> {
        let mut line = TelemetryLine::new();
        write!(
            line,
            "P:{:.1},T:{:.1},MV:{:.1},SH:{:.1},F:{},M:{},ESD:{},ESTADO:{},RELIEF:{},PURGE:{}",
            self.pressure,
            self.temperature,
            self.valve_percent,
            self.heater_percent,
            self.flow.label(),
            self.mode.label(),
            if self.esd_active { "Activado" } else { "Desactivado" },
            self.status,
            yes_no(self.relief),
            yes_no(self.purge),
        )
        .map_err(|_| TelemetryError::Overflow)?;
        Ok(line)
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "Si" } else { "No" }
}

/// Rate limiter for telemetry emission.
pub struct EmissionGate {
    interval_ms: u64,
    last_emit_ms: Option<u64>,
}

impl EmissionGate {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms),
            last_emit_ms: None,
        }
    }

    /// True (and re-armed) when at least one interval has passed since
    /// the last emission.  The first call is always due.
    pub fn due(&mut self, now_ms: u64) -> bool {
        let due = match self.last_emit_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
            None => true,
        };
        if due {
            self.last_emit_ms = Some(now_ms);
        }
        due
    }
}
