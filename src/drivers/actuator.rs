//! Actuator driver: maps a tick's commands onto [`ActuatorPort`] writes.
//!
//! Every channel is written every tick, even after an earlier write has
//! failed, so one faulty output never leaves the others stale.  The first
//! failure is returned to the caller.

use log::error;

use crate::app::ports::ActuatorPort;
use crate::context::ControlContext;
use crate::error::ActuatorError;
use crate::process::clamp_percent;

/// Convert a percentage to a duty cycle out of `max_duty`, clamping to
/// `[0, 100]`.
pub fn percent_to_duty(percent: f32, max_duty: u16) -> u16 {
    let fraction = clamp_percent(percent) / 100.0;
    (fraction * f32::from(max_duty)).round() as u16
}

pub struct ActuatorDriver {
    write_failures: u32,
}

impl ActuatorDriver {
    pub fn new() -> Self {
        Self { write_failures: 0 }
    }

    /// Drive all outputs from the context.
    pub fn apply(
        &mut self,
        ctx: &ControlContext,
        hw: &mut impl ActuatorPort,
    ) -> Result<(), ActuatorError> {
        let cmds = &ctx.outputs.commands;
        let (r, g, b) = cmds.status_rgb;

        let results = [
            hw.set_valve(clamp_percent(ctx.process.valve_percent)),
            hw.set_heater(clamp_percent(ctx.process.heater_percent)),
            hw.set_relief(cmds.relief_open),
            hw.set_purge(cmds.purge_open),
            hw.set_flow_indicator(cmds.flow_indicator),
            hw.set_laser(cmds.laser),
            hw.set_status_colour(r, g, b),
        ];

        let mut first = None;
        for err in results.into_iter().filter_map(Result::err) {
            self.write_failures = self.write_failures.saturating_add(1);
            first.get_or_insert(err);
        }
        match first {
            Some(err) => {
                error!("ACTUATOR WRITE FAILED: {err} (total {})", self.write_failures);
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Safe idle: every output off.
    pub fn all_off(&mut self, hw: &mut impl ActuatorPort) -> Result<(), ActuatorError> {
        hw.all_off().inspect_err(|err| {
            self.write_failures = self.write_failures.saturating_add(1);
            error!("ACTUATOR SHUTDOWN FAILED: {err}");
        })
    }

    /// Failed writes since construction.
    pub fn write_failures(&self) -> u32 {
        self.write_failures
    }
}

impl Default for ActuatorDriver {
    fn default() -> Self {
        Self::new()
    }
}
