//! Operator setpoint input.
//!
//! Turns the raw encoder position and mode-button level into a per-tick
//! delta and a debounced mode toggle, and applies the delta to the
//! channel selected by the current [`Mode`].
//!
//! | Mode        | Channel        | Sensitivity (% per detent) |
//! |-------------|----------------|----------------------------|
//! | Pressure    | valve_percent  | 2.0                        |
//! | Temperature | heater_percent | 1.0                        |
//!
//! Adjustment is refused while the ESD is engaged or while the safety
//! override governing the selected channel is latched.

use crate::config::SystemConfig;
use crate::context::{ControlContext, Mode};
use crate::drivers::button::{DebouncedButton, PinLevel};
use crate::drivers::encoder::EncoderTracker;

pub struct SetpointInput {
    encoder: EncoderTracker,
    mode_button: DebouncedButton,
    sensitivity_pressure: f32,
    sensitivity_temperature: f32,
}

/// Outcome of [`SetpointInput::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// No detents this tick.
    Idle,
    /// Channel moved (possibly clamped at a limit).
    Applied,
    /// Detents discarded: ESD engaged or channel overridden.
    Ignored,
}

impl SetpointInput {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            encoder: EncoderTracker::new(),
            mode_button: DebouncedButton::new(config.debounce_ms),
            sensitivity_pressure: config.encoder_sensitivity_pressure,
            sensitivity_temperature: config.encoder_sensitivity_temperature,
        }
    }

    /// Position change since the last tick.
    pub fn read_delta(&mut self, position: i32) -> i32 {
        self.encoder.delta(position)
    }

    /// Debounced mode-toggle edge.
    pub fn read_mode_toggle(&mut self, now_ms: u64, level: PinLevel) -> bool {
        self.mode_button.tick(now_ms, level)
    }

    /// Percent change a delta produces in `mode`.
    pub fn scaled(&self, mode: Mode, delta: i32) -> f32 {
        let sensitivity = match mode {
            Mode::Pressure => self.sensitivity_pressure,
            Mode::Temperature => self.sensitivity_temperature,
        };
        delta as f32 * sensitivity
    }

    /// Add the scaled delta to the active channel, clamped to [0, 100].
    pub fn apply(&self, ctx: &mut ControlContext, delta: i32) -> Adjustment {
        if delta == 0 {
            return Adjustment::Idle;
        }
        if ctx.esd_engaged() {
            return Adjustment::Ignored;
        }
        let step = self.scaled(ctx.mode, delta);
        match ctx.mode {
            Mode::Pressure if ctx.overrides.pressure_recovery => Adjustment::Ignored,
            Mode::Temperature if ctx.overrides.preheat => Adjustment::Ignored,
            Mode::Pressure => {
                let target = ctx.process.valve_percent + step;
                ctx.process.set_valve(target);
                Adjustment::Applied
            }
            Mode::Temperature => {
                let target = ctx.process.heater_percent + step;
                ctx.process.set_heater(target);
                Adjustment::Applied
            }
        }
    }
}
