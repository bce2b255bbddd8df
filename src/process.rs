//! Process state and first-order response model.
//!
//! The "plant" is a deliberately simple mock: each channel percentage
//! pushes its governed quantity away from the current value in proportion
//! to its offset from the 50 % neutral point.
//!
//! | Channel | Below 50 %          | Above 50 %                        |
//! |---------|---------------------|-----------------------------------|
//! | valve   | pressure rises      | pressure falls (not while venting)|
//! | heater  | temperature falls   | temperature rises (not while purging) |

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

/// Channel percentage at which the model applies no drive.
pub const NEUTRAL_PERCENT: f32 = 50.0;

/// Clamp a commanded percentage into `[0, 100]`.  NaN maps to 0.
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Floor a process value at zero.  NaN and negative zero map to `0.0`.
fn floor_zero(value: f32) -> f32 {
    if value > 0.0 { value } else { 0.0 }
}

/// The plant being driven.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    /// Line pressure (kPa, >= 0).
    pub pressure: f32,
    /// Steam temperature (°C, >= 0).
    pub temperature: f32,
    /// Modulating valve opening (%).
    pub valve_percent: f32,
    /// Superheater power (%).
    pub heater_percent: f32,
}

impl ProcessState {
    /// Nominal startup values: configured pressure/temperature, both
    /// channels at neutral.
    pub fn nominal(config: &SystemConfig) -> Self {
        Self {
            pressure: config.nominal_pressure_kpa,
            temperature: config.nominal_temperature_c,
            valve_percent: NEUTRAL_PERCENT,
            heater_percent: NEUTRAL_PERCENT,
        }
    }

    pub fn set_valve(&mut self, percent: f32) {
        self.valve_percent = clamp_percent(percent);
    }

    pub fn set_heater(&mut self, percent: f32) {
        self.heater_percent = clamp_percent(percent);
    }

    /// Apply the first-order response for `dt` seconds.
    ///
    /// `venting` suppresses the valve's pressure-reducing drive and
    /// `purging` suppresses the heater's temperature-raising drive; the
    /// ESD control law supplies its own accelerated correction instead.
    pub fn respond(&mut self, dt: f32, gain: f32, venting: bool, purging: bool) {
        let v = self.valve_percent;
        if v < NEUTRAL_PERCENT {
            self.pressure += (NEUTRAL_PERCENT - v) * dt * gain;
        } else if v > NEUTRAL_PERCENT && !venting {
            self.pressure -= (v - NEUTRAL_PERCENT) * dt * gain;
        }

        let h = self.heater_percent;
        if h > NEUTRAL_PERCENT && !purging {
            self.temperature += (h - NEUTRAL_PERCENT) * dt * gain;
        } else if h < NEUTRAL_PERCENT {
            self.temperature -= (NEUTRAL_PERCENT - h) * dt * gain;
        }

        self.floor();
    }

    /// Accelerated pressure decay toward `target` (relief valve open).
    pub fn vent_toward(&mut self, target: f32, dt: f32, gain: f32) {
        self.pressure -= (self.pressure - target) * dt * gain;
        self.floor();
    }

    /// Accelerated temperature decay toward `target` (purge open).
    pub fn purge_toward(&mut self, target: f32, dt: f32, gain: f32) {
        self.temperature -= (self.temperature - target) * dt * gain;
        self.floor();
    }

    fn floor(&mut self) {
        self.pressure = floor_zero(self.pressure);
        self.temperature = floor_zero(self.temperature);
    }
}
