//! System configuration parameters
//!
//! All tunable parameters for the VaporSur node: process limits, safety
//! thresholds, operator-input tuning and loop timing.
//! Values can be overridden from a JSON file via a [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Nominal operating point (ESD return target) ---
    /// Nominal line pressure (kPa)
    pub nominal_pressure_kpa: f32,
    /// Nominal steam temperature (°C)
    pub nominal_temperature_c: f32,

    // --- ESD trip limits ---
    /// Pressure at or above which the ESD trips automatically (kPa)
    pub pressure_emergency_kpa: f32,
    /// Temperature at or above which the ESD trips automatically (°C)
    pub temperature_emergency_c: f32,

    // --- Warning bands ---
    pub pressure_warn_high_kpa: f32,
    pub pressure_warn_low_kpa: f32,
    pub temperature_warn_high_c: f32,
    pub temperature_warn_low_c: f32,

    // --- Safety overrides ---
    /// Pressure at or below which recovery engages (kPa)
    pub recovery_threshold_kpa: f32,
    /// Temperature at or below which preheat engages (°C)
    pub preheat_threshold_c: f32,
    /// Band above the entry threshold that must be exceeded to release an override
    pub override_hysteresis: f32,

    // --- ESD convergence ---
    pub esd_pressure_tolerance_kpa: f32,
    pub esd_temperature_tolerance_c: f32,
    /// Accelerated decay gain applied while venting or purging
    pub esd_decay_gain: f32,

    // --- Process model ---
    /// First-order response gain per percent offset from neutral
    pub response_gain: f32,
    /// Multiplier applied to elapsed wall time before integration
    pub time_scale: f32,

    // --- Operator input ---
    /// Percent per encoder detent in pressure mode
    pub encoder_sensitivity_pressure: f32,
    /// Percent per encoder detent in temperature mode
    pub encoder_sensitivity_temperature: f32,
    /// Time the mode button must be held steady before a toggle is reported
    pub debounce_ms: u32,
    /// Number of white/blue-then-green flashes shown on a mode change
    pub mode_flash_cycles: u8,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Minimum spacing between telemetry records (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Standby after startup before control logic engages (milliseconds)
    pub standby_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Nominal
            nominal_pressure_kpa: 300.0,
            nominal_temperature_c: 150.0,

            // Trip
            pressure_emergency_kpa: 460.0,
            temperature_emergency_c: 190.0,

            // Warnings
            pressure_warn_high_kpa: 380.0,
            pressure_warn_low_kpa: 250.0,
            temperature_warn_high_c: 170.0,
            temperature_warn_low_c: 120.0,

            // Overrides
            recovery_threshold_kpa: 220.0,
            preheat_threshold_c: 110.0,
            override_hysteresis: 20.0,

            // ESD
            esd_pressure_tolerance_kpa: 5.0,
            esd_temperature_tolerance_c: 3.0,
            esd_decay_gain: 0.2,

            // Model
            response_gain: 0.1,
            time_scale: 0.5,

            // Operator input
            encoder_sensitivity_pressure: 2.0,
            encoder_sensitivity_temperature: 1.0,
            debounce_ms: 120,
            mode_flash_cycles: 2,

            // Timing
            control_loop_interval_ms: 10, // 100 Hz
            telemetry_interval_ms: 100,   // 10 Hz
            standby_ms: 3000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Rejects rather than clamps, so a bad
    /// file can never silently widen a safety band.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.nominal_pressure_kpa,
            self.nominal_temperature_c,
            self.pressure_emergency_kpa,
            self.temperature_emergency_c,
            self.pressure_warn_high_kpa,
            self.pressure_warn_low_kpa,
            self.temperature_warn_high_c,
            self.temperature_warn_low_c,
            self.recovery_threshold_kpa,
            self.preheat_threshold_c,
            self.override_hysteresis,
            self.esd_pressure_tolerance_kpa,
            self.esd_temperature_tolerance_c,
            self.esd_decay_gain,
            self.response_gain,
            self.time_scale,
            self.encoder_sensitivity_pressure,
            self.encoder_sensitivity_temperature,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed("non-finite value"));
        }

        if self.recovery_threshold_kpa < 0.0 || self.preheat_threshold_c < 0.0 {
            return Err(ConfigError::ValidationFailed("override thresholds must be >= 0"));
        }
        if self.override_hysteresis <= 0.0 {
            return Err(ConfigError::ValidationFailed("override_hysteresis must be > 0"));
        }
        if !(self.recovery_threshold_kpa < self.pressure_warn_low_kpa
            && self.pressure_warn_low_kpa < self.nominal_pressure_kpa
            && self.nominal_pressure_kpa < self.pressure_warn_high_kpa
            && self.pressure_warn_high_kpa < self.pressure_emergency_kpa)
        {
            return Err(ConfigError::ValidationFailed(
                "pressure bands must satisfy recovery < warn_low < nominal < warn_high < emergency",
            ));
        }
        if !(self.preheat_threshold_c < self.temperature_warn_low_c
            && self.temperature_warn_low_c < self.nominal_temperature_c
            && self.nominal_temperature_c < self.temperature_warn_high_c
            && self.temperature_warn_high_c < self.temperature_emergency_c)
        {
            return Err(ConfigError::ValidationFailed(
                "temperature bands must satisfy preheat < warn_low < nominal < warn_high < emergency",
            ));
        }
        if self.esd_pressure_tolerance_kpa <= 0.0 || self.esd_temperature_tolerance_c <= 0.0 {
            return Err(ConfigError::ValidationFailed("ESD tolerances must be > 0"));
        }
        if self.esd_decay_gain <= 0.0 || self.response_gain <= 0.0 || self.time_scale <= 0.0 {
            return Err(ConfigError::ValidationFailed("gains and time_scale must be > 0"));
        }
        if self.encoder_sensitivity_pressure <= 0.0 || self.encoder_sensitivity_temperature <= 0.0 {
            return Err(ConfigError::ValidationFailed("encoder sensitivities must be > 0"));
        }
        if self.control_loop_interval_ms == 0 || self.telemetry_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("intervals must be > 0"));
        }
        Ok(())
    }
}
