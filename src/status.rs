//! System status classification.
//!
//! One [`SystemStatus`] is computed per tick from the context.  Both the
//! ESTADO telemetry label and the status-indicator pattern are derived
//! from it, never from each other.
//!
//! ## Priority (highest first)
//!
//! | Rank | Variant    | Condition                                  | Indicator       |
//! |------|------------|--------------------------------------------|-----------------|
//! | 1    | `Esd`      | ESD Active or ReadyForReset                | red blink / green |
//! | 2    | `Critical` | relief or purge output commanded          | red             |
//! | 3    | `Override` | recovery or preheat latch set              | cyan            |
//! | 4    | `Warning`  | a quantity outside its warning band        | orange          |
//! | 5    | `Normal`   | none of the above                          | green           |

use crate::context::{ControlContext, Mode};
use crate::drivers::led_patterns::{
    COLOUR_CRITICAL, COLOUR_NORMAL, COLOUR_OVERRIDE, COLOUR_WARNING, PatternId, Rgb,
};
use crate::esd::{Correction, EsdState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Pressure,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    PressureHigh,
    PressureLow,
    TemperatureHigh,
    TemperatureLow,
}

/// What the ESD is doing, as reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsdStatus {
    Reducing(Quantity),
    Raising(Quantity),
    /// Active, both channels inside tolerance this tick.
    NotReady,
    /// Converged; waiting for the operator.
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemStatus {
    Esd(EsdStatus),
    Critical(Quantity),
    Override { recovery: bool, preheat: bool },
    Warning(Warning),
    #[default]
    Normal,
}

impl SystemStatus {
    /// Classify the current tick.  Must run after the ESD step and the
    /// override step so the commands and latches are final.
    pub fn classify(ctx: &ControlContext) -> Self {
        match ctx.esd {
            EsdState::ReadyForReset => return Self::Esd(EsdStatus::Ready),
            EsdState::Active => return Self::Esd(esd_status(ctx)),
            EsdState::Running => {}
        }

        let commands = &ctx.outputs.commands;
        if commands.relief_open {
            return Self::Critical(Quantity::Pressure);
        }
        if commands.purge_open {
            return Self::Critical(Quantity::Temperature);
        }

        if ctx.overrides.any() {
            return Self::Override {
                recovery: ctx.overrides.pressure_recovery,
                preheat: ctx.overrides.preheat,
            };
        }

        let pressure = pressure_warning(ctx);
        let temperature = temperature_warning(ctx);
        let warning = match ctx.mode {
            Mode::Pressure => pressure.or(temperature),
            Mode::Temperature => temperature.or(pressure),
        };
        warning.map_or(Self::Normal, Self::Warning)
    }

    /// ESTADO field text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning(Warning::PressureHigh) => "Advertencia Presión Alta",
            Self::Warning(Warning::PressureLow) => "Advertencia Presión Baja",
            Self::Warning(Warning::TemperatureHigh) => "Advertencia Temperatura Alta",
            Self::Warning(Warning::TemperatureLow) => "Advertencia Temperatura Baja",
            Self::Critical(Quantity::Pressure) => "Emergencia Presión",
            Self::Critical(Quantity::Temperature) => "Emergencia Temperatura",
            Self::Override {
                recovery: true,
                preheat: true,
            } => "Recuperación Presión y Precalentamiento",
            Self::Override { recovery: true, .. } => "Recuperación Presión",
            Self::Override { .. } => "Precalentamiento",
            Self::Esd(EsdStatus::Reducing(Quantity::Pressure)) => "ESD: Reduciendo Presión",
            Self::Esd(EsdStatus::Raising(Quantity::Pressure)) => "ESD: Aumentando Presión",
            Self::Esd(EsdStatus::Reducing(Quantity::Temperature)) => "ESD: Reduciendo Temperatura",
            Self::Esd(EsdStatus::Raising(Quantity::Temperature)) => "ESD: Aumentando Temperatura",
            Self::Esd(EsdStatus::NotReady) => "ESD: No Listo para el Reinicio",
            Self::Esd(EsdStatus::Ready) => "ESD: Listo para el Reinicio",
        }
    }

    /// Indicator colour and pattern.
    pub fn indicator(self) -> (Rgb, PatternId) {
        match self {
            Self::Esd(EsdStatus::Ready) => (COLOUR_NORMAL, PatternId::Solid),
            Self::Esd(_) => (COLOUR_CRITICAL, PatternId::Blink),
            Self::Critical(_) => (COLOUR_CRITICAL, PatternId::Solid),
            Self::Override { .. } => (COLOUR_OVERRIDE, PatternId::Solid),
            Self::Warning(_) => (COLOUR_WARNING, PatternId::Solid),
            Self::Normal => (COLOUR_NORMAL, PatternId::Solid),
        }
    }

    pub fn is_esd(self) -> bool {
        matches!(self, Self::Esd(_))
    }
}

// ── Internal ──────────────────────────────────────────────────

/// Temperature correction wins when both channels are correcting.
fn esd_status(ctx: &ControlContext) -> EsdStatus {
    let Some(correction) = ctx.outputs.esd_correction else {
        return EsdStatus::NotReady;
    };
    match (correction.temperature, correction.pressure) {
        (Correction::Reducing, _) => EsdStatus::Reducing(Quantity::Temperature),
        (Correction::Raising, _) => EsdStatus::Raising(Quantity::Temperature),
        (Correction::Holding, Correction::Reducing) => EsdStatus::Reducing(Quantity::Pressure),
        (Correction::Holding, Correction::Raising) => EsdStatus::Raising(Quantity::Pressure),
        (Correction::Holding, Correction::Holding) => EsdStatus::NotReady,
    }
}

fn pressure_warning(ctx: &ControlContext) -> Option<Warning> {
    let p = ctx.process.pressure;
    if p >= ctx.config.pressure_warn_high_kpa {
        Some(Warning::PressureHigh)
    } else if p <= ctx.config.pressure_warn_low_kpa {
        Some(Warning::PressureLow)
    } else {
        None
    }
}

fn temperature_warning(ctx: &ControlContext) -> Option<Warning> {
    let t = ctx.process.temperature;
    if t >= ctx.config.temperature_warn_high_c {
        Some(Warning::TemperatureHigh)
    } else if t <= ctx.config.temperature_warn_low_c {
        Some(Warning::TemperatureLow)
    } else {
        None
    }
}
